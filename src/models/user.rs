use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Technician,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Technician => "technician",
            Self::Admin => "admin",
        }
    }
}

/// Row of the `profiles` table, keyed by the auth user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsertProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

/// A user as reported by the auth admin API. Only the fields the operator
/// tooling reads are kept; the auth service adds many more.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUserRecord {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_metadata: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAuthUser {
    pub email: String,
    pub password: String,
    pub email_confirm: bool,
    pub user_metadata: Value,
    pub app_metadata: Value,
}

/// Claims of an access token issued by the backend auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(default)]
    pub user_metadata: Value,
}

impl Claims {
    /// Role from `app_metadata`, defaulting to user. `user_metadata` is
    /// writable by the user and never grants a role.
    pub fn app_role(&self) -> UserRole {
        self.app_metadata
            .get("role")
            .and_then(Value::as_str)
            .map(parse_role)
            .unwrap_or_default()
    }
}

pub fn parse_role(role: &str) -> UserRole {
    match role {
        "admin" => UserRole::Admin,
        "technician" => UserRole::Technician,
        _ => UserRole::User,
    }
}
