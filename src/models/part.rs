use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ServiceType;

/// Sentinel `part_type` value for a part not in the catalog.
pub const OTHER_PART: &str = "other";

/// Row of the `parts_catalog` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Part {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: ServiceType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PartsQuery {
    pub category: ServiceType,
}
