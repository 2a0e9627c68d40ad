use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionLevel {
    VerySatisfied,
    Satisfied,
    Neutral,
    Dissatisfied,
}

impl FromStr for SatisfactionLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "very_satisfied" => Ok(Self::VerySatisfied),
            "satisfied" => Ok(Self::Satisfied),
            "neutral" => Ok(Self::Neutral),
            "dissatisfied" => Ok(Self::Dissatisfied),
            _ => Err(()),
        }
    }
}

/// Row of the `reviews` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Review {
    pub id: Uuid,
    pub request_id: Uuid,
    pub technician_id: Uuid,
    pub rating: i32,
    pub satisfaction_level: SatisfactionLevel,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub request_id: Uuid,
    pub technician_id: Uuid,
    pub rating: i32,
    pub satisfaction_level: SatisfactionLevel,
    pub comment: Option<String>,
}

/// Rating form payload. Fields are loosely typed so that missing or malformed
/// values surface as rating errors instead of body rejections.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    #[schema(value_type = Option<i32>)]
    pub rating: Option<Value>,
    pub satisfaction: Option<String>,
    pub comment: Option<String>,
}
