use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ServiceType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TechnicianStatus {
    Available,
    Busy,
    Offline,
}

impl TechnicianStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Row of the `technicians` table. The id is the technician's auth user id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Technician {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub skills: Vec<ServiceType>,
    pub location: GeoPoint,
    pub status: TechnicianStatus,
    pub created_at: DateTime<Utc>,
}

impl Technician {
    pub fn has_skill(&self, service_type: ServiceType) -> bool {
        self.skills.contains(&service_type)
    }

    pub fn is_available(&self) -> bool {
        self.status == TechnicianStatus::Available
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankedTechnician {
    pub technician: Technician,
    pub distance_km: f64,
}

#[derive(Debug, Default, Clone)]
pub struct TechnicianFilter {
    pub status: Option<TechnicianStatus>,
    pub skill: Option<ServiceType>,
}

impl TechnicianFilter {
    pub fn available_for(service_type: ServiceType) -> Self {
        Self {
            status: Some(TechnicianStatus::Available),
            skill: Some(service_type),
        }
    }

    pub fn matches(&self, technician: &Technician) -> bool {
        self.status.map_or(true, |s| technician.status == s)
            && self.skill.map_or(true, |s| technician.has_skill(s))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub request: super::ServiceRequestResponse,
    pub technician: Technician,
}
