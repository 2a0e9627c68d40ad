use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validators::{non_blank, validate_not_blank, validate_saudi_mobile};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Plumbing,
    Electrical,
    Ac,
    Other,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plumbing => "plumbing",
            Self::Electrical => "electrical",
            Self::Ac => "ac",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PreferredTime {
    Morning,
    Evening,
}

/// Lifecycle stage of a request. Technicians call the confirmed stage
/// "accepted", so that spelling is accepted on input.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    #[serde(alias = "accepted")]
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses still visible on the technician task list.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::InProgress)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Trims the free-text parts and drops them when blank.
    pub fn normalized(self) -> Self {
        Self {
            neighborhood: non_blank(self.neighborhood.as_deref()),
            address: non_blank(self.address.as_deref()),
            ..self
        }
    }
}

/// Row of the `service_requests` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub full_name: String,
    pub mobile: String,
    pub service_type: ServiceType,
    pub issue_description: String,
    pub preferred_time: PreferredTime,
    pub location: Location,
    pub is_different_address: bool,
    pub needs_parts: bool,
    pub part_type: Option<String>,
    pub part_other: Option<String>,
    pub needs_installation: bool,
    pub photo_urls: Vec<String>,
    pub status: RequestStatus,
    pub assigned_technician: Option<Uuid>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated insert payload. Produced only by the intake service.
#[derive(Debug, Clone, Serialize)]
pub struct NewServiceRequest {
    pub full_name: String,
    pub mobile: String,
    pub service_type: ServiceType,
    pub issue_description: String,
    pub preferred_time: PreferredTime,
    pub location: Location,
    pub is_different_address: bool,
    pub needs_parts: bool,
    pub part_type: Option<String>,
    pub part_other: Option<String>,
    pub needs_installation: bool,
    pub photo_urls: Vec<String>,
    pub status: RequestStatus,
}

/// Partial update sent to the backend. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceRequestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_technician: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequestPatch {
    pub fn touch() -> Self {
        Self {
            updated_at: Utc::now(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateServiceRequest {
    #[validate(
        required(message = "full name is required"),
        custom(function = "validate_not_blank", message = "full name is required")
    )]
    pub full_name: Option<String>,
    #[validate(
        required(message = "mobile number is required"),
        custom(function = "validate_saudi_mobile", message = "invalid mobile number")
    )]
    pub mobile: Option<String>,
    #[validate(required(message = "location is required"))]
    pub location: Option<Location>,
    #[validate(required(message = "service type is required"))]
    pub service_type: Option<ServiceType>,
    #[validate(
        required(message = "issue description is required"),
        custom(function = "validate_not_blank", message = "issue description is required")
    )]
    pub issue_description: Option<String>,
    #[validate(required(message = "preferred time is required"))]
    pub preferred_time: Option<PreferredTime>,
    #[serde(default)]
    pub is_different_address: bool,
    #[serde(default)]
    pub needs_parts: bool,
    pub part_type: Option<String>,
    pub part_other: Option<String>,
    #[serde(default)]
    pub needs_installation: bool,
    #[serde(default)]
    #[validate(length(max = 5, message = "at most 5 photos can be attached"))]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNotesRequest {
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTechnicianRequest {
    pub technician_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestsQuery {
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceRequestResponse {
    pub id: Uuid,
    /// Short reference shown to the customer (last 8 id characters).
    pub reference: String,
    pub full_name: String,
    pub mobile: String,
    pub service_type: ServiceType,
    pub issue_description: String,
    pub preferred_time: PreferredTime,
    pub location: Location,
    pub is_different_address: bool,
    pub needs_parts: bool,
    pub part_type: Option<String>,
    pub part_other: Option<String>,
    pub needs_installation: bool,
    pub photo_urls: Vec<String>,
    pub status: RequestStatus,
    pub assigned_technician: Option<Uuid>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn reference(&self) -> String {
        let id = self.id.simple().to_string();
        id[id.len() - 8..].to_uppercase()
    }
}

impl From<ServiceRequest> for ServiceRequestResponse {
    fn from(req: ServiceRequest) -> Self {
        Self {
            reference: req.reference(),
            id: req.id,
            full_name: req.full_name,
            mobile: req.mobile,
            service_type: req.service_type,
            issue_description: req.issue_description,
            preferred_time: req.preferred_time,
            location: req.location,
            is_different_address: req.is_different_address,
            needs_parts: req.needs_parts,
            part_type: req.part_type,
            part_other: req.part_other,
            needs_installation: req.needs_installation,
            photo_urls: req.photo_urls,
            status: req.status,
            assigned_technician: req.assigned_technician,
            admin_notes: req.admin_notes,
            created_at: req.created_at,
            updated_at: req.updated_at,
        }
    }
}

/// Customer-facing view: hides admin notes.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequestTrackingResponse {
    pub id: Uuid,
    pub reference: String,
    pub service_type: ServiceType,
    pub preferred_time: PreferredTime,
    pub status: RequestStatus,
    pub assigned_technician: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceRequest> for RequestTrackingResponse {
    fn from(req: ServiceRequest) -> Self {
        Self {
            reference: req.reference(),
            id: req.id,
            service_type: req.service_type,
            preferred_time: req.preferred_time,
            status: req.status,
            assigned_technician: req.assigned_technician,
            created_at: req.created_at,
            updated_at: req.updated_at,
        }
    }
}
