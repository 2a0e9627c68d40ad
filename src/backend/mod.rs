//! Access to the managed backend (tables, auth, RPC).
//!
//! Everything that touches persisted state goes through [`Backend`], which is
//! constructed once at start-up and passed down explicitly. The HTTP
//! implementation talks to the hosted data API; [`memory::InMemoryBackend`]
//! stands in for it in tests.

pub mod error;
pub mod memory;
pub mod rest;

pub use error::{BackendError, BackendResult};
pub use memory::InMemoryBackend;
pub use rest::SupabaseClient;

use uuid::Uuid;

use crate::models::{
    NewReview, NewServiceRequest, Part, Profile, RequestStatus, Review, ServiceRequest,
    ServiceRequestPatch, ServiceType, Technician, TechnicianFilter, TechnicianStatus,
    UpsertProfile,
};

pub const SERVICE_REQUESTS: &str = "service_requests";
pub const TECHNICIANS: &str = "technicians";
pub const PARTS_CATALOG: &str = "parts_catalog";
pub const REVIEWS: &str = "reviews";
pub const PROFILES: &str = "profiles";

#[derive(Debug, Default, Clone)]
pub struct RequestFilter {
    pub statuses: Option<Vec<RequestStatus>>,
    pub assigned_technician: Option<Uuid>,
}

impl RequestFilter {
    pub fn with_status(status: RequestStatus) -> Self {
        Self {
            statuses: Some(vec![status]),
            ..Default::default()
        }
    }

    pub fn matches(&self, req: &ServiceRequest) -> bool {
        self.statuses
            .as_ref()
            .map_or(true, |s| s.contains(&req.status))
            && self
                .assigned_technician
                .map_or(true, |t| req.assigned_technician == Some(t))
    }
}

#[axum::async_trait]
pub trait Backend: Send + Sync {
    /// Requests matching `filter`, newest first.
    async fn list_service_requests(
        &self,
        filter: &RequestFilter,
    ) -> BackendResult<Vec<ServiceRequest>>;

    async fn get_service_request(&self, id: Uuid) -> BackendResult<Option<ServiceRequest>>;

    async fn insert_service_request(
        &self,
        request: &NewServiceRequest,
    ) -> BackendResult<ServiceRequest>;

    async fn update_service_request(
        &self,
        id: Uuid,
        patch: &ServiceRequestPatch,
    ) -> BackendResult<ServiceRequest>;

    async fn list_technicians(&self, filter: &TechnicianFilter) -> BackendResult<Vec<Technician>>;

    async fn get_technician(&self, id: Uuid) -> BackendResult<Option<Technician>>;

    async fn update_technician_status(
        &self,
        id: Uuid,
        status: TechnicianStatus,
    ) -> BackendResult<Technician>;

    /// Active catalog parts for one service type.
    async fn list_parts(&self, category: ServiceType) -> BackendResult<Vec<Part>>;

    async fn get_part(&self, id: Uuid) -> BackendResult<Option<Part>>;

    async fn insert_review(&self, review: &NewReview) -> BackendResult<Review>;

    async fn list_reviews(&self, request_id: Uuid) -> BackendResult<Vec<Review>>;

    async fn get_profile(&self, id: Uuid) -> BackendResult<Option<Profile>>;

    async fn list_profiles(&self) -> BackendResult<Vec<Profile>>;

    async fn upsert_profile(&self, profile: &UpsertProfile) -> BackendResult<Profile>;
}
