use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Backend, BackendError, BackendResult, RequestFilter, SERVICE_REQUESTS, TECHNICIANS,
};
use crate::models::{
    NewReview, NewServiceRequest, Part, Profile, Review, ServiceRequest, ServiceRequestPatch,
    ServiceType, Technician, TechnicianFilter, TechnicianStatus, UpsertProfile,
};

/// Operations that can be told to fail, for exercising error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ListServiceRequests,
    GetServiceRequest,
    InsertServiceRequest,
    UpdateServiceRequest,
    ListTechnicians,
    UpdateTechnician,
    InsertReview,
}

#[derive(Default)]
struct Tables {
    requests: HashMap<Uuid, ServiceRequest>,
    technicians: HashMap<Uuid, Technician>,
    parts: HashMap<Uuid, Part>,
    reviews: Vec<Review>,
    profiles: HashMap<Uuid, Profile>,
    failures: HashSet<FailPoint>,
}

impl Tables {
    fn check(&self, point: FailPoint) -> BackendResult<()> {
        if self.failures.contains(&point) {
            return Err(BackendError::Unavailable(format!("{:?} failed", point)));
        }
        Ok(())
    }
}

/// In-process stand-in for the hosted backend.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_on(&self, point: FailPoint) {
        self.tables.write().await.failures.insert(point);
    }

    pub async fn recover(&self, point: FailPoint) {
        self.tables.write().await.failures.remove(&point);
    }

    pub async fn add_technician(&self, technician: Technician) {
        self.tables
            .write()
            .await
            .technicians
            .insert(technician.id, technician);
    }

    pub async fn add_part(&self, part: Part) {
        self.tables.write().await.parts.insert(part.id, part);
    }

    pub async fn reviews(&self) -> Vec<Review> {
        self.tables.read().await.reviews.clone()
    }
}

#[axum::async_trait]
impl Backend for InMemoryBackend {
    async fn list_service_requests(
        &self,
        filter: &RequestFilter,
    ) -> BackendResult<Vec<ServiceRequest>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::ListServiceRequests)?;
        let mut rows: Vec<ServiceRequest> = tables
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_service_request(&self, id: Uuid) -> BackendResult<Option<ServiceRequest>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::GetServiceRequest)?;
        Ok(tables.requests.get(&id).cloned())
    }

    async fn insert_service_request(
        &self,
        request: &NewServiceRequest,
    ) -> BackendResult<ServiceRequest> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::InsertServiceRequest)?;
        let now = Utc::now();
        let row = ServiceRequest {
            id: Uuid::new_v4(),
            full_name: request.full_name.clone(),
            mobile: request.mobile.clone(),
            service_type: request.service_type,
            issue_description: request.issue_description.clone(),
            preferred_time: request.preferred_time,
            location: request.location.clone(),
            is_different_address: request.is_different_address,
            needs_parts: request.needs_parts,
            part_type: request.part_type.clone(),
            part_other: request.part_other.clone(),
            needs_installation: request.needs_installation,
            photo_urls: request.photo_urls.clone(),
            status: request.status,
            assigned_technician: None,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };
        tables.requests.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_service_request(
        &self,
        id: Uuid,
        patch: &ServiceRequestPatch,
    ) -> BackendResult<ServiceRequest> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::UpdateServiceRequest)?;
        let row = tables.requests.get_mut(&id).ok_or(BackendError::NotFound {
            table: SERVICE_REQUESTS,
            id,
        })?;
        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(technician) = patch.assigned_technician {
            row.assigned_technician = Some(technician);
        }
        if let Some(notes) = &patch.admin_notes {
            row.admin_notes = notes.clone();
        }
        row.updated_at = patch.updated_at;
        Ok(row.clone())
    }

    async fn list_technicians(&self, filter: &TechnicianFilter) -> BackendResult<Vec<Technician>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::ListTechnicians)?;
        Ok(tables
            .technicians
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn get_technician(&self, id: Uuid) -> BackendResult<Option<Technician>> {
        Ok(self.tables.read().await.technicians.get(&id).cloned())
    }

    async fn update_technician_status(
        &self,
        id: Uuid,
        status: TechnicianStatus,
    ) -> BackendResult<Technician> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::UpdateTechnician)?;
        let row = tables
            .technicians
            .get_mut(&id)
            .ok_or(BackendError::NotFound {
                table: TECHNICIANS,
                id,
            })?;
        row.status = status;
        Ok(row.clone())
    }

    async fn list_parts(&self, category: ServiceType) -> BackendResult<Vec<Part>> {
        let tables = self.tables.read().await;
        let mut parts: Vec<Part> = tables
            .parts
            .values()
            .filter(|p| p.category == category && p.is_active)
            .cloned()
            .collect();
        parts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parts)
    }

    async fn get_part(&self, id: Uuid) -> BackendResult<Option<Part>> {
        Ok(self.tables.read().await.parts.get(&id).cloned())
    }

    async fn insert_review(&self, review: &NewReview) -> BackendResult<Review> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::InsertReview)?;
        let row = Review {
            id: Uuid::new_v4(),
            request_id: review.request_id,
            technician_id: review.technician_id,
            rating: review.rating,
            satisfaction_level: review.satisfaction_level,
            comment: review.comment.clone(),
            created_at: Utc::now(),
        };
        tables.reviews.push(row.clone());
        Ok(row)
    }

    async fn list_reviews(&self, request_id: Uuid) -> BackendResult<Vec<Review>> {
        Ok(self
            .tables
            .read()
            .await
            .reviews
            .iter()
            .rev()
            .filter(|r| r.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn get_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn list_profiles(&self) -> BackendResult<Vec<Profile>> {
        Ok(self.tables.read().await.profiles.values().cloned().collect())
    }

    async fn upsert_profile(&self, profile: &UpsertProfile) -> BackendResult<Profile> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let created_at = tables
            .profiles
            .get(&profile.id)
            .map_or(now, |existing| existing.created_at);
        let row = Profile {
            id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
            created_at,
            updated_at: now,
        };
        tables.profiles.insert(row.id, row.clone());
        Ok(row)
    }
}
