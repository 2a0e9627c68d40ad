use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{Backend, RequestFilter};
use crate::error::{AppError, AppResult};
use crate::models::{
    ChangeEvent, Location, RankedTechnician, RequestStatus, ServiceRequest, ServiceRequestPatch, ServiceType,
    Table, Technician, TechnicianFilter, TechnicianStatus,
};
use crate::services::events::EventBus;
use crate::services::geo::distance_km;
use crate::services::lifecycle::TransitionPolicy;

/// Keeps only available technicians with the skill and orders them nearest
/// first. Equal distances fall back to technician id; NaN sorts last.
pub fn rank_technicians(
    candidates: Vec<Technician>,
    service_type: ServiceType,
    location: &Location,
) -> Vec<RankedTechnician> {
    let mut ranked: Vec<RankedTechnician> = candidates
        .into_iter()
        .filter(|t| t.is_available() && t.has_skill(service_type))
        .map(|technician| {
            let distance_km = distance_km(
                location.lat,
                location.lng,
                technician.location.lat,
                technician.location.lng,
            );
            RankedTechnician {
                technician,
                distance_km,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.technician.id.cmp(&b.technician.id))
    });
    ranked
}

pub struct MatchingService {
    backend: Arc<dyn Backend>,
    events: EventBus,
    policy: TransitionPolicy,
}

impl MatchingService {
    pub fn new(backend: Arc<dyn Backend>, events: EventBus) -> Self {
        Self {
            backend,
            events,
            policy: TransitionPolicy,
        }
    }

    async fn load_request(&self, request_id: Uuid) -> AppResult<ServiceRequest> {
        self.backend
            .get_service_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))
    }

    /// Ranked candidates for a request. Fails with `NoTechniciansAvailable`
    /// when nobody qualifies.
    pub async fn candidates(&self, request_id: Uuid) -> AppResult<Vec<RankedTechnician>> {
        let request = self.load_request(request_id).await?;
        self.candidates_for(request.service_type, &request.location)
            .await
    }

    pub async fn candidates_for(
        &self,
        service_type: ServiceType,
        location: &Location,
    ) -> AppResult<Vec<RankedTechnician>> {
        let technicians = self
            .backend
            .list_technicians(&TechnicianFilter::available_for(service_type))
            .await?;

        let ranked = rank_technicians(technicians, service_type, location);
        if ranked.is_empty() {
            return Err(AppError::NoTechniciansAvailable);
        }
        Ok(ranked)
    }

    /// Assigns the picked technician. The request update and the technician
    /// update are separate writes; if the second one fails the first stays,
    /// and calling `assign` again with the same pair finishes the job.
    pub async fn assign(
        &self,
        request_id: Uuid,
        technician_id: Uuid,
    ) -> AppResult<(ServiceRequest, Technician)> {
        let request = self.load_request(request_id).await?;
        let resuming = request.status == RequestStatus::InProgress
            && request.assigned_technician == Some(technician_id);
        if !resuming {
            self.policy.check_assignable(request.status)?;
        }

        let technician = self
            .backend
            .get_technician(technician_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Technician not found".to_string()))?;

        if resuming && technician.status == TechnicianStatus::Busy {
            return Ok((request, technician));
        }
        if !technician.is_available() {
            return Err(AppError::BadRequest(format!(
                "Technician is {}",
                technician.status.as_str()
            )));
        }
        if !technician.has_skill(request.service_type) {
            return Err(AppError::BadRequest(format!(
                "Technician does not handle {} requests",
                request.service_type
            )));
        }
        self.ensure_no_other_job(technician_id, request_id).await?;

        let updated = if resuming {
            tracing::info!(
                "Resuming assignment of technician {} to request {}",
                technician_id,
                request_id
            );
            request
        } else {
            let patch = ServiceRequestPatch {
                status: Some(RequestStatus::InProgress),
                assigned_technician: Some(technician_id),
                ..ServiceRequestPatch::touch()
            };
            let updated = self
                .backend
                .update_service_request(request_id, &patch)
                .await
                .map_err(|e| AppError::AssignmentFailed(format!("request update: {}", e)))?;
            self.events
                .publish(ChangeEvent::updated(Table::ServiceRequests, updated.id));
            updated
        };

        let technician = self
            .backend
            .update_technician_status(technician_id, TechnicianStatus::Busy)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Request {} points at technician {} who is not marked busy",
                    request_id,
                    technician_id
                );
                AppError::AssignmentFailed(format!("technician update: {}", e))
            })?;
        self.events
            .publish(ChangeEvent::updated(Table::Technicians, technician.id));

        tracing::info!(
            "Assigned technician {} to request {}",
            technician_id,
            request_id
        );
        Ok((updated, technician))
    }

    /// A technician holds at most one in-progress request.
    async fn ensure_no_other_job(&self, technician_id: Uuid, request_id: Uuid) -> AppResult<()> {
        let filter = RequestFilter {
            statuses: Some(vec![RequestStatus::InProgress]),
            assigned_technician: Some(technician_id),
        };
        let in_flight = self.backend.list_service_requests(&filter).await?;
        match in_flight.iter().find(|r| r.id != request_id) {
            Some(other) => Err(AppError::BadRequest(format!(
                "Technician is already working on request {}",
                other.id
            ))),
            None => Ok(()),
        }
    }
}
