use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::backend::{Backend, RequestFilter};
use crate::error::{AppError, AppResult};
use crate::models::{
    ChangeEvent, CreateServiceRequest, NewServiceRequest, Part, RequestStatus, ServiceRequest,
    ServiceRequestPatch, ServiceType, Table, TechnicianStatus, OTHER_PART,
};
use crate::services::events::EventBus;
use crate::services::lifecycle::TransitionPolicy;
use crate::services::matching::MatchingService;
use crate::services::notification_service::Notifier;
use crate::utils::validators::{non_blank, normalize_mobile, validate_photo_reference};

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Technician(Uuid),
}

pub struct RequestService {
    backend: Arc<dyn Backend>,
    events: EventBus,
    notifier: Arc<dyn Notifier>,
    policy: TransitionPolicy,
}

impl RequestService {
    pub fn new(backend: Arc<dyn Backend>, events: EventBus, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            events,
            notifier,
            policy: TransitionPolicy,
        }
    }

    pub async fn create(&self, payload: CreateServiceRequest) -> AppResult<ServiceRequest> {
        let new_request = self.validate_intake(payload).await?;
        let created = self.backend.insert_service_request(&new_request).await?;

        self.events
            .publish(ChangeEvent::created(Table::ServiceRequests, created.id));
        tracing::info!(
            "New {} request {} created",
            created.service_type,
            created.id
        );
        Ok(created)
    }

    /// Checks the intake form and normalizes it into an insertable record.
    pub async fn validate_intake(
        &self,
        payload: CreateServiceRequest,
    ) -> AppResult<NewServiceRequest> {
        payload.validate()?;

        let missing = |msg: &str| AppError::Validation(msg.to_string());

        let full_name = non_blank(payload.full_name.as_deref())
            .ok_or_else(|| missing("full name is required"))?;
        let mobile = payload
            .mobile
            .as_deref()
            .map(normalize_mobile)
            .ok_or_else(|| missing("mobile number is required"))?;
        let location = payload
            .location
            .ok_or_else(|| missing("location is required"))?;
        if !location.is_in_range() {
            return Err(missing("location is out of range"));
        }
        let service_type = payload
            .service_type
            .ok_or_else(|| missing("service type is required"))?;
        let issue_description = non_blank(payload.issue_description.as_deref())
            .ok_or_else(|| missing("issue description is required"))?;
        let preferred_time = payload
            .preferred_time
            .ok_or_else(|| missing("preferred time is required"))?;

        let (part_type, part_other, needs_installation) = if payload.needs_parts {
            let part_type = non_blank(payload.part_type.as_deref())
                .ok_or_else(|| missing("part type is required"))?;
            if part_type == OTHER_PART {
                let part_other = non_blank(payload.part_other.as_deref())
                    .ok_or_else(|| missing("please describe the part you need"))?;
                (Some(part_type), Some(part_other), payload.needs_installation)
            } else {
                self.check_catalog_part(&part_type, service_type).await?;
                (Some(part_type), None, payload.needs_installation)
            }
        } else {
            (None, None, false)
        };

        for photo in &payload.photo_urls {
            validate_photo_reference(photo).map_err(AppError::Validation)?;
        }

        Ok(NewServiceRequest {
            full_name,
            mobile,
            service_type,
            issue_description,
            preferred_time,
            location: location.normalized(),
            is_different_address: payload.is_different_address,
            needs_parts: payload.needs_parts,
            part_type,
            part_other,
            needs_installation,
            photo_urls: payload.photo_urls,
            status: RequestStatus::Pending,
        })
    }

    async fn check_catalog_part(&self, part_type: &str, service_type: ServiceType) -> AppResult<Part> {
        let id = Uuid::parse_str(part_type)
            .map_err(|_| AppError::Validation("unknown part type".to_string()))?;
        let part = self
            .backend
            .get_part(id)
            .await?
            .ok_or_else(|| AppError::Validation("unknown part type".to_string()))?;

        if !part.is_active || part.category != service_type {
            return Err(AppError::Validation(format!(
                "part {} is not available for {} requests",
                part.name, service_type
            )));
        }
        Ok(part)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ServiceRequest> {
        self.backend
            .get_service_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))
    }

    pub async fn list(&self, status: Option<RequestStatus>) -> AppResult<Vec<ServiceRequest>> {
        let filter = status.map(RequestFilter::with_status).unwrap_or_default();
        Ok(self.backend.list_service_requests(&filter).await?)
    }

    /// Open work visible to a technician: their own jobs plus unassigned
    /// requests they are skilled for.
    pub async fn technician_tasks(&self, technician_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let technician = self
            .backend
            .get_technician(technician_id)
            .await?
            .ok_or(AppError::Forbidden)?;

        let filter = RequestFilter {
            statuses: Some(
                RequestStatus::ALL
                    .into_iter()
                    .filter(RequestStatus::is_open)
                    .collect(),
            ),
            assigned_technician: None,
        };
        let open = self.backend.list_service_requests(&filter).await?;

        Ok(open
            .into_iter()
            .filter(|r| match r.assigned_technician {
                Some(assigned) => assigned == technician.id,
                None => technician.has_skill(r.service_type),
            })
            .collect())
    }

    pub async fn transition(
        &self,
        id: Uuid,
        to: RequestStatus,
        actor: Actor,
    ) -> AppResult<ServiceRequest> {
        let request = self.get(id).await?;

        if let Actor::Technician(technician_id) = actor {
            match request.assigned_technician {
                Some(assigned) if assigned == technician_id => {}
                None if request.status == RequestStatus::Pending
                    && to == RequestStatus::Confirmed => {}
                // Starting unassigned work claims it.
                None if request.status == RequestStatus::Confirmed
                    && to == RequestStatus::InProgress =>
                {
                    let (started, _) = MatchingService::new(self.backend.clone(), self.events.clone())
                        .assign(id, technician_id)
                        .await?;
                    return Ok(started);
                }
                _ => return Err(AppError::Forbidden),
            }
        }

        self.policy.check(request.status, to)?;

        if to == RequestStatus::InProgress && request.assigned_technician.is_none() {
            return Err(AppError::Validation(
                "assign a technician to start work on this request".to_string(),
            ));
        }

        let patch = ServiceRequestPatch {
            status: Some(to),
            ..ServiceRequestPatch::touch()
        };
        let updated = self.backend.update_service_request(id, &patch).await?;
        self.events
            .publish(ChangeEvent::updated(Table::ServiceRequests, updated.id));
        tracing::info!("Request {} moved {} -> {}", id, request.status, to);

        if to == RequestStatus::Completed {
            if let Some(technician_id) = updated.assigned_technician {
                self.release_technician(technician_id).await;
            }
        }

        if to.is_terminal() {
            let notifier = Arc::clone(&self.notifier);
            let finished = updated.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier.request_finished(&finished).await {
                    tracing::error!("Failed to notify customer for {}: {}", finished.id, e);
                }
            });
        }

        Ok(updated)
    }

    async fn release_technician(&self, technician_id: Uuid) {
        match self
            .backend
            .update_technician_status(technician_id, TechnicianStatus::Available)
            .await
        {
            Ok(technician) => self
                .events
                .publish(ChangeEvent::updated(Table::Technicians, technician.id)),
            Err(e) => tracing::error!(
                "Failed to release technician {}: {}",
                technician_id,
                e
            ),
        }
    }

    pub async fn update_notes(&self, id: Uuid, notes: Option<String>) -> AppResult<ServiceRequest> {
        self.get(id).await?;
        let patch = ServiceRequestPatch {
            admin_notes: Some(non_blank(notes.as_deref())),
            ..ServiceRequestPatch::touch()
        };
        let updated = self.backend.update_service_request(id, &patch).await?;
        self.events
            .publish(ChangeEvent::updated(Table::ServiceRequests, updated.id));
        Ok(updated)
    }

    pub async fn parts(&self, category: ServiceType) -> AppResult<Vec<Part>> {
        Ok(self.backend.list_parts(category).await?)
    }
}
