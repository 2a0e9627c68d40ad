use crate::error::AppResult;
use crate::models::{RequestStatus, ServiceRequest};

/// Hook invoked when a request reaches a terminal status. Called from a
/// spawned task; errors are logged by the caller and never undo the write.
#[axum::async_trait]
pub trait Notifier: Send + Sync {
    async fn request_finished(&self, request: &ServiceRequest) -> AppResult<()>;
}

/// Customer notifications. No delivery channel (WhatsApp, email) is wired
/// up yet, so messages are only logged.
#[derive(Debug, Default, Clone)]
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }
}

pub fn status_message(request: &ServiceRequest) -> String {
    match request.status {
        RequestStatus::Completed => format!(
            "HomeFix: your {} request #{} is complete. Please rate the service.",
            request.service_type,
            request.reference()
        ),
        RequestStatus::Cancelled => format!(
            "HomeFix: your {} request #{} has been cancelled.",
            request.service_type,
            request.reference()
        ),
        status => format!(
            "HomeFix: your request #{} is now {}.",
            request.reference(),
            status
        ),
    }
}

#[axum::async_trait]
impl Notifier for NotificationService {
    async fn request_finished(&self, request: &ServiceRequest) -> AppResult<()> {
        tracing::info!(
            "No delivery channel configured. Notification for {}: {}",
            request.mobile,
            status_message(request)
        );
        Ok(())
    }
}
