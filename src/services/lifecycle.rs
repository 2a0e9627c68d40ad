use crate::error::{AppError, AppResult};
use crate::models::RequestStatus;

/// Allowed request status transitions. Every status write is checked here
/// first; anything not listed is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionPolicy;

impl TransitionPolicy {
    pub fn allowed_from(&self, from: RequestStatus) -> &'static [RequestStatus] {
        use crate::models::RequestStatus::*;
        match from {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[InProgress, Cancelled],
            InProgress => &[Completed],
            Completed | Cancelled => &[],
        }
    }

    pub fn is_allowed(&self, from: RequestStatus, to: RequestStatus) -> bool {
        self.allowed_from(from).contains(&to)
    }

    pub fn check(&self, from: RequestStatus, to: RequestStatus) -> AppResult<()> {
        if self.is_allowed(from, to) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition { from, to })
        }
    }

    /// Assignment moves a request straight to in_progress; confirming first
    /// is optional.
    pub fn check_assignable(&self, from: RequestStatus) -> AppResult<()> {
        match from {
            RequestStatus::Pending | RequestStatus::Confirmed => Ok(()),
            _ => Err(AppError::InvalidTransition {
                from,
                to: RequestStatus::InProgress,
            }),
        }
    }
}
