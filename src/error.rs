use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::models::RequestStatus;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("No technicians available")]
    NoTechniciansAvailable,

    #[error("Assignment failed: {0}")]
    AssignmentFailed(String),

    #[error("Please choose a rating from 1 to 5 stars")]
    MissingRating,

    #[error("Please choose how satisfied you are with the service")]
    MissingSatisfaction,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            AppError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", self.to_string())
            }
            AppError::NoTechniciansAvailable => (
                StatusCode::NOT_FOUND,
                "NO_TECHNICIANS_AVAILABLE",
                self.to_string(),
            ),
            AppError::AssignmentFailed(msg) => {
                tracing::error!("Assignment failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "ASSIGNMENT_FAILED",
                    "Assignment failed, please try again".to_string(),
                )
            }
            AppError::MissingRating => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_RATING",
                self.to_string(),
            ),
            AppError::MissingSatisfaction => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_SATISFACTION",
                self.to_string(),
            ),
            AppError::Backend(e) => {
                tracing::error!("Backend error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_ERROR",
                    "Backend request failed".to_string(),
                )
            }
            AppError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid token".to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
