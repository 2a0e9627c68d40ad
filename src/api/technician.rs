use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{ServiceRequestResponse, UpdateStatusRequest, UserRole};
use crate::services::Actor;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_tasks))
        .route("/requests/:id/status", put(update_status))
}

fn technician_id(auth_user: &AuthUser) -> AppResult<Uuid> {
    match auth_user.role {
        UserRole::Technician => Ok(auth_user.user_id),
        _ => Err(AppError::Forbidden),
    }
}

/// Open requests for the signed-in technician
#[utoipa::path(
    get,
    path = "/api/v1/technician/requests",
    tag = "technician",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assigned and claimable requests", body = Vec<ServiceRequestResponse>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Technicians only")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<ServiceRequestResponse>>> {
    let technician_id = technician_id(&auth_user)?;
    let tasks = state.requests().technician_tasks(technician_id).await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// Accept, start or complete a request
#[utoipa::path(
    put,
    path = "/api/v1/technician/requests/{id}/status",
    tag = "technician",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ServiceRequestResponse),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ServiceRequestResponse>> {
    let technician_id = technician_id(&auth_user)?;
    let request = state
        .requests()
        .transition(id, payload.status, Actor::Technician(technician_id))
        .await?;
    Ok(Json(request.into()))
}
