use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    AssignTechnicianRequest, AssignmentResponse, DashboardResponse, RankedTechnician,
    RequestStatus, RequestsQuery, Review, ServiceRequestResponse, UpdateNotesRequest,
    UpdateStatusRequest,
};
use crate::services::Actor;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/requests", get(list_requests))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/candidates", get(list_candidates))
        .route("/requests/:id/assign", post(assign_technician))
        .route("/requests/:id/status", put(update_status))
        .route("/requests/:id/notes", put(update_notes))
        .route("/requests/:id/reviews", get(list_reviews))
}

/// Request counts per status
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Live counts", body = DashboardResponse),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DashboardResponse>> {
    auth_user.require_admin()?;
    let view = state.live_view.read().await;
    Ok(Json(view.dashboard()))
}

/// All requests, newest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/requests",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<RequestStatus>, Query, description = "Only this status")
    ),
    responses(
        (status = 200, description = "Requests", body = Vec<ServiceRequestResponse>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<RequestsQuery>,
) -> AppResult<Json<Vec<ServiceRequestResponse>>> {
    auth_user.require_admin()?;
    let requests = state.requests().list(query.status).await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// Full request details
#[utoipa::path(
    get,
    path = "/api/v1/admin/requests/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request", body = ServiceRequestResponse),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ServiceRequestResponse>> {
    auth_user.require_admin()?;
    let request = state.requests().get(id).await?;
    Ok(Json(request.into()))
}

/// Available technicians for a request, nearest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/requests/{id}/candidates",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Ranked technicians", body = Vec<RankedTechnician>),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Request not found or no technicians available")
    )
)]
pub async fn list_candidates(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<RankedTechnician>>> {
    auth_user.require_admin()?;
    let candidates = state.matching().candidates(id).await?;
    Ok(Json(candidates))
}

/// Assign a technician and start work
#[utoipa::path(
    post,
    path = "/api/v1/admin/requests/{id}/assign",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    request_body = AssignTechnicianRequest,
    responses(
        (status = 200, description = "Technician assigned", body = AssignmentResponse),
        (status = 400, description = "Technician cannot take this request"),
        (status = 403, description = "Admins only"),
        (status = 409, description = "Request is already started or closed"),
        (status = 502, description = "Assignment failed")
    )
)]
pub async fn assign_technician(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignTechnicianRequest>,
) -> AppResult<Json<AssignmentResponse>> {
    auth_user.require_admin()?;
    let (request, technician) = state.matching().assign(id, payload.technician_id).await?;
    Ok(Json(AssignmentResponse {
        request: request.into(),
        technician,
    }))
}

/// Move a request to another status
#[utoipa::path(
    put,
    path = "/api/v1/admin/requests/{id}/status",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ServiceRequestResponse),
        (status = 403, description = "Admins only"),
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
    auth_user.require_admin()?;
    let request = state
        .requests()
        .transition(id, payload.status, Actor::Admin)
        .await?;
    Ok(Json(request.into()))
}

/// Replace the internal notes on a request
#[utoipa::path(
    put,
    path = "/api/v1/admin/requests/{id}/notes",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    request_body = UpdateNotesRequest,
    responses(
        (status = 200, description = "Notes saved", body = ServiceRequestResponse),
        (status = 403, description = "Admins only")
    )
)]
pub async fn update_notes(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNotesRequest>,
) -> AppResult<Json<ServiceRequestResponse>> {
    auth_user.require_admin()?;
    let request = state.requests().update_notes(id, payload.admin_notes).await?;
    Ok(Json(request.into()))
}

/// Customer reviews of a request
#[utoipa::path(
    get,
    path = "/api/v1/admin/requests/{id}/reviews",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<Review>),
        (status = 403, description = "Admins only")
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Review>>> {
    auth_user.require_admin()?;
    let reviews = state.reviews().list(id).await?;
    Ok(Json(reviews))
}
