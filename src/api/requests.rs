use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AppState;
use crate::models::{
    CreateServiceRequest, RequestTrackingResponse, Review, ServiceRequestResponse,
    SubmitReviewRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request))
        .route("/:id", get(track_request))
        .route("/:id/reviews", post(submit_review))
}

/// Submit a new service request
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    tag = "requests",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Request created", body = ServiceRequestResponse),
        (status = 422, description = "Form is incomplete or invalid"),
        (status = 502, description = "Backend unavailable")
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<ServiceRequestResponse>)> {
    let created = state.requests().create(payload).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Track a request by id
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "requests",
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request status", body = RequestTrackingResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn track_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RequestTrackingResponse>> {
    let request = state.requests().get(id).await?;
    Ok(Json(request.into()))
}

/// Rate a completed request
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/reviews",
    tag = "requests",
    params(
        ("id" = Uuid, Path, description = "Request id")
    ),
    request_body = SubmitReviewRequest,
    responses(
        (status = 201, description = "Review recorded", body = Review),
        (status = 400, description = "Request is not completed"),
        (status = 404, description = "Not found"),
        (status = 422, description = "Rating or satisfaction missing")
    )
)]
pub async fn submit_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state.reviews().submit(id, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
