use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::AppResult;
use crate::middleware::AppState;
use crate::models::{Part, PartsQuery, ServiceType};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_parts))
}

/// Active catalog parts for a service category
#[utoipa::path(
    get,
    path = "/api/v1/parts",
    tag = "parts",
    params(
        ("category" = ServiceType, Query, description = "Service category")
    ),
    responses(
        (status = 200, description = "Parts, ordered by name", body = Vec<Part>)
    )
)]
pub async fn list_parts(
    State(state): State<AppState>,
    Query(query): Query<PartsQuery>,
) -> AppResult<Json<Vec<Part>>> {
    let parts = state.requests().parts(query.category).await?;
    Ok(Json(parts))
}
