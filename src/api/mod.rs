pub mod admin;
pub mod events;
pub mod parts;
pub mod requests;
pub mod technician;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/requests", requests::routes())
        .nest("/parts", parts::routes())
        .nest("/admin", admin::routes())
        .nest("/technician", technician::routes())
        .nest("/events", events::routes())
}
