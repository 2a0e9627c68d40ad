use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(stream_events))
}

/// Row change feed as server-sent events. A `resync` event means some
/// changes were dropped and the client should reload its lists.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "text/event-stream of ChangeEvent payloads"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn stream_events(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    auth_user.require_staff()?;

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).map(|result| match result {
        Ok(event) => Event::default().event("change").json_data(event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            Ok(Event::default().event("resync").data(skipped.to_string()))
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
