use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast::error::RecvError, RwLock};
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::backend::{Backend, BackendResult, RequestFilter};
use crate::models::{
    ChangeEvent, ChangeKind, DashboardResponse, RequestStatus, ServiceRequest, StatusCount, Table,
};
use crate::services::events::EventBus;

/// How often the live view re-reads everything regardless of events.
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Admin dashboard snapshot of every request, kept current from the change
/// feed instead of re-listing the table on each read.
#[derive(Debug, Default)]
pub struct LiveView {
    requests: HashMap<Uuid, ServiceRequest>,
}

impl LiveView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot with a full listing.
    pub fn replace_all(&mut self, rows: Vec<ServiceRequest>) {
        self.requests = rows.into_iter().map(|r| (r.id, r)).collect();
    }

    /// Stores the latest copy of a row, or drops it when it no longer exists.
    pub fn set(&mut self, id: Uuid, row: Option<ServiceRequest>) {
        match row {
            Some(row) => {
                self.requests.insert(id, row);
            }
            None => {
                self.requests.remove(&id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn status_counts(&self) -> Vec<StatusCount> {
        RequestStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: self
                    .requests
                    .values()
                    .filter(|r| r.status == status)
                    .count(),
            })
            .collect()
    }

    pub fn dashboard(&self) -> DashboardResponse {
        DashboardResponse {
            total: self.len(),
            by_status: self.status_counts(),
        }
    }
}

/// Full re-fetch. The lock is only taken once the rows are in hand.
pub async fn reconcile(view: &RwLock<LiveView>, backend: &dyn Backend) -> BackendResult<()> {
    let rows = backend
        .list_service_requests(&RequestFilter::default())
        .await?;
    view.write().await.replace_all(rows);
    Ok(())
}

/// Applies one change event by re-reading the affected row.
pub async fn apply(
    view: &RwLock<LiveView>,
    backend: &dyn Backend,
    event: ChangeEvent,
) -> BackendResult<()> {
    if event.table != Table::ServiceRequests {
        return Ok(());
    }

    let row = match event.kind {
        ChangeKind::Deleted => None,
        ChangeKind::Created | ChangeKind::Updated => {
            backend.get_service_request(event.row_id).await?
        }
    };
    view.write().await.set(event.row_id, row);
    Ok(())
}

async fn reload(view: &RwLock<LiveView>, backend: &dyn Backend) {
    if let Err(e) = reconcile(view, backend).await {
        tracing::warn!("Live view reload failed: {}", e);
    }
}

/// Keeps `view` in sync with the change feed until the bus is dropped.
/// Reloads fully when the subscriber lags, when a row fetch fails, and every
/// `resync_every` to pick up writes made outside this process.
pub async fn run(
    view: Arc<RwLock<LiveView>>,
    backend: Arc<dyn Backend>,
    events: EventBus,
    resync_every: Duration,
) {
    let mut rx = events.subscribe();
    let mut resync = time::interval_at(Instant::now() + resync_every, resync_every);
    resync.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if let Err(e) = reconcile(&view, backend.as_ref()).await {
        tracing::warn!("Initial live view load failed: {}", e);
    }

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => {
                    if let Err(e) = apply(&view, backend.as_ref(), event).await {
                        tracing::warn!("Live view update for {} failed, reloading: {}", event.row_id, e);
                        reload(&view, backend.as_ref()).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Live view missed {} events, reloading", skipped);
                    reload(&view, backend.as_ref()).await;
                }
                Err(RecvError::Closed) => break,
            },
            _ = resync.tick() => {
                tracing::debug!("Periodic live view reload");
                reload(&view, backend.as_ref()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::models::{Location, NewServiceRequest, PreferredTime, ServiceRequestPatch, ServiceType};

    fn new_request() -> NewServiceRequest {
        NewServiceRequest {
            full_name: "Sara".into(),
            mobile: "0551234567".into(),
            service_type: ServiceType::Ac,
            issue_description: "Not cooling".into(),
            preferred_time: PreferredTime::Evening,
            location: Location {
                lat: 21.54,
                lng: 39.17,
                neighborhood: None,
                address: None,
            },
            is_different_address: false,
            needs_parts: false,
            part_type: None,
            part_other: None,
            needs_installation: false,
            photo_urls: vec![],
            status: RequestStatus::Pending,
        }
    }

    fn count(view: &LiveView, status: RequestStatus) -> usize {
        view.status_counts()
            .into_iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    }

    #[tokio::test]
    async fn counts_follow_incremental_events() {
        let backend = InMemoryBackend::new();
        let view = RwLock::new(LiveView::new());
        reconcile(&view, &backend).await.unwrap();
        assert!(view.read().await.is_empty());

        let a = backend.insert_service_request(&new_request()).await.unwrap();
        let b = backend.insert_service_request(&new_request()).await.unwrap();
        apply(&view, &backend, ChangeEvent::created(Table::ServiceRequests, a.id))
            .await
            .unwrap();
        apply(&view, &backend, ChangeEvent::created(Table::ServiceRequests, b.id))
            .await
            .unwrap();
        assert_eq!(count(&*view.read().await, RequestStatus::Pending), 2);

        let patch = ServiceRequestPatch {
            status: Some(RequestStatus::Cancelled),
            ..ServiceRequestPatch::touch()
        };
        backend.update_service_request(a.id, &patch).await.unwrap();
        apply(&view, &backend, ChangeEvent::updated(Table::ServiceRequests, a.id))
            .await
            .unwrap();

        let view = view.read().await;
        assert_eq!(count(&view, RequestStatus::Pending), 1);
        assert_eq!(count(&view, RequestStatus::Cancelled), 1);
        assert_eq!(view.dashboard().total, 2);
    }

    #[tokio::test]
    async fn other_tables_are_ignored() {
        let backend = InMemoryBackend::new();
        let view = RwLock::new(LiveView::new());
        apply(&view, &backend, ChangeEvent::created(Table::Reviews, Uuid::new_v4()))
            .await
            .unwrap();
        assert!(view.read().await.is_empty());
    }

    #[tokio::test]
    async fn reconcile_replaces_stale_rows() {
        let backend = InMemoryBackend::new();
        let view = RwLock::new(LiveView::new());
        let mut stale = backend.insert_service_request(&new_request()).await.unwrap();
        let kept_id = stale.id;
        stale.id = Uuid::new_v4();
        view.write().await.set(stale.id, Some(stale.clone()));

        reconcile(&view, &backend).await.unwrap();
        let view = view.read().await;
        assert_eq!(view.len(), 1);
        assert!(view.requests.contains_key(&kept_id));
        assert!(!view.requests.contains_key(&stale.id));
        assert_eq!(view.status_counts().len(), RequestStatus::ALL.len());
    }
}
