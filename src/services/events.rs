use tokio::sync::broadcast;

use crate::models::ChangeEvent;

const CHANNEL_CAPACITY: usize = 256;

/// In-process change feed. Every successful write publishes one event per
/// touched row; dashboards and the live view subscribe.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Table;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscribers_see_events_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        bus.publish(ChangeEvent::created(Table::ServiceRequests, a));
        bus.publish(ChangeEvent::updated(Table::Technicians, b));

        assert_eq!(rx.recv().await.unwrap().row_id, a);
        assert_eq!(rx.recv().await.unwrap().row_id, b);
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        EventBus::new(4).publish(ChangeEvent::created(Table::Reviews, Uuid::new_v4()));
    }
}
