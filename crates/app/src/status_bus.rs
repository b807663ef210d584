//! In-process status bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use vdev_domain::event::DeviceEvent;

use crate::ports::StatusSink;

/// In-process status bus using a tokio [`broadcast`] channel.
///
/// Emitting succeeds even when there are no active subscribers
/// (the event is simply dropped). Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct StatusBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl StatusBus {
    /// Create a new status bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events emitted *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }
}

impl StatusSink for StatusBus {
    fn emit(&self, event: DeviceEvent) -> impl Future<Output = ()> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(event);
        async {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdev_domain::event::StatusUpdate;
    use vdev_domain::id::DeviceId;
    use vdev_domain::status::SwitchStatus;

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = StatusBus::new(16);
        let mut rx = bus.subscribe();

        let event = DeviceEvent::status(DeviceId::new(2), StatusUpdate::Switch(SwitchStatus::On));
        bus.emit(event.clone()).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = StatusBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = DeviceEvent::notice(None, "duplicate id 4");
        bus.emit(event.clone()).await;

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn should_not_deliver_events_emitted_before_subscription() {
        let bus = StatusBus::new(16);
        bus.emit(DeviceEvent::notice(None, "early")).await;

        let mut rx = bus.subscribe();
        let later = DeviceEvent::notice(None, "late");
        bus.emit(later.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), later);
    }
}
