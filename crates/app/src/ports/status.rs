//! Status port — outbound events from engines to the host.

use std::future::Future;

use vdev_domain::event::DeviceEvent;

/// Outbound channel for status updates, command reports and notices.
///
/// Emission never fails from the engine's point of view: a sink with no
/// listeners simply drops the event.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: DeviceEvent) -> impl Future<Output = ()> + Send;
}
