//! Storage port — persistence for per-device records.

use std::future::Future;

use vdev_domain::error::VdevError;
use vdev_domain::id::DeviceId;
use vdev_domain::record::DeviceRecord;

/// Persistence for per-device records, keyed by device id.
///
/// Engines call [`save`](Self::save) on every state-affecting transition and
/// [`load`](Self::load) once at startup; [`delete`](Self::delete) runs when a
/// device is removed from the configuration.
pub trait RecordStore: Send + Sync {
    fn load(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, VdevError>> + Send;

    fn save(
        &self,
        id: DeviceId,
        record: DeviceRecord,
    ) -> impl Future<Output = Result<(), VdevError>> + Send;

    fn delete(&self, id: DeviceId) -> impl Future<Output = Result<(), VdevError>> + Send;
}
