//! Garage backend port — field-level access to a door controller.

use std::future::Future;

use vdev_domain::error::BackendError;
use vdev_domain::garage::{Capability, FieldValue};

/// One authoritative source of garage state, read and written field by field.
///
/// The REST adapter implements this against a ratgdo/ESPHome controller; the
/// variable-backed implementation lives in the engine layer. The reconciler
/// is written once against this trait and never knows which one it drives.
pub trait GarageBackend: Send + Sync {
    /// Read one capability. `Ok(None)` means the backend does not carry this
    /// capability (an unmapped variable, say); the field keeps its last-known
    /// value.
    fn read_field(
        &self,
        capability: Capability,
    ) -> impl Future<Output = Result<Option<FieldValue>, BackendError>> + Send;

    /// Write one capability. Unmapped capabilities are a silent no-op.
    fn write_field(
        &self,
        capability: Capability,
        value: FieldValue,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
