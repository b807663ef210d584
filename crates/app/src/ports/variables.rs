//! Variable port — read/write access to host-controller variables.

use std::future::Future;

use vdev_domain::error::BackendError;
use vdev_domain::variable::VarRef;

/// Read/write access to the host controller's variable tables.
///
/// Values travel as `f64` because the state table carries fractional
/// precision; integer-coded fields round at the call site.
pub trait VariableClient: Send + Sync {
    fn read(&self, var: VarRef) -> impl Future<Output = Result<f64, BackendError>> + Send;

    fn write(
        &self,
        var: VarRef,
        value: f64,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
