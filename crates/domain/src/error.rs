//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`;
//! adapters wrap their library errors into [`VdevError::Storage`] or
//! [`VdevError::Backend`] at the boundary.

use crate::id::DeviceId;

/// Top-level error for the vdev core.
#[derive(Debug, thiserror::Error)]
pub enum VdevError {
    /// Non-fatal configuration problem; the device is created but flagged.
    #[error("configuration notice")]
    Configuration(#[from] ConfigNotice),

    /// A backend (REST target or variable host) could not be reached or
    /// answered nonsense. Retried on the next poll cycle.
    #[error("backend unreachable")]
    Backend(#[from] BackendError),

    /// Command not valid for the device type. Local no-op, never a crash.
    #[error("invalid command")]
    InvalidCommand(#[from] InvalidCommand),

    /// Persistence layer failure.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Operator-facing configuration notice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConfigNotice {
    pub device: Option<DeviceId>,
    pub message: String,
}

impl ConfigNotice {
    #[must_use]
    pub fn new(device: Option<DeviceId>, message: impl Into<String>) -> Self {
        Self {
            device,
            message: message.into(),
        }
    }
}

/// A backend read or write failed.
#[derive(Debug, thiserror::Error)]
#[error("{backend}: {message}")]
pub struct BackendError {
    /// Which backend failed (`"ratgdo"`, `"variables"`).
    pub backend: &'static str,
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(backend: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            message: message.into(),
        }
    }
}

/// A command was dispatched to a device that cannot handle it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device {device} does not accept {command}")]
pub struct InvalidCommand {
    pub device: DeviceId,
    pub command: &'static str,
}

impl InvalidCommand {
    #[must_use]
    pub fn new(device: DeviceId, command: &'static str) -> Self {
        Self { device, command }
    }
}
