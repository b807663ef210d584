//! Outbound status events and command reports.
//!
//! Engines never talk to the host directly; they emit these records through
//! the status sink port and the composition root forwards them.

use serde::{Deserialize, Serialize};

use crate::garage::{Capability, FieldValue};
use crate::id::DeviceId;
use crate::status::{SwitchStatus, ToggleStatus};

/// Command primitives reported outward (scene propagation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundCommand {
    Don,
    Dof,
    Dfon,
    Dfof,
}

impl std::fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Don => f.write_str("DON"),
            Self::Dof => f.write_str("DOF"),
            Self::Dfon => f.write_str("DFON"),
            Self::Dfof => f.write_str("DFOF"),
        }
    }
}

/// One driver-level status change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusUpdate {
    Switch(SwitchStatus),
    Toggle(ToggleStatus),
    Level(u8),
    /// Configured delay / phase duration in seconds.
    Duration { driver: DurationDriver, seconds: u32 },
    Temperature(TemperatureDriver),
    Garage { capability: Capability, value: FieldValue },
    /// Minutes since the value last changed.
    UpdateAge(f64),
    /// Seconds the garage door has been away from `Closed`.
    OpenSeconds(i64),
}

/// Which duration driver a [`StatusUpdate::Duration`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationDriver {
    Delay,
    OnDuration,
    OffDuration,
}

/// Temperature drivers beyond the primary value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureDriver {
    Current(f64),
    Previous(f64),
    Highest(f64),
    Lowest(f64),
    Average(f64),
}

/// Everything a device pushes outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceEvent {
    Status { device: DeviceId, update: StatusUpdate },
    Report { device: DeviceId, command: OutboundCommand },
    /// Operator-facing notice (configuration problems, unreachable
    /// backends). Non-fatal by definition.
    Notice { device: Option<DeviceId>, message: String },
}

impl DeviceEvent {
    #[must_use]
    pub fn status(device: DeviceId, update: StatusUpdate) -> Self {
        Self::Status { device, update }
    }

    #[must_use]
    pub fn report(device: DeviceId, command: OutboundCommand) -> Self {
        Self::Report { device, command }
    }

    #[must_use]
    pub fn notice(device: Option<DeviceId>, message: impl Into<String>) -> Self {
        Self::Notice {
            device,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_outbound_commands_in_wire_form() {
        assert_eq!(OutboundCommand::Don.to_string(), "DON");
        assert_eq!(OutboundCommand::Dfof.to_string(), "DFOF");
    }

    #[test]
    fn should_roundtrip_status_event_through_serde_json() {
        let event = DeviceEvent::status(
            DeviceId::new(3),
            StatusUpdate::Switch(SwitchStatus::Timer),
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: DeviceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
