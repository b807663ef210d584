//! Persisted per-device records.
//!
//! One record per device, keyed by id, written on every state-affecting
//! transition. Transient timer states are collapsed to their stable
//! equivalents *before* a record is written, so a restart never resumes
//! into a state with no running timer behind it.

use serde::{Deserialize, Serialize};

use crate::garage::GarageState;
use crate::status::{SwitchStatus, ToggleStatus};
use crate::temperature::TemperatureRecord;

/// Durable state for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeviceRecord {
    Switch {
        status: SwitchStatus,
        /// Delay duration for delayed variants; zero for plain switches.
        delay: u32,
    },
    Toggle {
        status: ToggleStatus,
        on_duration: u32,
        off_duration: u32,
    },
    Level {
        level: u8,
    },
    Temperature(TemperatureRecord),
    Garage(GarageState),
}

impl DeviceRecord {
    /// Collapse any transient timer state to its stable equivalent.
    #[must_use]
    pub fn stable(self) -> Self {
        match self {
            Self::Switch { status, delay } => Self::Switch {
                status: status.stable(),
                delay,
            },
            Self::Toggle {
                status,
                on_duration,
                off_duration,
            } => Self::Toggle {
                status: status.stable(),
                on_duration,
                off_duration,
            },
            other => other,
        }
    }
}
