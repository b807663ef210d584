//! Switch status values reported through the `ST` driver.
//!
//! The numeric encodings are part of the external contract: the host
//! controller renders them via its index units of measure, and the
//! persisted records carry them across restarts.

use serde::{Deserialize, Serialize};

/// Driver status for plain, on-only, delayed-on and delayed-off switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchStatus {
    #[default]
    Off,
    On,
    /// A delay countdown is running.
    Timer,
}

impl SwitchStatus {
    /// Numeric driver encoding (`Off=0, On=1, Timer=2`).
    #[must_use]
    pub fn driver_value(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Timer => 2,
        }
    }

    /// Collapse a transient state to the stable state it must persist as.
    ///
    /// A `Timer` state written to the store would be resumed with no running
    /// countdown behind it, so it persists as `On`.
    #[must_use]
    pub fn stable(self) -> Self {
        match self {
            Self::Timer => Self::On,
            other => other,
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On | Self::Timer)
    }
}

/// Driver status for the oscillating toggle switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleStatus {
    #[default]
    Off,
    On,
    /// In the On phase, counting down to the Off phase.
    OnTimer,
    /// In the Off phase, counting down to the On phase.
    OffTimer,
}

impl ToggleStatus {
    /// Numeric driver encoding (`Off=0, On=1, OnTimer=2, OffTimer=3`).
    #[must_use]
    pub fn driver_value(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::OnTimer => 2,
            Self::OffTimer => 3,
        }
    }

    /// Collapse a transient state to the stable state it must persist as:
    /// `OnTimer` persists as `On`, `OffTimer` persists as `Off`.
    #[must_use]
    pub fn stable(self) -> Self {
        match self {
            Self::OnTimer => Self::On,
            Self::OffTimer => Self::Off,
            other => other,
        }
    }
}

impl std::fmt::Display for SwitchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::On => f.write_str("on"),
            Self::Timer => f.write_str("timer"),
        }
    }
}

impl std::fmt::Display for ToggleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::On => f.write_str("on"),
            Self::OnTimer => f.write_str("on-timer"),
            Self::OffTimer => f.write_str("off-timer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_switch_driver_values() {
        assert_eq!(SwitchStatus::Off.driver_value(), 0);
        assert_eq!(SwitchStatus::On.driver_value(), 1);
        assert_eq!(SwitchStatus::Timer.driver_value(), 2);
    }

    #[test]
    fn should_collapse_timer_to_on() {
        assert_eq!(SwitchStatus::Timer.stable(), SwitchStatus::On);
        assert_eq!(SwitchStatus::On.stable(), SwitchStatus::On);
        assert_eq!(SwitchStatus::Off.stable(), SwitchStatus::Off);
    }

    #[test]
    fn should_collapse_toggle_timers_to_stable_phases() {
        assert_eq!(ToggleStatus::OnTimer.stable(), ToggleStatus::On);
        assert_eq!(ToggleStatus::OffTimer.stable(), ToggleStatus::Off);
        assert_eq!(ToggleStatus::On.stable(), ToggleStatus::On);
        assert_eq!(ToggleStatus::Off.stable(), ToggleStatus::Off);
    }

    #[test]
    fn should_default_to_off() {
        assert_eq!(SwitchStatus::default(), SwitchStatus::Off);
        assert_eq!(ToggleStatus::default(), ToggleStatus::Off);
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let status = ToggleStatus::OffTimer;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"offtimer\"");
        let parsed: ToggleStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
