//! Inbound command vocabulary.
//!
//! Commands arrive from the host dispatcher already routed to a device; the
//! engine for that device decides whether the command is valid for its type.

use serde::{Deserialize, Serialize};

use crate::temperature::Conversion;

/// Commands understood by the switch family (plain, on-only, delayed,
/// toggle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchCommand {
    /// `DON` — device on, possibly delayed.
    On,
    /// `DOF` — device off.
    Off,
    /// `DFON` — fast on, bypasses delay logic.
    FastOn,
    /// `DFOF` — fast off, cancels delay logic.
    FastOff,
    /// Flip between on and off (plain switch only).
    Toggle,
    /// Update the delay duration in seconds.
    SetDelay(u32),
    /// Update the oscillator on-phase duration in seconds.
    SetOnDuration(u32),
    /// Update the oscillator off-phase duration in seconds.
    SetOffDuration(u32),
}

/// Commands understood by dimmer/generic level devices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelCommand {
    On,
    Off,
    Brighten,
    Dim,
    SetLevel(u8),
}

/// Commands understood by the garage reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarageCommand {
    Open,
    Close,
    Stop,
    Toggle,
    SetPosition(u8),
    LightOn,
    LightOff,
    Lock,
    Unlock,
    ResetStats,
}

/// Commands understood by the temperature converter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureCommand {
    /// Inject a reading directly (bypassing the source variable).
    Set(f64),
    /// Select the unit conversion.
    SetConversion(Conversion),
    /// Enable/disable raw-to-precision scaling.
    SetRawToPrecision(bool),
    /// Clear running statistics, keeping the current value.
    ResetStats,
}

/// Any inbound device command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Switch(SwitchCommand),
    Level(LevelCommand),
    Garage(GarageCommand),
    Temperature(TemperatureCommand),
    /// Re-report all drivers for the device.
    Query,
}

impl Command {
    /// Short name used in logs and invalid-command notices.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Switch(cmd) => match cmd {
                SwitchCommand::On => "DON",
                SwitchCommand::Off => "DOF",
                SwitchCommand::FastOn => "DFON",
                SwitchCommand::FastOff => "DFOF",
                SwitchCommand::Toggle => "TOGGLE",
                SwitchCommand::SetDelay(_) => "SETDELAY",
                SwitchCommand::SetOnDuration(_) => "SETONDUR",
                SwitchCommand::SetOffDuration(_) => "SETOFFDUR",
            },
            Self::Level(cmd) => match cmd {
                LevelCommand::On => "DON",
                LevelCommand::Off => "DOF",
                LevelCommand::Brighten => "BRT",
                LevelCommand::Dim => "DIM",
                LevelCommand::SetLevel(_) => "SETLVL",
            },
            Self::Garage(cmd) => match cmd {
                GarageCommand::Open => "OPEN",
                GarageCommand::Close => "CLOSE",
                GarageCommand::Stop => "STOP",
                GarageCommand::Toggle => "TRIGGER",
                GarageCommand::SetPosition(_) => "SETPOS",
                GarageCommand::LightOn => "LT_ON",
                GarageCommand::LightOff => "LT_OFF",
                GarageCommand::Lock => "LOCK",
                GarageCommand::Unlock => "UNLOCK",
                GarageCommand::ResetStats => "RESET_STATS",
            },
            Self::Temperature(cmd) => match cmd {
                TemperatureCommand::Set(_) => "SETTEMP",
                TemperatureCommand::SetConversion(_) => "SETCONV",
                TemperatureCommand::SetRawToPrecision(_) => "SETRAWTOPREC",
                TemperatureCommand::ResetStats => "RESET_STATS",
            },
            Self::Query => "QUERY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_switch_primitives_like_the_wire_protocol() {
        assert_eq!(Command::Switch(SwitchCommand::On).name(), "DON");
        assert_eq!(Command::Switch(SwitchCommand::FastOff).name(), "DFOF");
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let cmd = Command::Garage(GarageCommand::SetPosition(50));
        let json = serde_json::to_string(&cmd).unwrap();
        let parsed: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cmd);
    }
}
