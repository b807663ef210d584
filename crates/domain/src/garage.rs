//! Canonical garage-door model and its variable encodings.
//!
//! The reconciler keeps exactly one [`GarageState`] per device regardless of
//! which backend feeds it. The REST backend maps vendor enumerations into
//! [`DoorState`] losslessly; the variable backend goes through the integer
//! tables documented on each `encode`/`decode` pair below.

use serde::{Deserialize, Serialize};

/// Canonical door position state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    #[default]
    Closed,
    Open,
    Opening,
    Closing,
    Stopped,
}

impl DoorState {
    /// Variable encoding: `Closed=0, Open=100, Stopped=102, Closing=103,
    /// Opening=104`.
    #[must_use]
    pub fn encode(self) -> i64 {
        match self {
            Self::Closed => 0,
            Self::Open => 100,
            Self::Stopped => 102,
            Self::Closing => 103,
            Self::Opening => 104,
        }
    }

    /// Inverse of [`encode`](Self::encode); unknown codes yield `None`.
    #[must_use]
    pub fn decode(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Closed),
            100 => Some(Self::Open),
            102 => Some(Self::Stopped),
            103 => Some(Self::Closing),
            104 => Some(Self::Opening),
            _ => None,
        }
    }
}

/// Remote-lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
}

impl LockState {
    /// Variable encoding: `Unlocked=0, Locked=1`.
    #[must_use]
    pub fn encode(self) -> i64 {
        match self {
            Self::Unlocked => 0,
            Self::Locked => 1,
        }
    }

    #[must_use]
    pub fn decode(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Unlocked),
            1 => Some(Self::Locked),
            _ => None,
        }
    }
}

/// Last door command issued, reported back to external consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorCommand {
    #[default]
    None,
    Open,
    Close,
    Toggle,
    Stop,
}

impl DoorCommand {
    /// Variable encoding: `None=0, Open=1, Close=2, Toggle=3, Stop=4`.
    #[must_use]
    pub fn encode(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Open => 1,
            Self::Close => 2,
            Self::Toggle => 3,
            Self::Stop => 4,
        }
    }

    #[must_use]
    pub fn decode(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Open),
            2 => Some(Self::Close),
            3 => Some(Self::Toggle),
            4 => Some(Self::Stop),
            _ => None,
        }
    }
}

/// One synchronized garage capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Door,
    DoorCommand,
    Position,
    Light,
    Lock,
    Motor,
    Motion,
    Obstruction,
}

impl Capability {
    /// Every capability, in propagation order.
    pub const ALL: [Self; 8] = [
        Self::Door,
        Self::DoorCommand,
        Self::Position,
        Self::Light,
        Self::Lock,
        Self::Motor,
        Self::Motion,
        Self::Obstruction,
    ];
}

/// Typed value carried by one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Door(DoorState),
    Command(DoorCommand),
    /// Door position percentage, `0..=100`.
    Percent(u8),
    /// Light / motor / motion / obstruction flag.
    Flag(bool),
    Lock(LockState),
}

impl FieldValue {
    /// Variable-backend scalar encoding of this value.
    #[must_use]
    pub fn encode(self) -> i64 {
        match self {
            Self::Door(door) => door.encode(),
            Self::Command(cmd) => cmd.encode(),
            Self::Percent(pos) => i64::from(pos),
            Self::Flag(flag) => i64::from(flag),
            Self::Lock(lock) => lock.encode(),
        }
    }

    /// Decode a variable-backend scalar for the given capability.
    /// Out-of-table codes yield `None` so the caller can freeze the field.
    #[must_use]
    pub fn decode(capability: Capability, value: i64) -> Option<Self> {
        match capability {
            Capability::Door => DoorState::decode(value).map(Self::Door),
            Capability::DoorCommand => DoorCommand::decode(value).map(Self::Command),
            Capability::Position => u8::try_from(value).ok().filter(|v| *v <= 100).map(Self::Percent),
            Capability::Light | Capability::Motor | Capability::Motion | Capability::Obstruction => {
                match value {
                    0 => Some(Self::Flag(false)),
                    1 => Some(Self::Flag(true)),
                    _ => None,
                }
            }
            Capability::Lock => LockState::decode(value).map(Self::Lock),
        }
    }
}

/// Canonical state of one garage device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GarageState {
    pub door: DoorState,
    pub command: DoorCommand,
    pub position: u8,
    pub light: bool,
    pub lock: LockState,
    pub motor: bool,
    pub motion: bool,
    pub obstruction: bool,
}

impl GarageState {
    /// Read one capability out of the canonical state.
    #[must_use]
    pub fn field(&self, capability: Capability) -> FieldValue {
        match capability {
            Capability::Door => FieldValue::Door(self.door),
            Capability::DoorCommand => FieldValue::Command(self.command),
            Capability::Position => FieldValue::Percent(self.position),
            Capability::Light => FieldValue::Flag(self.light),
            Capability::Lock => FieldValue::Lock(self.lock),
            Capability::Motor => FieldValue::Flag(self.motor),
            Capability::Motion => FieldValue::Flag(self.motion),
            Capability::Obstruction => FieldValue::Flag(self.obstruction),
        }
    }

    /// Write one capability into the canonical state. Mismatched value
    /// kinds are ignored (the field keeps its last-known value).
    pub fn set_field(&mut self, capability: Capability, value: FieldValue) {
        match (capability, value) {
            (Capability::Door, FieldValue::Door(door)) => self.door = door,
            (Capability::DoorCommand, FieldValue::Command(cmd)) => self.command = cmd,
            (Capability::Position, FieldValue::Percent(pos)) => self.position = pos.min(100),
            (Capability::Light, FieldValue::Flag(flag)) => self.light = flag,
            (Capability::Lock, FieldValue::Lock(lock)) => self.lock = lock,
            (Capability::Motor, FieldValue::Flag(flag)) => self.motor = flag,
            (Capability::Motion, FieldValue::Flag(flag)) => self.motion = flag,
            (Capability::Obstruction, FieldValue::Flag(flag)) => self.obstruction = flag,
            _ => {}
        }
    }

    /// Capabilities whose value differs from `previous`, in propagation
    /// order. Drives change-only status propagation.
    #[must_use]
    pub fn changed_since(&self, previous: &Self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|cap| self.field(*cap) != previous.field(*cap))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_door_state_through_variable_codes() {
        for door in [
            DoorState::Closed,
            DoorState::Open,
            DoorState::Opening,
            DoorState::Closing,
            DoorState::Stopped,
        ] {
            assert_eq!(DoorState::decode(door.encode()), Some(door));
        }
    }

    #[test]
    fn should_reject_unknown_door_code() {
        assert_eq!(DoorState::decode(101), None);
        assert_eq!(DoorState::decode(-1), None);
    }

    #[test]
    fn should_decode_position_only_within_range() {
        assert_eq!(
            FieldValue::decode(Capability::Position, 42),
            Some(FieldValue::Percent(42))
        );
        assert_eq!(FieldValue::decode(Capability::Position, 101), None);
        assert_eq!(FieldValue::decode(Capability::Position, -3), None);
    }

    #[test]
    fn should_decode_flags_strictly() {
        assert_eq!(
            FieldValue::decode(Capability::Motion, 1),
            Some(FieldValue::Flag(true))
        );
        assert_eq!(FieldValue::decode(Capability::Motion, 2), None);
    }

    #[test]
    fn should_report_no_changes_for_identical_states() {
        let state = GarageState::default();
        assert!(state.changed_since(&state).is_empty());
    }

    #[test]
    fn should_report_only_differing_capabilities() {
        let previous = GarageState::default();
        let mut state = previous;
        state.door = DoorState::Opening;
        state.position = 50;

        let changed = state.changed_since(&previous);
        assert_eq!(changed, vec![Capability::Door, Capability::Position]);
    }

    #[test]
    fn should_ignore_mismatched_field_kind_on_set() {
        let mut state = GarageState::default();
        state.set_field(Capability::Door, FieldValue::Percent(50));
        assert_eq!(state.door, DoorState::Closed);
    }

    #[test]
    fn should_clamp_position_on_set() {
        let mut state = GarageState::default();
        state.set_field(Capability::Position, FieldValue::Percent(100));
        assert_eq!(state.position, 100);
    }
}
