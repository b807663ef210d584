//! References to host-controller variables.

use serde::{Deserialize, Serialize};

/// How a host variable is addressed: state or integer table, current value
/// or init (power-up) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VarAccess {
    StateValue,
    StateInit,
    IntegerValue,
    IntegerInit,
}

impl VarAccess {
    /// Whether reads resolve the init (power-up) value instead of the
    /// current value.
    #[must_use]
    pub fn is_init(self) -> bool {
        matches!(self, Self::StateInit | Self::IntegerInit)
    }

    /// Variable table selector used in the host REST paths
    /// (`2` = state, `1` = integer).
    #[must_use]
    pub fn table(self) -> u8 {
        match self {
            Self::StateValue | Self::StateInit => 2,
            Self::IntegerValue | Self::IntegerInit => 1,
        }
    }
}

/// A fully-addressed host variable: id plus access type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarRef {
    pub id: u32,
    pub access: VarAccess,
}

impl VarRef {
    #[must_use]
    pub fn new(id: u32, access: VarAccess) -> Self {
        Self { id, access }
    }
}
