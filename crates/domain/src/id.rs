//! Typed device identifier.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a device, a positive integer assigned by the
/// configuration source.
///
/// Identity is the id alone: two configuration entries carrying the same id
/// describe the *same* device as far as persistence is concerned, even when
/// their parameters disagree (the documented "ghost device" footgun).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wrap a raw configuration id.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Access the raw integer value.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Whether this id is valid (ids are positive by contract).
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u32> for DeviceId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let id = DeviceId::new(42);
        let text = id.to_string();
        let parsed: DeviceId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let id = DeviceId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let parsed: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_reject_zero_as_invalid() {
        assert!(!DeviceId::new(0).is_valid());
        assert!(DeviceId::new(1).is_valid());
    }

    #[test]
    fn should_return_error_when_parsing_garbage() {
        let result: Result<DeviceId, _> = "not-a-number".parse();
        assert!(result.is_err());
    }
}
