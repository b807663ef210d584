//! Device specifications — validated, typed parameter bundles.
//!
//! The host-side configuration (flat key/value, JSON strings, or a YAML
//! device list) is normalized into one [`DeviceSpec`] per device before the
//! core sees it. Validation happens here, once, instead of ad hoc at each
//! use site.

use serde::{Deserialize, Serialize};

use crate::error::ConfigNotice;
use crate::id::DeviceId;
use crate::temperature::Conversion;
use crate::variable::VarRef;

/// Supported device types, spelled the way configuration sources spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "switch")]
    Switch,
    #[serde(rename = "ononly")]
    OnOnly,
    #[serde(rename = "dimmer")]
    Dimmer,
    #[serde(rename = "generic")]
    Generic,
    #[serde(rename = "ondelay")]
    OnDelay,
    #[serde(rename = "offdelay")]
    OffDelay,
    #[serde(rename = "toggle")]
    Toggle,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "temperaturec")]
    TemperatureC,
    #[serde(rename = "garage")]
    Garage,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Switch => "switch",
            Self::OnOnly => "ononly",
            Self::Dimmer => "dimmer",
            Self::Generic => "generic",
            Self::OnDelay => "ondelay",
            Self::OffDelay => "offdelay",
            Self::Toggle => "toggle",
            Self::Temperature => "temperature",
            Self::TemperatureC => "temperaturec",
            Self::Garage => "garage",
        };
        f.write_str(name)
    }
}

/// Temperature converter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureParams {
    /// Variable to pull readings from; `None` means push-only operation.
    pub source: Option<VarRef>,
    /// Variable to push the derived value to after a change.
    pub push: Option<VarRef>,
    /// Fractional digits assumed in raw integer readings.
    pub precision: u32,
    pub raw_to_precision: bool,
    pub conversion: Conversion,
}

/// Garage reconciler parameters. Every variable mapping is independently
/// optional; unset capabilities are simply not synchronized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GarageParams {
    /// REST door-controller address. When set, the REST backend is
    /// authoritative and the variables below become write-only mirrors.
    pub ratgdo: Option<String>,
    pub door: Option<VarRef>,
    pub door_command: Option<VarRef>,
    pub position: Option<VarRef>,
    pub light: Option<VarRef>,
    pub lock: Option<VarRef>,
    pub motor: Option<VarRef>,
    pub motion: Option<VarRef>,
    pub obstruction: Option<VarRef>,
}

impl GarageParams {
    /// Variable reference for one capability, if configured.
    #[must_use]
    pub fn var(&self, capability: crate::garage::Capability) -> Option<VarRef> {
        use crate::garage::Capability;
        match capability {
            Capability::Door => self.door,
            Capability::DoorCommand => self.door_command,
            Capability::Position => self.position,
            Capability::Light => self.light,
            Capability::Lock => self.lock,
            Capability::Motor => self.motor,
            Capability::Motion => self.motion,
            Capability::Obstruction => self.obstruction,
        }
    }
}

/// Per-type parameter bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceParams {
    Switch,
    OnOnly,
    Dimmer,
    Generic,
    OnDelay {
        /// Delay before the ON takes effect, seconds. Zero degenerates to a
        /// plain switch.
        #[serde(default)]
        delay: u32,
        /// Whether `DFON` behaves like an immediate ON (the documented
        /// behavior is ambiguous, so this is explicit configuration).
        #[serde(default = "default_dfon")]
        dfon_acts_as_don: bool,
    },
    OffDelay {
        #[serde(default)]
        delay: u32,
        #[serde(default = "default_dfon")]
        dfon_acts_as_don: bool,
    },
    Toggle {
        #[serde(default)]
        on_duration: u32,
        #[serde(default)]
        off_duration: u32,
    },
    Temperature(TemperatureParams),
    #[serde(rename = "temperaturec")]
    TemperatureC(TemperatureParams),
    Garage(GarageParams),
}

fn default_dfon() -> bool {
    true
}

impl DeviceParams {
    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::Switch => DeviceType::Switch,
            Self::OnOnly => DeviceType::OnOnly,
            Self::Dimmer => DeviceType::Dimmer,
            Self::Generic => DeviceType::Generic,
            Self::OnDelay { .. } => DeviceType::OnDelay,
            Self::OffDelay { .. } => DeviceType::OffDelay,
            Self::Toggle { .. } => DeviceType::Toggle,
            Self::Temperature(_) => DeviceType::Temperature,
            Self::TemperatureC(_) => DeviceType::TemperatureC,
            Self::Garage(_) => DeviceType::Garage,
        }
    }
}

/// One normalized device definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub id: DeviceId,
    pub name: String,
    #[serde(flatten)]
    pub params: DeviceParams,
}

impl DeviceSpec {
    #[must_use]
    pub fn new(id: DeviceId, name: impl Into<String>, params: DeviceParams) -> Self {
        Self {
            id,
            name: name.into(),
            params,
        }
    }

    /// Validate ranges once at construction time. Notices are non-fatal:
    /// the device is still created, just flagged to the operator.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigNotice> {
        let mut notices = Vec::new();
        if !self.id.is_valid() {
            notices.push(ConfigNotice::new(
                Some(self.id),
                format!("device id {} is not a positive integer", self.id),
            ));
        }
        match &self.params {
            DeviceParams::Toggle {
                on_duration,
                off_duration,
            } => {
                if *on_duration == 0 || *off_duration == 0 {
                    notices.push(ConfigNotice::new(
                        Some(self.id),
                        "toggle durations of 0 are clamped to 1 second",
                    ));
                }
            }
            DeviceParams::Garage(params) => {
                if params.ratgdo.is_none() && params.door.is_none() {
                    notices.push(ConfigNotice::new(
                        Some(self.id),
                        "garage has neither a REST target nor a door variable; door status will never update",
                    ));
                }
            }
            DeviceParams::Temperature(params) | DeviceParams::TemperatureC(params) => {
                if params.precision > 9 {
                    notices.push(ConfigNotice::new(
                        Some(self.id),
                        format!("precision {} is out of range (max 9)", params.precision),
                    ));
                }
            }
            _ => {}
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_lowercase_type_tags() {
        let spec: DeviceSpec = serde_json::from_str(
            r#"{"id": 4, "name": "porch", "type": "ondelay", "delay": 30, "dfon_acts_as_don": true}"#,
        )
        .unwrap();
        assert_eq!(spec.params.device_type(), DeviceType::OnDelay);
        assert_eq!(
            spec.params,
            DeviceParams::OnDelay {
                delay: 30,
                dfon_acts_as_don: true
            }
        );
    }

    #[test]
    fn should_accept_valid_spec_without_notices() {
        let spec = DeviceSpec::new(DeviceId::new(1), "sw", DeviceParams::Switch);
        assert!(spec.validate().is_empty());
    }

    #[test]
    fn should_flag_zero_id() {
        let spec = DeviceSpec::new(DeviceId::new(0), "sw", DeviceParams::Switch);
        assert_eq!(spec.validate().len(), 1);
    }

    #[test]
    fn should_flag_zero_toggle_durations() {
        let spec = DeviceSpec::new(
            DeviceId::new(2),
            "osc",
            DeviceParams::Toggle {
                on_duration: 0,
                off_duration: 5,
            },
        );
        assert_eq!(spec.validate().len(), 1);
    }

    #[test]
    fn should_flag_garage_without_any_door_source() {
        let spec = DeviceSpec::new(DeviceId::new(3), "gar", DeviceParams::Garage(GarageParams::default()));
        assert_eq!(spec.validate().len(), 1);
    }

    #[test]
    fn should_not_flag_garage_with_rest_target() {
        let params = GarageParams {
            ratgdo: Some("192.168.1.20".to_string()),
            ..GarageParams::default()
        };
        let spec = DeviceSpec::new(DeviceId::new(3), "gar", DeviceParams::Garage(params));
        assert!(spec.validate().is_empty());
    }
}
