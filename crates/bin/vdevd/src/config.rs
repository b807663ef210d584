//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `vdev.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values. Devices come from inline `[[devices]]`
//! tables, an external YAML list, a JSON string in `VDEV_DEVICES`, or any
//! mix of the three.

use serde::Deserialize;

use vdev_domain::device::{DeviceParams, DeviceSpec};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Host controller (variable table) settings.
    pub isy: IsyConfig,
    /// Poll cadences.
    pub poll: PollConfig,
    /// Inline device definitions.
    pub devices: Vec<DeviceSpec>,
    /// Path to a YAML file carrying additional device definitions.
    pub devices_file: Option<String>,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// ISY host controller access.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IsyConfig {
    /// Controller host, IP, or full URL. Empty means no controller; devices
    /// that reference variables will then fail their backend reads.
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Poll cadences, in seconds. Variable-backed devices refresh on the short
/// cadence, REST door controllers on the long one.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub short_seconds: u64,
    pub long_seconds: u64,
}

impl Config {
    /// Load configuration from `vdev.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("vdev.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VDEV_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("VDEV_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("VDEV_ISY_HOST") {
            self.isy.host = val;
        }
        if let Ok(val) = std::env::var("VDEV_ISY_USERNAME") {
            self.isy.username = Some(val);
        }
        if let Ok(val) = std::env::var("VDEV_ISY_PASSWORD") {
            self.isy.password = Some(val);
        }
        if let Ok(val) = std::env::var("VDEV_SHORT_POLL") {
            if let Ok(seconds) = val.parse() {
                self.poll.short_seconds = seconds;
            }
        }
        if let Ok(val) = std::env::var("VDEV_LONG_POLL") {
            if let Ok(seconds) = val.parse() {
                self.poll.long_seconds = seconds;
            }
        }
        if let Ok(val) = std::env::var("VDEV_DEVICES_FILE") {
            self.devices_file = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.short_seconds == 0 || self.poll.long_seconds == 0 {
            return Err(ConfigError::Validation(
                "poll cadences must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Collect every configured device: inline tables first, then the YAML
    /// file, then the `VDEV_DEVICES` JSON string. Later sources append;
    /// duplicate ids are resolved downstream (the last definition wins).
    pub fn device_specs(&self) -> Result<Vec<DeviceSpec>, ConfigError> {
        let mut specs = self.devices.clone();
        if let Some(path) = &self.devices_file {
            let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
            let mut listed: Vec<DeviceSpec> =
                serde_yaml::from_str(&content).map_err(ConfigError::Yaml)?;
            specs.append(&mut listed);
        }
        if let Ok(json) = std::env::var("VDEV_DEVICES") {
            let mut listed: Vec<DeviceSpec> =
                serde_json::from_str(&json).map_err(ConfigError::Json)?;
            specs.append(&mut listed);
        }
        Ok(specs)
    }

    /// Whether any device needs the variable backend.
    #[must_use]
    pub fn needs_variable_host(&self, specs: &[DeviceSpec]) -> bool {
        specs.iter().any(|spec| match &spec.params {
            DeviceParams::Temperature(params) | DeviceParams::TemperatureC(params) => {
                params.source.is_some() || params.push.is_some()
            }
            DeviceParams::Garage(params) => {
                vdev_domain::garage::Capability::ALL
                    .into_iter()
                    .any(|capability| params.var(capability).is_some())
            }
            _ => false,
        })
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// ISY credentials, when both halves are configured.
    #[must_use]
    pub fn isy_credentials(&self) -> Option<(String, String)> {
        match (&self.isy.username, &self.isy.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:vdev.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vdevd=info,vdev=info".to_string(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            short_seconds: 30,
            long_seconds: 120,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// Device YAML parse failure.
    #[error("failed to parse devices file")]
    Yaml(#[from] serde_yaml::Error),
    /// Device JSON parse failure.
    #[error("failed to parse VDEV_DEVICES")]
    Json(#[from] serde_json::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdev_domain::id::DeviceId;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite:vdev.db?mode=rwc");
        assert_eq!(config.poll.short_seconds, 30);
        assert_eq!(config.poll.long_seconds, 120);
        assert!(config.devices.is_empty());
        assert!(config.devices_file.is_none());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.poll.short_seconds, 30);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [isy]
            host = '192.168.1.20'
            username = 'admin'
            password = 'secret'

            [poll]
            short_seconds = 10
            long_seconds = 60

            [[devices]]
            id = 1
            name = 'porch'
            type = 'ondelay'
            delay = 30
            dfon_acts_as_don = true

            [[devices]]
            id = 2
            name = 'sw'
            type = 'switch'
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.isy.host, "192.168.1.20");
        assert_eq!(config.poll.short_seconds, 10);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].id, DeviceId::new(1));
        assert_eq!(
            config.devices[0].params,
            DeviceParams::OnDelay {
                delay: 30,
                dfon_acts_as_don: true
            }
        );
        assert_eq!(config.isy_credentials(), Some(("admin".to_string(), "secret".to_string())));
    }

    #[test]
    fn should_parse_garage_device_with_variable_map() {
        let toml = r#"
            [[devices]]
            id = 5
            name = 'garage'
            type = 'garage'
            ratgdo = '10.0.0.9'
            door = { id = 11, access = 'state-value' }
            light = { id = 12, access = 'state-value' }
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        match &config.devices[0].params {
            DeviceParams::Garage(params) => {
                assert_eq!(params.ratgdo.as_deref(), Some("10.0.0.9"));
                assert_eq!(params.door.map(|var| var.id), Some(11));
                assert_eq!(params.lock, None);
            }
            other => panic!("unexpected params {other:?}"),
        }
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.poll.long_seconds, 120);
    }

    #[test]
    fn should_reject_zero_poll_cadence() {
        let mut config = Config::default();
        config.poll.short_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_detect_variable_host_requirement() {
        let toml = r#"
            [[devices]]
            id = 3
            name = 'attic'
            type = 'temperature'
            source = { id = 7, access = 'state-value' }
            precision = 1
            raw_to_precision = true
            conversion = 'none'
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let specs = config.devices.clone();
        assert!(config.needs_variable_host(&specs));
    }

    #[test]
    fn should_not_require_variable_host_for_plain_switches() {
        let toml = r#"
            [[devices]]
            id = 1
            name = 'sw'
            type = 'switch'
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let specs = config.devices.clone();
        assert!(!config.needs_variable_host(&specs));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
