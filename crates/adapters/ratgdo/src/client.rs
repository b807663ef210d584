//! HTTP client for the controller's native REST API.
//!
//! One entity per path: the door cover at `cover/door`, the light at
//! `light/light`, the remote lockout at `lock/lock_remotes` and the three
//! binary sensors under `binary_sensor/`. Reads are plain GETs returning
//! JSON entity states; commands are empty POSTs to action paths.

use serde::Deserialize;

use vdev_app::ports::GarageBackend;
use vdev_domain::error::BackendError;
use vdev_domain::garage::{Capability, DoorCommand, DoorState, FieldValue, LockState};

/// REST client for one ratgdo controller, addressed by host or full URL.
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct RatgdoClient {
    base: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CoverState {
    state: String,
    #[serde(default)]
    current_operation: Option<String>,
    /// Fraction open, `0.0..=1.0`.
    #[serde(default)]
    position: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EntityState {
    id: String,
    state: String,
}

/// Derive the canonical door state from the cover entity. The operation
/// field wins while the door is moving; otherwise the resting state
/// decides, and anything unrecognized reads as stopped mid-travel.
fn door_state(state: &str, current_operation: Option<&str>) -> DoorState {
    match current_operation {
        Some("OPENING") => DoorState::Opening,
        Some("CLOSING") => DoorState::Closing,
        _ => match state {
            "OPEN" => DoorState::Open,
            "CLOSED" => DoorState::Closed,
            _ => DoorState::Stopped,
        },
    }
}

/// Door position as a percentage; controllers without a position sensor
/// report only the resting state.
fn position_percent(position: Option<f64>, door: DoorState) -> u8 {
    match position {
        Some(fraction) => (fraction.clamp(0.0, 1.0) * 100.0).round() as u8,
        None if door == DoorState::Open => 100,
        None => 0,
    }
}

/// Set-position write path. The controller takes the target as a whole
/// percentage, and the tilt axis must be pinned to zero.
fn set_position_path(position: u8) -> String {
    format!("cover/door/set?position={}&tilt=0", position.min(100))
}

impl RatgdoClient {
    /// Address a controller by bare host/IP or full URL.
    #[must_use]
    pub fn new(http: reqwest::Client, host: &str) -> Self {
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };
        Self { base, http }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Probe the controller before its device goes live: fetch the light
    /// entity and verify it answers with the expected identity.
    pub async fn check_availability(&self) -> Result<(), BackendError> {
        let light: EntityState = self.get("light/light").await?;
        if light.id == "light-light" {
            Ok(())
        } else {
            Err(BackendError::new(
                "ratgdo",
                format!("unexpected controller identity {:?}", light.id),
            ))
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = format!("{}/{path}", self.base);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fail)?;
        response.json().await.map_err(fail)
    }

    async fn post(&self, path: &str) -> Result<(), BackendError> {
        let url = format!("{}/{path}", self.base);
        self.http
            .post(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fail)?;
        Ok(())
    }

    async fn cover(&self) -> Result<CoverState, BackendError> {
        self.get("cover/door").await
    }

    async fn flag(&self, path: &str) -> Result<FieldValue, BackendError> {
        let entity: EntityState = self.get(path).await?;
        Ok(FieldValue::Flag(entity.state == "ON"))
    }
}

fn fail(err: reqwest::Error) -> BackendError {
    BackendError::new("ratgdo", err.to_string())
}

impl GarageBackend for RatgdoClient {
    async fn read_field(&self, capability: Capability) -> Result<Option<FieldValue>, BackendError> {
        Ok(Some(match capability {
            Capability::Door => {
                let cover = self.cover().await?;
                FieldValue::Door(door_state(&cover.state, cover.current_operation.as_deref()))
            }
            Capability::Position => {
                let cover = self.cover().await?;
                let door = door_state(&cover.state, cover.current_operation.as_deref());
                FieldValue::Percent(position_percent(cover.position, door))
            }
            // commands have no readback on the controller
            Capability::DoorCommand => return Ok(None),
            Capability::Light => self.flag("light/light").await?,
            Capability::Lock => {
                let entity: EntityState = self.get("lock/lock_remotes").await?;
                FieldValue::Lock(if entity.state == "LOCKED" {
                    LockState::Locked
                } else {
                    LockState::Unlocked
                })
            }
            Capability::Motor => self.flag("binary_sensor/motor").await?,
            Capability::Motion => self.flag("binary_sensor/motion").await?,
            Capability::Obstruction => self.flag("binary_sensor/obstruction").await?,
        }))
    }

    async fn write_field(
        &self,
        capability: Capability,
        value: FieldValue,
    ) -> Result<(), BackendError> {
        match (capability, value) {
            (Capability::DoorCommand, FieldValue::Command(command)) => match command {
                DoorCommand::Open => self.post("cover/door/open").await,
                DoorCommand::Close => self.post("cover/door/close").await,
                DoorCommand::Stop => self.post("cover/door/stop").await,
                DoorCommand::Toggle => self.post("cover/door/toggle").await,
                DoorCommand::None => Ok(()),
            },
            (Capability::Position, FieldValue::Percent(position)) => {
                self.post(&set_position_path(position)).await
            }
            (Capability::Light, FieldValue::Flag(true)) => self.post("light/light/turn_on").await,
            (Capability::Light, FieldValue::Flag(false)) => self.post("light/light/turn_off").await,
            (Capability::Lock, FieldValue::Lock(LockState::Locked)) => {
                self.post("lock/lock_remotes/lock").await
            }
            (Capability::Lock, FieldValue::Lock(LockState::Unlocked)) => {
                self.post("lock/lock_remotes/unlock").await
            }
            // sensor fields have no writable endpoint
            _ => Ok(()),
        }
    }
}
