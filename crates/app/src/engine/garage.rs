//! Garage reconciler: one canonical door state per device, fed by exactly
//! one authoritative backend and propagated outward only when a field
//! actually changes.
//!
//! The backend is either the REST door controller or the variable tables;
//! the reconciler does not know which. In REST mode a second, write-only
//! backend mirrors every propagated change into the variables so external
//! consumers keep seeing the door.

use std::sync::Arc;

use tokio::sync::Mutex;

use vdev_domain::command::{Command, GarageCommand};
use vdev_domain::device::GarageParams;
use vdev_domain::error::{BackendError, VdevError};
use vdev_domain::event::{DeviceEvent, StatusUpdate};
use vdev_domain::garage::{Capability, DoorCommand, DoorState, FieldValue, GarageState, LockState};
use vdev_domain::id::DeviceId;
use vdev_domain::record::DeviceRecord;
use vdev_domain::time::{Timestamp, now};

use crate::ports::{GarageBackend, RecordStore, StatusSink, VariableClient};

/// Variable-table implementation of [`GarageBackend`]. Serves as the
/// authoritative backend when no REST controller is configured, and as the
/// write-only mirror when one is.
pub struct GarageVariables<V> {
    vars: V,
    params: GarageParams,
}

impl<V> GarageVariables<V> {
    pub fn new(vars: V, params: GarageParams) -> Self {
        Self { vars, params }
    }
}

impl<V: VariableClient> GarageBackend for GarageVariables<V> {
    async fn read_field(&self, capability: Capability) -> Result<Option<FieldValue>, BackendError> {
        let Some(var) = self.params.var(capability) else {
            return Ok(None);
        };
        let value = self.vars.read(var).await?;
        let code = value.round() as i64;
        FieldValue::decode(capability, code).map(Some).ok_or_else(|| {
            BackendError::new(
                "variables",
                format!("variable {} carries unmappable code {code}", var.id),
            )
        })
    }

    async fn write_field(
        &self,
        capability: Capability,
        value: FieldValue,
    ) -> Result<(), BackendError> {
        let Some(var) = self.params.var(capability) else {
            return Ok(());
        };
        self.vars.write(var, value.encode() as f64).await
    }
}

#[derive(Debug)]
struct GarageInner {
    state: GarageState,
    /// Last propagated snapshot; `None` forces a full push on the next poll.
    propagated: Option<GarageState>,
    opened_at: Option<Timestamp>,
    backend_down: bool,
    mirror_down: bool,
}

/// Engine for one garage device.
pub struct GarageReconciler<B, M, S, K> {
    id: DeviceId,
    name: String,
    backend: B,
    mirror: Option<M>,
    store: S,
    sink: K,
    state: Mutex<GarageInner>,
}

impl<B, M, S, K> GarageReconciler<B, M, S, K>
where
    B: GarageBackend + 'static,
    M: GarageBackend + 'static,
    S: RecordStore + 'static,
    K: StatusSink + 'static,
{
    pub async fn start(
        id: DeviceId,
        name: impl Into<String>,
        backend: B,
        mirror: Option<M>,
        store: S,
        sink: K,
    ) -> Result<Arc<Self>, VdevError> {
        let mut state = GarageState::default();
        if let Some(DeviceRecord::Garage(saved)) = store.load(id).await? {
            state = saved;
        }
        // a door that was open across the restart restarts its clock
        let opened_at = (state.door != DoorState::Closed).then(now);
        let engine = Arc::new(Self {
            id,
            name: name.into(),
            backend,
            mirror,
            store,
            sink,
            state: Mutex::new(GarageInner {
                state,
                propagated: None,
                opened_at,
                backend_down: false,
                mirror_down: false,
            }),
        });
        let inner = engine.state.lock().await;
        engine.persist(&inner).await?;
        drop(inner);
        Ok(engine)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One reconciliation pass: read every capability from the backend,
    /// diff against the last propagated snapshot, and push only the fields
    /// that changed. An unreachable backend freezes the whole state at its
    /// last-known values and raises a single notice.
    pub async fn poll(&self) -> Result<(), VdevError> {
        let mut inner = self.state.lock().await;
        let previous = inner.state;
        let mut fresh = previous;
        for capability in Capability::ALL {
            match self.backend.read_field(capability).await {
                Ok(Some(value)) => fresh.set_field(capability, value),
                Ok(None) => {}
                Err(error) => {
                    if !inner.backend_down {
                        inner.backend_down = true;
                        self.sink
                            .emit(DeviceEvent::notice(
                                Some(self.id),
                                format!("door controller unreachable: {error}"),
                            ))
                            .await;
                    }
                    return Ok(());
                }
            }
        }
        if inner.backend_down {
            inner.backend_down = false;
            tracing::info!(device = %self.id, name = %self.name, "door controller reachable again");
        }
        // a door transition consumes the pending command
        if fresh.door != previous.door {
            fresh.command = DoorCommand::None;
        }
        let changed = match inner.propagated {
            Some(seen) => fresh.changed_since(&seen),
            None => Capability::ALL.to_vec(),
        };
        inner.state = fresh;
        inner.propagated = Some(fresh);
        if !changed.is_empty() {
            self.persist(&inner).await?;
        }
        for capability in changed {
            let value = fresh.field(capability);
            self.sink
                .emit(DeviceEvent::status(
                    self.id,
                    StatusUpdate::Garage { capability, value },
                ))
                .await;
            self.mirror_write(&mut inner, capability, value).await;
        }
        self.track_open_time(&mut inner).await;
        Ok(())
    }

    /// Issue one command to the backend. Commands are never deduplicated;
    /// a lost write surfaces as a notice and is simply gone (the next poll
    /// shows whatever the door actually did).
    pub async fn command(&self, command: GarageCommand) -> Result<(), VdevError> {
        tracing::debug!(device = %self.id, name = %self.name, command = ?command, "garage command");
        let mut inner = self.state.lock().await;
        let (capability, value) = match command {
            GarageCommand::Open => (
                Capability::DoorCommand,
                FieldValue::Command(DoorCommand::Open),
            ),
            GarageCommand::Close => (
                Capability::DoorCommand,
                FieldValue::Command(DoorCommand::Close),
            ),
            GarageCommand::Stop => (
                Capability::DoorCommand,
                FieldValue::Command(DoorCommand::Stop),
            ),
            GarageCommand::Toggle => (
                Capability::DoorCommand,
                FieldValue::Command(DoorCommand::Toggle),
            ),
            GarageCommand::SetPosition(position) => {
                (Capability::Position, FieldValue::Percent(position.min(100)))
            }
            GarageCommand::LightOn => (Capability::Light, FieldValue::Flag(true)),
            GarageCommand::LightOff => (Capability::Light, FieldValue::Flag(false)),
            GarageCommand::Lock => (Capability::Lock, FieldValue::Lock(LockState::Locked)),
            GarageCommand::Unlock => (Capability::Lock, FieldValue::Lock(LockState::Unlocked)),
            GarageCommand::ResetStats => {
                inner.opened_at = None;
                self.sink
                    .emit(DeviceEvent::status(self.id, StatusUpdate::OpenSeconds(0)))
                    .await;
                return Ok(());
            }
        };
        if let Err(error) = self.backend.write_field(capability, value).await {
            self.sink
                .emit(DeviceEvent::notice(
                    Some(self.id),
                    format!(
                        "door controller rejected {}: {error}",
                        Command::Garage(command).name()
                    ),
                ))
                .await;
            return Ok(());
        }
        self.mirror_write(&mut inner, capability, value).await;
        // optimistic canonical update; the door state itself waits for a poll
        inner.state.set_field(capability, value);
        let changed = match inner.propagated {
            Some(seen) => inner.state.changed_since(&seen),
            None => vec![capability],
        };
        inner.propagated = Some(inner.state);
        if !changed.is_empty() {
            self.persist(&inner).await?;
        }
        for capability in changed {
            let value = inner.state.field(capability);
            self.sink
                .emit(DeviceEvent::status(
                    self.id,
                    StatusUpdate::Garage { capability, value },
                ))
                .await;
        }
        Ok(())
    }

    /// Re-report every field without touching the backend.
    pub async fn query(&self) {
        let mut inner = self.state.lock().await;
        for capability in Capability::ALL {
            let value = inner.state.field(capability);
            self.sink
                .emit(DeviceEvent::status(
                    self.id,
                    StatusUpdate::Garage { capability, value },
                ))
                .await;
        }
        self.track_open_time(&mut inner).await;
    }

    pub async fn stop(&self) -> Result<(), VdevError> {
        let inner = self.state.lock().await;
        self.persist(&inner).await
    }

    async fn track_open_time(&self, inner: &mut GarageInner) {
        if inner.state.door == DoorState::Closed {
            if inner.opened_at.take().is_some() {
                self.sink
                    .emit(DeviceEvent::status(self.id, StatusUpdate::OpenSeconds(0)))
                    .await;
            }
        } else {
            let opened_at = *inner.opened_at.get_or_insert_with(now);
            let seconds = (now() - opened_at).num_seconds().max(0);
            self.sink
                .emit(DeviceEvent::status(
                    self.id,
                    StatusUpdate::OpenSeconds(seconds),
                ))
                .await;
        }
    }

    async fn mirror_write(&self, inner: &mut GarageInner, capability: Capability, value: FieldValue) {
        let Some(mirror) = &self.mirror else { return };
        match mirror.write_field(capability, value).await {
            Ok(()) => inner.mirror_down = false,
            Err(error) => {
                if !inner.mirror_down {
                    inner.mirror_down = true;
                    self.sink
                        .emit(DeviceEvent::notice(
                            Some(self.id),
                            format!("status mirror unreachable: {error}"),
                        ))
                        .await;
                }
            }
        }
    }

    async fn persist(&self, inner: &GarageInner) -> Result<(), VdevError> {
        self.store
            .save(self.id, DeviceRecord::Garage(inner.state))
            .await
    }
}
