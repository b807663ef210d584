//! Device registry: builds engines from normalized specs, routes commands
//! and poll ticks, and tears devices down when they leave the configuration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use vdev_domain::command::Command;
use vdev_domain::device::{DeviceParams, DeviceSpec};
use vdev_domain::error::{InvalidCommand, VdevError};
use vdev_domain::event::DeviceEvent;
use vdev_domain::id::DeviceId;

use crate::engine::{
    GarageReconciler, GarageVariables, LevelEngine, SwitchVariant, TemperatureConverter,
    TimedSwitch,
};
use crate::ports::{GarageBackend, RecordStore, StatusSink, VariableClient};

/// Which poll cadence a tick belongs to. Variable-backed devices refresh on
/// the short cadence; REST door controllers on the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Short,
    Long,
}

enum Handle<S, K, V, R> {
    Switch(Arc<TimedSwitch<S, K>>),
    Level(Arc<LevelEngine<S, K>>),
    Temperature(Arc<TemperatureConverter<V, S, K>>),
    GarageRest(Arc<GarageReconciler<R, GarageVariables<V>, S, K>>),
    GarageVars(Arc<GarageReconciler<GarageVariables<V>, GarageVariables<V>, S, K>>),
}

/// All running devices, keyed by id. The REST factory builds one backend
/// client per configured door-controller host.
pub struct DeviceRegistry<S, K, V, F, R> {
    store: S,
    sink: K,
    vars: V,
    rest: F,
    devices: HashMap<DeviceId, Handle<S, K, V, R>>,
}

impl<S, K, V, F, R> DeviceRegistry<S, K, V, F, R>
where
    S: RecordStore + Clone + 'static,
    K: StatusSink + Clone + 'static,
    V: VariableClient + Clone + 'static,
    F: Fn(&str) -> R,
    R: GarageBackend + 'static,
{
    pub fn new(store: S, sink: K, vars: V, rest: F) -> Self {
        Self {
            store,
            sink,
            vars,
            rest,
            devices: HashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Bring the registry in line with a new configuration: create or
    /// rebuild every listed device, remove the rest. Validation notices are
    /// non-fatal; duplicate ids are flagged and the last definition wins.
    pub async fn apply(&mut self, specs: Vec<DeviceSpec>) -> Result<(), VdevError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            for notice in spec.validate() {
                self.sink
                    .emit(DeviceEvent::notice(notice.device, notice.message))
                    .await;
            }
            if !seen.insert(spec.id) {
                self.sink
                    .emit(DeviceEvent::notice(
                        Some(spec.id),
                        format!("device id {} is defined more than once; the last definition wins", spec.id),
                    ))
                    .await;
            }
        }

        let stale: Vec<DeviceId> = self
            .devices
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();
        for id in stale {
            self.remove(id).await?;
        }

        for spec in specs {
            // a rebuilt (or duplicated) id stops its previous engine first
            if let Some(old) = self.devices.remove(&spec.id) {
                stop_handle(&old).await?;
            }
            tracing::info!(device = %spec.id, name = %spec.name, kind = %spec.params.device_type(), "starting device");
            let id = spec.id;
            let handle = self.build(spec).await?;
            self.devices.insert(id, handle);
        }
        Ok(())
    }

    async fn build(&self, spec: DeviceSpec) -> Result<Handle<S, K, V, R>, VdevError> {
        let DeviceSpec { id, name, params } = spec;
        let store = self.store.clone();
        let sink = self.sink.clone();
        Ok(match params {
            DeviceParams::Switch => Handle::Switch(
                TimedSwitch::start(id, name, SwitchVariant::Plain, store, sink).await?,
            ),
            DeviceParams::OnOnly => Handle::Switch(
                TimedSwitch::start(id, name, SwitchVariant::OnOnly, store, sink).await?,
            ),
            DeviceParams::Dimmer | DeviceParams::Generic => {
                Handle::Level(LevelEngine::start(id, name, store, sink).await?)
            }
            DeviceParams::OnDelay {
                delay,
                dfon_acts_as_don,
            } => Handle::Switch(
                TimedSwitch::start(
                    id,
                    name,
                    SwitchVariant::OnDelay {
                        delay,
                        dfon_acts_as_don,
                    },
                    store,
                    sink,
                )
                .await?,
            ),
            DeviceParams::OffDelay {
                delay,
                dfon_acts_as_don,
            } => Handle::Switch(
                TimedSwitch::start(
                    id,
                    name,
                    SwitchVariant::OffDelay {
                        delay,
                        dfon_acts_as_don,
                    },
                    store,
                    sink,
                )
                .await?,
            ),
            DeviceParams::Toggle {
                on_duration,
                off_duration,
            } => Handle::Switch(
                TimedSwitch::start(
                    id,
                    name,
                    SwitchVariant::Toggle {
                        on_duration,
                        off_duration,
                    },
                    store,
                    sink,
                )
                .await?,
            ),
            DeviceParams::Temperature(params) | DeviceParams::TemperatureC(params) => {
                Handle::Temperature(
                    TemperatureConverter::start(id, name, params, self.vars.clone(), store, sink)
                        .await?,
                )
            }
            DeviceParams::Garage(params) => match params.ratgdo.clone() {
                Some(host) => {
                    let backend = (self.rest)(&host);
                    let mirror = GarageVariables::new(self.vars.clone(), params);
                    Handle::GarageRest(
                        GarageReconciler::start(id, name, backend, Some(mirror), store, sink)
                            .await?,
                    )
                }
                None => {
                    let backend = GarageVariables::new(self.vars.clone(), params);
                    Handle::GarageVars(
                        GarageReconciler::start(
                            id,
                            name,
                            backend,
                            None::<GarageVariables<V>>,
                            store,
                            sink,
                        )
                        .await?,
                    )
                }
            },
        })
    }

    /// One scheduler tick. Backend failures are absorbed inside the
    /// engines; only storage failures surface here, as warnings.
    pub async fn poll(&self, kind: PollKind) {
        for handle in self.devices.values() {
            let result = match (handle, kind) {
                (Handle::Temperature(engine), PollKind::Short) => engine.poll().await,
                (Handle::GarageVars(engine), PollKind::Short) => engine.poll().await,
                (Handle::GarageRest(engine), PollKind::Long) => engine.poll().await,
                _ => Ok(()),
            };
            if let Err(error) = result {
                tracing::warn!(?error, "poll tick failed");
            }
        }
    }

    /// Route one command to its device. Unknown devices and commands
    /// outside the device's vocabulary fail with [`InvalidCommand`].
    pub async fn command(&self, id: DeviceId, command: Command) -> Result<(), VdevError> {
        let Some(handle) = self.devices.get(&id) else {
            return Err(InvalidCommand::new(id, command.name()).into());
        };
        match (handle, command) {
            (Handle::Switch(engine), Command::Switch(cmd)) => engine.command(cmd).await,
            (Handle::Level(engine), Command::Level(cmd)) => engine.command(cmd).await,
            (Handle::Temperature(engine), Command::Temperature(cmd)) => engine.command(cmd).await,
            (Handle::GarageRest(engine), Command::Garage(cmd)) => engine.command(cmd).await,
            (Handle::GarageVars(engine), Command::Garage(cmd)) => engine.command(cmd).await,
            (Handle::Switch(engine), Command::Query) => {
                engine.query().await;
                Ok(())
            }
            (Handle::Level(engine), Command::Query) => {
                engine.query().await;
                Ok(())
            }
            (Handle::Temperature(engine), Command::Query) => {
                engine.query().await;
                Ok(())
            }
            (Handle::GarageRest(engine), Command::Query) => {
                engine.query().await;
                Ok(())
            }
            (Handle::GarageVars(engine), Command::Query) => {
                engine.query().await;
                Ok(())
            }
            _ => Err(InvalidCommand::new(id, command.name()).into()),
        }
    }

    /// Stop one device and drop its persisted record.
    pub async fn remove(&mut self, id: DeviceId) -> Result<(), VdevError> {
        if let Some(handle) = self.devices.remove(&id) {
            tracing::info!(device = %id, "removing device");
            stop_handle(&handle).await?;
            self.store.delete(id).await?;
        }
        Ok(())
    }

    /// Graceful shutdown: cancel countdowns and persist every device's
    /// stable state.
    pub async fn stop(&self) {
        for handle in self.devices.values() {
            if let Err(error) = stop_handle(handle).await {
                tracing::warn!(?error, "failed to persist device on shutdown");
            }
        }
    }
}

async fn stop_handle<S, K, V, R>(handle: &Handle<S, K, V, R>) -> Result<(), VdevError>
where
    S: RecordStore + 'static,
    K: StatusSink + 'static,
    V: VariableClient + 'static,
    R: GarageBackend + 'static,
{
    match handle {
        Handle::Switch(engine) => engine.stop().await,
        Handle::Level(engine) => engine.stop().await,
        Handle::Temperature(engine) => engine.stop().await,
        Handle::GarageRest(engine) => engine.stop().await,
        Handle::GarageVars(engine) => engine.stop().await,
    }
}
