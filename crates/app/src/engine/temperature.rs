//! Temperature converter: pulls readings from a host variable, derives a
//! value through scaling and unit conversion, tracks running statistics and
//! optionally pushes the derived value back out.

use std::sync::Arc;

use tokio::sync::Mutex;

use vdev_domain::command::TemperatureCommand;
use vdev_domain::device::TemperatureParams;
use vdev_domain::error::VdevError;
use vdev_domain::event::{DeviceEvent, StatusUpdate, TemperatureDriver};
use vdev_domain::id::DeviceId;
use vdev_domain::record::DeviceRecord;
use vdev_domain::temperature::TemperatureRecord;
use vdev_domain::time::now;
use vdev_domain::variable::VarRef;

use crate::ports::{RecordStore, StatusSink, VariableClient};

#[derive(Debug)]
struct TempState {
    record: TemperatureRecord,
    source_down: bool,
    push_down: bool,
}

/// Engine for one temperature device.
pub struct TemperatureConverter<V, S, K> {
    id: DeviceId,
    name: String,
    source: Option<VarRef>,
    push: Option<VarRef>,
    vars: V,
    store: S,
    sink: K,
    state: Mutex<TempState>,
}

impl<V, S, K> TemperatureConverter<V, S, K>
where
    V: VariableClient + 'static,
    S: RecordStore + 'static,
    K: StatusSink + 'static,
{
    pub async fn start(
        id: DeviceId,
        name: impl Into<String>,
        params: TemperatureParams,
        vars: V,
        store: S,
        sink: K,
    ) -> Result<Arc<Self>, VdevError> {
        let mut record =
            TemperatureRecord::new(params.precision, params.raw_to_precision, params.conversion);
        // Observed values survive a restart; the scaling and conversion
        // settings always come from the configuration.
        if let Some(DeviceRecord::Temperature(saved)) = store.load(id).await? {
            record.current = saved.current;
            record.previous = saved.previous;
            record.highest = saved.highest;
            record.lowest = saved.lowest;
            record.average = saved.average;
            record.last_change = saved.last_change;
        }
        let engine = Arc::new(Self {
            id,
            name: name.into(),
            source: params.source,
            push: params.push,
            vars,
            store,
            sink,
            state: Mutex::new(TempState {
                record,
                source_down: false,
                push_down: false,
            }),
        });
        let state = engine.state.lock().await;
        engine.persist(&state.record).await?;
        engine.push_values(&state.record).await;
        drop(state);
        Ok(engine)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pull one reading from the source variable, if configured. An
    /// unreachable source freezes the current value and raises a single
    /// notice until the source answers again.
    pub async fn evaluate(&self) -> Result<(), VdevError> {
        let Some(source) = self.source else {
            return Ok(());
        };
        let mut state = self.state.lock().await;
        match self.vars.read(source).await {
            Ok(raw) => {
                if state.source_down {
                    state.source_down = false;
                    tracing::info!(device = %self.id, name = %self.name, "source variable reachable again");
                }
                if let Some(value) = state.record.observe(raw, now()) {
                    self.after_change(&mut state, value).await?;
                }
            }
            Err(error) => {
                if !state.source_down {
                    state.source_down = true;
                    self.sink
                        .emit(DeviceEvent::notice(
                            Some(self.id),
                            format!("source variable unreachable: {error}"),
                        ))
                        .await;
                }
            }
        }
        Ok(())
    }

    /// Poll tick: refresh the update-age driver, then pull.
    pub async fn poll(&self) -> Result<(), VdevError> {
        {
            let state = self.state.lock().await;
            let age = state.record.update_age(now());
            self.sink
                .emit(DeviceEvent::status(self.id, StatusUpdate::UpdateAge(age)))
                .await;
        }
        self.evaluate().await
    }

    pub async fn command(&self, command: TemperatureCommand) -> Result<(), VdevError> {
        tracing::debug!(device = %self.id, name = %self.name, command = ?command, "temperature command");
        let mut state = self.state.lock().await;
        match command {
            // Manual sets carry the final value; no scaling or conversion.
            TemperatureCommand::Set(value) => {
                if let Some(value) = state.record.observe_value(value, now()) {
                    self.after_change(&mut state, value).await?;
                }
            }
            TemperatureCommand::SetConversion(conversion) => {
                if state.record.set_conversion(conversion) {
                    self.persist(&state.record).await?;
                    self.push_values(&state.record).await;
                }
            }
            TemperatureCommand::SetRawToPrecision(enabled) => {
                if state.record.set_raw_to_precision(enabled) {
                    self.persist(&state.record).await?;
                    self.push_values(&state.record).await;
                }
            }
            TemperatureCommand::ResetStats => {
                state.record.reset_statistics();
                self.persist(&state.record).await?;
                self.push_values(&state.record).await;
            }
        }
        Ok(())
    }

    pub async fn query(&self) {
        let state = self.state.lock().await;
        self.push_values(&state.record).await;
        let age = state.record.update_age(now());
        self.sink
            .emit(DeviceEvent::status(self.id, StatusUpdate::UpdateAge(age)))
            .await;
    }

    pub async fn stop(&self) -> Result<(), VdevError> {
        let state = self.state.lock().await;
        self.persist(&state.record).await
    }

    async fn after_change(&self, state: &mut TempState, value: f64) -> Result<(), VdevError> {
        self.persist(&state.record).await?;
        self.push_values(&state.record).await;
        self.sink
            .emit(DeviceEvent::status(self.id, StatusUpdate::UpdateAge(0.0)))
            .await;
        if let Some(push) = self.push {
            match self.vars.write(push, value).await {
                Ok(()) => state.push_down = false,
                Err(error) => {
                    if !state.push_down {
                        state.push_down = true;
                        self.sink
                            .emit(DeviceEvent::notice(
                                Some(self.id),
                                format!("push variable unreachable: {error}"),
                            ))
                            .await;
                    }
                }
            }
        }
        Ok(())
    }

    async fn persist(&self, record: &TemperatureRecord) -> Result<(), VdevError> {
        self.store
            .save(self.id, DeviceRecord::Temperature(record.clone()))
            .await
    }

    async fn push_values(&self, record: &TemperatureRecord) {
        // cleared statistics report as zero, matching the driver defaults
        for driver in [
            TemperatureDriver::Current(record.current.unwrap_or(0.0)),
            TemperatureDriver::Previous(record.previous.unwrap_or(0.0)),
            TemperatureDriver::Highest(record.highest.unwrap_or(0.0)),
            TemperatureDriver::Lowest(record.lowest.unwrap_or(0.0)),
            TemperatureDriver::Average(record.average.unwrap_or(0.0)),
        ] {
            self.sink
                .emit(DeviceEvent::status(
                    self.id,
                    StatusUpdate::Temperature(driver),
                ))
                .await;
        }
    }
}
