//! Shared in-memory fakes for engine and registry tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use vdev_domain::error::{BackendError, VdevError};
use vdev_domain::garage::{Capability, FieldValue, GarageState};
use vdev_domain::id::DeviceId;
use vdev_domain::record::DeviceRecord;
use vdev_domain::variable::VarRef;

use crate::ports::{GarageBackend, RecordStore, VariableClient};

/// In-memory record store.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryStore {
    records: Arc<Mutex<HashMap<DeviceId, DeviceRecord>>>,
}

impl MemoryStore {
    pub(crate) fn with_record(id: DeviceId, record: DeviceRecord) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().insert(id, record);
        store
    }

    pub(crate) fn record(&self, id: DeviceId) -> Option<DeviceRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }
}

impl RecordStore for MemoryStore {
    fn load(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, VdevError>> + Send {
        let records = Arc::clone(&self.records);
        async move { Ok(records.lock().unwrap().get(&id).cloned()) }
    }

    fn save(
        &self,
        id: DeviceId,
        record: DeviceRecord,
    ) -> impl Future<Output = Result<(), VdevError>> + Send {
        let records = Arc::clone(&self.records);
        async move {
            records.lock().unwrap().insert(id, record);
            Ok(())
        }
    }

    fn delete(&self, id: DeviceId) -> impl Future<Output = Result<(), VdevError>> + Send {
        let records = Arc::clone(&self.records);
        async move {
            records.lock().unwrap().remove(&id);
            Ok(())
        }
    }
}

/// In-memory variable host with a write log and a switchable failure mode.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeVariables {
    values: Arc<Mutex<HashMap<VarRef, f64>>>,
    writes: Arc<Mutex<Vec<(VarRef, f64)>>>,
    unreachable: Arc<AtomicBool>,
}

impl FakeVariables {
    pub(crate) fn set(&self, var: VarRef, value: f64) {
        self.values.lock().unwrap().insert(var, value);
    }

    pub(crate) fn writes(&self) -> Vec<(VarRef, f64)> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

impl VariableClient for FakeVariables {
    fn read(&self, var: VarRef) -> impl Future<Output = Result<f64, BackendError>> + Send {
        let values = Arc::clone(&self.values);
        let unreachable = self.unreachable.load(Ordering::SeqCst);
        async move {
            if unreachable {
                return Err(BackendError::new("variables", "connection refused"));
            }
            values
                .lock()
                .unwrap()
                .get(&var)
                .copied()
                .ok_or_else(|| BackendError::new("variables", format!("no variable {}", var.id)))
        }
    }

    fn write(
        &self,
        var: VarRef,
        value: f64,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        let values = Arc::clone(&self.values);
        let writes = Arc::clone(&self.writes);
        let unreachable = self.unreachable.load(Ordering::SeqCst);
        async move {
            if unreachable {
                return Err(BackendError::new("variables", "connection refused"));
            }
            values.lock().unwrap().insert(var, value);
            writes.lock().unwrap().push((var, value));
            Ok(())
        }
    }
}

/// Scripted garage controller: tests mutate the state directly and the
/// backend serves it field by field.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeGarage {
    state: Arc<Mutex<GarageState>>,
    writes: Arc<Mutex<Vec<(Capability, FieldValue)>>>,
    unreachable: Arc<AtomicBool>,
}

impl FakeGarage {
    pub(crate) fn update(&self, mutate: impl FnOnce(&mut GarageState)) {
        mutate(&mut self.state.lock().unwrap());
    }

    pub(crate) fn writes(&self) -> Vec<(Capability, FieldValue)> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

impl GarageBackend for FakeGarage {
    fn read_field(
        &self,
        capability: Capability,
    ) -> impl Future<Output = Result<Option<FieldValue>, BackendError>> + Send {
        let state = Arc::clone(&self.state);
        let unreachable = self.unreachable.load(Ordering::SeqCst);
        async move {
            if unreachable {
                return Err(BackendError::new("ratgdo", "connection refused"));
            }
            Ok(Some(state.lock().unwrap().field(capability)))
        }
    }

    fn write_field(
        &self,
        capability: Capability,
        value: FieldValue,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        let writes = Arc::clone(&self.writes);
        let unreachable = self.unreachable.load(Ordering::SeqCst);
        async move {
            if unreachable {
                return Err(BackendError::new("ratgdo", "connection refused"));
            }
            writes.lock().unwrap().push((capability, value));
            Ok(())
        }
    }
}

/// Drain every event currently queued on a broadcast receiver.
pub(crate) fn drain(
    rx: &mut tokio::sync::broadcast::Receiver<vdev_domain::event::DeviceEvent>,
) -> Vec<vdev_domain::event::DeviceEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
