//! Level devices: dimmers and generic percentage holders.
//!
//! No timers here; the engine is a persisted `0..=100` level with on/off
//! reports at the extremes.

use std::sync::Arc;

use tokio::sync::Mutex;

use vdev_domain::command::LevelCommand;
use vdev_domain::error::VdevError;
use vdev_domain::event::{DeviceEvent, OutboundCommand, StatusUpdate};
use vdev_domain::id::DeviceId;
use vdev_domain::record::DeviceRecord;

use crate::ports::{RecordStore, StatusSink};

/// Brighten/dim step size, percent per command.
const LEVEL_STEP: u8 = 3;

/// Engine for one level device.
pub struct LevelEngine<S, K> {
    id: DeviceId,
    name: String,
    store: S,
    sink: K,
    level: Mutex<u8>,
}

impl<S, K> LevelEngine<S, K>
where
    S: RecordStore + 'static,
    K: StatusSink + 'static,
{
    pub async fn start(
        id: DeviceId,
        name: impl Into<String>,
        store: S,
        sink: K,
    ) -> Result<Arc<Self>, VdevError> {
        let level = match store.load(id).await? {
            Some(DeviceRecord::Level { level }) => level.min(100),
            _ => 0,
        };
        let engine = Arc::new(Self {
            id,
            name: name.into(),
            store,
            sink,
            level: Mutex::new(level),
        });
        engine.store.save(id, DeviceRecord::Level { level }).await?;
        engine.push(level).await;
        Ok(engine)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn command(&self, command: LevelCommand) -> Result<(), VdevError> {
        tracing::debug!(device = %self.id, name = %self.name, command = ?command, "level command");
        let mut level = self.level.lock().await;
        let (next, report) = match command {
            LevelCommand::On => (100, Some(OutboundCommand::Don)),
            LevelCommand::Off => (0, Some(OutboundCommand::Dof)),
            LevelCommand::Brighten => (level.saturating_add(LEVEL_STEP).min(100), None),
            LevelCommand::Dim => (level.saturating_sub(LEVEL_STEP), None),
            LevelCommand::SetLevel(value) => (value.min(100), None),
        };
        *level = next;
        if let Some(report) = report {
            self.sink.emit(DeviceEvent::report(self.id, report)).await;
        }
        self.store
            .save(self.id, DeviceRecord::Level { level: next })
            .await?;
        self.push(next).await;
        Ok(())
    }

    pub async fn query(&self) {
        let level = self.level.lock().await;
        self.push(*level).await;
    }

    pub async fn stop(&self) -> Result<(), VdevError> {
        let level = self.level.lock().await;
        self.store
            .save(self.id, DeviceRecord::Level { level: *level })
            .await
    }

    async fn push(&self, level: u8) {
        self.sink
            .emit(DeviceEvent::status(self.id, StatusUpdate::Level(level)))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_bus::StatusBus;
    use crate::test_support::{MemoryStore, drain};

    fn id() -> DeviceId {
        DeviceId::new(11)
    }

    #[tokio::test]
    async fn should_set_full_level_and_report_don_on_on() {
        let bus = StatusBus::new(16);
        let engine = LevelEngine::start(id(), "lamp", MemoryStore::default(), bus.clone())
            .await
            .unwrap();
        let mut rx = bus.subscribe();

        engine.command(LevelCommand::On).await.unwrap();
        let events = drain(&mut rx);
        assert!(events.contains(&DeviceEvent::report(id(), OutboundCommand::Don)));
        assert!(events.contains(&DeviceEvent::status(id(), StatusUpdate::Level(100))));
    }

    #[tokio::test]
    async fn should_step_and_clamp_at_full_brightness() {
        let bus = StatusBus::new(16);
        let engine = LevelEngine::start(id(), "lamp", MemoryStore::default(), bus.clone())
            .await
            .unwrap();

        engine.command(LevelCommand::SetLevel(98)).await.unwrap();
        let mut rx = bus.subscribe();
        engine.command(LevelCommand::Brighten).await.unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![DeviceEvent::status(id(), StatusUpdate::Level(100))]
        );
    }

    #[tokio::test]
    async fn should_not_dim_below_zero() {
        let bus = StatusBus::new(16);
        let engine = LevelEngine::start(id(), "lamp", MemoryStore::default(), bus.clone())
            .await
            .unwrap();

        engine.command(LevelCommand::SetLevel(2)).await.unwrap();
        let mut rx = bus.subscribe();
        engine.command(LevelCommand::Dim).await.unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![DeviceEvent::status(id(), StatusUpdate::Level(0))]
        );
    }

    #[tokio::test]
    async fn should_clamp_out_of_range_level_to_full() {
        let bus = StatusBus::new(16);
        let engine = LevelEngine::start(id(), "lamp", MemoryStore::default(), bus.clone())
            .await
            .unwrap();

        let mut rx = bus.subscribe();
        engine.command(LevelCommand::SetLevel(150)).await.unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![DeviceEvent::status(id(), StatusUpdate::Level(100))]
        );
    }

    #[tokio::test]
    async fn should_resume_persisted_level() {
        let store = MemoryStore::with_record(id(), DeviceRecord::Level { level: 40 });
        let bus = StatusBus::new(16);
        let mut rx = bus.subscribe();
        let _engine = LevelEngine::start(id(), "lamp", store, bus.clone())
            .await
            .unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![DeviceEvent::status(id(), StatusUpdate::Level(40))]
        );
    }
}
