//! The switch family: plain, on-only, delayed-on, delayed-off and the
//! oscillating toggle.
//!
//! All five share one engine. The variant decides which commands are legal
//! and what a countdown expiry means; the state machine itself is a single
//! [`ToggleStatus`] phase plus one [`TimerSlot`]. Every transition runs under
//! the device mutex, so a command racing a countdown expiry resolves to
//! whichever side locked first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use vdev_domain::command::{Command, SwitchCommand};
use vdev_domain::error::{InvalidCommand, VdevError};
use vdev_domain::event::{DeviceEvent, DurationDriver, OutboundCommand, StatusUpdate};
use vdev_domain::id::DeviceId;
use vdev_domain::record::DeviceRecord;
use vdev_domain::status::{SwitchStatus, ToggleStatus};

use crate::ports::{RecordStore, StatusSink};
use crate::timer::TimerSlot;

/// Which member of the switch family an engine instance runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchVariant {
    Plain,
    /// Momentary: reports `DON`/`DFON` outward, never an off.
    OnOnly,
    OnDelay {
        delay: u32,
        dfon_acts_as_don: bool,
    },
    OffDelay {
        delay: u32,
        dfon_acts_as_don: bool,
    },
    Toggle {
        on_duration: u32,
        off_duration: u32,
    },
}

impl SwitchVariant {
    fn is_toggle(self) -> bool {
        matches!(self, Self::Toggle { .. })
    }
}

#[derive(Debug)]
struct SwitchState {
    /// Unified phase; delay variants only ever use `Off`/`On`/`OnTimer`.
    status: ToggleStatus,
    delay: u32,
    on_duration: u32,
    off_duration: u32,
    timer: TimerSlot,
}

/// Engine for one switch-family device.
pub struct TimedSwitch<S, K> {
    id: DeviceId,
    name: String,
    variant: SwitchVariant,
    store: S,
    sink: K,
    state: Mutex<SwitchState>,
}

fn switch_status(status: ToggleStatus) -> SwitchStatus {
    match status {
        ToggleStatus::Off => SwitchStatus::Off,
        ToggleStatus::On => SwitchStatus::On,
        ToggleStatus::OnTimer | ToggleStatus::OffTimer => SwitchStatus::Timer,
    }
}

impl<S, K> TimedSwitch<S, K>
where
    S: RecordStore + 'static,
    K: StatusSink + 'static,
{
    /// Build the engine, resume the persisted stable status and re-assert
    /// the drivers.
    pub async fn start(
        id: DeviceId,
        name: impl Into<String>,
        variant: SwitchVariant,
        store: S,
        sink: K,
    ) -> Result<Arc<Self>, VdevError> {
        let (delay, on_duration, off_duration) = match variant {
            SwitchVariant::OnDelay { delay, .. } | SwitchVariant::OffDelay { delay, .. } => {
                (delay, 0, 0)
            }
            SwitchVariant::Toggle {
                on_duration,
                off_duration,
            } => (0, on_duration, off_duration),
            SwitchVariant::Plain | SwitchVariant::OnOnly => (0, 0, 0),
        };
        let mut state = SwitchState {
            status: ToggleStatus::Off,
            delay,
            on_duration,
            off_duration,
            timer: TimerSlot::new(),
        };
        // Durations always come from the configuration; only the observed
        // status survives a restart.
        match (variant.is_toggle(), store.load(id).await?) {
            (false, Some(DeviceRecord::Switch { status, .. })) => {
                state.status = match status.stable() {
                    SwitchStatus::On => ToggleStatus::On,
                    _ => ToggleStatus::Off,
                };
            }
            (true, Some(DeviceRecord::Toggle { status, .. })) => {
                state.status = status.stable();
            }
            // No record, or the device type changed under this id.
            _ => {}
        }

        let engine = Arc::new(Self {
            id,
            name: name.into(),
            variant,
            store,
            sink,
            state: Mutex::new(state),
        });
        let state = engine.state.lock().await;
        engine.persist(&state).await?;
        engine.push_status(&state).await;
        engine.push_durations(&state).await;
        drop(state);
        Ok(engine)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle one inbound command. Commands outside the variant's vocabulary
    /// fail with [`InvalidCommand`]; nothing else about the device changes.
    pub async fn command(self: &Arc<Self>, command: SwitchCommand) -> Result<(), VdevError> {
        tracing::debug!(device = %self.id, name = %self.name, command = ?command, "switch command");
        let mut state = self.state.lock().await;
        match self.variant {
            SwitchVariant::Plain => self.plain(&mut state, command).await,
            SwitchVariant::OnOnly => self.on_only(&mut state, command).await,
            SwitchVariant::OnDelay {
                dfon_acts_as_don, ..
            } => self.on_delay(&mut state, command, dfon_acts_as_don).await,
            SwitchVariant::OffDelay {
                dfon_acts_as_don, ..
            } => self.off_delay(&mut state, command, dfon_acts_as_don).await,
            SwitchVariant::Toggle { .. } => self.toggle(&mut state, command).await,
        }
    }

    /// Re-assert every driver without changing state.
    pub async fn query(&self) {
        let state = self.state.lock().await;
        self.push_status(&state).await;
        self.push_durations(&state).await;
    }

    /// Cancel any countdown and persist the stable collapse of the current
    /// status. Called on shutdown and before removal.
    pub async fn stop(&self) -> Result<(), VdevError> {
        let mut state = self.state.lock().await;
        state.timer.cancel();
        state.status = state.status.stable();
        self.persist(&state).await
    }

    async fn plain(&self, state: &mut SwitchState, command: SwitchCommand) -> Result<(), VdevError> {
        let (status, report) = match command {
            SwitchCommand::On => (ToggleStatus::On, OutboundCommand::Don),
            SwitchCommand::FastOn => (ToggleStatus::On, OutboundCommand::Dfon),
            SwitchCommand::Off => (ToggleStatus::Off, OutboundCommand::Dof),
            SwitchCommand::FastOff => (ToggleStatus::Off, OutboundCommand::Dfof),
            SwitchCommand::Toggle => {
                if state.status == ToggleStatus::On {
                    (ToggleStatus::Off, OutboundCommand::Dof)
                } else {
                    (ToggleStatus::On, OutboundCommand::Don)
                }
            }
            other => return Err(self.invalid(other)),
        };
        state.status = status;
        self.report(report).await;
        self.persist(state).await?;
        self.push_status(state).await;
        Ok(())
    }

    /// Momentary switch: only the on side is reported outward. An off is
    /// reflected in the status drivers without an outbound DOF.
    async fn on_only(
        &self,
        state: &mut SwitchState,
        command: SwitchCommand,
    ) -> Result<(), VdevError> {
        let (status, report) = match command {
            SwitchCommand::On => (ToggleStatus::On, Some(OutboundCommand::Don)),
            SwitchCommand::FastOn => (ToggleStatus::On, Some(OutboundCommand::Dfon)),
            SwitchCommand::Off | SwitchCommand::FastOff => (ToggleStatus::Off, None),
            other => return Err(self.invalid(other)),
        };
        state.status = status;
        if let Some(report) = report {
            self.report(report).await;
        }
        self.persist(state).await?;
        self.push_status(state).await;
        Ok(())
    }

    async fn on_delay(
        self: &Arc<Self>,
        state: &mut SwitchState,
        command: SwitchCommand,
        dfon_acts_as_don: bool,
    ) -> Result<(), VdevError> {
        match command {
            SwitchCommand::On => {
                if state.delay == 0 {
                    state.timer.cancel();
                    state.status = ToggleStatus::On;
                    self.report(OutboundCommand::Don).await;
                } else {
                    state.status = ToggleStatus::OnTimer;
                    let seconds = state.delay;
                    self.arm(state, seconds);
                }
            }
            // An off during the countdown is ignored; the on still lands.
            SwitchCommand::Off => match state.status {
                ToggleStatus::On => {
                    state.status = ToggleStatus::Off;
                    self.report(OutboundCommand::Dof).await;
                }
                _ => return Ok(()),
            },
            SwitchCommand::FastOff => {
                state.timer.cancel();
                state.status = ToggleStatus::Off;
                self.report(OutboundCommand::Dfof).await;
            }
            SwitchCommand::FastOn if dfon_acts_as_don => {
                state.timer.cancel();
                state.status = ToggleStatus::On;
                self.report(OutboundCommand::Dfon).await;
            }
            SwitchCommand::SetDelay(seconds) => {
                state.delay = seconds;
                self.persist(state).await?;
                self.push_durations(state).await;
                return Ok(());
            }
            other => return Err(self.invalid(other)),
        }
        self.persist(state).await?;
        self.push_status(state).await;
        Ok(())
    }

    async fn off_delay(
        self: &Arc<Self>,
        state: &mut SwitchState,
        command: SwitchCommand,
        dfon_acts_as_don: bool,
    ) -> Result<(), VdevError> {
        match command {
            SwitchCommand::On => {
                self.report(OutboundCommand::Don).await;
                if state.delay == 0 {
                    state.timer.cancel();
                    state.status = ToggleStatus::Off;
                    self.report(OutboundCommand::Dof).await;
                } else {
                    state.status = ToggleStatus::OnTimer;
                    let seconds = state.delay;
                    self.arm(state, seconds);
                }
            }
            SwitchCommand::Off => match state.status {
                ToggleStatus::On | ToggleStatus::OnTimer => {
                    state.timer.cancel();
                    state.status = ToggleStatus::Off;
                    self.report(OutboundCommand::Dof).await;
                }
                _ => return Ok(()),
            },
            SwitchCommand::FastOff => {
                state.timer.cancel();
                state.status = ToggleStatus::Off;
                self.report(OutboundCommand::Dfof).await;
            }
            SwitchCommand::FastOn if dfon_acts_as_don => {
                state.timer.cancel();
                state.status = ToggleStatus::On;
                self.report(OutboundCommand::Dfon).await;
            }
            SwitchCommand::SetDelay(seconds) => {
                state.delay = seconds;
                self.persist(state).await?;
                self.push_durations(state).await;
                return Ok(());
            }
            other => return Err(self.invalid(other)),
        }
        self.persist(state).await?;
        self.push_status(state).await;
        Ok(())
    }

    async fn toggle(
        self: &Arc<Self>,
        state: &mut SwitchState,
        command: SwitchCommand,
    ) -> Result<(), VdevError> {
        match command {
            SwitchCommand::On => {
                state.status = ToggleStatus::OnTimer;
                let seconds = state.on_duration.max(1);
                self.arm(state, seconds);
                self.report(OutboundCommand::Don).await;
            }
            // Scene-safe: a fast-on lands a stable On with no oscillation.
            SwitchCommand::FastOn => {
                state.timer.cancel();
                state.status = ToggleStatus::On;
                self.report(OutboundCommand::Dfon).await;
            }
            // A plain off only lands in a stable phase; the oscillation
            // itself is stopped with a fast-off.
            SwitchCommand::Off => match state.status {
                ToggleStatus::On | ToggleStatus::Off => {
                    state.status = ToggleStatus::Off;
                    self.report(OutboundCommand::Dof).await;
                }
                _ => return Ok(()),
            },
            SwitchCommand::FastOff => {
                state.timer.cancel();
                state.status = ToggleStatus::Off;
                self.report(OutboundCommand::Dfof).await;
            }
            SwitchCommand::SetOnDuration(seconds) => {
                state.on_duration = seconds;
                self.persist(state).await?;
                self.push_durations(state).await;
                return Ok(());
            }
            SwitchCommand::SetOffDuration(seconds) => {
                state.off_duration = seconds;
                self.persist(state).await?;
                self.push_durations(state).await;
                return Ok(());
            }
            other => return Err(self.invalid(other)),
        }
        self.persist(state).await?;
        self.push_status(state).await;
        Ok(())
    }

    /// Spawn the countdown for the current transition. The expiry re-takes
    /// the device lock and claims its generation; a stale generation means a
    /// command got there first and the expiry does nothing.
    fn arm(self: &Arc<Self>, state: &mut SwitchState, seconds: u32) {
        let generation = state.timer.arm();
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(seconds))).await;
            engine.expire(generation).await;
        });
        state.timer.track(handle.abort_handle());
    }

    async fn expire(self: Arc<Self>, generation: u64) {
        let mut state = self.state.lock().await;
        if !state.timer.expire(generation) {
            return;
        }
        match self.variant {
            SwitchVariant::OnDelay { .. } => {
                state.status = ToggleStatus::On;
                self.report(OutboundCommand::Don).await;
            }
            SwitchVariant::OffDelay { .. } => {
                state.status = ToggleStatus::Off;
                self.report(OutboundCommand::Dof).await;
            }
            SwitchVariant::Toggle { .. } => {
                // Arm the next phase before persisting, so a slow store
                // write cannot stretch the cadence.
                if state.status == ToggleStatus::OnTimer {
                    state.status = ToggleStatus::OffTimer;
                    let seconds = state.off_duration.max(1);
                    self.arm(&mut state, seconds);
                    self.report(OutboundCommand::Dof).await;
                } else {
                    state.status = ToggleStatus::OnTimer;
                    let seconds = state.on_duration.max(1);
                    self.arm(&mut state, seconds);
                    self.report(OutboundCommand::Don).await;
                }
            }
            SwitchVariant::Plain | SwitchVariant::OnOnly => return,
        }
        if let Err(error) = self.persist(&state).await {
            tracing::warn!(device = %self.id, ?error, "failed to persist timer expiry");
        }
        self.push_status(&state).await;
    }

    fn invalid(&self, command: SwitchCommand) -> VdevError {
        InvalidCommand::new(self.id, Command::Switch(command).name()).into()
    }

    async fn report(&self, command: OutboundCommand) {
        self.sink.emit(DeviceEvent::report(self.id, command)).await;
    }

    async fn push_status(&self, state: &SwitchState) {
        let update = if self.variant.is_toggle() {
            StatusUpdate::Toggle(state.status)
        } else {
            StatusUpdate::Switch(switch_status(state.status))
        };
        self.sink.emit(DeviceEvent::status(self.id, update)).await;
    }

    async fn push_durations(&self, state: &SwitchState) {
        match self.variant {
            SwitchVariant::OnDelay { .. } | SwitchVariant::OffDelay { .. } => {
                self.sink
                    .emit(DeviceEvent::status(
                        self.id,
                        StatusUpdate::Duration {
                            driver: DurationDriver::Delay,
                            seconds: state.delay,
                        },
                    ))
                    .await;
            }
            SwitchVariant::Toggle { .. } => {
                self.sink
                    .emit(DeviceEvent::status(
                        self.id,
                        StatusUpdate::Duration {
                            driver: DurationDriver::OnDuration,
                            seconds: state.on_duration,
                        },
                    ))
                    .await;
                self.sink
                    .emit(DeviceEvent::status(
                        self.id,
                        StatusUpdate::Duration {
                            driver: DurationDriver::OffDuration,
                            seconds: state.off_duration,
                        },
                    ))
                    .await;
            }
            SwitchVariant::Plain | SwitchVariant::OnOnly => {}
        }
    }

    async fn persist(&self, state: &SwitchState) -> Result<(), VdevError> {
        let record = if self.variant.is_toggle() {
            DeviceRecord::Toggle {
                status: state.status.stable(),
                on_duration: state.on_duration,
                off_duration: state.off_duration,
            }
        } else {
            DeviceRecord::Switch {
                status: switch_status(state.status).stable(),
                delay: state.delay,
            }
        };
        self.store.save(self.id, record).await
    }
}
