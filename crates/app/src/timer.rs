//! Per-device countdown bookkeeping.
//!
//! A [`TimerSlot`] lives inside each engine's state mutex, so arming,
//! cancelling and the expiry check all happen under the same lock. The
//! generation counter is the tie-breaker for the race between a command
//! cancelling a countdown and the countdown task firing at the same instant:
//! whichever side takes the lock first wins, the other observes a stale
//! generation and becomes a no-op. A countdown can never fire twice and a
//! cancelled countdown can never fire late.

use tokio::task::AbortHandle;

/// Bookkeeping for one device's single outstanding countdown.
#[derive(Debug, Default)]
pub struct TimerSlot {
    generation: u64,
    abort: Option<AbortHandle>,
}

impl TimerSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any outstanding countdown and reserve a new generation for the
    /// next one. The caller spawns the countdown task with the returned
    /// generation and registers its handle via [`track`](Self::track).
    pub fn arm(&mut self) -> u64 {
        self.cancel();
        self.generation
    }

    /// Cancel the outstanding countdown, if any. The abort is advisory; the
    /// generation bump is what actually invalidates a task that already woke.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }

    /// Register the spawned countdown task for the current generation.
    pub fn track(&mut self, abort: AbortHandle) {
        self.abort = Some(abort);
    }

    /// Called by the countdown task once it holds the device lock. Returns
    /// `true` when the task's generation is still current, claiming the
    /// expiry; a stale generation returns `false` and the task must do
    /// nothing.
    pub fn expire(&mut self, generation: u64) -> bool {
        if self.generation == generation {
            self.abort = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_accept_expiry_for_current_generation() {
        let mut slot = TimerSlot::new();
        let generation = slot.arm();
        assert!(slot.expire(generation));
    }

    #[tokio::test]
    async fn should_reject_expiry_after_cancel() {
        let mut slot = TimerSlot::new();
        let generation = slot.arm();
        slot.cancel();
        assert!(!slot.expire(generation));
    }

    #[tokio::test]
    async fn should_reject_expiry_after_rearm() {
        let mut slot = TimerSlot::new();
        let stale = slot.arm();
        let fresh = slot.arm();
        assert!(!slot.expire(stale));
        assert!(slot.expire(fresh));
    }

    #[tokio::test]
    async fn should_claim_expiry_exactly_once() {
        let mut slot = TimerSlot::new();
        let generation = slot.arm();
        assert!(slot.expire(generation));
        assert!(!slot.expire(generation));
    }

    #[tokio::test]
    async fn should_abort_tracked_task_on_cancel() {
        let mut slot = TimerSlot::new();
        let _generation = slot.arm();
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        slot.track(handle.abort_handle());
        slot.cancel();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
