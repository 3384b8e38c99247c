//! One-second accumulator for total session time.
//!
//! Runs on its own ticker, independent of the frame-rate phase clock. Paused
//! time is not counted and there is no gap compensation on resume. The part
//! of a second already run when pausing is carried, so the first tick after
//! a resume comes early by that much.

use super::scheduler::{Scheduler, TickerHandle, TICK_INTERVAL_MS};

/// Seconds of active time after which the sleep threshold fires.
pub const SLEEP_THRESHOLD_SECS: u64 = 420;

/// What a delivered tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// `total_elapsed_seconds` after this tick.
    pub second: u64,
    /// This tick is the one that first reached [`SLEEP_THRESHOLD_SECS`].
    pub sleep_threshold_reached: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SessionTimer {
    total_elapsed_seconds: u64,
    ticker: Option<TickerHandle>,
    sleep_fired: bool,
    /// Active milliseconds toward the next second, as of `started_ms`.
    carried_ms: u64,
    started_ms: u64,
    ticks_since_start: u64,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_elapsed_seconds(&self) -> u64 {
        self.total_elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn sleep_fired(&self) -> bool {
        self.sleep_fired
    }

    /// Milliseconds of the current second already counted while paused.
    pub fn carried_ms(&self) -> u64 {
        self.carried_ms
    }

    /// Start ticking. No-op when already running.
    pub fn start<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.ticker.is_none() {
            self.started_ms = scheduler.now_ms();
            self.ticks_since_start = 0;
            self.ticker = Some(scheduler.start_ticker(TICK_INTERVAL_MS - self.carried_ms));
        }
    }

    /// Stop ticking, keep the accumulated seconds and carry the partial one.
    /// Idempotent.
    pub fn pause<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.ticker.take() {
            scheduler.cancel_ticker(handle);
            let run_ms = self.carried_ms + scheduler.now_ms().saturating_sub(self.started_ms);
            // A tick that fell due but was never delivered is not carried.
            self.carried_ms = run_ms
                .saturating_sub(self.ticks_since_start * TICK_INTERVAL_MS)
                .min(TICK_INTERVAL_MS - 1);
        }
    }

    /// Stop ticking and clear the accumulator and the sleep latch.
    pub fn reset<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.pause(scheduler);
        self.total_elapsed_seconds = 0;
        self.sleep_fired = false;
        self.carried_ms = 0;
    }

    /// Deliver a tick. Returns `None` for a handle this timer no longer owns.
    pub fn on_tick(&mut self, handle: TickerHandle) -> Option<TickReport> {
        if self.ticker != Some(handle) {
            return None;
        }
        self.ticks_since_start += 1;
        self.total_elapsed_seconds += 1;

        let sleep_threshold_reached =
            !self.sleep_fired && self.total_elapsed_seconds >= SLEEP_THRESHOLD_SECS;
        if sleep_threshold_reached {
            self.sleep_fired = true;
        }

        Some(TickReport {
            second: self.total_elapsed_seconds,
            sleep_threshold_reached,
        })
    }
}
