//! Phase clock: animates one phase step from 0 to 100 percent.
//!
//! Progress is recomputed every frame from a fixed start timestamp, never by
//! summing frame deltas, so irregular frame cadence cannot accumulate drift.
//! The start timestamp is captured by the first frame after `start`, not at
//! call time. A chained step is anchored on the exact boundary of the step
//! before it instead, which keeps step boundaries on the technique's grid
//! across transitions.

use serde::{Deserialize, Serialize};

use super::scheduler::{FrameHandle, Scheduler};
use crate::error::ConfigError;

/// Result of delivering a frame to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FrameOutcome {
    /// The frame was cancelled or superseded; nothing changed.
    Stale,
    /// Step still running at this percentage.
    Progress(f64),
    /// Step finished. Progress is exactly 100 and no frame is pending.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    Unset,
    /// Capture on the next frame, crediting `carried_ms` already elapsed.
    OnFirstFrame { carried_ms: u64 },
    At(u64),
}

#[derive(Debug, Clone)]
pub struct PhaseClock {
    duration_ms: u64,
    anchor: Anchor,
    pending: Option<FrameHandle>,
    elapsed_ms: u64,
    progress_pct: f64,
    completed: bool,
}

impl PhaseClock {
    pub fn new() -> Self {
        Self {
            duration_ms: 0,
            anchor: Anchor::Unset,
            pending: None,
            elapsed_ms: 0,
            progress_pct: 0.0,
            completed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn progress_pct(&self) -> f64 {
        self.progress_pct
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Timestamp at which the current step ends, once the start is known.
    pub fn boundary_ms(&self) -> Option<u64> {
        match self.anchor {
            Anchor::At(start) => Some(start.saturating_add(self.duration_ms)),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Time a step of `duration_ms`, starting at the first delivered frame.
    ///
    /// Any in-flight frame is cancelled first.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPhaseDuration`] without touching the clock
    /// if `duration_ms` is zero.
    pub fn start<S: Scheduler + ?Sized>(
        &mut self,
        duration_ms: u64,
        scheduler: &mut S,
    ) -> Result<(), ConfigError> {
        self.arm(duration_ms, Anchor::OnFirstFrame { carried_ms: 0 }, scheduler)
    }

    /// Time a step that begins at `anchor_ms`, the previous step's boundary.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPhaseDuration`] if `duration_ms` is zero.
    pub fn chain<S: Scheduler + ?Sized>(
        &mut self,
        duration_ms: u64,
        anchor_ms: u64,
        scheduler: &mut S,
    ) -> Result<(), ConfigError> {
        self.arm(duration_ms, Anchor::At(anchor_ms), scheduler)
    }

    /// Deliver a frame. Only the currently pending handle is honoured.
    pub fn on_frame<S: Scheduler + ?Sized>(
        &mut self,
        handle: FrameHandle,
        now_ms: u64,
        scheduler: &mut S,
    ) -> FrameOutcome {
        if self.pending != Some(handle) {
            return FrameOutcome::Stale;
        }
        self.pending = None;

        let start = match self.anchor {
            Anchor::OnFirstFrame { carried_ms } => {
                let start = now_ms.saturating_sub(carried_ms);
                self.anchor = Anchor::At(start);
                start
            }
            Anchor::At(start) => start,
            Anchor::Unset => return FrameOutcome::Stale,
        };

        self.elapsed_ms = now_ms.saturating_sub(start);
        if self.elapsed_ms >= self.duration_ms {
            self.elapsed_ms = self.duration_ms;
            self.progress_pct = 100.0;
            self.completed = true;
            return FrameOutcome::Completed;
        }

        let pct = (self.elapsed_ms as f64 * 100.0 / self.duration_ms as f64).min(100.0);
        // Clock skew between hosts must not move the ring backwards.
        self.progress_pct = pct.max(self.progress_pct);
        self.pending = Some(scheduler.request_frame());
        FrameOutcome::Progress(self.progress_pct)
    }

    /// Stop animating and freeze progress. The next [`resume`](Self::resume)
    /// continues from the elapsed time observed by the last frame.
    pub fn pause<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.cancel(scheduler);
        if let Anchor::At(_) = self.anchor {
            self.anchor = Anchor::OnFirstFrame {
                carried_ms: self.elapsed_ms,
            };
        }
    }

    /// Request frames again after a pause. No-op when already scheduled,
    /// completed, or never started.
    pub fn resume<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.pending.is_some() || self.completed || self.anchor == Anchor::Unset {
            return;
        }
        self.pending = Some(scheduler.request_frame());
    }

    /// Drop the pending frame, if any. Idempotent.
    pub fn cancel<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// Cancel and return to the unstarted state with progress 0.
    pub fn reset<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.cancel(scheduler);
        *self = Self::new();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm<S: Scheduler + ?Sized>(
        &mut self,
        duration_ms: u64,
        anchor: Anchor,
        scheduler: &mut S,
    ) -> Result<(), ConfigError> {
        if duration_ms == 0 {
            return Err(ConfigError::ZeroPhaseDuration);
        }
        self.cancel(scheduler);
        self.duration_ms = duration_ms;
        self.anchor = anchor;
        self.elapsed_ms = 0;
        self.progress_pct = 0.0;
        self.completed = false;
        self.pending = Some(scheduler.request_frame());
        Ok(())
    }
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::scheduler::ManualScheduler;

    /// Pump the clock through one refresh of `dt` ms.
    fn refresh(clock: &mut PhaseClock, sched: &mut ManualScheduler, dt: u64) -> FrameOutcome {
        let wakes = sched.advance(dt);
        match wakes.frame {
            Some(h) => clock.on_frame(h, wakes.now_ms, sched),
            None => FrameOutcome::Stale,
        }
    }

    #[test]
    fn start_captures_timestamp_on_first_frame() {
        let mut sched = ManualScheduler::new();
        let mut clock = PhaseClock::new();
        clock.start(1000, &mut sched).unwrap();

        // Scheduler queuing latency before the first frame is not counted.
        assert_eq!(refresh(&mut clock, &mut sched, 500), FrameOutcome::Progress(0.0));
        assert_eq!(refresh(&mut clock, &mut sched, 250), FrameOutcome::Progress(25.0));
        assert_eq!(clock.elapsed_ms(), 250);
        assert_eq!(clock.boundary_ms(), Some(1500));
    }

    #[test]
    fn completes_exactly_once_at_100() {
        let mut sched = ManualScheduler::new();
        let mut clock = PhaseClock::new();
        clock.start(100, &mut sched).unwrap();
        refresh(&mut clock, &mut sched, 16);

        let mut completions = 0;
        for _ in 0..20 {
            if refresh(&mut clock, &mut sched, 16) == FrameOutcome::Completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(clock.is_completed());
        assert_eq!(clock.elapsed_ms(), 100);
        assert_eq!(clock.progress_pct(), 100.0);
        assert!(!clock.is_scheduled());
    }

    #[test]
    fn stale_handle_is_ignored() {
        let mut sched = ManualScheduler::new();
        let mut clock = PhaseClock::new();
        clock.start(1000, &mut sched).unwrap();
        let wakes = sched.advance(16);
        let old = wakes.frame.unwrap();

        // Restart before the old frame is delivered.
        clock.start(2000, &mut sched).unwrap();
        assert_eq!(clock.on_frame(old, wakes.now_ms, &mut sched), FrameOutcome::Stale);
        assert!(clock.is_scheduled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut sched = ManualScheduler::new();
        let mut clock = PhaseClock::new();
        clock.start(1000, &mut sched).unwrap();
        clock.cancel(&mut sched);
        clock.cancel(&mut sched);
        assert_eq!(sched.pending_frames(), 0);
        assert_eq!(refresh(&mut clock, &mut sched, 16), FrameOutcome::Stale);
    }

    #[test]
    fn zero_duration_is_rejected_without_scheduling() {
        let mut sched = ManualScheduler::new();
        let mut clock = PhaseClock::new();
        assert_eq!(clock.start(0, &mut sched), Err(ConfigError::ZeroPhaseDuration));
        assert_eq!(sched.pending_frames(), 0);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut sched = ManualScheduler::new();
        let mut clock = PhaseClock::new();
        clock.start(1000, &mut sched).unwrap();
        refresh(&mut clock, &mut sched, 16);
        refresh(&mut clock, &mut sched, 400);
        assert_eq!(clock.progress_pct(), 40.0);

        clock.pause(&mut sched);
        assert!(!clock.is_scheduled());
        // A long background gap while paused is not counted.
        sched.advance(60_000);
        assert_eq!(clock.progress_pct(), 40.0);

        clock.resume(&mut sched);
        assert_eq!(refresh(&mut clock, &mut sched, 16), FrameOutcome::Progress(40.0));
        assert_eq!(refresh(&mut clock, &mut sched, 300), FrameOutcome::Progress(70.0));
        assert_eq!(refresh(&mut clock, &mut sched, 300), FrameOutcome::Completed);
    }

    #[test]
    fn chained_step_is_anchored_on_boundary() {
        let mut sched = ManualScheduler::new();
        let mut clock = PhaseClock::new();
        clock.start(1000, &mut sched).unwrap();
        refresh(&mut clock, &mut sched, 0);
        // Frame lands 30ms after the boundary.
        assert_eq!(refresh(&mut clock, &mut sched, 1030), FrameOutcome::Completed);
        let boundary = clock.boundary_ms().unwrap();
        assert_eq!(boundary, 1000);

        clock.chain(1000, boundary, &mut sched).unwrap();
        // The 30ms overshoot already counts toward the next step.
        assert_eq!(refresh(&mut clock, &mut sched, 20), FrameOutcome::Progress(5.0));
        assert_eq!(clock.boundary_ms(), Some(2000));
    }
}
