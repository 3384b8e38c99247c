//! Scheduler abstraction for the two session cadences.
//!
//! The phase clock runs on one-shot "next display refresh" frames; the session
//! timer runs on a repeating one-second ticker. A request hands back a handle.
//! The host later delivers the wake-up with that handle, and the owner ignores
//! handles it no longer holds, so a cancelled or superseded request can never
//! re-enter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Interval between session timer ticks.
pub const TICK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TickerHandle(pub u64);

pub trait Scheduler {
    /// Request one callback on the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Drop a pending frame. Unknown or already-fired handles are a no-op.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Start a ticker that first fires after `first_due_ms`, then every
    /// [`TICK_INTERVAL_MS`].
    fn start_ticker(&mut self, first_due_ms: u64) -> TickerHandle;

    /// Stop a ticker. Unknown or already-stopped handles are a no-op.
    fn cancel_ticker(&mut self, handle: TickerHandle);

    /// Host clock in milliseconds, on the same timeline as frame timestamps.
    fn now_ms(&self) -> u64;
}

/// Wake-ups a [`ManualScheduler`] produced for one simulated refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueWakes {
    /// Ticker firings in deadline order.
    pub ticks: Vec<TickerHandle>,
    /// The pending frame, if one was requested.
    pub frame: Option<FrameHandle>,
    /// Virtual time of the refresh.
    pub now_ms: u64,
}

#[derive(Debug, Clone)]
struct ManualTicker {
    handle: TickerHandle,
    next_due_ms: u64,
}

/// Deterministic scheduler over a virtual millisecond clock.
///
/// Nothing fires on its own: [`advance`](Self::advance) moves the clock and
/// reports what became due.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: u64,
    frames: BTreeSet<FrameHandle>,
    tickers: Vec<ManualTicker>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the virtual clock somewhere other than zero.
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms,
            ..Self::default()
        }
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn active_tickers(&self) -> usize {
        self.tickers.len()
    }

    /// Move the clock forward by `dt_ms` as one display refresh.
    ///
    /// Every ticker deadline that fell inside the interval is reported (a long
    /// gap yields several ticks), followed by the single pending frame stamped
    /// with the new time. Reported frames are consumed; the owner must request
    /// another one to keep animating.
    pub fn advance(&mut self, dt_ms: u64) -> DueWakes {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        let now = self.now_ms;

        let mut due: Vec<(u64, TickerHandle)> = Vec::new();
        for ticker in &mut self.tickers {
            while ticker.next_due_ms <= now {
                due.push((ticker.next_due_ms, ticker.handle));
                ticker.next_due_ms += TICK_INTERVAL_MS;
            }
        }
        due.sort();

        // One refresh services one frame request.
        let frame = self.frames.iter().next_back().copied();
        self.frames.clear();

        DueWakes {
            ticks: due.into_iter().map(|(_, h)| h).collect(),
            frame,
            now_ms: now,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.frames.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.remove(&handle);
    }

    fn start_ticker(&mut self, first_due_ms: u64) -> TickerHandle {
        let handle = TickerHandle(self.next_id());
        self.tickers.push(ManualTicker {
            handle,
            next_due_ms: self.now_ms + first_due_ms,
        });
        handle
    }

    fn cancel_ticker(&mut self, handle: TickerHandle) {
        self.tickers.retain(|t| t.handle != handle);
    }

    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_reported_once() {
        let mut s = ManualScheduler::new();
        let h = s.request_frame();
        let wakes = s.advance(16);
        assert_eq!(wakes.frame, Some(h));
        assert_eq!(wakes.now_ms, 16);
        assert_eq!(s.advance(16).frame, None);
    }

    #[test]
    fn cancelled_frame_never_fires() {
        let mut s = ManualScheduler::new();
        let h = s.request_frame();
        s.cancel_frame(h);
        s.cancel_frame(h);
        assert_eq!(s.advance(16).frame, None);
    }

    #[test]
    fn ticker_fires_every_second_including_long_gaps() {
        let mut s = ManualScheduler::new();
        let t = s.start_ticker(TICK_INTERVAL_MS);
        assert!(s.advance(999).ticks.is_empty());
        assert_eq!(s.advance(1).ticks, vec![t]);
        assert_eq!(s.advance(3000).ticks, vec![t, t, t]);
    }

    #[test]
    fn ticker_phase_follows_start_time() {
        let mut s = ManualScheduler::starting_at(250);
        let t = s.start_ticker(TICK_INTERVAL_MS);
        assert!(s.advance(999).ticks.is_empty());
        assert_eq!(s.advance(1).ticks, vec![t]);
    }

    #[test]
    fn shortened_first_deadline_then_full_period() {
        let mut s = ManualScheduler::new();
        let t = s.start_ticker(300);
        assert!(s.advance(299).ticks.is_empty());
        assert_eq!(s.advance(1).ticks, vec![t]);
        assert!(s.advance(999).ticks.is_empty());
        assert_eq!(s.advance(1).ticks, vec![t]);
        assert_eq!(s.now_ms(), 1300);
    }

    #[test]
    fn cancelled_ticker_stops() {
        let mut s = ManualScheduler::new();
        let t = s.start_ticker(TICK_INTERVAL_MS);
        s.cancel_ticker(t);
        s.cancel_ticker(t);
        assert!(s.advance(5000).ticks.is_empty());
        assert_eq!(s.active_tickers(), 0);
    }
}
