//! Deterministic host over a [`ManualScheduler`].
//!
//! Each [`refresh`](SimulatedHost::refresh) is one display refresh: ticks that
//! fell due are delivered first in deadline order, then the pending frame.

use crate::timer::{ManualScheduler, Scheduler};

use super::controller::{SessionController, SessionSnapshot};

#[derive(Debug)]
pub struct SimulatedHost {
    controller: SessionController<ManualScheduler>,
}

impl SimulatedHost {
    pub fn new(controller: SessionController<ManualScheduler>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &SessionController<ManualScheduler> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SessionController<ManualScheduler> {
        &mut self.controller
    }

    pub fn now_ms(&self) -> u64 {
        self.controller.scheduler().now_ms()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    /// Advance virtual time by `dt_ms` and deliver what fell due.
    pub fn refresh(&mut self, dt_ms: u64) {
        let wakes = self.controller.scheduler_mut().advance(dt_ms);
        for tick in wakes.ticks {
            self.controller.on_tick(tick);
        }
        if let Some(frame) = wakes.frame {
            self.controller.on_frame(frame, wakes.now_ms);
        }
    }

    /// Run `total_ms` of virtual time at a fixed frame interval. A final
    /// shorter refresh covers any remainder.
    pub fn run_for(&mut self, total_ms: u64, frame_ms: u64) {
        let frame_ms = frame_ms.max(1);
        let mut remaining = total_ms;
        while remaining > 0 {
            let dt = remaining.min(frame_ms);
            self.refresh(dt);
            remaining -= dt;
        }
    }

    /// Run one refresh per interval, for jittery frame cadences.
    pub fn run_intervals(&mut self, intervals: impl IntoIterator<Item = u64>) {
        for dt in intervals {
            self.refresh(dt);
        }
    }
}
