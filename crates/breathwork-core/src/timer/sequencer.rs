use std::sync::Arc;

use crate::catalog::{PhaseStep, Technique};

/// Position reached by [`CycleSequencer::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub step_index: usize,
    /// The last step finished and the sequence restarted at 0.
    pub wrapped: bool,
}

/// Walks a technique's steps cyclically and counts completed cycles.
///
/// `advance` is the only place the cycle count grows.
#[derive(Debug, Clone)]
pub struct CycleSequencer {
    technique: Arc<Technique>,
    step_index: usize,
    cycle_count: u64,
}

impl CycleSequencer {
    pub fn new(technique: Arc<Technique>) -> Self {
        Self {
            technique,
            step_index: 0,
            cycle_count: 0,
        }
    }

    pub fn technique(&self) -> &Arc<Technique> {
        &self.technique
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// The step at the current index. `None` only for a technique that
    /// bypassed catalog validation.
    pub fn current_step(&self) -> Option<&PhaseStep> {
        debug_assert!(
            self.technique.steps.is_empty() || self.step_index < self.technique.steps.len(),
            "step index {} out of range for '{}'",
            self.step_index,
            self.technique.id
        );
        self.technique.steps.get(self.step_index)
    }

    /// Move to the next step, wrapping to 0 and counting a cycle after the last.
    pub fn advance(&mut self) -> Advance {
        let len = self.technique.steps.len();
        if self.step_index + 1 < len {
            self.step_index += 1;
            Advance {
                step_index: self.step_index,
                wrapped: false,
            }
        } else {
            self.step_index = 0;
            self.cycle_count += 1;
            Advance {
                step_index: 0,
                wrapped: true,
            }
        }
    }

    /// Point at a different technique from step 0. The cycle count is kept.
    pub fn load(&mut self, technique: Arc<Technique>) {
        self.technique = technique;
        self.step_index = 0;
    }

    /// Back to step 0 without touching the cycle count.
    pub fn rewind(&mut self) {
        self.step_index = 0;
    }

    pub fn reset_cycles(&mut self) {
        self.cycle_count = 0;
    }
}
