//! Preset playback measured in session-timer seconds.
//!
//! Segment lengths are whole seconds while phase lengths are arbitrary
//! milliseconds, so boundaries are decided on ticks, never on step completion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Preset, Segment};

/// What the director wants done after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentDecision {
    Continue,
    /// Switch to `technique_id`; the director has already moved to `segment_index`.
    Advance {
        technique_id: String,
        segment_index: usize,
    },
    /// The last segment ran out. The director has cleared itself.
    Finished { preset: Arc<Preset> },
}

/// Position inside a running preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetProgress {
    pub preset_id: String,
    pub segment_index: usize,
    pub segment_start_second: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PresetDirector {
    active: Option<Active>,
}

#[derive(Debug, Clone)]
struct Active {
    preset: Arc<Preset>,
    segment_index: usize,
    segment_start_second: u64,
}

impl PresetDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_preset_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.preset.id.as_str())
    }

    pub fn segment_index(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.segment_index)
    }

    pub fn segment_start_second(&self) -> u64 {
        self.active.as_ref().map_or(0, |a| a.segment_start_second)
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        let active = self.active.as_ref()?;
        active.preset.segments.get(active.segment_index)
    }

    pub fn progress(&self) -> Option<PresetProgress> {
        self.active.as_ref().map(|a| PresetProgress {
            preset_id: a.preset.id.clone(),
            segment_index: a.segment_index,
            segment_start_second: a.segment_start_second,
        })
    }

    /// Seconds spent in the current segment at `total_elapsed_seconds`.
    pub fn elapsed_in_segment(&self, total_elapsed_seconds: u64) -> u64 {
        let start = self.segment_start_second();
        debug_assert!(
            total_elapsed_seconds >= start,
            "segment start {start} is ahead of elapsed {total_elapsed_seconds}"
        );
        total_elapsed_seconds.saturating_sub(start)
    }

    /// Begin at segment 0, second 0. Returns the first technique id, or
    /// `None` for a preset without segments.
    pub fn begin(&mut self, preset: Arc<Preset>) -> Option<String> {
        let first = preset.segments.first()?.technique_id.clone();
        self.active = Some(Active {
            preset,
            segment_index: 0,
            segment_start_second: 0,
        });
        Some(first)
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Decide, after a tick has been logged, whether the segment is over.
    pub fn on_second(&mut self, total_elapsed_seconds: u64) -> SegmentDecision {
        let elapsed = self.elapsed_in_segment(total_elapsed_seconds);
        let Some(active) = self.active.as_mut() else {
            return SegmentDecision::Continue;
        };
        let Some(segment) = active.preset.segments.get(active.segment_index) else {
            return SegmentDecision::Continue;
        };
        if elapsed < segment.duration_secs {
            return SegmentDecision::Continue;
        }

        let next_index = active.segment_index + 1;
        let next = active
            .preset
            .segments
            .get(next_index)
            .map(|s| s.technique_id.clone());
        match next {
            Some(technique_id) => {
                active.segment_index = next_index;
                active.segment_start_second = total_elapsed_seconds;
                SegmentDecision::Advance {
                    technique_id,
                    segment_index: next_index,
                }
            }
            None => {
                let preset = Arc::clone(&active.preset);
                self.active = None;
                SegmentDecision::Finished { preset }
            }
        }
    }
}
