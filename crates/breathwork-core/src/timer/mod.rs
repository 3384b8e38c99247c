mod phase_clock;
mod preset_director;
mod scheduler;
mod sequencer;
mod session_timer;

pub use phase_clock::{FrameOutcome, PhaseClock};
pub use preset_director::{PresetDirector, PresetProgress, SegmentDecision};
pub use scheduler::{
    DueWakes, FrameHandle, ManualScheduler, Scheduler, TickerHandle, TICK_INTERVAL_MS,
};
pub use sequencer::{Advance, CycleSequencer};
pub use session_timer::{SessionTimer, TickReport, SLEEP_THRESHOLD_SECS};
