//! Session orchestration: the controller, its collaborators and two hosts.

mod collaborators;
mod controller;
mod host;
mod recorder;
mod runtime;

pub use collaborators::{
    ActivityLog, AudioCue, Collaborators, Haptics, SessionExport, SessionSummary, Silent,
    SleepHook, StepCue,
};
pub use controller::{SessionController, SessionSnapshot, SessionState};
pub use host::SimulatedHost;
pub use recorder::Recorder;
pub use runtime::{SessionHandle, SessionRuntime, TokioScheduler, DEFAULT_FRAME_INTERVAL};
