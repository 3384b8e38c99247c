//! # Breathwork Core Library
//!
//! This library provides the session timing and playback engine for guided
//! breathing. It follows a CLI-first philosophy: every operation is available
//! through the standalone `breathwork-cli` binary, and any GUI is a thin layer
//! over the same core library.
//!
//! ## Architecture
//!
//! - **Catalog**: validated, read-only techniques (cyclic phase steps) and
//!   presets (timed technique segments)
//! - **Timer**: a frame-driven phase clock, a cycle sequencer, a 1 Hz session
//!   timer and a preset director, all driven through an injected [`Scheduler`]
//! - **Session**: the [`SessionController`] that composes the timer parts and
//!   dispatches side effects to injected collaborators, plus two hosts: a
//!   deterministic [`SimulatedHost`] and the tokio-backed [`SessionRuntime`]
//! - **Storage**: TOML configuration and a SQLite practice log
//!
//! ## Key Components
//!
//! - [`SessionController`]: session state machine
//! - [`Catalog`]: technique and preset lookup
//! - [`Config`]: application configuration management
//! - [`DailyLog`]: practice persistence and goal compliance

pub mod catalog;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use catalog::{BreathAction, Catalog, FilterKey, PhaseStep, Preset, Segment, Technique};
pub use error::{CollaboratorError, ConfigError, CoreError};
pub use events::SessionEvent;
pub use session::{
    Collaborators, Recorder, SessionController, SessionHandle, SessionRuntime, SessionSnapshot,
    SessionState, SimulatedHost, StepCue,
};
pub use storage::{Config, DailyLog, SessionSettings, SoundMode};
pub use timer::{ManualScheduler, Scheduler};
