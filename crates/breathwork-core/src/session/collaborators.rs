//! Side-effect collaborators injected into the session controller.
//!
//! Every method has a no-op default so a host only implements what it has.
//! Collaborators receive owned copies of session data, never the runtime state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{BreathAction, VibrationPattern};
use crate::error::CollaboratorError;
use crate::storage::SoundMode;

/// Everything the audio engine needs when a new step begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCue {
    pub technique_id: String,
    pub step_index: usize,
    pub action: BreathAction,
    pub duration_ms: u64,
    /// Binaural beat target, when the technique has an audio profile.
    pub entrainment_hz: Option<f32>,
    pub base_frequency_hz: Option<f32>,
    pub vibration: VibrationPattern,
    pub sound_mode: SoundMode,
}

/// A finished session, as handed to persistence and health export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub technique_id: String,
    pub technique_name: String,
    pub preset_id: Option<String>,
    pub cycles: u64,
}

impl SessionSummary {
    /// Summary of a session begun at `started_at` that ends now with
    /// `duration_secs` of active time. Paused time sits between the two
    /// timestamps but is not part of the duration.
    pub fn ending_now(
        started_at: DateTime<Utc>,
        duration_secs: u64,
        technique_id: &str,
        technique_name: &str,
        preset_id: Option<String>,
        cycles: u64,
    ) -> Self {
        Self {
            started_at,
            ended_at: Utc::now(),
            duration_secs,
            technique_id: technique_id.to_string(),
            technique_name: technique_name.to_string(),
            preset_id,
            cycles,
        }
    }
}

pub trait AudioCue: Send {
    /// Prepare the audio engine. Called on every transition into running;
    /// must tolerate repeated calls.
    fn init(&mut self) {}

    fn cue(&mut self, _cue: &StepCue) {}
}

pub trait Haptics: Send {
    fn pulse(&mut self, _pattern: &VibrationPattern) {}
}

/// Per-second attribution for the daily log.
pub trait ActivityLog: Send {
    /// # Errors
    /// A failed write is reported on the controller's error channel and
    /// otherwise ignored.
    fn record_second(&mut self, _technique_id: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Health-platform export of finished sessions.
pub trait SessionExport: Send {
    /// # Errors
    /// A failed export is reported on the controller's error channel and
    /// otherwise ignored.
    fn finalize(&mut self, _summary: &SessionSummary) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Settings collaborator told when the session crosses the sleep threshold.
pub trait SleepHook: Send {
    fn on_sleep_threshold(&mut self) {}
}

/// Collaborator that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioCue for Silent {}
impl Haptics for Silent {}
impl ActivityLog for Silent {}
impl SessionExport for Silent {}
impl SleepHook for Silent {}

pub struct Collaborators {
    pub audio: Box<dyn AudioCue>,
    pub haptics: Box<dyn Haptics>,
    pub activity: Box<dyn ActivityLog>,
    pub export: Box<dyn SessionExport>,
    pub sleep: Box<dyn SleepHook>,
}

impl Collaborators {
    pub fn silent() -> Self {
        Self {
            audio: Box::new(Silent),
            haptics: Box::new(Silent),
            activity: Box::new(Silent),
            export: Box::new(Silent),
            sleep: Box::new(Silent),
        }
    }

    pub fn with_audio(mut self, audio: impl AudioCue + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn with_haptics(mut self, haptics: impl Haptics + 'static) -> Self {
        self.haptics = Box::new(haptics);
        self
    }

    pub fn with_activity(mut self, activity: impl ActivityLog + 'static) -> Self {
        self.activity = Box::new(activity);
        self
    }

    pub fn with_export(mut self, export: impl SessionExport + 'static) -> Self {
        self.export = Box::new(export);
        self
    }

    pub fn with_sleep(mut self, sleep: impl SleepHook + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
