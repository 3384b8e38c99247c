//! Session controller: the single owner of all session state.
//!
//! Composes the phase clock, cycle sequencer, session timer and preset
//! director, and is the only place collaborators are called from. It never
//! blocks or sleeps. The host delivers wake-ups through [`on_frame`] and
//! [`on_tick`] using the handles the injected [`Scheduler`] handed out.
//!
//! [`on_frame`]: SessionController::on_frame
//! [`on_tick`]: SessionController::on_tick

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{BreathAction, Catalog, Preset, Technique};
use crate::error::{CollaboratorError, ConfigError, CoreError};
use crate::storage::{SessionSettings, SoundMode};
use crate::timer::{
    CycleSequencer, FrameHandle, FrameOutcome, PhaseClock, PresetDirector, Scheduler,
    SegmentDecision, SessionTimer, TickerHandle,
};

use super::collaborators::{Collaborators, SessionSummary, StepCue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Freshly constructed or reset.
    Idle,
    Running,
    /// Inactive with counters retained.
    Paused,
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub is_active: bool,
    pub technique_id: String,
    pub technique_name: String,
    pub current_step_index: usize,
    pub step_action: Option<BreathAction>,
    pub step_text: Option<String>,
    pub step_scale: Option<f32>,
    pub step_duration_ms: u64,
    pub step_progress_pct: f64,
    pub total_elapsed_seconds: u64,
    pub cycle_count: u64,
    pub active_preset_id: Option<String>,
    pub preset_segment_index: usize,
    pub preset_segment_start_second: u64,
    pub sleep_threshold_reached: bool,
    pub sound_mode: SoundMode,
}

pub struct SessionController<S: Scheduler> {
    catalog: Catalog,
    settings: SessionSettings,
    scheduler: S,
    collaborators: Collaborators,
    state: SessionState,
    clock: PhaseClock,
    sequencer: CycleSequencer,
    timer: SessionTimer,
    director: PresetDirector,
    /// The next start begins the current step from zero instead of resuming
    /// the frozen clock.
    fresh_step: bool,
    /// Total seconds already handed to the export collaborator.
    finalized_through: u64,
    /// Wall-clock start of the time not yet exported.
    started_at: Option<DateTime<Utc>>,
    errors: Vec<CoreError>,
}

impl<S: Scheduler> SessionController<S> {
    /// Build an idle session on `settings.default_technique`, falling back to
    /// the first catalog technique when that id is unknown.
    ///
    /// # Errors
    /// [`ConfigError::EmptyCatalog`] if there is nothing to select.
    pub fn new(
        catalog: Catalog,
        settings: SessionSettings,
        scheduler: S,
        collaborators: Collaborators,
    ) -> Result<Self, ConfigError> {
        let technique = match catalog.technique(&settings.default_technique) {
            Ok(t) => t,
            Err(err) => {
                let fallback = catalog
                    .techniques()
                    .first()
                    .cloned()
                    .ok_or(ConfigError::EmptyCatalog)?;
                warn!("{err}; falling back to '{}'", fallback.id);
                fallback
            }
        };

        Ok(Self {
            catalog,
            settings,
            scheduler,
            collaborators,
            state: SessionState::Idle,
            clock: PhaseClock::new(),
            sequencer: CycleSequencer::new(technique),
            timer: SessionTimer::new(),
            director: PresetDirector::new(),
            fresh_step: true,
            finalized_through: 0,
            started_at: None,
            errors: Vec::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn technique(&self) -> &Arc<Technique> {
        self.sequencer.technique()
    }

    pub fn current_step_index(&self) -> usize {
        self.sequencer.step_index()
    }

    pub fn step_progress_pct(&self) -> f64 {
        self.clock.progress_pct()
    }

    pub fn total_elapsed_seconds(&self) -> u64 {
        self.timer.total_elapsed_seconds()
    }

    pub fn cycle_count(&self) -> u64 {
        self.sequencer.cycle_count()
    }

    pub fn active_preset_id(&self) -> Option<&str> {
        self.director.active_preset_id()
    }

    pub fn preset_segment_index(&self) -> usize {
        self.director.segment_index()
    }

    pub fn preset_segment_start_second(&self) -> u64 {
        self.director.segment_start_second()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Hosts need this to pump a scheduler they drive themselves.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let step = self.sequencer.current_step();
        SessionSnapshot {
            state: self.state,
            is_active: self.is_active(),
            technique_id: self.technique().id.clone(),
            technique_name: self.technique().name.clone(),
            current_step_index: self.sequencer.step_index(),
            step_action: step.map(|s| s.action),
            step_text: step.map(|s| s.text.clone()),
            step_scale: step.map(|s| s.scale),
            step_duration_ms: step.map_or(0, |s| s.duration_ms),
            step_progress_pct: self.clock.progress_pct(),
            total_elapsed_seconds: self.timer.total_elapsed_seconds(),
            cycle_count: self.sequencer.cycle_count(),
            active_preset_id: self.director.active_preset_id().map(str::to_string),
            preset_segment_index: self.director.segment_index(),
            preset_segment_start_second: self.director.segment_start_second(),
            sleep_threshold_reached: self.timer.sleep_fired(),
            sound_mode: self.settings.sound_mode,
        }
    }

    /// Drain errors reported since the last call.
    pub fn take_errors(&mut self) -> Vec<CoreError> {
        std::mem::take(&mut self.errors)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Become active. A paused session resumes its frozen step; otherwise the
    /// current step starts from zero and its cue fires.
    ///
    /// # Errors
    /// A configuration error if the current step cannot be timed. The session
    /// is left as it was.
    pub fn start(&mut self) -> Result<SessionState, ConfigError> {
        if self.state == SessionState::Running {
            return Ok(self.state);
        }
        let step = self.sequencer.current_step().ok_or_else(|| ConfigError::EmptySteps {
            technique: self.technique().id.clone(),
        })?;
        if step.duration_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                technique: self.technique().id.clone(),
                index: self.sequencer.step_index(),
            });
        }

        self.started_at.get_or_insert_with(Utc::now);
        self.collaborators.audio.init();
        self.timer.start(&mut self.scheduler);
        if self.fresh_step {
            self.fresh_step = false;
            self.begin_step(None);
        } else {
            self.clock.resume(&mut self.scheduler);
        }
        self.state = SessionState::Running;
        info!(
            "session running: technique={} step={} elapsed={}s",
            self.technique().id,
            self.sequencer.step_index(),
            self.timer.total_elapsed_seconds()
        );
        Ok(self.state)
    }

    /// Freeze progress and counters. No-op unless running.
    pub fn pause(&mut self) -> SessionState {
        if self.state == SessionState::Running {
            self.clock.pause(&mut self.scheduler);
            self.timer.pause(&mut self.scheduler);
            self.state = SessionState::Paused;
            info!("session paused at {}s", self.timer.total_elapsed_seconds());
        }
        self.state
    }

    /// # Errors
    /// See [`start`](Self::start).
    pub fn toggle(&mut self) -> Result<SessionState, ConfigError> {
        match self.state {
            SessionState::Running => Ok(self.pause()),
            SessionState::Idle | SessionState::Paused => self.start(),
        }
    }

    /// Deactivate and snap the step index and progress to zero. Elapsed time
    /// and cycle count are kept; the next start fires step 0's cue again.
    pub fn stop(&mut self) -> SessionState {
        self.clock.reset(&mut self.scheduler);
        self.timer.pause(&mut self.scheduler);
        self.sequencer.rewind();
        self.fresh_step = true;
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
        }
        info!("session stopped at {}s", self.timer.total_elapsed_seconds());
        self.state
    }

    /// Finalize any unexported time, then clear all counters and the preset.
    pub fn reset(&mut self) -> SessionState {
        self.finalize_pending();
        self.clock.reset(&mut self.scheduler);
        self.timer.reset(&mut self.scheduler);
        self.director.cancel();
        self.sequencer.rewind();
        self.sequencer.reset_cycles();
        self.fresh_step = true;
        self.finalized_through = 0;
        self.state = SessionState::Idle;
        debug!("session reset");
        self.state
    }

    /// Reset and select `id`. The session stays idle.
    ///
    /// # Errors
    /// [`ConfigError::UnknownTechnique`] or a validation error; nothing is
    /// changed in that case.
    pub fn change_technique(&mut self, id: &str) -> Result<(), ConfigError> {
        let technique = self.catalog.technique(id)?;
        technique.validate()?;

        self.reset();
        self.sequencer.load(technique);
        info!("technique selected: {id}");
        Ok(())
    }

    /// Reset, load the preset's first technique and start running.
    ///
    /// # Errors
    /// An unknown or invalid preset, or a segment naming an unknown
    /// technique. Nothing is changed in that case.
    pub fn start_preset(&mut self, id: &str) -> Result<SessionState, ConfigError> {
        let preset = self.catalog.preset(id)?;
        preset.validate(|tid| self.catalog.technique(tid).is_ok())?;
        let first = preset
            .segments
            .first()
            .ok_or_else(|| ConfigError::EmptySegments { preset: id.to_string() })?;
        let technique = self.catalog.technique(&first.technique_id)?;
        technique.validate()?;

        self.reset();
        self.director.begin(Arc::clone(&preset));
        self.sequencer.load(technique);
        info!(
            "preset started: {id} ({} segments, {}s)",
            preset.segments.len(),
            preset.total_duration_secs()
        );
        self.start()
    }

    pub fn set_haptics_enabled(&mut self, enabled: bool) {
        self.settings.haptics_enabled = enabled;
    }

    pub fn set_sound_mode(&mut self, mode: SoundMode) {
        self.settings.sound_mode = mode;
    }

    // ── Host wake-ups ────────────────────────────────────────────────

    /// Deliver a display-refresh frame at host time `now_ms`.
    pub fn on_frame(&mut self, handle: FrameHandle, now_ms: u64) {
        if self.state != SessionState::Running {
            return;
        }
        if self.clock.on_frame(handle, now_ms, &mut self.scheduler) != FrameOutcome::Completed {
            return;
        }

        let boundary = self.clock.boundary_ms();
        let advance = self.sequencer.advance();
        if advance.wrapped {
            debug!(
                "cycle {} complete on '{}'",
                self.sequencer.cycle_count(),
                self.technique().id
            );
        }
        self.begin_step(boundary);
    }

    /// Deliver a one-second tick.
    ///
    /// Order per tick: count the second, attribute it to the technique that
    /// was running, fire the sleep hook, then let the preset director act.
    pub fn on_tick(&mut self, handle: TickerHandle) {
        let Some(report) = self.timer.on_tick(handle) else {
            return;
        };

        let technique_id = self.technique().id.clone();
        if let Err(err) = self.collaborators.activity.record_second(&technique_id) {
            self.report(err);
        }

        if report.sleep_threshold_reached {
            info!("sleep threshold reached at {}s", report.second);
            self.collaborators.sleep.on_sleep_threshold();
            if self.settings.sleep_auto_mute {
                self.settings.sound_mode = SoundMode::Off;
            }
        }

        match self.director.on_second(report.second) {
            SegmentDecision::Continue => {}
            SegmentDecision::Advance {
                technique_id,
                segment_index,
            } => match self.catalog.technique(&technique_id) {
                Ok(next) => {
                    info!("preset segment {segment_index}: {technique_id}");
                    self.swap_technique(next);
                }
                Err(err) => {
                    warn!("preset aborted: {err}");
                    self.director.cancel();
                    self.errors.push(err.into());
                }
            },
            SegmentDecision::Finished { preset } => self.finish_preset(&preset),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Time the current step, chained on `anchor_ms` when given, and fire
    /// its cue.
    fn begin_step(&mut self, anchor_ms: Option<u64>) {
        let Some(step) = self.sequencer.current_step() else {
            let err = ConfigError::EmptySteps {
                technique: self.technique().id.clone(),
            };
            self.halt(err);
            return;
        };
        let technique = self.sequencer.technique();
        let cue = StepCue {
            technique_id: technique.id.clone(),
            step_index: self.sequencer.step_index(),
            action: step.action,
            duration_ms: step.duration_ms,
            entrainment_hz: technique.entrainment_hz(),
            base_frequency_hz: technique.audio_profile.map(|p| p.base_frequency_hz),
            vibration: step.vibration.clone(),
            sound_mode: self.settings.sound_mode,
        };

        let armed = match anchor_ms {
            Some(anchor) => self.clock.chain(cue.duration_ms, anchor, &mut self.scheduler),
            None => self.clock.start(cue.duration_ms, &mut self.scheduler),
        };
        if let Err(err) = armed {
            self.halt(err);
            return;
        }

        debug!(
            "step {} {} {}ms",
            cue.step_index,
            cue.action.label(),
            cue.duration_ms
        );
        self.collaborators.audio.cue(&cue);
        if self.settings.haptics_enabled {
            self.collaborators.haptics.pulse(&cue.vibration);
        }
    }

    /// Preset segment change: new technique from step 0 with a fresh cycle
    /// count. Runs even while paused so the next start uses the new step.
    fn swap_technique(&mut self, technique: Arc<Technique>) {
        self.clock.cancel(&mut self.scheduler);
        self.sequencer.load(technique);
        self.sequencer.reset_cycles();
        if self.state == SessionState::Running {
            self.begin_step(None);
        } else {
            self.clock.reset(&mut self.scheduler);
            self.fresh_step = true;
        }
    }

    fn finish_preset(&mut self, preset: &Preset) {
        info!("preset finished: {}", preset.id);
        let total = self.timer.total_elapsed_seconds();
        let duration = total.saturating_sub(self.finalized_through);
        self.export(duration, Some(preset.id.clone()));
        self.finalized_through = total;
        self.pause();
    }

    /// Export the time not yet covered by an earlier summary.
    fn finalize_pending(&mut self) {
        let total = self.timer.total_elapsed_seconds();
        if total > self.finalized_through {
            let preset_id = self.director.active_preset_id().map(str::to_string);
            self.export(total - self.finalized_through, preset_id);
            self.finalized_through = total;
        }
    }

    fn export(&mut self, duration_secs: u64, preset_id: Option<String>) {
        let started_at = self
            .started_at
            .take()
            .unwrap_or_else(|| Utc::now() - chrono::Duration::seconds(duration_secs as i64));
        let technique = self.sequencer.technique();
        let summary = SessionSummary::ending_now(
            started_at,
            duration_secs,
            &technique.id,
            &technique.name,
            preset_id,
            self.sequencer.cycle_count(),
        );
        if let Err(err) = self.collaborators.export.finalize(&summary) {
            self.report(err);
        }
    }

    /// The step cannot be timed: deactivate and surface the error.
    fn halt(&mut self, err: ConfigError) {
        warn!("session halted: {err}");
        self.clock.cancel(&mut self.scheduler);
        self.timer.pause(&mut self.scheduler);
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
        }
        self.fresh_step = true;
        self.errors.push(err.into());
    }

    fn report(&mut self, err: CollaboratorError) {
        warn!("collaborator failed: {err}");
        self.errors.push(err.into());
    }
}

impl<S: Scheduler> std::fmt::Debug for SessionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("technique", &self.technique().id)
            .field("step", &self.sequencer.step_index())
            .field("elapsed", &self.timer.total_elapsed_seconds())
            .finish_non_exhaustive()
    }
}
