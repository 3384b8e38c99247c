use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog::{BreathAction, VibrationPattern};
use crate::error::CollaboratorError;
use crate::events::SessionEvent;

use super::collaborators::{
    ActivityLog, AudioCue, Collaborators, Haptics, SessionExport, SessionSummary, SleepHook,
    StepCue,
};

/// In-memory collaborator that records every call.
///
/// Clones share one log, so a test keeps a clone while the controller owns
/// the boxed copies.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A full collaborator set backed by this recorder.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            audio: Box::new(self.clone()),
            haptics: Box::new(self.clone()),
            activity: Box::new(self.clone()),
            export: Box::new(self.clone()),
            sleep: Box::new(self.clone()),
        }
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn cues(&self) -> Vec<StepCue> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::StepCue(cue) => Some(cue.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cue_actions(&self) -> Vec<BreathAction> {
        self.cues().into_iter().map(|c| c.action).collect()
    }

    pub fn haptics(&self) -> Vec<VibrationPattern> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Haptic { pattern } => Some(pattern.clone()),
                _ => None,
            })
            .collect()
    }

    /// Technique id attributed to each logged second, in order.
    pub fn ticks(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::SecondTick { technique_id } => Some(technique_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn finalized(&self) -> Vec<SessionSummary> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::SessionFinalized(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: SessionEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SessionEvent>> {
        // A panic while holding the lock only happens inside a failing test.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AudioCue for Recorder {
    fn init(&mut self) {
        self.push(SessionEvent::AudioInit);
    }

    fn cue(&mut self, cue: &StepCue) {
        self.push(SessionEvent::StepCue(cue.clone()));
    }
}

impl Haptics for Recorder {
    fn pulse(&mut self, pattern: &VibrationPattern) {
        self.push(SessionEvent::Haptic {
            pattern: pattern.clone(),
        });
    }
}

impl ActivityLog for Recorder {
    fn record_second(&mut self, technique_id: &str) -> Result<(), CollaboratorError> {
        self.push(SessionEvent::SecondTick {
            technique_id: technique_id.to_string(),
        });
        Ok(())
    }
}

impl SessionExport for Recorder {
    fn finalize(&mut self, summary: &SessionSummary) -> Result<(), CollaboratorError> {
        self.push(SessionEvent::SessionFinalized(summary.clone()));
        Ok(())
    }
}

impl SleepHook for Recorder {
    fn on_sleep_threshold(&mut self) {
        self.push(SessionEvent::SleepThreshold);
    }
}
