//! Terminal stand-ins for the audio, haptic and sleep collaborators.

use breathwork_core::catalog::VibrationPattern;
use breathwork_core::session::{AudioCue, Collaborators, Haptics, SleepHook, StepCue};
use breathwork_core::storage::{DailyLog, SoundMode};
use tracing::{debug, info, warn};

/// Prints one line per step.
pub struct ConsoleAudio;

impl AudioCue for ConsoleAudio {
    fn init(&mut self) {
        debug!("audio ready");
    }

    fn cue(&mut self, cue: &StepCue) {
        let tone = match (cue.sound_mode, cue.entrainment_hz) {
            (SoundMode::Off, _) => String::new(),
            (SoundMode::Binaural, Some(hz)) => format!("  [{hz} Hz beat]"),
            (SoundMode::Tones | SoundMode::Binaural, _) => "  [tone]".to_string(),
        };
        println!(
            "{:>8} {:>5.1}s{tone}",
            cue.action.label(),
            cue.duration_ms as f64 / 1000.0
        );
    }
}

pub struct ConsoleHaptics;

impl Haptics for ConsoleHaptics {
    fn pulse(&mut self, pattern: &VibrationPattern) {
        debug!("vibrate {:?}", pattern.pulses());
    }
}

pub struct ConsoleSleep;

impl SleepHook for ConsoleSleep {
    fn on_sleep_threshold(&mut self) {
        info!("sleep threshold reached, sound muted");
    }
}

/// Console collaborators, persisting to the daily log when it opens.
pub fn collaborators() -> Collaborators {
    let base = Collaborators::silent()
        .with_audio(ConsoleAudio)
        .with_haptics(ConsoleHaptics)
        .with_sleep(ConsoleSleep);
    match DailyLog::open() {
        Ok(log) => base.with_activity(log.clone()).with_export(log),
        Err(e) => {
            warn!("practice log unavailable: {e}");
            base
        }
    }
}
