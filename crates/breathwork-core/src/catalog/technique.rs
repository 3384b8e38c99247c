use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rank::{FilterKey, FALLBACK_RANK};
use crate::error::ConfigError;

/// One breathing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathAction {
    Inhale,
    /// Quick top-up inhale following a full inhale (multi-inhale techniques).
    Inhale2,
    Hold,
    Exhale,
}

impl BreathAction {
    pub fn label(self) -> &'static str {
        match self {
            BreathAction::Inhale => "Breathe In",
            BreathAction::Inhale2 => "Sip In",
            BreathAction::Hold => "Hold",
            BreathAction::Exhale => "Breathe Out",
        }
    }

    fn default_scale(self) -> f32 {
        match self {
            BreathAction::Inhale => 1.5,
            BreathAction::Inhale2 => 1.65,
            BreathAction::Hold => 1.5,
            BreathAction::Exhale => 1.0,
        }
    }

    fn default_vibration(self) -> VibrationPattern {
        match self {
            BreathAction::Inhale => VibrationPattern::Sequence(vec![10, 50, 15, 45, 20, 40, 30]),
            BreathAction::Inhale2 => VibrationPattern::Single(30),
            BreathAction::Hold => VibrationPattern::Single(15),
            BreathAction::Exhale => VibrationPattern::Sequence(vec![50, 20, 40, 30, 30, 40, 20]),
        }
    }
}

/// Haptic pulse timings in milliseconds, handed to the haptics collaborator as-is.
///
/// Accepts either a bare integer or a list when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VibrationPattern {
    Single(u32),
    Sequence(Vec<u32>),
}

impl VibrationPattern {
    pub fn pulses(&self) -> &[u32] {
        match self {
            VibrationPattern::Single(ms) => std::slice::from_ref(ms),
            VibrationPattern::Sequence(ms) => ms,
        }
    }

    pub fn total_ms(&self) -> u32 {
        self.pulses().iter().sum()
    }

    fn is_valid(&self) -> bool {
        let pulses = self.pulses();
        !pulses.is_empty() && pulses.iter().all(|&p| p > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStep {
    pub action: BreathAction,
    pub duration_ms: u64,
    /// Visual expansion factor for the UI.
    pub scale: f32,
    pub text: String,
    pub vibration: VibrationPattern,
}

impl PhaseStep {
    /// A step with the action's default scale, label and vibration.
    pub fn new(action: BreathAction, duration_ms: u64) -> Self {
        Self {
            action,
            duration_ms,
            scale: action.default_scale(),
            text: action.label().to_string(),
            vibration: action.default_vibration(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_vibration(mut self, vibration: VibrationPattern) -> Self {
        self.vibration = vibration;
        self
    }
}

/// Audio passthrough for the tone/drone collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioProfile {
    pub base_frequency_hz: f32,
    pub binaural_beat_hz: f32,
}

/// A named, repeatable cycle of phase steps.
///
/// Catalog code hands techniques out as `Arc<Technique>`; the engine swaps the
/// reference and never mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<PhaseStep>,
    #[serde(default)]
    pub audio_profile: Option<AudioProfile>,
    /// Ordering within catalog filters; lower sorts first.
    #[serde(default)]
    pub ranks: BTreeMap<FilterKey, u32>,
}

impl Technique {
    pub fn new(id: impl Into<String>, name: impl Into<String>, steps: Vec<PhaseStep>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            steps,
            audio_profile: None,
            ranks: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_audio(mut self, base_frequency_hz: f32, binaural_beat_hz: f32) -> Self {
        self.audio_profile = Some(AudioProfile {
            base_frequency_hz,
            binaural_beat_hz,
        });
        self
    }

    pub fn with_rank(mut self, key: FilterKey, rank: u32) -> Self {
        self.ranks.insert(key, rank);
        self
    }

    /// Check the step invariants.
    ///
    /// # Errors
    /// Returns the first violation found: no steps, a zero duration, a
    /// non-positive scale or an empty/zero vibration pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::EmptySteps {
                technique: self.id.clone(),
            });
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.duration_ms == 0 {
                return Err(ConfigError::ZeroDuration {
                    technique: self.id.clone(),
                    index,
                });
            }
            if !(step.scale.is_finite() && step.scale > 0.0) {
                return Err(ConfigError::NonPositiveScale {
                    technique: self.id.clone(),
                    index,
                });
            }
            if !step.vibration.is_valid() {
                return Err(ConfigError::InvalidVibration {
                    technique: self.id.clone(),
                    index,
                });
            }
        }
        Ok(())
    }

    /// Rank under `filter`, or [`FALLBACK_RANK`] when unranked.
    pub fn rank(&self, filter: FilterKey) -> u32 {
        self.ranks.get(&filter).copied().unwrap_or(FALLBACK_RANK)
    }

    pub fn cycle_duration_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_ms).sum()
    }

    pub fn breaths_per_minute(&self) -> f64 {
        let cycle = self.cycle_duration_ms();
        if cycle == 0 {
            return 0.0;
        }
        60_000.0 / cycle as f64
    }

    pub fn entrainment_hz(&self) -> Option<f32> {
        self.audio_profile.map(|p| p.binaural_beat_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_breath() -> Technique {
        Technique::new(
            "box",
            "Box",
            vec![
                PhaseStep::new(BreathAction::Inhale, 4000),
                PhaseStep::new(BreathAction::Hold, 4000),
                PhaseStep::new(BreathAction::Exhale, 4000),
                PhaseStep::new(BreathAction::Hold, 4000),
            ],
        )
    }

    #[test]
    fn valid_technique_passes() {
        assert!(box_breath().validate().is_ok());
    }

    #[test]
    fn empty_steps_rejected() {
        let t = Technique::new("empty", "Empty", vec![]);
        assert_eq!(
            t.validate(),
            Err(ConfigError::EmptySteps {
                technique: "empty".into()
            })
        );
    }

    #[test]
    fn zero_duration_rejected() {
        let mut t = box_breath();
        t.steps[2].duration_ms = 0;
        assert_eq!(
            t.validate(),
            Err(ConfigError::ZeroDuration {
                technique: "box".into(),
                index: 2
            })
        );
    }

    #[test]
    fn zero_pulse_rejected() {
        let mut t = box_breath();
        t.steps[1].vibration = VibrationPattern::Sequence(vec![10, 0]);
        assert!(matches!(
            t.validate(),
            Err(ConfigError::InvalidVibration { index: 1, .. })
        ));
    }

    #[test]
    fn nan_scale_rejected() {
        let mut t = box_breath();
        t.steps[0].scale = f32::NAN;
        assert!(matches!(
            t.validate(),
            Err(ConfigError::NonPositiveScale { index: 0, .. })
        ));
    }

    #[test]
    fn cycle_metrics() {
        let t = box_breath();
        assert_eq!(t.cycle_duration_ms(), 16_000);
        assert!((t.breaths_per_minute() - 3.75).abs() < 1e-9);
    }

    #[test]
    fn vibration_accepts_int_or_list() {
        let single: VibrationPattern = serde_json::from_str("40").unwrap();
        let list: VibrationPattern = serde_json::from_str("[10, 20]").unwrap();
        assert_eq!(single.pulses(), &[40]);
        assert_eq!(list.total_ms(), 30);
    }

    #[test]
    fn unranked_filter_uses_fallback() {
        let t = box_breath().with_rank(FilterKey::Focus, 1);
        assert_eq!(t.rank(FilterKey::Focus), 1);
        assert_eq!(t.rank(FilterKey::Sleep), FALLBACK_RANK);
    }
}
