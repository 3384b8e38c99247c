//! Built-in techniques and presets.

use super::preset::{Preset, Segment};
use super::rank::FilterKey;
use super::technique::{BreathAction::*, PhaseStep, Technique, VibrationPattern};

pub fn techniques() -> Vec<Technique> {
    vec![
        Technique::new(
            "box",
            "Box Breathing",
            vec![
                PhaseStep::new(Inhale, 4000),
                PhaseStep::new(Hold, 4000),
                PhaseStep::new(Exhale, 4000),
                PhaseStep::new(Hold, 4000).with_scale(1.0),
            ],
        )
        .with_description("Equal four-count sides. Steadies attention under pressure.")
        .with_audio(200.0, 14.0)
        .with_rank(FilterKey::Focus, 1)
        .with_rank(FilterKey::Anxiety, 3),
        Technique::new(
            "4-7-8",
            "Tranquility",
            vec![
                PhaseStep::new(Inhale, 4000),
                PhaseStep::new(Hold, 7000),
                PhaseStep::new(Exhale, 8000),
            ],
        )
        .with_description("A long hold and longer exhale to settle before sleep.")
        .with_audio(136.1, 4.0)
        .with_rank(FilterKey::Sleep, 1)
        .with_rank(FilterKey::Anxiety, 2),
        Technique::new(
            "coherent",
            "Coherence",
            vec![PhaseStep::new(Inhale, 5500), PhaseStep::new(Exhale, 5500)],
        )
        .with_description("About 5.5 breaths per minute for heart rate variability.")
        .with_audio(174.0, 10.0)
        .with_rank(FilterKey::Calm, 1)
        .with_rank(FilterKey::Sleep, 3),
        Technique::new(
            "calm",
            "Balance",
            vec![PhaseStep::new(Inhale, 4000), PhaseStep::new(Exhale, 6000)],
        )
        .with_description("Exhale longer than you inhale.")
        .with_rank(FilterKey::Calm, 2)
        .with_rank(FilterKey::Anxiety, 4),
        Technique::new(
            "sigh",
            "Physiological Sigh",
            vec![
                PhaseStep::new(Inhale, 2000),
                PhaseStep::new(Inhale2, 1000).with_text("One more sip"),
                PhaseStep::new(Exhale, 6000).with_text("Long sigh out"),
            ],
        )
        .with_description("Double inhale, long exhale. The fastest way to offload stress.")
        .with_audio(110.0, 6.0)
        .with_rank(FilterKey::Anxiety, 1)
        .with_rank(FilterKey::Calm, 3),
        Technique::new(
            "power",
            "Power Breath",
            vec![
                PhaseStep::new(Inhale, 1500).with_vibration(VibrationPattern::Single(20)),
                PhaseStep::new(Exhale, 1000).with_vibration(VibrationPattern::Single(20)),
            ],
        )
        .with_description("Quick rhythmic breaths to raise energy.")
        .with_audio(256.0, 18.0)
        .with_rank(FilterKey::Energy, 1),
        Technique::new(
            "triangle",
            "Triangle",
            vec![
                PhaseStep::new(Inhale, 4000),
                PhaseStep::new(Hold, 4000),
                PhaseStep::new(Exhale, 4000),
            ],
        )
        .with_description("Three equal sides, no bottom hold.")
        .with_rank(FilterKey::Focus, 2)
        .with_rank(FilterKey::Energy, 2),
    ]
}

pub fn presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "wind-down",
            "Wind Down",
            vec![Segment::new("coherent", 180), Segment::new("4-7-8", 240)],
        )
        .with_description("Settle the heart rate, then lengthen the exhale."),
        Preset::new(
            "focus-ramp",
            "Focus Ramp",
            vec![
                Segment::new("sigh", 60),
                Segment::new("box", 240),
                Segment::new("triangle", 120),
            ],
        )
        .with_description("Clear the head, then hold a steady square."),
        Preset::new(
            "sleep-sequence",
            "Sleep Sequence",
            vec![
                Segment::new("calm", 120),
                Segment::new("coherent", 180),
                Segment::new("4-7-8", 300),
            ],
        )
        .with_description("Longer than the sleep threshold so sound fades on its own."),
    ]
}
