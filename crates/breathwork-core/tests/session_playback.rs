//! End-to-end session playback over the deterministic host.

use breathwork_core::catalog::{BreathAction, Catalog, PhaseStep, Preset, Segment, Technique};
use breathwork_core::session::{Collaborators, Recorder, SessionController, SessionState, SimulatedHost};
use breathwork_core::storage::{DailyLog, SessionSettings};
use breathwork_core::timer::ManualScheduler;
use breathwork_core::SessionEvent;

use BreathAction::*;

fn host_with(catalog: Catalog, technique: &str, collaborators: Collaborators) -> SimulatedHost {
    let settings = SessionSettings {
        default_technique: technique.to_string(),
        ..SessionSettings::default()
    };
    let controller =
        SessionController::new(catalog, settings, ManualScheduler::new(), collaborators).unwrap();
    SimulatedHost::new(controller)
}

/// Start and deliver the first display refresh immediately.
fn start(host: &mut SimulatedHost) {
    host.controller_mut().toggle().unwrap();
    host.refresh(0);
}

#[test]
fn box_breathing_one_full_cycle() {
    let rec = Recorder::new();
    let mut host = host_with(Catalog::builtin(), "box", rec.collaborators());
    start(&mut host);

    host.run_for(16_000, 250);

    // Entry cue, three transitions, then the wrap back to step 0.
    assert_eq!(rec.cue_actions(), vec![Inhale, Hold, Exhale, Hold, Inhale]);
    let snap = host.snapshot();
    assert_eq!(snap.cycle_count, 1);
    assert_eq!(snap.current_step_index, 0);
    assert_eq!(snap.total_elapsed_seconds, 16);
    assert_eq!(rec.ticks().len(), 16);
    assert!(rec.ticks().iter().all(|t| t == "box"));
}

#[test]
fn cues_carry_audio_profile() {
    let rec = Recorder::new();
    let mut host = host_with(Catalog::builtin(), "4-7-8", rec.collaborators());
    start(&mut host);
    host.run_for(4_000, 100);

    let cues = rec.cues();
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[1].action, Hold);
    assert_eq!(cues[1].duration_ms, 7_000);
    assert_eq!(cues[1].entrainment_hz, Some(4.0));
    assert_eq!(cues[1].step_index, 1);
}

#[test]
fn irregular_frames_keep_step_boundaries() {
    let rec = Recorder::new();
    let mut host = host_with(Catalog::builtin(), "box", rec.collaborators());
    start(&mut host);

    // 16 ms, then a 97 ms hitch, repeated past 32 s.
    let cadence = [16u64, 16, 16, 97];
    host.run_intervals(cadence.iter().copied().cycle().take(1_000));
    assert_eq!(host.now_ms(), 36_250);
    // Two cycles are due by 32 s regardless of cadence.
    assert_eq!(host.snapshot().cycle_count, 2);
}

fn two_segment_catalog() -> Catalog {
    let mut techniques = Catalog::builtin()
        .techniques()
        .iter()
        .map(|t| (**t).clone())
        .collect::<Vec<_>>();
    techniques.push(Technique::new("a", "A", vec![PhaseStep::new(Inhale, 800)]));
    techniques.push(Technique::new(
        "b",
        "B",
        vec![PhaseStep::new(Inhale, 700), PhaseStep::new(Exhale, 900)],
    ));
    let presets = vec![Preset::new(
        "ab",
        "A then B",
        vec![Segment::new("a", 5), Segment::new("b", 3)],
    )];
    Catalog::new(techniques, presets).unwrap()
}

#[test]
fn preset_attributes_each_second_to_the_technique_that_ran_it() {
    let rec = Recorder::new();
    let mut host = host_with(two_segment_catalog(), "box", rec.collaborators());
    host.controller_mut().start_preset("ab").unwrap();
    host.refresh(0);

    host.run_for(12_000, 16);

    assert_eq!(rec.ticks(), vec!["a", "a", "a", "a", "a", "b", "b", "b"]);
    let snap = host.snapshot();
    assert!(!snap.is_active);
    assert_eq!(snap.active_preset_id, None);
    assert_eq!(snap.total_elapsed_seconds, 8);

    let finals = rec.finalized();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].technique_id, "b");
    assert_eq!(finals[0].preset_id.as_deref(), Some("ab"));
}

#[test]
fn preset_segment_swap_restarts_cycles_and_cues_step_zero() {
    let rec = Recorder::new();
    let mut host = host_with(two_segment_catalog(), "box", rec.collaborators());
    host.controller_mut().start_preset("ab").unwrap();
    host.refresh(0);
    host.run_for(4_990, 10);
    assert!(host.snapshot().cycle_count >= 5);

    rec.clear();
    host.refresh(10);
    let snap = host.snapshot();
    assert_eq!(snap.technique_id, "b");
    assert_eq!(snap.cycle_count, 0);
    assert_eq!(snap.current_step_index, 0);
    assert_eq!(snap.preset_segment_index, 1);
    assert_eq!(snap.preset_segment_start_second, 5);
    assert_eq!(rec.cue_actions(), vec![Inhale]);
    assert_eq!(rec.cues()[0].technique_id, "b");
}

#[test]
fn pausing_a_preset_holds_its_segment_clock() {
    let rec = Recorder::new();
    let mut host = host_with(two_segment_catalog(), "box", rec.collaborators());
    host.controller_mut().start_preset("ab").unwrap();
    host.refresh(0);
    host.run_for(3_000, 50);

    host.controller_mut().toggle().unwrap();
    host.run_for(60_000, 1_000);
    assert_eq!(host.snapshot().total_elapsed_seconds, 3);
    assert_eq!(host.snapshot().active_preset_id.as_deref(), Some("ab"));

    host.controller_mut().toggle().unwrap();
    host.run_for(2_000, 50);
    assert_eq!(host.snapshot().technique_id, "b");
}

#[test]
fn reset_after_finished_preset_does_not_export_again() {
    let rec = Recorder::new();
    let mut host = host_with(two_segment_catalog(), "box", rec.collaborators());
    host.controller_mut().start_preset("ab").unwrap();
    host.run_for(9_000, 100);
    assert_eq!(rec.finalized().len(), 1);

    host.controller_mut().reset();
    host.controller_mut().reset();
    assert_eq!(rec.finalized().len(), 1);
    assert_eq!(host.controller().state(), SessionState::Idle);
}

#[test]
fn stop_then_start_replays_step_zero_cue() {
    let rec = Recorder::new();
    let mut host = host_with(Catalog::builtin(), "sigh", rec.collaborators());
    start(&mut host);
    host.run_for(2_500, 50);
    assert_eq!(host.snapshot().current_step_index, 1);

    host.controller_mut().stop();
    let snap = host.snapshot();
    assert_eq!(snap.current_step_index, 0);
    assert_eq!(snap.step_progress_pct, 0.0);
    assert_eq!(snap.total_elapsed_seconds, 2);

    rec.clear();
    host.controller_mut().toggle().unwrap();
    assert_eq!(rec.events()[0], SessionEvent::AudioInit);
    assert_eq!(rec.cue_actions(), vec![Inhale]);
}

#[test]
fn daily_log_collects_practice_from_a_session() {
    let log = DailyLog::open_memory().unwrap();
    let collaborators = Collaborators::silent()
        .with_activity(log.clone())
        .with_export(log.clone());
    let mut host = host_with(Catalog::builtin(), "coherent", collaborators);
    start(&mut host);
    host.run_for(30_000, 100);
    host.controller_mut().reset();

    let stats = log.stats_today().unwrap();
    assert_eq!(stats.total_seconds, 30);
    assert_eq!(stats.sessions, 1);
    assert_eq!(stats.by_technique.get("coherent"), Some(&30));
}
