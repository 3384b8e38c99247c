//! Property tests for the timing engine under arbitrary frame cadences.

use breathwork_core::catalog::{BreathAction, Catalog, PhaseStep, Technique};
use breathwork_core::session::{Collaborators, SessionController, SimulatedHost};
use breathwork_core::storage::SessionSettings;
use breathwork_core::timer::ManualScheduler;
use proptest::prelude::*;

fn host_for(steps: &[u64]) -> SimulatedHost {
    let actions = [
        BreathAction::Inhale,
        BreathAction::Hold,
        BreathAction::Exhale,
        BreathAction::Hold,
    ];
    let technique = Technique::new(
        "prop",
        "Prop",
        steps
            .iter()
            .enumerate()
            .map(|(i, &ms)| PhaseStep::new(actions[i % actions.len()], ms))
            .collect(),
    );
    let catalog = Catalog::new(vec![technique], Vec::new()).unwrap();
    let settings = SessionSettings {
        default_technique: "prop".into(),
        ..SessionSettings::default()
    };
    let controller = SessionController::new(
        catalog,
        settings,
        ManualScheduler::new(),
        Collaborators::silent(),
    )
    .unwrap();
    let mut host = SimulatedHost::new(controller);
    host.controller_mut().start().unwrap();
    host.refresh(0);
    host
}

/// Step boundaries at or before `t` for a technique cycled from time 0.
fn boundaries_until(steps: &[u64], t: u64) -> u64 {
    let mut at = 0;
    let mut count = 0;
    for &d in steps.iter().cycle() {
        at += d;
        if at > t {
            return count;
        }
        count += 1;
    }
    unreachable!("cycle never ends")
}

proptest! {
    #[test]
    fn progress_is_monotonic_and_bounded(
        duration in 200u64..5_000,
        intervals in prop::collection::vec(1u64..120, 1..400),
    ) {
        let mut host = host_for(&[duration]);
        let mut last_cycle = 0;
        let mut last_pct = 0.0;
        for dt in intervals {
            host.refresh(dt);
            let snap = host.snapshot();
            prop_assert!(snap.step_progress_pct >= 0.0);
            prop_assert!(snap.step_progress_pct <= 100.0);
            if snap.cycle_count == last_cycle {
                prop_assert!(snap.step_progress_pct >= last_pct);
            }
            last_cycle = snap.cycle_count;
            last_pct = snap.step_progress_pct;
        }
    }

    #[test]
    fn step_boundaries_do_not_drift(
        steps in prop::collection::vec(300u64..3_000, 1..5),
        intervals in prop::collection::vec(1u64..250, 1..600),
    ) {
        let mut host = host_for(&steps);
        for dt in intervals {
            host.refresh(dt);
            let snap = host.snapshot();
            let completed = snap.cycle_count * steps.len() as u64 + snap.current_step_index as u64;
            prop_assert_eq!(completed, boundaries_until(&steps, host.now_ms()));
        }
    }

    #[test]
    fn elapsed_seconds_follow_the_wall_clock(
        intervals in prop::collection::vec(1u64..700, 1..200),
    ) {
        let mut host = host_for(&[4_000, 4_000]);
        for dt in intervals {
            host.refresh(dt);
        }
        prop_assert_eq!(host.snapshot().total_elapsed_seconds, host.now_ms() / 1_000);
    }

    #[test]
    fn cycle_count_is_completions_over_step_count(
        n in 1usize..6,
        completions in 0u64..30,
    ) {
        let steps = vec![500u64; n];
        let mut host = host_for(&steps);
        // Frames land exactly on boundaries.
        for _ in 0..completions {
            host.refresh(500);
        }
        let snap = host.snapshot();
        prop_assert_eq!(snap.cycle_count, completions / n as u64);
        prop_assert_eq!(snap.current_step_index as u64, completions % n as u64);
    }
}
