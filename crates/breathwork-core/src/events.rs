use serde::{Deserialize, Serialize};

use crate::catalog::VibrationPattern;
use crate::session::{SessionSummary, StepCue};

/// Every side effect the controller dispatches, in dispatch order.
///
/// The [`Recorder`](crate::session::Recorder) collaborator captures these; the
/// CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    AudioInit,
    StepCue(StepCue),
    Haptic {
        pattern: VibrationPattern,
    },
    SecondTick {
        technique_id: String,
    },
    SleepThreshold,
    SessionFinalized(SessionSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(SessionEvent::SecondTick {
            technique_id: "box".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "second_tick");
        assert_eq!(json["technique_id"], "box");
    }
}
