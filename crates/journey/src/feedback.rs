//! Periodic pace feedback.
//!
//! While a session runs, the tracker compares the average speed against the
//! quest's required speed and emits an advisory [`PaceSignal`]. Feedback never
//! changes session state.

use serde::{Deserialize, Serialize};

use crate::config::FeedbackConfig;
use crate::cues::Cue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceSignal {
    /// Average speed is well below the required speed.
    Warning,
    /// Average speed meets the required speed.
    GoodPace,
}

impl PaceSignal {
    pub fn cue(&self) -> Cue {
        match self {
            Self::Warning => Cue::SpeedWarning,
            Self::GoodPace => Cue::SpeedGood,
        }
    }
}

/// Classifies an average speed against a requirement.
///
/// No signal when the requirement is unset, nothing has been covered yet, or
/// the runner is between `warning_ratio * required` and `required`.
pub fn classify(average_speed_mps: f64, required_speed_mps: f64, warning_ratio: f64) -> Option<PaceSignal> {
    if required_speed_mps <= 0.0 || average_speed_mps <= 0.0 {
        return None;
    }
    if average_speed_mps < required_speed_mps * warning_ratio {
        Some(PaceSignal::Warning)
    } else if average_speed_mps >= required_speed_mps {
        Some(PaceSignal::GoodPace)
    } else {
        None
    }
}

/// Spacing guard layered under the poll interval.
///
/// Seeded with the session start, so the first evaluation cannot happen
/// before `min_gap_ms` have passed.
#[derive(Debug, Clone)]
pub(crate) struct FeedbackGate {
    last_check_ms: i64,
    min_gap_ms: i64,
}

impl FeedbackGate {
    pub(crate) fn new(started_at_ms: i64, config: &FeedbackConfig) -> Self {
        Self {
            last_check_ms: started_at_ms,
            min_gap_ms: config.min_gap_ms as i64,
        }
    }

    /// Returns true and records the check when enough time has passed.
    pub(crate) fn try_pass(&mut self, now_ms: i64) -> bool {
        if now_ms - self.last_check_ms >= self.min_gap_ms {
            self.last_check_ms = now_ms;
            true
        } else {
            false
        }
    }
}
