//! Win/lose evaluation and reward computation.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::models::{ChallengeResult, Quest, QuestTargets};

const MS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

/// Message of the result returned when there is nothing to complete.
pub const NO_SESSION_MESSAGE: &str = "The challenge could not be started!";

/// Average speed in m/s for a distance in km over an elapsed time in ms.
///
/// Zero when either the distance or the elapsed time is zero.
pub fn average_speed_mps(distance_km: f64, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 || distance_km <= 0.0 {
        return 0.0;
    }
    let hours = elapsed_ms as f64 / MS_PER_HOUR;
    distance_km / hours / 3.6
}

/// Per-condition verdict. Each condition holds vacuously when its target is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub time_ok: bool,
    pub distance_ok: bool,
    pub speed_ok: bool,
}

impl Evaluation {
    pub fn passed(&self) -> bool {
        self.time_ok && self.distance_ok && self.speed_ok
    }
}

pub fn evaluate(
    elapsed_ms: u64,
    distance_km: f64,
    average_speed_mps: f64,
    targets: &QuestTargets,
) -> Evaluation {
    let time_ok =
        targets.time_min == 0 || elapsed_ms <= targets.time_min.saturating_mul(60 * 1000);
    let distance_ok = targets.distance_km <= 0.0 || distance_km >= targets.distance_km;
    let speed_ok =
        targets.required_speed_mps <= 0.0 || average_speed_mps >= targets.required_speed_mps;

    Evaluation {
        time_ok,
        distance_ok,
        speed_ok,
    }
}

/// Builds the result for a finished session.
pub fn build_result(
    quest: &Quest,
    elapsed_ms: u64,
    distance_km: f64,
    rng: &mut impl Rng,
) -> (ChallengeResult, Evaluation) {
    let average = average_speed_mps(distance_km, elapsed_ms);
    let evaluation = evaluate(elapsed_ms, distance_km, average, &quest.targets);
    let completed = evaluation.passed();

    let lines = if completed {
        &quest.dialogue_win
    } else {
        &quest.dialogue_lose
    };
    let npc_message = lines.choose(rng).cloned().unwrap_or_default();

    let result = ChallengeResult {
        quest_id: quest.id.clone(),
        completed,
        time_taken_ms: elapsed_ms,
        average_speed_mps: average,
        distance_km,
        gold_earned: if completed { quest.reward_gold } else { 0 },
        xp_earned: if completed { quest.reward_xp } else { 0 },
        npc_message,
    };
    (result, evaluation)
}

/// The canonical result of completing while no session is active.
pub fn no_session_result(quest_id: &str) -> ChallengeResult {
    ChallengeResult {
        quest_id: quest_id.to_string(),
        completed: false,
        time_taken_ms: 0,
        average_speed_mps: 0.0,
        distance_km: 0.0,
        gold_earned: 0,
        xp_earned: 0,
        npc_message: NO_SESSION_MESSAGE.to_string(),
    }
}
