//! Core data types shared by the tracker, location sources and catalog.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A single timestamped GPS observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lon: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Speed reported by the positioning source, 0 when unknown.
    pub speed_mps: f64,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, timestamp_ms: i64, speed_mps: f64) -> Self {
        Self {
            lat: coordinate.lat,
            lon: coordinate.lon,
            timestamp_ms,
            speed_mps,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn is_valid(&self) -> bool {
        self.coordinate().is_valid() && self.speed_mps.is_finite()
    }
}

/// Difficulty tier of a quest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestCategory {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl QuestCategory {
    pub const ALL: [QuestCategory; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Expert];

    pub fn difficulty(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
        }
    }

    /// Nominal gold value of the tier. Informational only; quests carry their own rewards.
    pub fn base_reward(&self) -> u32 {
        match self {
            Self::Easy => 25,
            Self::Medium => 75,
            Self::Hard => 150,
            Self::Expert => 300,
        }
    }
}

/// The success thresholds of a quest. A zero value leaves that dimension unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestTargets {
    pub distance_km: f64,
    pub time_min: u64,
    pub required_speed_mps: f64,
}

/// An externally defined challenge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: QuestCategory,
    pub targets: QuestTargets,
    pub reward_gold: u32,
    pub reward_xp: u32,
    pub npc_name: String,
    pub dialogue_intro: Vec<String>,
    pub dialogue_win: Vec<String>,
    pub dialogue_lose: Vec<String>,
    /// Where the quest giver stands on the map.
    pub location: Option<Coordinate>,
}

impl Quest {
    /// Picks one intro line at random, `None` when the quest has no intro.
    pub fn intro_line(&self, rng: &mut impl Rng) -> Option<&str> {
        self.dialogue_intro.choose(rng).map(String::as_str)
    }
}

/// One in-progress attempt at a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub quest_id: String,
    pub started_at_ms: i64,
    pub active: bool,
    pub elapsed_ms: u64,
    /// Instantaneous speed as reported by the latest fix.
    pub current_speed_mps: f64,
    pub distance_km: f64,
    /// Fixes in arrival order.
    pub route: Vec<LocationFix>,
}

impl Session {
    pub(crate) fn begin(quest_id: &str, started_at_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            quest_id: quest_id.to_string(),
            started_at_ms,
            active: true,
            elapsed_ms: 0,
            current_speed_mps: 0.0,
            distance_km: 0.0,
            route: Vec::new(),
        }
    }
}

/// Final verdict of a session, handed to the caller for display or persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResult {
    pub quest_id: String,
    pub completed: bool,
    pub time_taken_ms: u64,
    pub average_speed_mps: f64,
    pub distance_km: f64,
    pub gold_earned: u32,
    pub xp_earned: u32,
    pub npc_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(51.0269, 7.5636).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_fix_with_nan_speed_is_invalid() {
        let fix = LocationFix::new(Coordinate::new(1.0, 1.0), 0, f64::NAN);
        assert!(!fix.is_valid());
    }

    #[test]
    fn test_intro_line() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut quest = Quest::default();
        assert!(quest.intro_line(&mut rng).is_none());

        quest.dialogue_intro = vec!["Ready?".into(), "Let's go!".into()];
        let line = quest.intro_line(&mut rng).unwrap();
        assert!(quest.dialogue_intro.iter().any(|l| l == line));
    }

    #[test]
    fn test_category_rewards_increase() {
        let rewards: Vec<u32> = QuestCategory::ALL.iter().map(|c| c.base_reward()).collect();
        assert!(rewards.windows(2).all(|w| w[0] < w[1]));
    }
}
