//! Read-only quest lookup.
//!
//! The catalog is constructed once and passed by reference to whoever needs it.
//! Catalog files store required speeds with an explicit unit. The loader
//! converts them to m/s so the rest of the crate only ever sees m/s.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::errors::CatalogError;
use crate::models::{Coordinate, Quest, QuestCategory, QuestTargets};

/// Lookup capability over a set of quests.
pub trait QuestCatalog: Send + Sync {
    fn get(&self, id: &str) -> Option<Quest>;

    fn all(&self) -> Vec<Quest>;

    fn by_category(&self, category: QuestCategory) -> Vec<Quest> {
        self.all()
            .into_iter()
            .filter(|q| q.category == category)
            .collect()
    }
}

/// An in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    quests: Vec<Quest>,
}

impl StaticCatalog {
    /// Builds a catalog, rejecting duplicate ids and malformed targets.
    pub fn new(quests: Vec<Quest>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for quest in &quests {
            validate(quest)?;
            if !seen.insert(quest.id.as_str()) {
                return Err(CatalogError::DuplicateId(quest.id.clone()));
            }
        }
        Ok(Self { quests })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<QuestRecord> = serde_json::from_str(json)?;
        Self::new(records.into_iter().map(Quest::from).collect())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        info!("Loaded {} quests from {}", catalog.quests.len(), path.display());
        Ok(catalog)
    }

    /// The five built-in quests around Gummersbach.
    pub fn builtin() -> Self {
        Self {
            quests: builtin_quests(),
        }
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

impl QuestCatalog for StaticCatalog {
    fn get(&self, id: &str) -> Option<Quest> {
        self.quests.iter().find(|q| q.id == id).cloned()
    }

    fn all(&self) -> Vec<Quest> {
        self.quests.clone()
    }
}

fn validate(quest: &Quest) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidQuest {
        id: quest.id.clone(),
        reason: reason.to_string(),
    };

    if quest.id.trim().is_empty() {
        return Err(invalid("id must not be empty"));
    }
    let t = &quest.targets;
    if !(t.distance_km.is_finite() && t.distance_km >= 0.0) {
        return Err(invalid("target distance must be a non-negative number"));
    }
    if !(t.required_speed_mps.is_finite() && t.required_speed_mps >= 0.0) {
        return Err(invalid("required speed must be a non-negative number"));
    }
    if quest.location.is_some_and(|c| !c.is_valid()) {
        return Err(invalid("location is not a valid coordinate"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SpeedUnit {
    Mps,
    Kmh,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum SpeedRecord {
    Bare(f64),
    WithUnit { value: f64, unit: SpeedUnit },
}

impl SpeedRecord {
    fn to_mps(self) -> f64 {
        match self {
            Self::Bare(value) => value,
            Self::WithUnit {
                value,
                unit: SpeedUnit::Mps,
            } => value,
            Self::WithUnit {
                value,
                unit: SpeedUnit::Kmh,
            } => value / 3.6,
        }
    }
}

/// On-disk form of a quest.
#[derive(Debug, Deserialize)]
struct QuestRecord {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: QuestCategory,
    #[serde(default)]
    target_distance_km: f64,
    #[serde(default)]
    target_time_min: u64,
    #[serde(default)]
    required_speed: Option<SpeedRecord>,
    #[serde(default)]
    reward_gold: u32,
    #[serde(default)]
    reward_xp: u32,
    #[serde(default)]
    npc_name: String,
    #[serde(default)]
    dialogue_intro: Vec<String>,
    #[serde(default)]
    dialogue_win: Vec<String>,
    #[serde(default)]
    dialogue_lose: Vec<String>,
    #[serde(default)]
    location: Option<Coordinate>,
}

impl From<QuestRecord> for Quest {
    fn from(r: QuestRecord) -> Self {
        Quest {
            id: r.id,
            title: r.title,
            description: r.description,
            category: r.category,
            targets: QuestTargets {
                distance_km: r.target_distance_km,
                time_min: r.target_time_min,
                required_speed_mps: r.required_speed.map_or(0.0, SpeedRecord::to_mps),
            },
            reward_gold: r.reward_gold,
            reward_xp: r.reward_xp,
            npc_name: r.npc_name,
            dialogue_intro: r.dialogue_intro,
            dialogue_win: r.dialogue_win,
            dialogue_lose: r.dialogue_lose,
            location: r.location,
        }
    }
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin_quests() -> Vec<Quest> {
    vec![
        Quest {
            id: "easy_jogger1".into(),
            title: "BEGINNER JOGGER".into(),
            description: "Run 1 km in under 8 minutes".into(),
            category: QuestCategory::Easy,
            targets: QuestTargets {
                distance_km: 1.0,
                time_min: 8,
                required_speed_mps: 2.1,
            },
            reward_gold: 25,
            reward_xp: 30,
            npc_name: "Max the Jogger".into(),
            dialogue_intro: lines(&[
                "Hey! Ready for a little jog?",
                "I'm Max and I love easy running!",
                "Let's run 1 km together. Can you do it in under 8 minutes?",
            ]),
            dialogue_win: lines(&[
                "Wow! That was a great run!",
                "You've got a talent for jogging!",
                "Super time! I'm impressed!",
            ]),
            dialogue_lose: lines(&[
                "Don't worry, next time you'll make it!",
                "Hey, that was still a good try!",
                "Practice makes perfect, keep going!",
            ]),
            location: Some(Coordinate::new(51.02847, 7.56234)),
        },
        Quest {
            id: "easy_collector".into(),
            title: "NATURE LOVER".into(),
            description: "Collect points running along the lake".into(),
            category: QuestCategory::Easy,
            targets: QuestTargets {
                distance_km: 0.8,
                time_min: 0,
                required_speed_mps: 1.7,
            },
            reward_gold: 20,
            reward_xp: 35,
            npc_name: "Emma the Collector".into(),
            dialogue_intro: lines(&[
                "Hello! I love collecting memories while running!",
                "Let's run 800 m and enjoy the scenery!",
            ]),
            dialogue_win: lines(&[
                "That was a wonderful lap!",
                "Great! You kept a good pace!",
            ]),
            dialogue_lose: lines(&[
                "Never mind! The scenery was still beautiful!",
                "Next time we'll take it a bit slower!",
            ]),
            location: Some(Coordinate::new(51.02756, 7.56445)),
        },
        Quest {
            id: "easy_explorer".into(),
            title: "PARK EXPLORER".into(),
            description: "Explore 1.2 km through the park".into(),
            category: QuestCategory::Easy,
            targets: QuestTargets {
                distance_km: 1.2,
                time_min: 12,
                required_speed_mps: 1.7,
            },
            reward_gold: 30,
            reward_xp: 40,
            npc_name: "Ben the Explorer".into(),
            dialogue_intro: lines(&[
                "Hey adventurer! Ready to explore the park?",
                "Let's run 1.2 km through the nicest corners!",
            ]),
            dialogue_win: lines(&[
                "Amazing! You really know your way around!",
                "Fantastic! You're a true park expert!",
            ]),
            dialogue_lose: lines(&[
                "Too bad! But the park was still fun!",
                "Next time I'll show you a shorter route!",
            ]),
            location: Some(Coordinate::new(51.02945, 7.56123)),
        },
        Quest {
            id: "medium_runner".into(),
            title: "ENDURANCE RUNNER".into(),
            description: "Run 3 km in under 18 minutes".into(),
            category: QuestCategory::Medium,
            targets: QuestTargets {
                distance_km: 3.0,
                time_min: 18,
                required_speed_mps: 2.8,
            },
            reward_gold: 75,
            reward_xp: 100,
            npc_name: "Sarah the Runner".into(),
            dialogue_intro: lines(&[
                "Time for a real challenge!",
                "3 km in 18 minutes, are you ready?",
            ]),
            dialogue_win: lines(&[
                "Incredible! That was a top performance!",
                "Wow! You run like a pro!",
            ]),
            dialogue_lose: lines(&[
                "You were close! Next time you'll make it!",
                "Not bad! You've got potential!",
            ]),
            location: Some(Coordinate::new(51.02634, 7.56789)),
        },
        Quest {
            id: "hard_marathon".into(),
            title: "MARATHON MASTER".into(),
            description: "An intense 5 km in under 25 minutes".into(),
            category: QuestCategory::Hard,
            targets: QuestTargets {
                distance_km: 5.0,
                time_min: 25,
                required_speed_mps: 3.3,
            },
            reward_gold: 150,
            reward_xp: 250,
            npc_name: "Marcus the Marathon King".into(),
            dialogue_intro: lines(&[
                "You think you're ready for the top league?",
                "5 km in 25 minutes, that's only for pros!",
            ]),
            dialogue_win: lines(&[
                "UNBELIEVABLE! You're a true champion!",
                "WORLD CLASS! I rarely see runners like you!",
            ]),
            dialogue_lose: lines(&[
                "Respect! Just trying takes courage!",
                "You weren't that far from the goal!",
            ]),
            location: Some(Coordinate::new(51.02523, 7.56567)),
        },
    ]
}
