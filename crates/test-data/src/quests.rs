//! Quest fixtures.

use journey::models::{Coordinate, Quest, QuestCategory, QuestTargets};

/// Fluent builder for [`Quest`] fixtures.
#[derive(Debug, Clone)]
pub struct QuestBuilder {
    quest: Quest,
}

impl QuestBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            quest: Quest {
                id: id.to_string(),
                title: id.replace('_', " "),
                npc_name: "Coach".to_string(),
                dialogue_win: vec!["Well run!".to_string()],
                dialogue_lose: vec!["Try again tomorrow.".to_string()],
                ..Default::default()
            },
        }
    }

    /// The 1 km / 8 min / 2.1 m/s jogger quest worth 25 gold and 30 xp.
    pub fn jogger() -> Self {
        Self::new("easy_jogger1")
            .category(QuestCategory::Easy)
            .targets(1.0, 8, 2.1)
            .rewards(25, 30)
    }

    pub fn title(mut self, title: &str) -> Self {
        self.quest.title = title.to_string();
        self
    }

    pub fn category(mut self, category: QuestCategory) -> Self {
        self.quest.category = category;
        self
    }

    pub fn targets(mut self, distance_km: f64, time_min: u64, required_speed_mps: f64) -> Self {
        self.quest.targets = QuestTargets {
            distance_km,
            time_min,
            required_speed_mps,
        };
        self
    }

    /// Sets the required speed from km/h.
    pub fn required_speed_kmh(mut self, kmh: f64) -> Self {
        self.quest.targets.required_speed_mps = kmh / 3.6;
        self
    }

    pub fn rewards(mut self, gold: u32, xp: u32) -> Self {
        self.quest.reward_gold = gold;
        self.quest.reward_xp = xp;
        self
    }

    pub fn npc(mut self, name: &str) -> Self {
        self.quest.npc_name = name.to_string();
        self
    }

    pub fn win_lines(mut self, lines: &[&str]) -> Self {
        self.quest.dialogue_win = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn lose_lines(mut self, lines: &[&str]) -> Self {
        self.quest.dialogue_lose = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn location(mut self, at: Coordinate) -> Self {
        self.quest.location = Some(at);
        self
    }

    pub fn build(self) -> Quest {
        self.quest
    }

    /// Serializes the quest in catalog-file form, with the speed in km/h.
    pub fn to_catalog_json(&self) -> serde_json::Value {
        let q = &self.quest;
        serde_json::json!({
            "id": q.id,
            "title": q.title,
            "description": q.description,
            "category": q.category,
            "target_distance_km": q.targets.distance_km,
            "target_time_min": q.targets.time_min,
            "required_speed": { "value": q.targets.required_speed_mps * 3.6, "unit": "kmh" },
            "reward_gold": q.reward_gold,
            "reward_xp": q.reward_xp,
            "npc_name": q.npc_name,
            "dialogue_intro": q.dialogue_intro,
            "dialogue_win": q.dialogue_win,
            "dialogue_lose": q.dialogue_lose,
            "location": q.location,
        })
    }
}
