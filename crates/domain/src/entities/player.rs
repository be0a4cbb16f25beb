use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{NpcId, PlayerId, SessionId};
use crate::value_objects::{stat_from_state, DEFAULT_PLAYER_HP};

/// Numeric and boolean player state, stored as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(default)]
    pub numeric: BTreeMap<String, i32>,
    #[serde(default)]
    pub boolean: BTreeMap<String, bool>,
}

impl Default for PlayerState {
    fn default() -> Self {
        let numeric = BTreeMap::from([
            ("HP".to_string(), DEFAULT_PLAYER_HP),
            ("MP".to_string(), 50),
            ("gold".to_string(), 0),
        ]);
        Self {
            numeric,
            boolean: BTreeMap::new(),
        }
    }
}

impl PlayerState {
    pub fn hp(&self) -> i32 {
        self.numeric.get("HP").copied().unwrap_or(0)
    }

    pub fn max_hp(&self) -> i32 {
        self.numeric
            .get("MAX_HP")
            .copied()
            .unwrap_or(DEFAULT_PLAYER_HP)
    }

    pub fn gold(&self) -> i32 {
        self.numeric.get("gold").copied().unwrap_or(0)
    }

    /// Parse a raw JSON state, tolerating the flat `{"hp": 10}` shape.
    pub fn from_json(value: &serde_json::Value) -> Self {
        if let Ok(state) = serde_json::from_value::<PlayerState>(value.clone()) {
            if !state.numeric.is_empty() || !state.boolean.is_empty() {
                return state;
            }
        }
        let mut state = Self::default();
        for key in ["HP", "MP", "gold"] {
            if let Some(v) = stat_from_state(value, key) {
                state.numeric.insert(key.to_string(), v);
            }
        }
        state
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,
    pub session_id: SessionId,
    pub name: String,
    pub description: Option<String>,
    pub state: PlayerState,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerHpUpdate {
    pub player_id: PlayerId,
    pub current_hp: i32,
    pub max_hp: i32,
    pub hp_change: i32,
}

/// Player-to-NPC affinity row joined with the NPC's names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerNpcRelation {
    pub npc_id: NpcId,
    pub npc_name: String,
    pub scenario_npc_id: String,
    pub affinity_score: i32,
    pub relation_type: String,
    pub interaction_count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcAffinityUpdate {
    pub player_id: PlayerId,
    pub npc_id: NpcId,
    pub new_affinity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub player_id: PlayerId,
    pub item_id: i32,
    pub item_name: String,
    pub item_type: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUpdate {
    pub player_id: PlayerId,
    pub item_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGrant {
    pub player_id: PlayerId,
    pub item_id: i32,
    pub quantity: i32,
    pub total_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConsumption {
    pub player_id: PlayerId,
    pub item_id: i32,
    pub quantity: i32,
    pub remaining_quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_state_matches_new_player_row() {
        let state = PlayerState::default();
        assert_eq!(state.hp(), 100);
        assert_eq!(state.numeric.get("MP"), Some(&50));
        assert_eq!(state.gold(), 0);
        assert_eq!(state.max_hp(), 100);
    }

    #[test]
    fn from_json_reads_nested_state() {
        let state = PlayerState::from_json(&json!({
            "numeric": {"HP": 7, "gold": 339},
            "boolean": {"has_key": true}
        }));
        assert_eq!(state.hp(), 7);
        assert_eq!(state.gold(), 339);
        assert_eq!(state.boolean.get("has_key"), Some(&true));
    }

    #[test]
    fn from_json_accepts_flat_legacy_state() {
        let state = PlayerState::from_json(&json!({"hp": 42}));
        assert_eq!(state.hp(), 42);
        assert_eq!(state.numeric.get("MP"), Some(&50));
    }
}
