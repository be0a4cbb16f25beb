//! JSON request bodies.
//!
//! Ids arrive as UUID strings and are typed here, so a malformed id is rejected
//! while the body is parsed. `SessionStartRequest::scenario_id` is the exception:
//! it stays a string and is parsed explicitly so the error names the field.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use statedb_domain::value_objects::{
    DEFAULT_ENEMY_ATTACK, DEFAULT_ENEMY_DEFENSE, DEFAULT_ENEMY_HP, DEFAULT_NPC_HP,
};
use statedb_domain::{EnemyId, NpcId, Phase, PlayerId, SessionId};
use validator::Validate;

fn default_ordinal() -> i32 {
    1
}

fn default_location() -> String {
    "Starting Town".to_string()
}

fn default_reason() -> String {
    "unknown".to_string()
}

fn default_npc_hp() -> i32 {
    DEFAULT_NPC_HP
}

fn default_enemy_hp() -> i32 {
    DEFAULT_ENEMY_HP
}

fn default_enemy_attack() -> i32 {
    DEFAULT_ENEMY_ATTACK
}

fn default_enemy_defense() -> i32 {
    DEFAULT_ENEMY_DEFENSE
}

fn default_npc_tags() -> Vec<String> {
    vec!["npc".to_string()]
}

fn default_enemy_tags() -> Vec<String> {
    vec!["enemy".to_string()]
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Accept author keys written either as strings or as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Text(String),
        Number(i64),
    }

    Ok(match Key::deserialize(deserializer)? {
        Key::Text(s) => s,
        Key::Number(n) => n.to_string(),
    })
}

// =============================================================================
// START
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionStartRequest {
    pub scenario_id: String,
    #[serde(default = "default_ordinal")]
    #[validate(range(min = 1))]
    pub current_act: i32,
    #[serde(default = "default_ordinal")]
    #[validate(range(min = 1))]
    pub current_sequence: i32,
    #[serde(default = "default_location")]
    pub location: String,
}

// =============================================================================
// UPDATE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerHpUpdateRequest {
    pub session_id: SessionId,
    pub hp_change: i32,
    #[serde(default = "default_reason")]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatsUpdateRequest {
    pub session_id: SessionId,
    pub stat_changes: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InventoryUpdateRequest {
    pub player_id: PlayerId,
    pub item_id: i32,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcAffinityUpdateRequest {
    pub player_id: PlayerId,
    pub npc_id: NpcId,
    pub affinity_change: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationUpdateRequest {
    #[validate(length(min = 1, max = 200))]
    pub new_location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyHpUpdateRequest {
    pub session_id: SessionId,
    pub hp_change: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemEarnRequest {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemUseRequest {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

// =============================================================================
// MANAGE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseChangeRequest {
    pub new_phase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActChangeRequest {
    #[validate(range(min = 1))]
    pub new_act: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SequenceChangeRequest {
    #[validate(range(min = 1))]
    pub new_sequence: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NpcSpawnRequest {
    #[serde(deserialize_with = "string_or_number")]
    #[validate(length(min = 1))]
    pub npc_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_npc_tags")]
    pub tags: Vec<String>,
    #[serde(default = "empty_object")]
    pub state: serde_json::Value,
    #[serde(default = "default_npc_hp")]
    #[validate(range(min = 0))]
    pub hp: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EnemySpawnRequest {
    #[serde(deserialize_with = "string_or_number")]
    #[validate(length(min = 1))]
    pub enemy_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enemy_tags")]
    pub tags: Vec<String>,
    #[serde(default = "empty_object")]
    pub state: serde_json::Value,
    #[serde(default = "default_enemy_hp")]
    #[validate(range(min = 0))]
    pub hp: i32,
    #[serde(default = "default_enemy_attack")]
    pub attack: i32,
    #[serde(default = "default_enemy_defense")]
    pub defense: i32,
    #[serde(default)]
    pub dropped_items: Vec<i32>,
}

// =============================================================================
// State service
// =============================================================================

/// Sparse set of state changes. Absent keys are left untouched.
///
/// The same shape arrives from clients and inside a Rule Engine judgment
/// (`state_changes`). Player-scoped keys need `player_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StateChanges {
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub player_hp: Option<i32>,
    #[serde(default)]
    pub player_stats: Option<BTreeMap<String, i32>>,
    #[serde(default)]
    pub enemy_hp: Option<BTreeMap<EnemyId, i32>>,
    #[serde(default)]
    pub npc_affinity: Option<BTreeMap<NpcId, i32>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub phase: Option<Phase>,
    #[serde(default)]
    pub turn_increment: bool,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub act: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub sequence: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEndRequest {
    pub victory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerActionRequest {
    pub player_id: PlayerId,
    pub action: serde_json::Map<String, serde_json::Value>,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiKeyCreateRequest {
    #[validate(length(min = 1, max = 100))]
    pub key_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_start_defaults() {
        let request: SessionStartRequest =
            serde_json::from_value(json!({"scenario_id": "abc"})).unwrap();
        assert_eq!(request.current_act, 1);
        assert_eq!(request.current_sequence, 1);
        assert_eq!(request.location, "Starting Town");
    }

    #[test]
    fn session_start_rejects_act_zero() {
        let request: SessionStartRequest =
            serde_json::from_value(json!({"scenario_id": "abc", "current_act": 0})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn state_changes_reject_non_positive_act_and_sequence() {
        let changes: StateChanges = serde_json::from_value(json!({"act": 0})).unwrap();
        assert!(changes.validate().is_err());
        let changes: StateChanges = serde_json::from_value(json!({"sequence": -3})).unwrap();
        assert!(changes.validate().is_err());
        let changes: StateChanges =
            serde_json::from_value(json!({"act": 2, "sequence": 1, "player_hp": -500})).unwrap();
        assert!(changes.validate().is_ok());
        assert!(StateChanges::default().validate().is_ok());
    }

    #[test]
    fn spawn_accepts_numeric_entity_key() {
        let request: EnemySpawnRequest =
            serde_json::from_value(json!({"enemy_id": 7, "name": "Rat"})).unwrap();
        assert_eq!(request.enemy_id, "7");
        assert_eq!(request.hp, 30);
        assert_eq!(request.attack, 10);
        assert_eq!(request.defense, 5);
        assert_eq!(request.tags, vec!["enemy".to_string()]);
    }

    #[test]
    fn state_changes_are_sparse() {
        let enemy = "5b1f3a9e-7c1d-4b1a-9f3e-2d4c6b8a0e11";
        let changes: StateChanges = serde_json::from_value(json!({
            "enemy_hp": {enemy: -12},
            "phase": "combat",
            "turn_increment": true
        }))
        .unwrap();
        assert_eq!(changes.phase, Some(Phase::Combat));
        assert!(changes.turn_increment);
        assert!(changes.player_hp.is_none());
        let enemy_id: EnemyId = enemy.parse().unwrap();
        assert_eq!(changes.enemy_hp.unwrap().get(&enemy_id), Some(&-12));
    }

    #[test]
    fn api_key_name_must_not_be_empty() {
        let request = ApiKeyCreateRequest {
            key_name: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn malformed_session_id_fails_to_parse() {
        let result: Result<EnemyHpUpdateRequest, _> =
            serde_json::from_value(json!({"session_id": "nope", "hp_change": -5}));
        assert!(result.is_err());
    }
}
