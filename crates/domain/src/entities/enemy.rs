use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EnemyId, ScenarioId, SessionId};

/// Session-scoped enemy instance.
///
/// `current_hp` never goes below 0; reaching 0 sets `is_defeated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub enemy_instance_id: EnemyId,
    pub session_id: SessionId,
    pub scenario_id: Option<ScenarioId>,
    pub scenario_enemy_id: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub state: serde_json::Value,
    pub current_hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub dropped_items: Vec<i32>,
    pub is_defeated: bool,
    pub defeated_at: Option<DateTime<Utc>>,
    pub assigned_sequence_id: Option<String>,
    pub assigned_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub scenario_enemy_id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub state: serde_json::Value,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub dropped_items: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyHpUpdate {
    pub enemy_instance_id: EnemyId,
    pub current_hp: i32,
    pub max_hp: i32,
    pub hp_change: i32,
    pub is_defeated: bool,
}
