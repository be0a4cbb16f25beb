use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{NpcId, ScenarioId, SessionId};

/// Session-scoped NPC instance (or a master row when `session_id` is the template id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub npc_id: NpcId,
    pub session_id: SessionId,
    pub scenario_id: Option<ScenarioId>,
    pub scenario_npc_id: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub state: serde_json::Value,
    pub current_hp: i32,
    pub assigned_sequence_id: Option<String>,
    pub assigned_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Ad-hoc NPC spawned mid-session (not part of the scenario template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSpawn {
    pub scenario_npc_id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub state: serde_json::Value,
    pub hp: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnedEntity {
    pub instance_id: Uuid,
    pub scenario_entity_id: String,
    pub name: String,
}
