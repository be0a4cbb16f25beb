//! Session rows and the narrow projections the INQUIRY endpoints return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{EntityRelation, PlayerNpcRelation, ScenarioSequence};
use crate::ids::{PlayerId, ScenarioId, SessionId};
use crate::value_objects::{Phase, SessionStatus};

/// One play-through instance.
///
/// `current_act`/`current_sequence` are 1-based ordinals; the string ids are
/// resolved against the scenario's acts/sequences (or `act-N`/`seq-N` when the
/// scenario has none at that ordinal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub scenario_id: ScenarioId,
    pub player_id: Option<PlayerId>,
    pub current_act: i32,
    pub current_act_id: String,
    pub current_sequence: i32,
    pub current_sequence_id: String,
    pub current_phase: Phase,
    pub current_turn: i32,
    pub location: Option<String>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    pub session_id: SessionId,
    pub current_phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub session_id: SessionId,
    pub current_turn: i32,
    pub phase_at_turn: Option<Phase>,
    pub turn_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActState {
    pub session_id: SessionId,
    pub current_act: i32,
    pub current_act_id: String,
    pub act_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceState {
    pub session_id: SessionId,
    pub current_sequence: i32,
    pub current_sequence_id: String,
    pub sequence_name: Option<String>,
    pub location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    pub session_id: SessionId,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub session_id: SessionId,
    pub scenario_id: ScenarioId,
    pub current_act: i32,
    pub current_act_id: String,
    pub current_sequence: i32,
    pub current_sequence_id: String,
    pub current_phase: Phase,
    pub current_turn: i32,
    pub location: Option<String>,
    pub status: SessionStatus,
}

/// Where the session is in its scenario, with human-readable names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub scenario_id: ScenarioId,
    pub scenario_title: String,
    pub current_act: i32,
    pub current_act_id: String,
    pub act_name: Option<String>,
    pub current_sequence: i32,
    pub current_sequence_id: String,
    pub sequence_name: Option<String>,
    pub location: Option<String>,
    pub current_phase: Phase,
    pub current_turn: i32,
    pub status: SessionStatus,
}

/// An NPC or enemy instance placed in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntity {
    pub id: Uuid,
    pub scenario_entity_id: String,
    pub name: String,
    pub description: Option<String>,
    pub entity_type: String,
    pub tags: Vec<String>,
    pub state: serde_json::Value,
    pub is_defeated: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDetails {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub sequence: ScenarioSequence,
    pub npcs: Vec<SequenceEntity>,
    pub enemies: Vec<SequenceEntity>,
    pub entity_relations: Vec<EntityRelation>,
    pub player_npc_relations: Vec<PlayerNpcRelation>,
}
