use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use statedb_domain::{
    Enemy, EnemyId, InventoryEntry, Npc, Phase, Player, Session, TurnState,
};

/// Everything the GM needs to describe the current moment of a session.
///
/// Assembled from independent reads; there is no cross-read consistency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub session: Session,
    pub player: Option<Player>,
    pub npcs: Vec<Npc>,
    /// Active enemies only.
    pub enemies: Vec<Enemy>,
    pub inventory: Vec<InventoryEntry>,
    pub phase: Phase,
    pub turn: Option<TurnState>,
    pub snapshot_timestamp: DateTime<Utc>,
}

/// Which keys of a change set were applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteResult {
    pub status: &'static str,
    pub message: String,
    pub updated_fields: Vec<&'static str>,
}

impl WriteResult {
    pub(super) fn from_fields(updated_fields: Vec<&'static str>) -> Self {
        let message = if updated_fields.is_empty() {
            "No changes applied".to_string()
        } else {
            format!("State updated: {}", updated_fields.join(", "))
        };
        Self {
            status: "success",
            message,
            updated_fields,
        }
    }
}

/// Result of running one player action through judgment and state write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Success {
        judgment: Value,
        apply_result: WriteResult,
        final_state: Box<StateSnapshot>,
    },
    /// The Rule Engine judged the action a failure; nothing was written.
    Skipped { message: String, judgment: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatResult {
    pub victory: bool,
    pub phase: Phase,
    pub removed_enemies: Vec<EnemyId>,
    pub message: String,
}
