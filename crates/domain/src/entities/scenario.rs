use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ScenarioId;

/// Scenario metadata row. Root of a template tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: ScenarioId,
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAct {
    pub act_id: String,
    pub act_name: String,
    pub act_description: Option<String>,
    pub exit_criteria: Option<String>,
    pub act_order: i32,
    pub sequence_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSequence {
    pub sequence_id: String,
    pub sequence_name: String,
    pub act_id: Option<String>,
    pub location_name: Option<String>,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub exit_triggers: Vec<String>,
    pub sequence_order: i32,
    pub npc_ids: Vec<String>,
    pub enemy_ids: Vec<String>,
    pub item_ids: Vec<String>,
}

/// Scenario with its ordered acts and sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDetail {
    #[serde(flatten)]
    pub scenario: Scenario,
    pub acts: Vec<ScenarioAct>,
    pub sequences: Vec<ScenarioSequence>,
}

/// The act a session currently sits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActDetails {
    pub scenario_id: ScenarioId,
    #[serde(flatten)]
    pub act: ScenarioAct,
}
