use serde::{Deserialize, Serialize};

use crate::ids::{ScenarioId, SessionId};

/// Item definition scoped to a session (or the template session).
///
/// `item_id` is the author-assigned integer, unique within a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: i32,
    pub session_id: SessionId,
    pub scenario_id: Option<ScenarioId>,
    pub name: String,
    pub description: Option<String>,
    pub item_type: String,
    pub meta: serde_json::Value,
}
