//! Query-string parameters.

use serde::Deserialize;
use statedb_domain::SessionId;
use validator::Validate;

fn default_true() -> bool {
    true
}

fn default_recent_turns() -> i64 {
    10
}

fn default_recent_phases() -> i64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveOnlyQuery {
    #[serde(default = "default_true")]
    pub active_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionQuery {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecentTurnsQuery {
    #[serde(default = "default_recent_turns")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TurnRangeQuery {
    #[validate(range(min = 1))]
    pub start: i32,
    #[validate(range(min = 1))]
    pub end: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecentPhasesQuery {
    #[serde(default = "default_recent_phases")]
    #[validate(range(min = 1, max = 50))]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseFilterQuery {
    pub phase: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhaseRangeQuery {
    #[validate(range(min = 0))]
    pub start_turn: i32,
    #[validate(range(min = 0))]
    pub end_turn: i32,
}
