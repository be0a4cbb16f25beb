//! Append-only turn/phase logs and the aggregates the TRACE endpoints compute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;
use crate::value_objects::Phase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub history_id: i64,
    pub session_id: SessionId,
    pub turn_number: i32,
    pub phase_at_turn: Phase,
    pub turn_type: String,
    pub state_changes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnPhaseStatistics {
    pub phase: Phase,
    pub turn_count: i64,
    pub first_turn: i32,
    pub last_turn: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnTypeStatistics {
    pub turn_type: String,
    pub turn_count: i64,
}

/// Wall-clock time between a turn and the next one (open-ended for the latest turn).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDuration {
    pub turn_number: i32,
    pub phase_at_turn: Phase,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub session_id: SessionId,
    pub total_turns: i64,
    pub latest_turn: Option<i32>,
    pub first_turn_at: Option<DateTime<Utc>>,
    pub last_turn_at: Option<DateTime<Utc>>,
    pub by_phase: Vec<TurnPhaseStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub history_id: i64,
    pub session_id: SessionId,
    pub previous_phase: Option<Phase>,
    pub new_phase: Phase,
    pub turn_at_transition: i32,
    pub transition_reason: String,
    pub transitioned_at: DateTime<Utc>,
}

/// Time spent in one phase, summed over every visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStatistics {
    pub phase: Phase,
    pub entered_count: i64,
    pub total_seconds: f64,
}

/// How often the session moved from one phase to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePattern {
    pub previous_phase: Option<Phase>,
    pub new_phase: Phase,
    pub occurrences: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub session_id: SessionId,
    pub total_transitions: i64,
    pub current_phase: Option<Phase>,
    pub first_transition_at: Option<DateTime<Utc>>,
    pub last_transition_at: Option<DateTime<Utc>>,
    pub statistics: Vec<PhaseStatistics>,
}
