//! Row decoding helpers shared by the Postgres repositories.
//!
//! Column lists live next to the decoders so every query selecting an entity
//! returns exactly the shape its `row_to_*` function expects.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Decode, Postgres, Row, Type};
use uuid::Uuid;

use statedb_domain::*;

use crate::infrastructure::ports::RepoError;

// =============================================================================
// Row Extension Trait
// =============================================================================

pub(super) trait RowExt {
    /// Decode a column, mapping failures to `RepoError::Database("decode")`.
    fn col<'r, T>(&'r self, name: &str) -> Result<T, RepoError>
    where
        T: Decode<'r, Postgres> + Type<Postgres>;

    fn phase(&self, name: &str) -> Result<Phase, RepoError>;

    fn optional_phase(&self, name: &str) -> Result<Option<Phase>, RepoError>;

    fn status(&self, name: &str) -> Result<SessionStatus, RepoError>;
}

impl RowExt for PgRow {
    fn col<'r, T>(&'r self, name: &str) -> Result<T, RepoError>
    where
        T: Decode<'r, Postgres> + Type<Postgres>,
    {
        self.try_get(name)
            .map_err(|e| RepoError::database("decode", format!("{name}: {e}")))
    }

    fn phase(&self, name: &str) -> Result<Phase, RepoError> {
        let raw: String = self.col(name)?;
        raw.parse().map_err(RepoError::serialization)
    }

    fn optional_phase(&self, name: &str) -> Result<Option<Phase>, RepoError> {
        let raw: Option<String> = self.col(name)?;
        raw.map(|p| p.parse::<Phase>().map_err(RepoError::serialization))
            .transpose()
    }

    fn status(&self, name: &str) -> Result<SessionStatus, RepoError> {
        let raw: String = self.col(name)?;
        raw.parse().map_err(RepoError::serialization)
    }
}

// =============================================================================
// Scenario
// =============================================================================

pub(super) const SCENARIO_COLUMNS: &str =
    "scenario_id, title, description, is_published, created_at, updated_at";

pub(super) const ACT_COLUMNS: &str =
    "act_id, act_name, act_description, exit_criteria, act_order, sequence_ids";

pub(super) const SEQUENCE_COLUMNS: &str = "sequence_id, sequence_name, act_id, location_name, \
     description, goal, exit_triggers, sequence_order, npc_ids, enemy_ids, item_ids";

pub(super) fn row_to_scenario(row: &PgRow) -> Result<Scenario, RepoError> {
    Ok(Scenario {
        scenario_id: ScenarioId::from_uuid(row.col("scenario_id")?),
        title: row.col("title")?,
        description: row.col("description")?,
        is_published: row.col("is_published")?,
        created_at: row.col("created_at")?,
        updated_at: row.col("updated_at")?,
    })
}

pub(super) fn row_to_act(row: &PgRow) -> Result<ScenarioAct, RepoError> {
    let Json(sequence_ids): Json<Vec<String>> = row.col("sequence_ids")?;
    Ok(ScenarioAct {
        act_id: row.col("act_id")?,
        act_name: row.col("act_name")?,
        act_description: row.col("act_description")?,
        exit_criteria: row.col("exit_criteria")?,
        act_order: row.col("act_order")?,
        sequence_ids,
    })
}

pub(super) fn row_to_sequence(row: &PgRow) -> Result<ScenarioSequence, RepoError> {
    let Json(exit_triggers): Json<Vec<String>> = row.col("exit_triggers")?;
    let Json(npc_ids): Json<Vec<String>> = row.col("npc_ids")?;
    let Json(enemy_ids): Json<Vec<String>> = row.col("enemy_ids")?;
    let Json(item_ids): Json<Vec<String>> = row.col("item_ids")?;
    Ok(ScenarioSequence {
        sequence_id: row.col("sequence_id")?,
        sequence_name: row.col("sequence_name")?,
        act_id: row.col("act_id")?,
        location_name: row.col("location_name")?,
        description: row.col("description")?,
        goal: row.col("goal")?,
        exit_triggers,
        sequence_order: row.col("sequence_order")?,
        npc_ids,
        enemy_ids,
        item_ids,
    })
}

// =============================================================================
// Session
// =============================================================================

/// Session columns, aliased `s` with the player joined as `p`.
pub(super) const SESSION_SELECT: &str = "SELECT s.session_id, s.scenario_id, p.player_id, \
     s.current_act, s.current_act_id, s.current_sequence, s.current_sequence_id, \
     s.current_phase, s.current_turn, s.location, s.status, \
     s.started_at, s.ended_at, s.paused_at, s.updated_at \
     FROM session s LEFT JOIN player p ON p.session_id = s.session_id";

pub(super) fn row_to_session(row: &PgRow) -> Result<Session, RepoError> {
    let player_id: Option<Uuid> = row.col("player_id")?;
    Ok(Session {
        session_id: SessionId::from_uuid(row.col("session_id")?),
        scenario_id: ScenarioId::from_uuid(row.col("scenario_id")?),
        player_id: player_id.map(PlayerId::from_uuid),
        current_act: row.col("current_act")?,
        current_act_id: row.col("current_act_id")?,
        current_sequence: row.col("current_sequence")?,
        current_sequence_id: row.col("current_sequence_id")?,
        current_phase: row.phase("current_phase")?,
        current_turn: row.col("current_turn")?,
        location: row.col("location")?,
        status: row.status("status")?,
        started_at: row.col("started_at")?,
        ended_at: row.col("ended_at")?,
        paused_at: row.col("paused_at")?,
        updated_at: row.col("updated_at")?,
    })
}

// =============================================================================
// Player
// =============================================================================

pub(super) const PLAYER_COLUMNS: &str =
    "player_id, session_id, name, description, state, tags, created_at";

pub(super) fn row_to_player(row: &PgRow) -> Result<Player, RepoError> {
    let state: serde_json::Value = row.col("state")?;
    Ok(Player {
        player_id: PlayerId::from_uuid(row.col("player_id")?),
        session_id: SessionId::from_uuid(row.col("session_id")?),
        name: row.col("name")?,
        description: row.col("description")?,
        state: PlayerState::from_json(&state),
        tags: row.col("tags")?,
        created_at: row.col("created_at")?,
    })
}

/// Expects `r` = player_npc_relations joined with `n` = npc.
pub(super) const PLAYER_NPC_RELATION_SELECT: &str = "SELECT r.npc_id, n.name AS npc_name, \
     n.scenario_npc_id, r.affinity_score, r.relation_type, r.interaction_count \
     FROM player_npc_relations r JOIN npc n ON n.npc_id = r.npc_id";

pub(super) fn row_to_player_npc_relation(row: &PgRow) -> Result<PlayerNpcRelation, RepoError> {
    Ok(PlayerNpcRelation {
        npc_id: NpcId::from_uuid(row.col("npc_id")?),
        npc_name: row.col("npc_name")?,
        scenario_npc_id: row.col("scenario_npc_id")?,
        affinity_score: row.col("affinity_score")?,
        relation_type: row.col("relation_type")?,
        interaction_count: row.col("interaction_count")?,
    })
}

pub(super) fn row_to_inventory_entry(row: &PgRow) -> Result<InventoryEntry, RepoError> {
    Ok(InventoryEntry {
        player_id: PlayerId::from_uuid(row.col("player_id")?),
        item_id: row.col("item_id")?,
        item_name: row.col("item_name")?,
        item_type: row.col("item_type")?,
        description: row.col("description")?,
        quantity: row.col("quantity")?,
        acquired_at: row.col("acquired_at")?,
    })
}

// =============================================================================
// Session entities
// =============================================================================

pub(super) const NPC_COLUMNS: &str = "npc_id, session_id, scenario_id, scenario_npc_id, name, \
     description, tags, state, current_hp, assigned_sequence_id, assigned_location, created_at";

pub(super) const ENEMY_COLUMNS: &str = "enemy_id, session_id, scenario_id, scenario_enemy_id, \
     name, description, tags, state, current_hp, max_hp, attack, defense, dropped_items, \
     is_defeated, defeated_at, assigned_sequence_id, assigned_location, created_at";

pub(super) const ITEM_COLUMNS: &str =
    "item_id, session_id, scenario_id, name, description, item_type, meta";

pub(super) fn row_to_npc(row: &PgRow) -> Result<Npc, RepoError> {
    let scenario_id: Option<Uuid> = row.col("scenario_id")?;
    Ok(Npc {
        npc_id: NpcId::from_uuid(row.col("npc_id")?),
        session_id: SessionId::from_uuid(row.col("session_id")?),
        scenario_id: scenario_id.map(ScenarioId::from_uuid),
        scenario_npc_id: row.col("scenario_npc_id")?,
        name: row.col("name")?,
        description: row.col("description")?,
        tags: row.col("tags")?,
        state: row.col("state")?,
        current_hp: row.col("current_hp")?,
        assigned_sequence_id: row.col("assigned_sequence_id")?,
        assigned_location: row.col("assigned_location")?,
        created_at: row.col("created_at")?,
    })
}

pub(super) fn row_to_enemy(row: &PgRow) -> Result<Enemy, RepoError> {
    let scenario_id: Option<Uuid> = row.col("scenario_id")?;
    Ok(Enemy {
        enemy_instance_id: EnemyId::from_uuid(row.col("enemy_id")?),
        session_id: SessionId::from_uuid(row.col("session_id")?),
        scenario_id: scenario_id.map(ScenarioId::from_uuid),
        scenario_enemy_id: row.col("scenario_enemy_id")?,
        name: row.col("name")?,
        description: row.col("description")?,
        tags: row.col("tags")?,
        state: row.col("state")?,
        current_hp: row.col("current_hp")?,
        max_hp: row.col("max_hp")?,
        attack: row.col("attack")?,
        defense: row.col("defense")?,
        dropped_items: row.col("dropped_items")?,
        is_defeated: row.col("is_defeated")?,
        defeated_at: row.col("defeated_at")?,
        assigned_sequence_id: row.col("assigned_sequence_id")?,
        assigned_location: row.col("assigned_location")?,
        created_at: row.col("created_at")?,
    })
}

pub(super) fn row_to_item(row: &PgRow) -> Result<Item, RepoError> {
    let scenario_id: Option<Uuid> = row.col("scenario_id")?;
    Ok(Item {
        item_id: row.col("item_id")?,
        session_id: SessionId::from_uuid(row.col("session_id")?),
        scenario_id: scenario_id.map(ScenarioId::from_uuid),
        name: row.col("name")?,
        description: row.col("description")?,
        item_type: row.col("item_type")?,
        meta: row.col("meta")?,
    })
}

/// Expects `id, scenario_entity_id, name, description, entity_type, tags, state, is_defeated`.
pub(super) fn row_to_sequence_entity(row: &PgRow) -> Result<SequenceEntity, RepoError> {
    Ok(SequenceEntity {
        id: row.col("id")?,
        scenario_entity_id: row.col("scenario_entity_id")?,
        name: row.col("name")?,
        description: row.col("description")?,
        entity_type: row.col("entity_type")?,
        tags: row.col("tags")?,
        state: row.col("state")?,
        is_defeated: row.col("is_defeated")?,
    })
}

// =============================================================================
// History
// =============================================================================

pub(super) const TURN_COLUMNS: &str =
    "history_id, session_id, turn_number, phase_at_turn, turn_type, state_changes, created_at";

pub(super) const PHASE_COLUMNS: &str = "history_id, session_id, previous_phase, new_phase, \
     turn_at_transition, transition_reason, transitioned_at";

pub(super) fn row_to_turn(row: &PgRow) -> Result<TurnRecord, RepoError> {
    Ok(TurnRecord {
        history_id: row.col("history_id")?,
        session_id: SessionId::from_uuid(row.col("session_id")?),
        turn_number: row.col("turn_number")?,
        phase_at_turn: row.phase("phase_at_turn")?,
        turn_type: row.col("turn_type")?,
        state_changes: row.col("state_changes")?,
        created_at: row.col("created_at")?,
    })
}

pub(super) fn row_to_phase_transition(row: &PgRow) -> Result<PhaseTransition, RepoError> {
    Ok(PhaseTransition {
        history_id: row.col("history_id")?,
        session_id: SessionId::from_uuid(row.col("session_id")?),
        previous_phase: row.optional_phase("previous_phase")?,
        new_phase: row.phase("new_phase")?,
        turn_at_transition: row.col("turn_at_transition")?,
        transition_reason: row.col("transition_reason")?,
        transitioned_at: row.col::<DateTime<Utc>>("transitioned_at")?,
    })
}

// =============================================================================
// Auth
// =============================================================================

pub(super) const API_KEY_COLUMNS: &str =
    "api_key_id, key_name, created_at, last_used_at, is_active";

pub(super) fn row_to_api_key(row: &PgRow) -> Result<ApiKey, RepoError> {
    Ok(ApiKey {
        api_key_id: ApiKeyId::from_uuid(row.col("api_key_id")?),
        key_name: row.col("key_name")?,
        created_at: row.col("created_at")?,
        last_used_at: row.col("last_used_at")?,
        is_active: row.col("is_active")?,
    })
}
