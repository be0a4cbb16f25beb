//! Repository port traits for database access.

use std::collections::BTreeMap;

use async_trait::async_trait;
use statedb_domain::*;

use super::error::RepoError;
use super::types::{ItemUseOutcome, SequenceRoster, SessionStart};

// =============================================================================
// Scenario templates
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScenarioRepo: Send + Sync {
    /// Upsert the scenario by title and replace its template rows, vertices and
    /// edges, all inside one transaction.
    async fn inject(&self, plan: &InjectionPlan) -> Result<ScenarioId, RepoError>;
    async fn list(&self) -> Result<Vec<Scenario>, RepoError>;
    async fn get(&self, id: ScenarioId) -> Result<Option<ScenarioDetail>, RepoError>;
    /// RELATION edges scoped to the template session of this scenario.
    async fn template_relations(&self, id: ScenarioId) -> Result<Vec<EntityRelation>, RepoError>;
}

// =============================================================================
// Sessions
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Clone a scenario into a new session. `None` when the scenario does not exist.
    async fn create(&self, start: &SessionStart) -> Result<Option<SessionId>, RepoError>;
    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepoError>;
    async fn list(&self, status: Option<SessionStatus>) -> Result<Vec<Session>, RepoError>;
    async fn set_status(
        &self,
        id: SessionId,
        status: SessionStatus,
    ) -> Result<Option<Session>, RepoError>;
    /// Hard delete of the session, its entity rows and its graph vertices.
    async fn delete(&self, id: SessionId) -> Result<bool, RepoError>;

    async fn get_phase(&self, id: SessionId) -> Result<Option<PhaseState>, RepoError>;
    async fn change_phase(
        &self,
        id: SessionId,
        phase: Phase,
    ) -> Result<Option<PhaseState>, RepoError>;
    async fn get_turn(&self, id: SessionId) -> Result<Option<TurnState>, RepoError>;
    async fn add_turn(&self, id: SessionId) -> Result<Option<TurnState>, RepoError>;
}

// =============================================================================
// Narrative progress
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepo: Send + Sync {
    async fn progress(&self, id: SessionId) -> Result<Option<SessionProgress>, RepoError>;
    async fn context(&self, id: SessionId) -> Result<Option<SessionContext>, RepoError>;

    async fn get_location(&self, id: SessionId) -> Result<Option<LocationState>, RepoError>;
    async fn update_location(
        &self,
        id: SessionId,
        location: &str,
    ) -> Result<Option<LocationState>, RepoError>;

    async fn get_act(&self, id: SessionId) -> Result<Option<ActState>, RepoError>;
    async fn set_act(&self, id: SessionId, act: i32) -> Result<Option<ActState>, RepoError>;
    /// Move the act counter by `delta`, never below 1.
    async fn shift_act(&self, id: SessionId, delta: i32) -> Result<Option<ActState>, RepoError>;
    async fn current_act_details(&self, id: SessionId) -> Result<Option<ActDetails>, RepoError>;

    async fn get_sequence(&self, id: SessionId) -> Result<Option<SequenceState>, RepoError>;
    async fn set_sequence(
        &self,
        id: SessionId,
        sequence: i32,
    ) -> Result<Option<SequenceState>, RepoError>;
    async fn shift_sequence(
        &self,
        id: SessionId,
        delta: i32,
    ) -> Result<Option<SequenceState>, RepoError>;
    async fn current_sequence(
        &self,
        id: SessionId,
    ) -> Result<Option<ScenarioSequence>, RepoError>;
}

// =============================================================================
// Player, inventory, player/NPC affinity
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerRepo: Send + Sync {
    async fn get(&self, id: PlayerId) -> Result<Option<Player>, RepoError>;
    async fn update_hp(
        &self,
        id: PlayerId,
        session_id: SessionId,
        delta: i32,
    ) -> Result<Option<PlayerHpUpdate>, RepoError>;
    /// Add each delta to the matching numeric stat (missing stats start at 0).
    async fn update_stats(
        &self,
        id: PlayerId,
        session_id: SessionId,
        changes: &BTreeMap<String, i32>,
    ) -> Result<Option<Player>, RepoError>;

    async fn npc_relations(&self, id: PlayerId) -> Result<Vec<PlayerNpcRelation>, RepoError>;
    async fn session_npc_relations(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PlayerNpcRelation>, RepoError>;
    /// Clamped to 0..=100; the NPC must belong to the player's session.
    async fn update_npc_affinity(
        &self,
        id: PlayerId,
        npc_id: NpcId,
        delta: i32,
    ) -> Result<Option<NpcAffinityUpdate>, RepoError>;

    async fn session_inventory(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<InventoryEntry>, RepoError>;
    async fn set_inventory_quantity(
        &self,
        id: PlayerId,
        item_id: i32,
        quantity: i32,
    ) -> Result<Option<InventoryUpdate>, RepoError>;
    async fn earn_item(
        &self,
        session_id: SessionId,
        id: PlayerId,
        item_id: i32,
        quantity: i32,
    ) -> Result<Option<ItemGrant>, RepoError>;
    async fn use_item(
        &self,
        session_id: SessionId,
        id: PlayerId,
        item_id: i32,
        quantity: i32,
    ) -> Result<ItemUseOutcome, RepoError>;
}

// =============================================================================
// Session entities (NPC, enemy, item, graph relations)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityRepo: Send + Sync {
    async fn session_npcs(&self, session_id: SessionId) -> Result<Vec<Npc>, RepoError>;
    /// `None` when the session does not exist.
    async fn spawn_npc(
        &self,
        session_id: SessionId,
        spawn: &NpcSpawn,
    ) -> Result<Option<SpawnedEntity>, RepoError>;
    async fn remove_npc(&self, session_id: SessionId, npc_id: NpcId) -> Result<bool, RepoError>;

    async fn session_enemies(
        &self,
        session_id: SessionId,
        active_only: bool,
    ) -> Result<Vec<Enemy>, RepoError>;
    async fn spawn_enemy(
        &self,
        session_id: SessionId,
        spawn: &EnemySpawn,
    ) -> Result<Option<SpawnedEntity>, RepoError>;
    /// Applies `delta` in one statement, clamping at 0 and flagging defeat at 0.
    async fn update_enemy_hp(
        &self,
        session_id: SessionId,
        enemy_id: EnemyId,
        delta: i32,
    ) -> Result<Option<EnemyHpUpdate>, RepoError>;
    async fn defeat_enemy(
        &self,
        session_id: SessionId,
        enemy_id: EnemyId,
    ) -> Result<bool, RepoError>;
    async fn remove_enemy(
        &self,
        session_id: SessionId,
        enemy_id: EnemyId,
    ) -> Result<bool, RepoError>;

    async fn session_items(&self, session_id: SessionId) -> Result<Vec<Item>, RepoError>;
    async fn session_relations(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<EntityRelation>, RepoError>;
    async fn sequence_roster(
        &self,
        session_id: SessionId,
        sequence_id: &str,
    ) -> Result<SequenceRoster, RepoError>;
}

// =============================================================================
// Turn / phase history
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TraceRepo: Send + Sync {
    async fn turns(&self, session_id: SessionId) -> Result<Vec<TurnRecord>, RepoError>;
    async fn recent_turns(
        &self,
        session_id: SessionId,
        limit: i64,
    ) -> Result<Vec<TurnRecord>, RepoError>;
    async fn turn(
        &self,
        session_id: SessionId,
        turn_number: i32,
    ) -> Result<Option<TurnRecord>, RepoError>;
    async fn turn_range(
        &self,
        session_id: SessionId,
        start: i32,
        end: i32,
    ) -> Result<Vec<TurnRecord>, RepoError>;
    async fn latest_turn(&self, session_id: SessionId) -> Result<Option<TurnRecord>, RepoError>;
    async fn turn_statistics_by_phase(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<TurnPhaseStatistics>, RepoError>;
    async fn turn_statistics_by_type(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<TurnTypeStatistics>, RepoError>;
    async fn turn_durations(&self, session_id: SessionId)
        -> Result<Vec<TurnDuration>, RepoError>;
    async fn turn_summary(&self, session_id: SessionId) -> Result<TurnSummary, RepoError>;

    async fn phases(&self, session_id: SessionId) -> Result<Vec<PhaseTransition>, RepoError>;
    async fn recent_phases(
        &self,
        session_id: SessionId,
        limit: i64,
    ) -> Result<Vec<PhaseTransition>, RepoError>;
    async fn phases_by_phase(
        &self,
        session_id: SessionId,
        phase: Phase,
    ) -> Result<Vec<PhaseTransition>, RepoError>;
    async fn phase_range(
        &self,
        session_id: SessionId,
        start_turn: i32,
        end_turn: i32,
    ) -> Result<Vec<PhaseTransition>, RepoError>;
    async fn latest_phase(
        &self,
        session_id: SessionId,
    ) -> Result<Option<PhaseTransition>, RepoError>;
    async fn phase_statistics(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PhaseStatistics>, RepoError>;
    async fn phase_patterns(&self, session_id: SessionId)
        -> Result<Vec<PhasePattern>, RepoError>;
    async fn phase_summary(&self, session_id: SessionId) -> Result<PhaseSummary, RepoError>;
}

// =============================================================================
// API keys
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    async fn create(&self, key_hash: &str, key_name: &str) -> Result<ApiKey, RepoError>;
    async fn list(&self) -> Result<Vec<ApiKey>, RepoError>;
    /// Soft delete. `false` when no key has this id.
    async fn deactivate(&self, id: ApiKeyId) -> Result<bool, RepoError>;
    /// Look up an active key by hash and stamp `last_used_at`.
    async fn verify(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError>;
}

// =============================================================================
// Liveness
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
