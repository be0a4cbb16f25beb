//! State service: aggregate snapshot reads and fan-out change writes.
//!
//! `write_changes` applies each key with its own repository call. The calls are
//! sequential and not wrapped in one transaction, so a failure part-way leaves
//! the earlier keys committed.

mod error;
mod types;

use std::sync::Arc;

use serde_json::{Map, Value};
use statedb_domain::{Phase, PlayerId, SessionId};
use statedb_shared::StateChanges;
use validator::Validate;

use crate::infrastructure::ports::{
    ActionValidation, EntityRepo, PlayerRepo, ProgressRepo, RuleEnginePort, SessionRepo,
};

pub use error::StateError;
pub use types::{ActionOutcome, CombatResult, StateSnapshot, WriteResult};

pub struct StateUseCases {
    session: Arc<dyn SessionRepo>,
    player: Arc<dyn PlayerRepo>,
    entity: Arc<dyn EntityRepo>,
    progress: Arc<dyn ProgressRepo>,
    rule_engine: Arc<dyn RuleEnginePort>,
}

impl StateUseCases {
    pub fn new(
        session: Arc<dyn SessionRepo>,
        player: Arc<dyn PlayerRepo>,
        entity: Arc<dyn EntityRepo>,
        progress: Arc<dyn ProgressRepo>,
        rule_engine: Arc<dyn RuleEnginePort>,
    ) -> Self {
        Self {
            session,
            player,
            entity,
            progress,
            rule_engine,
        }
    }

    pub async fn snapshot(&self, session_id: SessionId) -> Result<StateSnapshot, StateError> {
        let session = self
            .session
            .get(session_id)
            .await?
            .ok_or(StateError::SessionNotFound(session_id))?;

        let player = match session.player_id {
            Some(player_id) => self.player.get(player_id).await?,
            None => None,
        };
        let npcs = self.entity.session_npcs(session_id).await?;
        let enemies = self.entity.session_enemies(session_id, true).await?;
        let inventory = self.player.session_inventory(session_id).await?;
        let phase = self
            .session
            .get_phase(session_id)
            .await?
            .map(|p| p.current_phase)
            .unwrap_or(session.current_phase);
        let turn = self.session.get_turn(session_id).await?;

        Ok(StateSnapshot {
            snapshot_timestamp: session.updated_at,
            session,
            player,
            npcs,
            enemies,
            inventory,
            phase,
            turn,
        })
    }

    pub async fn write_changes(
        &self,
        session_id: SessionId,
        changes: &StateChanges,
    ) -> Result<WriteResult, StateError> {
        let mut updated = Vec::new();

        if changes.player_hp.is_some() || changes.player_stats.is_some() {
            let player_id = match changes.player_id {
                Some(id) => id,
                None => self.session_player(session_id).await?,
            };

            if let Some(delta) = changes.player_hp {
                self.player
                    .update_hp(player_id, session_id, delta)
                    .await?
                    .ok_or_else(|| StateError::not_found("Player", player_id))?;
                updated.push("player_hp_updated");
            }
            if let Some(stats) = &changes.player_stats {
                self.player
                    .update_stats(player_id, session_id, stats)
                    .await?
                    .ok_or_else(|| StateError::not_found("Player", player_id))?;
                updated.push("player_stats_updated");
            }
        }

        if let Some(enemy_hp) = &changes.enemy_hp {
            for (&enemy_id, &delta) in enemy_hp {
                let hp = self
                    .entity
                    .update_enemy_hp(session_id, enemy_id, delta)
                    .await?
                    .ok_or_else(|| StateError::not_found("Enemy", enemy_id))?;
                if hp.current_hp <= 0 {
                    self.entity.defeat_enemy(session_id, enemy_id).await?;
                    tracing::debug!(session_id = %session_id, enemy_id = %enemy_id, "Enemy defeated");
                }
            }
            updated.push("enemy_hp_updated");
        }

        if let Some(affinity) = &changes.npc_affinity {
            let player_id = match changes.player_id {
                Some(id) => id,
                None => self.session_player(session_id).await?,
            };
            for (&npc_id, &delta) in affinity {
                self.player
                    .update_npc_affinity(player_id, npc_id, delta)
                    .await?
                    .ok_or_else(|| StateError::not_found("NPC", npc_id))?;
            }
            updated.push("npc_affinity_updated");
        }

        if let Some(location) = &changes.location {
            self.progress
                .update_location(session_id, location)
                .await?
                .ok_or(StateError::SessionNotFound(session_id))?;
            updated.push("location_updated");
        }

        if let Some(phase) = changes.phase {
            self.session
                .change_phase(session_id, phase)
                .await?
                .ok_or(StateError::SessionNotFound(session_id))?;
            updated.push("phase_updated");
        }

        if changes.turn_increment {
            self.session
                .add_turn(session_id)
                .await?
                .ok_or(StateError::SessionNotFound(session_id))?;
            updated.push("turn_incremented");
        }

        if let Some(act) = changes.act {
            self.progress
                .set_act(session_id, act)
                .await?
                .ok_or(StateError::SessionNotFound(session_id))?;
            updated.push("act_updated");
        }

        if let Some(sequence) = changes.sequence {
            self.progress
                .set_sequence(session_id, sequence)
                .await?
                .ok_or(StateError::SessionNotFound(session_id))?;
            updated.push("sequence_updated");
        }

        tracing::debug!(session_id = %session_id, fields = ?updated, "State changes written");
        Ok(WriteResult::from_fields(updated))
    }

    /// Judge a player action with the Rule Engine and apply what it decides.
    pub async fn process_action(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        mut action: Map<String, Value>,
        token: Option<String>,
    ) -> Result<ActionOutcome, StateError> {
        let phase = self
            .session
            .get_phase(session_id)
            .await?
            .ok_or(StateError::SessionNotFound(session_id))?
            .current_phase;

        let action_type = action
            .get("action_type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        action.insert("player_id".to_string(), Value::String(player_id.to_string()));
        action.insert("phase".to_string(), Value::String(phase.as_str().to_string()));

        let judgment = self
            .rule_engine
            .validate_action(
                ActionValidation {
                    session_id,
                    action_type,
                    action_data: Value::Object(action),
                },
                token,
            )
            .await?;

        let success = judgment
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            return Ok(ActionOutcome::Skipped {
                message: "Judgment failed".to_string(),
                judgment,
            });
        }

        let mut changes: StateChanges = match judgment.get("state_changes") {
            Some(Value::Null) | None => StateChanges::default(),
            Some(raw) => serde_json::from_value(raw.clone())
                .map_err(|e| StateError::InvalidChanges(e.to_string()))?,
        };
        changes
            .validate()
            .map_err(|e| StateError::InvalidChanges(e.to_string()))?;
        changes.player_id.get_or_insert(player_id);

        let apply_result = self.write_changes(session_id, &changes).await?;
        let final_state = self.snapshot(session_id).await?;

        Ok(ActionOutcome::Success {
            judgment,
            apply_result,
            final_state: Box::new(final_state),
        })
    }

    /// Close a combat encounter. Victory clears the active enemies and returns
    /// to exploration; defeat sends the party to rest.
    pub async fn combat_end(
        &self,
        session_id: SessionId,
        victory: bool,
    ) -> Result<CombatResult, StateError> {
        let mut removed_enemies = Vec::new();
        let phase = if victory {
            for enemy in self.entity.session_enemies(session_id, true).await? {
                if self
                    .entity
                    .remove_enemy(session_id, enemy.enemy_instance_id)
                    .await?
                {
                    removed_enemies.push(enemy.enemy_instance_id);
                }
            }
            Phase::Exploration
        } else {
            Phase::Rest
        };

        self.session
            .change_phase(session_id, phase)
            .await?
            .ok_or(StateError::SessionNotFound(session_id))?;

        let message = if victory {
            format!("Combat won, {} enemies removed", removed_enemies.len())
        } else {
            "Combat lost, party is resting".to_string()
        };
        tracing::info!(session_id = %session_id, victory, "Combat ended");

        Ok(CombatResult {
            victory,
            phase,
            removed_enemies,
            message,
        })
    }

    async fn session_player(&self, session_id: SessionId) -> Result<PlayerId, StateError> {
        self.session
            .get(session_id)
            .await?
            .ok_or(StateError::SessionNotFound(session_id))?
            .player_id
            .ok_or_else(|| StateError::InvalidChanges("session has no player".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::infrastructure::ports::{
        MockEntityRepo, MockPlayerRepo, MockProgressRepo, MockRuleEnginePort, MockSessionRepo,
        ProxyError,
    };
    use crate::use_cases::session::tests::session as session_row;
    use chrono::Utc;
    use serde_json::json;
    use statedb_domain::{
        Enemy, EnemyHpUpdate, EnemyId, NpcAffinityUpdate, NpcId, PhaseState, PlayerHpUpdate,
        SessionStatus, TurnState,
    };

    struct Mocks {
        session: MockSessionRepo,
        player: MockPlayerRepo,
        entity: MockEntityRepo,
        progress: MockProgressRepo,
        rule_engine: MockRuleEnginePort,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                session: MockSessionRepo::new(),
                player: MockPlayerRepo::new(),
                entity: MockEntityRepo::new(),
                progress: MockProgressRepo::new(),
                rule_engine: MockRuleEnginePort::new(),
            }
        }

        fn build(self) -> StateUseCases {
            StateUseCases::new(
                Arc::new(self.session),
                Arc::new(self.player),
                Arc::new(self.entity),
                Arc::new(self.progress),
                Arc::new(self.rule_engine),
            )
        }
    }

    fn enemy(session_id: SessionId, id: EnemyId) -> Enemy {
        Enemy {
            enemy_instance_id: id,
            session_id,
            scenario_id: None,
            scenario_enemy_id: "goblin".to_string(),
            name: "Goblin".to_string(),
            description: None,
            tags: vec!["enemy".to_string()],
            state: json!({}),
            current_hp: 30,
            max_hp: 30,
            attack: 10,
            defense: 5,
            dropped_items: vec![],
            is_defeated: false,
            defeated_at: None,
            assigned_sequence_id: Some("seq-1".to_string()),
            assigned_location: None,
            created_at: Utc::now(),
        }
    }

    fn expect_snapshot_reads(mocks: &mut Mocks, session_id: SessionId) {
        mocks
            .session
            .expect_get()
            .returning(|id| Ok(Some(session_row(id, SessionStatus::Active))));
        mocks.entity.expect_session_npcs().returning(|_| Ok(vec![]));
        mocks
            .entity
            .expect_session_enemies()
            .withf(|_, active_only| *active_only)
            .returning(|_, _| Ok(vec![]));
        mocks
            .player
            .expect_session_inventory()
            .returning(|_| Ok(vec![]));
        mocks.session.expect_get_phase().returning(|id| {
            Ok(Some(PhaseState {
                session_id: id,
                current_phase: Phase::Combat,
            }))
        });
        mocks.session.expect_get_turn().returning(move |_| {
            Ok(Some(TurnState {
                session_id,
                current_turn: 3,
                phase_at_turn: Some(Phase::Combat),
                turn_type: Some("action".to_string()),
                created_at: None,
            }))
        });
    }

    #[tokio::test]
    async fn snapshot_of_missing_session_is_not_found() {
        let id = SessionId::new();
        let mut mocks = Mocks::new();
        mocks.session.expect_get().returning(|_| Ok(None));

        let result = mocks.build().snapshot(id).await;

        assert!(matches!(result, Err(StateError::SessionNotFound(sid)) if sid == id));
    }

    #[tokio::test]
    async fn snapshot_aggregates_independent_reads() {
        let id = SessionId::new();
        let mut mocks = Mocks::new();
        expect_snapshot_reads(&mut mocks, id);

        let snapshot = mocks.build().snapshot(id).await.unwrap();

        assert_eq!(snapshot.session.session_id, id);
        assert!(snapshot.player.is_none());
        assert_eq!(snapshot.phase, Phase::Combat);
        assert_eq!(snapshot.turn.map(|t| t.current_turn), Some(3));
        assert_eq!(snapshot.snapshot_timestamp, snapshot.session.updated_at);
    }

    #[tokio::test]
    async fn enemy_hp_at_zero_triggers_defeat() {
        let session_id = SessionId::new();
        let enemy_id = EnemyId::new();
        let mut mocks = Mocks::new();
        mocks
            .entity
            .expect_update_enemy_hp()
            .withf(move |sid, eid, delta| *sid == session_id && *eid == enemy_id && *delta == -35)
            .returning(|_, eid, delta| {
                Ok(Some(EnemyHpUpdate {
                    enemy_instance_id: eid,
                    current_hp: 0,
                    max_hp: 30,
                    hp_change: delta,
                    is_defeated: true,
                }))
            });
        mocks
            .entity
            .expect_defeat_enemy()
            .withf(move |sid, eid| *sid == session_id && *eid == enemy_id)
            .times(1)
            .returning(|_, _| Ok(true));

        let changes = StateChanges {
            enemy_hp: Some(BTreeMap::from([(enemy_id, -35)])),
            ..Default::default()
        };
        let result = mocks
            .build()
            .write_changes(session_id, &changes)
            .await
            .unwrap();

        assert_eq!(result.updated_fields, vec!["enemy_hp_updated"]);
        assert_eq!(result.message, "State updated: enemy_hp_updated");
    }

    #[tokio::test]
    async fn wounded_enemy_is_not_defeated() {
        let session_id = SessionId::new();
        let enemy_id = EnemyId::new();
        let mut mocks = Mocks::new();
        mocks.entity.expect_update_enemy_hp().returning(|_, eid, delta| {
            Ok(Some(EnemyHpUpdate {
                enemy_instance_id: eid,
                current_hp: 20,
                max_hp: 30,
                hp_change: delta,
                is_defeated: false,
            }))
        });
        mocks.entity.expect_defeat_enemy().never();

        let changes = StateChanges {
            enemy_hp: Some(BTreeMap::from([(enemy_id, -10)])),
            ..Default::default()
        };
        mocks
            .build()
            .write_changes(session_id, &changes)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn player_keys_use_given_player_and_run_in_order() {
        let session_id = SessionId::new();
        let player_id = PlayerId::new();
        let npc_id = NpcId::new();
        let mut mocks = Mocks::new();
        mocks
            .player
            .expect_update_hp()
            .withf(move |pid, sid, delta| *pid == player_id && *sid == session_id && *delta == -5)
            .returning(|pid, _, delta| {
                Ok(Some(PlayerHpUpdate {
                    player_id: pid,
                    current_hp: 95,
                    max_hp: 100,
                    hp_change: delta,
                }))
            });
        mocks
            .player
            .expect_update_npc_affinity()
            .withf(move |pid, nid, delta| *pid == player_id && *nid == npc_id && *delta == 10)
            .returning(|pid, nid, _| {
                Ok(Some(NpcAffinityUpdate {
                    player_id: pid,
                    npc_id: nid,
                    new_affinity: 60,
                }))
            });
        mocks.session.expect_add_turn().returning(move |id| {
            Ok(Some(TurnState {
                session_id: id,
                current_turn: 1,
                phase_at_turn: None,
                turn_type: None,
                created_at: None,
            }))
        });
        mocks.session.expect_get().never();

        let changes = StateChanges {
            player_id: Some(player_id),
            player_hp: Some(-5),
            npc_affinity: Some(BTreeMap::from([(npc_id, 10)])),
            turn_increment: true,
            ..Default::default()
        };
        let result = mocks
            .build()
            .write_changes(session_id, &changes)
            .await
            .unwrap();

        assert_eq!(
            result.updated_fields,
            vec!["player_hp_updated", "npc_affinity_updated", "turn_incremented"]
        );
    }

    #[tokio::test]
    async fn player_keys_without_player_fall_back_to_session_player() {
        let session_id = SessionId::new();
        let player_id = PlayerId::new();
        let mut mocks = Mocks::new();
        mocks.session.expect_get().returning(move |id| {
            let mut session = session_row(id, SessionStatus::Active);
            session.player_id = Some(player_id);
            Ok(Some(session))
        });
        mocks
            .player
            .expect_update_hp()
            .withf(move |pid, _, _| *pid == player_id)
            .returning(|pid, _, delta| {
                Ok(Some(PlayerHpUpdate {
                    player_id: pid,
                    current_hp: 100,
                    max_hp: 100,
                    hp_change: delta,
                }))
            });

        let changes = StateChanges {
            player_hp: Some(20),
            ..Default::default()
        };
        let result = mocks
            .build()
            .write_changes(session_id, &changes)
            .await
            .unwrap();

        assert_eq!(result.updated_fields, vec!["player_hp_updated"]);
    }

    #[tokio::test]
    async fn empty_change_set_touches_nothing() {
        let result = Mocks::new()
            .build()
            .write_changes(SessionId::new(), &StateChanges::default())
            .await
            .unwrap();

        assert!(result.updated_fields.is_empty());
        assert_eq!(result.message, "No changes applied");
    }

    #[tokio::test]
    async fn failed_judgment_writes_nothing() {
        let session_id = SessionId::new();
        let player_id = PlayerId::new();
        let mut mocks = Mocks::new();
        mocks.session.expect_get_phase().returning(|id| {
            Ok(Some(PhaseState {
                session_id: id,
                current_phase: Phase::Combat,
            }))
        });
        mocks
            .rule_engine
            .expect_validate_action()
            .withf(move |request, _| {
                request.action_type == "attack"
                    && request.action_data["player_id"] == json!(player_id.to_string())
                    && request.action_data["phase"] == json!("combat")
            })
            .returning(|_, _| Ok(json!({"success": false, "reason": "missed"})));
        mocks.session.expect_change_phase().never();

        let mut action = Map::new();
        action.insert("action_type".to_string(), json!("attack"));
        let outcome = mocks
            .build()
            .process_action(session_id, player_id, action, None)
            .await
            .unwrap();

        match outcome {
            ActionOutcome::Skipped { message, judgment } => {
                assert_eq!(message, "Judgment failed");
                assert_eq!(judgment["reason"], "missed");
            }
            other => panic!("expected skipped outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_judgment_applies_changes_and_snapshots() {
        let session_id = SessionId::new();
        let player_id = PlayerId::new();
        let mut mocks = Mocks::new();
        expect_snapshot_reads(&mut mocks, session_id);
        mocks
            .rule_engine
            .expect_validate_action()
            .withf(|request, token| request.action_type == "unknown" && token.is_none())
            .returning(|_, _| {
                Ok(json!({"success": true, "state_changes": {"phase": "rest"}}))
            });
        mocks
            .session
            .expect_change_phase()
            .withf(|_, phase| *phase == Phase::Rest)
            .times(1)
            .returning(|id, phase| {
                Ok(Some(PhaseState {
                    session_id: id,
                    current_phase: phase,
                }))
            });

        let outcome = mocks
            .build()
            .process_action(session_id, player_id, Map::new(), None)
            .await
            .unwrap();

        match outcome {
            ActionOutcome::Success { apply_result, .. } => {
                assert_eq!(apply_result.updated_fields, vec!["phase_updated"]);
            }
            other => panic!("expected success outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn judgment_with_act_zero_is_rejected_before_any_write() {
        let mut mocks = Mocks::new();
        mocks.session.expect_get_phase().returning(|id| {
            Ok(Some(PhaseState {
                session_id: id,
                current_phase: Phase::Exploration,
            }))
        });
        mocks.rule_engine.expect_validate_action().returning(|_, _| {
            Ok(json!({"success": true, "state_changes": {"act": 0, "phase": "rest"}}))
        });
        mocks.progress.expect_set_act().never();
        mocks.session.expect_change_phase().never();

        let result = mocks
            .build()
            .process_action(SessionId::new(), PlayerId::new(), Map::new(), None)
            .await;

        assert!(matches!(result, Err(StateError::InvalidChanges(_))));
    }

    #[tokio::test]
    async fn unreachable_rule_engine_surfaces_proxy_error() {
        let mut mocks = Mocks::new();
        mocks.session.expect_get_phase().returning(|id| {
            Ok(Some(PhaseState {
                session_id: id,
                current_phase: Phase::Exploration,
            }))
        });
        mocks.rule_engine.expect_validate_action().returning(|_, _| {
            Err(ProxyError::Unavailable {
                base_url: "http://localhost:8050".to_string(),
                detail: "connection refused".to_string(),
            })
        });

        let result = mocks
            .build()
            .process_action(SessionId::new(), PlayerId::new(), Map::new(), None)
            .await;

        assert!(matches!(
            result,
            Err(StateError::Proxy(ProxyError::Unavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn victory_removes_active_enemies_and_returns_to_exploration() {
        let session_id = SessionId::new();
        let first = EnemyId::new();
        let second = EnemyId::new();
        let mut mocks = Mocks::new();
        mocks
            .entity
            .expect_session_enemies()
            .withf(|_, active_only| *active_only)
            .returning(move |sid, _| Ok(vec![enemy(sid, first), enemy(sid, second)]));
        mocks
            .entity
            .expect_remove_enemy()
            .times(2)
            .returning(|_, _| Ok(true));
        mocks
            .session
            .expect_change_phase()
            .withf(|_, phase| *phase == Phase::Exploration)
            .returning(|id, phase| {
                Ok(Some(PhaseState {
                    session_id: id,
                    current_phase: phase,
                }))
            });

        let result = mocks.build().combat_end(session_id, true).await.unwrap();

        assert_eq!(result.removed_enemies, vec![first, second]);
        assert_eq!(result.phase, Phase::Exploration);
    }

    #[tokio::test]
    async fn defeat_keeps_enemies_and_rests() {
        let mut mocks = Mocks::new();
        mocks.entity.expect_session_enemies().never();
        mocks
            .session
            .expect_change_phase()
            .withf(|_, phase| *phase == Phase::Rest)
            .returning(|id, phase| {
                Ok(Some(PhaseState {
                    session_id: id,
                    current_phase: phase,
                }))
            });

        let result = mocks
            .build()
            .combat_end(SessionId::new(), false)
            .await
            .unwrap();

        assert!(!result.victory);
        assert!(result.removed_enemies.is_empty());
        assert_eq!(result.phase, Phase::Rest);
    }
}
