//! Postgres implementation of the Entity repository (session NPCs, enemies,
//! items and the RELATION graph between them).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use statedb_domain::value_objects::DEFAULT_AFFINITY;
use statedb_domain::*;

use super::graph::{cypher_literal, relation_projection, AgeGraph, EntityVertex};
use super::rows::*;
use super::sql_error;
use crate::infrastructure::ports::{EntityRepo, RepoError, SequenceRoster};

pub struct PgEntityRepo {
    pool: PgPool,
    graph: AgeGraph,
}

impl PgEntityRepo {
    pub fn new(pool: PgPool, graph: AgeGraph) -> Self {
        Self { pool, graph }
    }

    /// Delete one NPC or enemy row and its vertex. `false` when the row is not
    /// in this session.
    async fn remove_entity(
        &self,
        kind: EntityKind,
        session_id: SessionId,
        entity_id: Uuid,
    ) -> Result<bool, RepoError> {
        let sql = match kind {
            EntityKind::Npc => "DELETE FROM npc WHERE npc_id = $1 AND session_id = $2",
            EntityKind::Enemy => "DELETE FROM enemy WHERE enemy_id = $1 AND session_id = $2",
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| sql_error("begin", e))?;

        let deleted = sqlx::query(sql)
            .bind(entity_id)
            .bind(session_id.to_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| sql_error("remove_entity", e))?;
        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        let cypher = format!(
            "MATCH (v:{}) WHERE v.entity_id = {} AND v.session_id = {} DETACH DELETE v",
            kind.label(),
            cypher_literal(&entity_id.to_string()),
            cypher_literal(&session_id.to_string()),
        );
        self.graph.execute(&mut *tx, &cypher).await?;

        tx.commit()
            .await
            .map_err(|e| sql_error("commit", e))?;

        tracing::debug!(%session_id, %entity_id, kind = %kind, "Entity removed");
        Ok(true)
    }
}

#[async_trait]
impl EntityRepo for PgEntityRepo {
    // =========================================================================
    // NPC
    // =========================================================================

    async fn session_npcs(&self, session_id: SessionId) -> Result<Vec<Npc>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {NPC_COLUMNS} FROM npc WHERE session_id = $1 ORDER BY created_at, name"
        ))
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("session_npcs", e))?;

        rows.iter().map(row_to_npc).collect()
    }

    async fn spawn_npc(
        &self,
        session_id: SessionId,
        spawn: &NpcSpawn,
    ) -> Result<Option<SpawnedEntity>, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| sql_error("begin", e))?;

        // Spawned NPCs join the session's current sequence and location.
        let row = sqlx::query(
            "INSERT INTO npc
                (session_id, scenario_id, scenario_npc_id, name, description, tags, state,
                 current_hp, assigned_sequence_id, assigned_location)
             SELECT s.session_id, s.scenario_id, $2, $3, $4, $5, $6, $7,
                    s.current_sequence_id, s.location
               FROM session s
              WHERE s.session_id = $1
             RETURNING npc_id, scenario_id",
        )
        .bind(session_id.to_uuid())
        .bind(&spawn.scenario_npc_id)
        .bind(&spawn.name)
        .bind(&spawn.description)
        .bind(&spawn.tags)
        .bind(&spawn.state)
        .bind(spawn.hp)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| sql_error("spawn_npc", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let npc_id: Uuid = row.col("npc_id")?;
        let scenario_id = ScenarioId::from_uuid(row.col("scenario_id")?);

        sqlx::query(
            "INSERT INTO player_npc_relations (player_id, npc_id, affinity_score, relation_type)
             SELECT player_id, $2, $3, 'neutral' FROM player WHERE session_id = $1",
        )
        .bind(session_id.to_uuid())
        .bind(npc_id)
        .bind(DEFAULT_AFFINITY)
        .execute(&mut *tx)
        .await
        .map_err(|e| sql_error("spawn_npc_relation", e))?;

        let vertex = EntityVertex {
            kind: EntityKind::Npc,
            entity_id: npc_id,
            key: &spawn.scenario_npc_id,
            scenario_id,
            session_id,
            name: &spawn.name,
        };
        self.graph.execute(&mut *tx, &vertex.create_cypher()).await?;

        tx.commit()
            .await
            .map_err(|e| sql_error("commit", e))?;

        tracing::debug!(%session_id, %npc_id, name = %spawn.name, "NPC spawned");
        Ok(Some(SpawnedEntity {
            instance_id: npc_id,
            scenario_entity_id: spawn.scenario_npc_id.clone(),
            name: spawn.name.clone(),
        }))
    }

    async fn remove_npc(&self, session_id: SessionId, npc_id: NpcId) -> Result<bool, RepoError> {
        self.remove_entity(EntityKind::Npc, session_id, npc_id.to_uuid())
            .await
    }

    // =========================================================================
    // Enemy
    // =========================================================================

    async fn session_enemies(
        &self,
        session_id: SessionId,
        active_only: bool,
    ) -> Result<Vec<Enemy>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENEMY_COLUMNS} FROM enemy
              WHERE session_id = $1 AND (NOT $2 OR NOT is_defeated)
              ORDER BY created_at, name"
        ))
        .bind(session_id.to_uuid())
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("session_enemies", e))?;

        rows.iter().map(row_to_enemy).collect()
    }

    async fn spawn_enemy(
        &self,
        session_id: SessionId,
        spawn: &EnemySpawn,
    ) -> Result<Option<SpawnedEntity>, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| sql_error("begin", e))?;

        let row = sqlx::query(
            "INSERT INTO enemy
                (session_id, scenario_id, scenario_enemy_id, name, description, tags, state,
                 current_hp, max_hp, attack, defense, dropped_items,
                 assigned_sequence_id, assigned_location)
             SELECT s.session_id, s.scenario_id, $2, $3, $4, $5, $6, $7, $7, $8, $9, $10,
                    s.current_sequence_id, s.location
               FROM session s
              WHERE s.session_id = $1
             RETURNING enemy_id, scenario_id",
        )
        .bind(session_id.to_uuid())
        .bind(&spawn.scenario_enemy_id)
        .bind(&spawn.name)
        .bind(&spawn.description)
        .bind(&spawn.tags)
        .bind(&spawn.state)
        .bind(spawn.hp)
        .bind(spawn.attack)
        .bind(spawn.defense)
        .bind(&spawn.dropped_items)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| sql_error("spawn_enemy", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let enemy_id: Uuid = row.col("enemy_id")?;
        let scenario_id = ScenarioId::from_uuid(row.col("scenario_id")?);

        let vertex = EntityVertex {
            kind: EntityKind::Enemy,
            entity_id: enemy_id,
            key: &spawn.scenario_enemy_id,
            scenario_id,
            session_id,
            name: &spawn.name,
        };
        self.graph.execute(&mut *tx, &vertex.create_cypher()).await?;

        tx.commit()
            .await
            .map_err(|e| sql_error("commit", e))?;

        tracing::debug!(%session_id, %enemy_id, name = %spawn.name, "Enemy spawned");
        Ok(Some(SpawnedEntity {
            instance_id: enemy_id,
            scenario_entity_id: spawn.scenario_enemy_id.clone(),
            name: spawn.name.clone(),
        }))
    }

    async fn update_enemy_hp(
        &self,
        session_id: SessionId,
        enemy_id: EnemyId,
        delta: i32,
    ) -> Result<Option<EnemyHpUpdate>, RepoError> {
        // Every right-hand side sees the pre-update row, so the clamped value is spelled out each time.
        let row = sqlx::query(
            "UPDATE enemy
                SET current_hp = LEAST(GREATEST(current_hp + $3, 0), max_hp),
                    is_defeated = is_defeated OR LEAST(GREATEST(current_hp + $3, 0), max_hp) = 0,
                    defeated_at = CASE
                        WHEN NOT is_defeated AND LEAST(GREATEST(current_hp + $3, 0), max_hp) = 0
                            THEN NOW()
                        ELSE defeated_at
                    END
              WHERE enemy_id = $1 AND session_id = $2
          RETURNING current_hp, max_hp, is_defeated",
        )
        .bind(enemy_id.to_uuid())
        .bind(session_id.to_uuid())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("update_enemy_hp", e))?;

        row.map(|row| -> Result<EnemyHpUpdate, RepoError> {
            Ok(EnemyHpUpdate {
                enemy_instance_id: enemy_id,
                current_hp: row.col("current_hp")?,
                max_hp: row.col("max_hp")?,
                hp_change: delta,
                is_defeated: row.col("is_defeated")?,
            })
        })
        .transpose()
    }

    async fn defeat_enemy(
        &self,
        session_id: SessionId,
        enemy_id: EnemyId,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE enemy
                SET is_defeated = TRUE, defeated_at = COALESCE(defeated_at, NOW())
              WHERE enemy_id = $1 AND session_id = $2",
        )
        .bind(enemy_id.to_uuid())
        .bind(session_id.to_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| sql_error("defeat_enemy", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_enemy(
        &self,
        session_id: SessionId,
        enemy_id: EnemyId,
    ) -> Result<bool, RepoError> {
        self.remove_entity(EntityKind::Enemy, session_id, enemy_id.to_uuid())
            .await
    }

    // =========================================================================
    // Items and relations
    // =========================================================================

    async fn session_items(&self, session_id: SessionId) -> Result<Vec<Item>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM item WHERE session_id = $1 ORDER BY item_id"
        ))
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("session_items", e))?;

        rows.iter().map(row_to_item).collect()
    }

    async fn session_relations(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<EntityRelation>, RepoError> {
        let cypher = relation_projection(&format!(
            "r.session_id = {}",
            cypher_literal(&session_id.to_string())
        ));
        self.graph.fetch(&self.pool, &cypher).await
    }

    async fn sequence_roster(
        &self,
        session_id: SessionId,
        sequence_id: &str,
    ) -> Result<SequenceRoster, RepoError> {
        let npcs = sqlx::query(
            "SELECT npc_id AS id, scenario_npc_id AS scenario_entity_id, name, description,
                    'npc' AS entity_type, tags, state, NULL::boolean AS is_defeated
               FROM npc
              WHERE session_id = $1 AND assigned_sequence_id = $2
              ORDER BY name",
        )
        .bind(session_id.to_uuid())
        .bind(sequence_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("sequence_npcs", e))?
        .iter()
        .map(row_to_sequence_entity)
        .collect::<Result<Vec<_>, _>>()?;

        let enemies = sqlx::query(
            "SELECT enemy_id AS id, scenario_enemy_id AS scenario_entity_id, name, description,
                    'enemy' AS entity_type, tags, state, is_defeated
               FROM enemy
              WHERE session_id = $1 AND assigned_sequence_id = $2
              ORDER BY name",
        )
        .bind(session_id.to_uuid())
        .bind(sequence_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("sequence_enemies", e))?
        .iter()
        .map(row_to_sequence_entity)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(SequenceRoster { npcs, enemies })
    }
}
