//! Postgres implementation of the Player repository.
//!
//! HP and stats live inside the `state` JSONB document under `numeric`. Every
//! mutation is a single statement, so concurrent writers never lose an update.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use statedb_domain::value_objects::{
    AFFINITY_MAX, AFFINITY_MIN, DEFAULT_AFFINITY, DEFAULT_PLAYER_HP,
};
use statedb_domain::*;

use super::rows::*;
use super::sql_error;
use crate::infrastructure::ports::{ItemUseOutcome, PlayerRepo, RepoError};

pub struct PgPlayerRepo {
    pool: PgPool,
}

impl PgPlayerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepo for PgPlayerRepo {
    async fn get(&self, id: PlayerId) -> Result<Option<Player>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM player WHERE player_id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("get_player", e))?;

        row.as_ref().map(row_to_player).transpose()
    }

    async fn update_hp(
        &self,
        id: PlayerId,
        session_id: SessionId,
        delta: i32,
    ) -> Result<Option<PlayerHpUpdate>, RepoError> {
        // $4 is the ceiling used when the player has no MAX_HP stat.
        let row = sqlx::query(
            "UPDATE player
                SET state = jsonb_set(
                        state,
                        '{numeric}',
                        COALESCE(state->'numeric', '{}'::jsonb) || jsonb_build_object(
                            'HP',
                            LEAST(
                                GREATEST(COALESCE((state->'numeric'->>'HP')::int, 0) + $3, 0),
                                COALESCE((state->'numeric'->>'MAX_HP')::int, $4)
                            )
                        ),
                        true
                    )
              WHERE player_id = $1 AND session_id = $2
          RETURNING (state->'numeric'->>'HP')::int AS current_hp,
                    COALESCE((state->'numeric'->>'MAX_HP')::int, $4) AS max_hp",
        )
        .bind(id.to_uuid())
        .bind(session_id.to_uuid())
        .bind(delta)
        .bind(DEFAULT_PLAYER_HP)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("update_player_hp", e))?;

        row.map(|row| -> Result<PlayerHpUpdate, RepoError> {
            Ok(PlayerHpUpdate {
                player_id: id,
                current_hp: row.col("current_hp")?,
                max_hp: row.col("max_hp")?,
                hp_change: delta,
            })
        })
        .transpose()
    }

    async fn update_stats(
        &self,
        id: PlayerId,
        session_id: SessionId,
        changes: &BTreeMap<String, i32>,
    ) -> Result<Option<Player>, RepoError> {
        let row = sqlx::query(&format!(
            "UPDATE player
                SET state = jsonb_set(
                        state,
                        '{{numeric}}',
                        COALESCE(state->'numeric', '{{}}'::jsonb) || (
                            SELECT COALESCE(
                                jsonb_object_agg(
                                    c.key,
                                    COALESCE((state->'numeric'->>c.key)::int, 0) + c.value::int
                                ),
                                '{{}}'::jsonb
                            )
                            FROM jsonb_each_text($3::jsonb) AS c
                        ),
                        true
                    )
              WHERE player_id = $1 AND session_id = $2
          RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(id.to_uuid())
        .bind(session_id.to_uuid())
        .bind(Json(changes))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("update_player_stats", e))?;

        row.as_ref().map(row_to_player).transpose()
    }

    // =========================================================================
    // NPC affinity
    // =========================================================================

    async fn npc_relations(&self, id: PlayerId) -> Result<Vec<PlayerNpcRelation>, RepoError> {
        let rows = sqlx::query(&format!(
            "{PLAYER_NPC_RELATION_SELECT} WHERE r.player_id = $1 ORDER BY n.name"
        ))
        .bind(id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("npc_relations", e))?;

        rows.iter().map(row_to_player_npc_relation).collect()
    }

    async fn session_npc_relations(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PlayerNpcRelation>, RepoError> {
        let rows = sqlx::query(&format!(
            "{PLAYER_NPC_RELATION_SELECT}
             WHERE r.player_id IN (SELECT player_id FROM player WHERE session_id = $1)
             ORDER BY n.name"
        ))
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("session_npc_relations", e))?;

        rows.iter().map(row_to_player_npc_relation).collect()
    }

    async fn update_npc_affinity(
        &self,
        id: PlayerId,
        npc_id: NpcId,
        delta: i32,
    ) -> Result<Option<NpcAffinityUpdate>, RepoError> {
        let affinity: Option<i32> = sqlx::query_scalar(
            "INSERT INTO player_npc_relations
                (player_id, npc_id, affinity_score, interaction_count, last_interaction_at)
             SELECT p.player_id, n.npc_id, LEAST(GREATEST($4 + $3, $5), $6), 1, NOW()
               FROM player p
               JOIN npc n ON n.session_id = p.session_id
              WHERE p.player_id = $1 AND n.npc_id = $2
             ON CONFLICT (player_id, npc_id) DO UPDATE
                SET affinity_score = LEAST(GREATEST(player_npc_relations.affinity_score + $3, $5), $6),
                    interaction_count = player_npc_relations.interaction_count + 1,
                    last_interaction_at = NOW()
             RETURNING affinity_score",
        )
        .bind(id.to_uuid())
        .bind(npc_id.to_uuid())
        .bind(delta)
        .bind(DEFAULT_AFFINITY)
        .bind(AFFINITY_MIN)
        .bind(AFFINITY_MAX)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("update_npc_affinity", e))?;

        Ok(affinity.map(|new_affinity| NpcAffinityUpdate {
            player_id: id,
            npc_id,
            new_affinity,
        }))
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    async fn session_inventory(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<InventoryEntry>, RepoError> {
        let rows = sqlx::query(
            "SELECT pi.player_id, pi.item_id,
                    COALESCE(i.name, 'Item ' || pi.item_id) AS item_name,
                    i.item_type, i.description, pi.quantity, pi.acquired_at
               FROM player p
               JOIN player_inventory pi ON pi.player_id = p.player_id
               LEFT JOIN item i ON i.session_id = p.session_id AND i.item_id = pi.item_id
              WHERE p.session_id = $1 AND pi.quantity > 0
              ORDER BY pi.item_id",
        )
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("session_inventory", e))?;

        rows.iter().map(row_to_inventory_entry).collect()
    }

    async fn set_inventory_quantity(
        &self,
        id: PlayerId,
        item_id: i32,
        quantity: i32,
    ) -> Result<Option<InventoryUpdate>, RepoError> {
        let stored: Option<i32> = sqlx::query_scalar(
            "INSERT INTO player_inventory (player_id, item_id, quantity)
             SELECT p.player_id, i.item_id, $3
               FROM player p
               JOIN item i ON i.session_id = p.session_id AND i.item_id = $2
              WHERE p.player_id = $1
             ON CONFLICT (player_id, item_id) DO UPDATE SET quantity = EXCLUDED.quantity
             RETURNING quantity",
        )
        .bind(id.to_uuid())
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("set_inventory_quantity", e))?;

        Ok(stored.map(|quantity| InventoryUpdate {
            player_id: id,
            item_id,
            quantity,
        }))
    }

    async fn earn_item(
        &self,
        session_id: SessionId,
        id: PlayerId,
        item_id: i32,
        quantity: i32,
    ) -> Result<Option<ItemGrant>, RepoError> {
        let total: Option<i32> = sqlx::query_scalar(
            "INSERT INTO player_inventory (player_id, item_id, quantity)
             SELECT p.player_id, i.item_id, $4
               FROM player p
               JOIN item i ON i.session_id = p.session_id AND i.item_id = $3
              WHERE p.player_id = $2 AND p.session_id = $1
             ON CONFLICT (player_id, item_id) DO UPDATE
                SET quantity = player_inventory.quantity + EXCLUDED.quantity
             RETURNING quantity",
        )
        .bind(session_id.to_uuid())
        .bind(id.to_uuid())
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("earn_item", e))?;

        Ok(total.map(|total_quantity| ItemGrant {
            player_id: id,
            item_id,
            quantity,
            total_quantity,
        }))
    }

    async fn use_item(
        &self,
        session_id: SessionId,
        id: PlayerId,
        item_id: i32,
        quantity: i32,
    ) -> Result<ItemUseOutcome, RepoError> {
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE player_inventory pi
                SET quantity = pi.quantity - $4
               FROM player p
              WHERE p.player_id = pi.player_id
                AND p.session_id = $1
                AND pi.player_id = $2
                AND pi.item_id = $3
                AND pi.quantity >= $4
          RETURNING pi.quantity",
        )
        .bind(session_id.to_uuid())
        .bind(id.to_uuid())
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("use_item", e))?;

        if let Some(remaining_quantity) = remaining {
            return Ok(ItemUseOutcome::Used(ItemConsumption {
                player_id: id,
                item_id,
                quantity,
                remaining_quantity,
            }));
        }

        let available: Option<i32> = sqlx::query_scalar(
            "SELECT pi.quantity
               FROM player_inventory pi
               JOIN player p ON p.player_id = pi.player_id
              WHERE p.session_id = $1 AND pi.player_id = $2 AND pi.item_id = $3",
        )
        .bind(session_id.to_uuid())
        .bind(id.to_uuid())
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("use_item", e))?;

        Ok(match available {
            None => ItemUseOutcome::NotOwned,
            Some(available) => ItemUseOutcome::Insufficient { available },
        })
    }
}
