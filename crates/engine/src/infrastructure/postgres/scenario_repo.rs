//! Postgres implementation of the Scenario repository.
//!
//! Injection writes the scenario row, its acts and sequences, the template
//! NPC/enemy/item rows, their vertices and the RELATION edges in a single
//! transaction. Re-injecting a title replaces everything under the template
//! session; sessions already cloned from it are left alone.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use statedb_domain::*;

use super::graph::{cypher_literal, relation_projection, AgeGraph, EntityVertex};
use super::rows::*;
use super::sql_error;
use crate::infrastructure::ports::{RepoError, ScenarioRepo};

pub struct PgScenarioRepo {
    pool: PgPool,
    graph: AgeGraph,
}

impl PgScenarioRepo {
    pub fn new(pool: PgPool, graph: AgeGraph) -> Self {
        Self { pool, graph }
    }

    async fn clear_template(
        &self,
        conn: &mut PgConnection,
        scenario_id: ScenarioId,
    ) -> Result<(), RepoError> {
        let id = scenario_id.to_uuid();
        let template = TEMPLATE_SESSION_ID.to_uuid();

        for sql in [
            "DELETE FROM scenario_act WHERE scenario_id = $1",
            "DELETE FROM scenario_sequence WHERE scenario_id = $1",
        ] {
            sqlx::query(sql)
                .bind(id)
                .execute(&mut *conn)
                .await
                .map_err(|e| sql_error("clear_template", e))?;
        }
        for sql in [
            "DELETE FROM npc WHERE scenario_id = $1 AND session_id = $2",
            "DELETE FROM enemy WHERE scenario_id = $1 AND session_id = $2",
            "DELETE FROM item WHERE scenario_id = $1 AND session_id = $2",
        ] {
            sqlx::query(sql)
                .bind(id)
                .bind(template)
                .execute(&mut *conn)
                .await
                .map_err(|e| sql_error("clear_template", e))?;
        }

        let cypher = format!(
            "MATCH (v) WHERE v.scenario_id = {} AND v.session_id = {} DETACH DELETE v",
            cypher_literal(&scenario_id.to_string()),
            cypher_literal(&TEMPLATE_SESSION_ID.to_string()),
        );
        self.graph.execute(&mut *conn, &cypher).await?;
        Ok(())
    }

    async fn insert_structure(
        &self,
        conn: &mut PgConnection,
        scenario_id: ScenarioId,
        plan: &InjectionPlan,
    ) -> Result<(), RepoError> {
        for act in &plan.acts {
            let def = &act.definition;
            sqlx::query(
                "INSERT INTO scenario_act
                    (scenario_id, act_id, act_name, act_description, exit_criteria, act_order, sequence_ids)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(scenario_id.to_uuid())
            .bind(&def.id)
            .bind(&def.name)
            .bind(&def.description)
            .bind(&def.exit_criteria)
            .bind(act.act_order)
            .bind(Json(&def.sequences))
            .execute(&mut *conn)
            .await
            .map_err(|e| sql_error("insert_act", e))?;
        }

        for sequence in &plan.sequences {
            let def = &sequence.definition;
            sqlx::query(
                "INSERT INTO scenario_sequence
                    (scenario_id, sequence_id, sequence_name, act_id, location_name, description,
                     goal, exit_triggers, sequence_order, npc_ids, enemy_ids, item_ids)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(scenario_id.to_uuid())
            .bind(&def.id)
            .bind(&def.name)
            .bind(&sequence.act_id)
            .bind(&def.location_name)
            .bind(&def.description)
            .bind(&def.goal)
            .bind(Json(&def.exit_triggers))
            .bind(sequence.sequence_order)
            .bind(Json(&def.npcs))
            .bind(Json(&def.enemies))
            .bind(Json(&def.items))
            .execute(&mut *conn)
            .await
            .map_err(|e| sql_error("insert_sequence", e))?;
        }
        Ok(())
    }

    async fn insert_entities(
        &self,
        conn: &mut PgConnection,
        scenario_id: ScenarioId,
        plan: &InjectionPlan,
    ) -> Result<(), RepoError> {
        for npc in &plan.npcs {
            let def = &npc.definition;
            let npc_id: Uuid = sqlx::query_scalar(
                "INSERT INTO npc
                    (session_id, scenario_id, scenario_npc_id, name, description, tags, state,
                     current_hp, assigned_sequence_id, assigned_location)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                 RETURNING npc_id",
            )
            .bind(TEMPLATE_SESSION_ID.to_uuid())
            .bind(scenario_id.to_uuid())
            .bind(&def.scenario_npc_id)
            .bind(&def.name)
            .bind(&def.description)
            .bind(&def.tags)
            .bind(&def.state)
            .bind(npc.initial_hp)
            .bind(&npc.sequence_id)
            .bind(&npc.location)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| sql_error("insert_npc", e))?;

            let vertex = EntityVertex {
                kind: EntityKind::Npc,
                entity_id: npc_id,
                key: &def.scenario_npc_id,
                scenario_id,
                session_id: TEMPLATE_SESSION_ID,
                name: &def.name,
            };
            self.graph.execute(&mut *conn, &vertex.create_cypher()).await?;
        }

        for enemy in &plan.enemies {
            let def = &enemy.definition;
            let enemy_id: Uuid = sqlx::query_scalar(
                "INSERT INTO enemy
                    (session_id, scenario_id, scenario_enemy_id, name, description, tags, state,
                     current_hp, max_hp, attack, defense, dropped_items,
                     assigned_sequence_id, assigned_location)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10, $11, $12, $13)
                 RETURNING enemy_id",
            )
            .bind(TEMPLATE_SESSION_ID.to_uuid())
            .bind(scenario_id.to_uuid())
            .bind(&def.scenario_enemy_id)
            .bind(&def.name)
            .bind(&def.description)
            .bind(&def.tags)
            .bind(&def.state)
            .bind(enemy.initial_hp)
            .bind(enemy.attack)
            .bind(enemy.defense)
            .bind(&def.dropped_items)
            .bind(&enemy.sequence_id)
            .bind(&enemy.location)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| sql_error("insert_enemy", e))?;

            let vertex = EntityVertex {
                kind: EntityKind::Enemy,
                entity_id: enemy_id,
                key: &def.scenario_enemy_id,
                scenario_id,
                session_id: TEMPLATE_SESSION_ID,
                name: &def.name,
            };
            self.graph.execute(&mut *conn, &vertex.create_cypher()).await?;
        }

        for item in &plan.items {
            sqlx::query(
                "INSERT INTO item (item_id, session_id, scenario_id, name, description, item_type, meta)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(item.item_id)
            .bind(TEMPLATE_SESSION_ID.to_uuid())
            .bind(scenario_id.to_uuid())
            .bind(&item.name)
            .bind(&item.description)
            .bind(&item.item_type)
            .bind(&item.meta)
            .execute(&mut *conn)
            .await
            .map_err(|e| sql_error("insert_item", e))?;
        }
        Ok(())
    }

    async fn insert_relations(
        &self,
        conn: &mut PgConnection,
        scenario_id: ScenarioId,
        plan: &InjectionPlan,
    ) -> Result<(), RepoError> {
        let scenario = cypher_literal(&scenario_id.to_string());
        let template = cypher_literal(&TEMPLATE_SESSION_ID.to_string());

        for relation in &plan.relations {
            let cypher = format!(
                "MATCH (a:{from_label}), (b:{to_label}) \
                 WHERE a.session_id = {template} AND a.scenario_id = {scenario} AND a.entity_key = {from} \
                   AND b.session_id = {template} AND b.scenario_id = {scenario} AND b.entity_key = {to} \
                 CREATE (a)-[e:RELATION {{relation_type: {relation_type}, affinity: {affinity}, meta: {meta}, session_id: {template}}}]->(b) \
                 RETURN id(e)",
                from_label = relation.from_kind.label(),
                to_label = relation.to_kind.label(),
                from = cypher_literal(&relation.from_key),
                to = cypher_literal(&relation.to_key),
                relation_type = cypher_literal(&relation.relation_type),
                affinity = relation.affinity,
                meta = cypher_literal(&relation.meta.to_string()),
            );
            let created = self.graph.execute(&mut *conn, &cypher).await?;
            if created == 0 {
                return Err(RepoError::constraint(format!(
                    "Relation endpoints not found: {} -> {}",
                    relation.from_key, relation.to_key
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ScenarioRepo for PgScenarioRepo {
    async fn inject(&self, plan: &InjectionPlan) -> Result<ScenarioId, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| sql_error("begin", e))?;

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO scenario (title, description)
             VALUES ($1, $2)
             ON CONFLICT (title) DO UPDATE
                SET description = EXCLUDED.description, updated_at = NOW()
             RETURNING scenario_id",
        )
        .bind(&plan.title)
        .bind(&plan.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| sql_error("upsert_scenario", e))?;
        let scenario_id = ScenarioId::from_uuid(id);

        self.clear_template(&mut tx, scenario_id).await?;
        self.insert_structure(&mut tx, scenario_id, plan).await?;
        self.insert_entities(&mut tx, scenario_id, plan).await?;
        self.insert_relations(&mut tx, scenario_id, plan).await?;

        tx.commit()
            .await
            .map_err(|e| sql_error("commit", e))?;

        tracing::info!(
            scenario_id = %scenario_id,
            title = %plan.title,
            acts = plan.acts.len(),
            sequences = plan.sequences.len(),
            npcs = plan.npcs.len(),
            enemies = plan.enemies.len(),
            items = plan.items.len(),
            relations = plan.relations.len(),
            "Scenario injected"
        );
        Ok(scenario_id)
    }

    async fn list(&self) -> Result<Vec<Scenario>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {SCENARIO_COLUMNS} FROM scenario ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("list_scenarios", e))?;

        rows.iter().map(row_to_scenario).collect()
    }

    async fn get(&self, id: ScenarioId) -> Result<Option<ScenarioDetail>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {SCENARIO_COLUMNS} FROM scenario WHERE scenario_id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("get_scenario", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let scenario = row_to_scenario(&row)?;

        let acts = sqlx::query(&format!(
            "SELECT {ACT_COLUMNS} FROM scenario_act WHERE scenario_id = $1 ORDER BY act_order"
        ))
        .bind(id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("get_scenario_acts", e))?
        .iter()
        .map(row_to_act)
        .collect::<Result<Vec<_>, _>>()?;

        let sequences = sqlx::query(&format!(
            "SELECT {SEQUENCE_COLUMNS} FROM scenario_sequence WHERE scenario_id = $1 ORDER BY sequence_order"
        ))
        .bind(id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("get_scenario_sequences", e))?
        .iter()
        .map(row_to_sequence)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ScenarioDetail {
            scenario,
            acts,
            sequences,
        }))
    }

    async fn template_relations(&self, id: ScenarioId) -> Result<Vec<EntityRelation>, RepoError> {
        let cypher = relation_projection(&format!(
            "r.session_id = {} AND a.scenario_id = {}",
            cypher_literal(&TEMPLATE_SESSION_ID.to_string()),
            cypher_literal(&id.to_string()),
        ));
        self.graph.fetch(&self.pool, &cypher).await
    }
}
