//! Postgres implementation of the Session repository.
//!
//! Cloning is delegated to the `create_session` database function so the copy
//! of rows, vertices and edges happens in one statement.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use statedb_domain::*;

use super::graph::{cypher_literal, AgeGraph};
use super::rows::*;
use super::sql_error;
use crate::infrastructure::ports::{RepoError, SessionRepo, SessionStart};

pub struct PgSessionRepo {
    pool: PgPool,
    graph: AgeGraph,
}

impl PgSessionRepo {
    pub fn new(pool: PgPool, graph: AgeGraph) -> Self {
        Self { pool, graph }
    }
}

#[async_trait]
impl SessionRepo for PgSessionRepo {
    async fn create(&self, start: &SessionStart) -> Result<Option<SessionId>, RepoError> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT create_session($1, $2, $3, $4, $5)")
            .bind(start.scenario_id.to_uuid())
            .bind(start.current_act)
            .bind(start.current_sequence)
            .bind(&start.location)
            .bind(self.graph.name())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| sql_error("create_session", e))?;

        if let Some(id) = id {
            tracing::info!(session_id = %id, scenario_id = %start.scenario_id, "Session created");
        }
        Ok(id.map(SessionId::from_uuid))
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepoError> {
        let row = sqlx::query(&format!("{SESSION_SELECT} WHERE s.session_id = $1"))
            .bind(id.to_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| sql_error("get_session", e))?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn list(&self, status: Option<SessionStatus>) -> Result<Vec<Session>, RepoError> {
        let rows = sqlx::query(&format!(
            "{SESSION_SELECT}
             WHERE ($1::varchar IS NULL OR s.status = $1)
             ORDER BY s.started_at DESC"
        ))
        .bind(status.map(SessionStatus::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("list_sessions", e))?;

        rows.iter().map(row_to_session).collect()
    }

    async fn set_status(
        &self,
        id: SessionId,
        status: SessionStatus,
    ) -> Result<Option<Session>, RepoError> {
        let updated = sqlx::query(
            "UPDATE session
                SET status = $2::varchar,
                    ended_at = CASE WHEN $2::varchar = 'ended' THEN NOW() ELSE ended_at END,
                    paused_at = CASE
                        WHEN $2::varchar = 'paused' THEN NOW()
                        WHEN $2::varchar = 'active' THEN NULL
                        ELSE paused_at
                    END
              WHERE session_id = $1",
        )
        .bind(id.to_uuid())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| sql_error("set_session_status", e))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: SessionId) -> Result<bool, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| sql_error("begin", e))?;

        let deleted = sqlx::query("DELETE FROM session WHERE session_id = $1")
            .bind(id.to_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| sql_error("delete_session", e))?;
        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        for sql in [
            "DELETE FROM npc WHERE session_id = $1",
            "DELETE FROM enemy WHERE session_id = $1",
            "DELETE FROM item WHERE session_id = $1",
        ] {
            sqlx::query(sql)
                .bind(id.to_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| sql_error("delete_session_entities", e))?;
        }

        let cypher = format!(
            "MATCH (v) WHERE v.session_id = {} DETACH DELETE v",
            cypher_literal(&id.to_string())
        );
        self.graph.execute(&mut *tx, &cypher).await?;

        tx.commit()
            .await
            .map_err(|e| sql_error("commit", e))?;

        tracing::info!(session_id = %id, "Session deleted");
        Ok(true)
    }

    async fn get_phase(&self, id: SessionId) -> Result<Option<PhaseState>, RepoError> {
        let row = sqlx::query("SELECT session_id, current_phase FROM session WHERE session_id = $1")
            .bind(id.to_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| sql_error("get_phase", e))?;

        row.map(|row| -> Result<PhaseState, RepoError> {
            Ok(PhaseState {
                session_id: id,
                current_phase: row.phase("current_phase")?,
            })
        })
        .transpose()
    }

    async fn change_phase(
        &self,
        id: SessionId,
        phase: Phase,
    ) -> Result<Option<PhaseState>, RepoError> {
        let row = sqlx::query(
            "UPDATE session SET current_phase = $2
              WHERE session_id = $1
          RETURNING current_phase",
        )
        .bind(id.to_uuid())
        .bind(phase.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("change_phase", e))?;

        row.map(|row| -> Result<PhaseState, RepoError> {
            Ok(PhaseState {
                session_id: id,
                current_phase: row.phase("current_phase")?,
            })
        })
        .transpose()
    }

    async fn get_turn(&self, id: SessionId) -> Result<Option<TurnState>, RepoError> {
        let row = sqlx::query(
            "SELECT s.current_turn, t.phase_at_turn, t.turn_type, t.created_at
               FROM session s
               LEFT JOIN turn_history t
                 ON t.session_id = s.session_id AND t.turn_number = s.current_turn
              WHERE s.session_id = $1",
        )
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("get_turn", e))?;

        row.map(|row| -> Result<TurnState, RepoError> {
            Ok(TurnState {
                session_id: id,
                current_turn: row.col("current_turn")?,
                phase_at_turn: row.optional_phase("phase_at_turn")?,
                turn_type: row.col("turn_type")?,
                created_at: row.col("created_at")?,
            })
        })
        .transpose()
    }

    async fn add_turn(&self, id: SessionId) -> Result<Option<TurnState>, RepoError> {
        let updated =
            sqlx::query("UPDATE session SET current_turn = current_turn + 1 WHERE session_id = $1")
                .bind(id.to_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| sql_error("add_turn", e))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_turn(id).await
    }
}
