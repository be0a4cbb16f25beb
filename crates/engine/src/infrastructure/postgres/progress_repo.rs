//! Postgres implementation of the Progress repository (act, sequence, location).
//!
//! Act and sequence ordinals are 1-based. Whenever one moves, the matching
//! string id is re-resolved against the scenario so both stay in step.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use statedb_domain::*;

use super::rows::*;
use super::sql_error;
use crate::infrastructure::ports::{ProgressRepo, RepoError};

const ACT_STATE_SELECT: &str = "SELECT s.current_act, s.current_act_id, a.act_name
       FROM session s
       LEFT JOIN scenario_act a
         ON a.scenario_id = s.scenario_id AND a.act_id = s.current_act_id
      WHERE s.session_id = $1";

const SEQUENCE_STATE_SELECT: &str = "SELECT s.current_sequence, s.current_sequence_id,
            q.sequence_name, q.location_name
       FROM session s
       LEFT JOIN scenario_sequence q
         ON q.scenario_id = s.scenario_id AND q.sequence_id = s.current_sequence_id
      WHERE s.session_id = $1";

pub struct PgProgressRepo {
    pool: PgPool,
}

impl PgProgressRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_session_row(
        &self,
        sql: &str,
        id: SessionId,
        operation: &'static str,
    ) -> Result<Option<PgRow>, RepoError> {
        sqlx::query(sql)
            .bind(id.to_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| sql_error(operation, e))
    }

    async fn update_session(
        &self,
        sql: &str,
        id: SessionId,
        value: i32,
        operation: &'static str,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(sql)
            .bind(id.to_uuid())
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| sql_error(operation, e))?;
        tracing::debug!(session_id = %id, operation, value, "Progress updated");
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_act_state(id: SessionId, row: &PgRow) -> Result<ActState, RepoError> {
    Ok(ActState {
        session_id: id,
        current_act: row.col("current_act")?,
        current_act_id: row.col("current_act_id")?,
        act_name: row.col("act_name")?,
    })
}

fn row_to_sequence_state(id: SessionId, row: &PgRow) -> Result<SequenceState, RepoError> {
    Ok(SequenceState {
        session_id: id,
        current_sequence: row.col("current_sequence")?,
        current_sequence_id: row.col("current_sequence_id")?,
        sequence_name: row.col("sequence_name")?,
        location_name: row.col("location_name")?,
    })
}

#[async_trait]
impl ProgressRepo for PgProgressRepo {
    async fn progress(&self, id: SessionId) -> Result<Option<SessionProgress>, RepoError> {
        let row = self
            .fetch_one_session_row(
                "SELECT scenario_id, current_act, current_act_id, current_sequence,
                        current_sequence_id, current_phase, current_turn, location, status
                   FROM session WHERE session_id = $1",
                id,
                "get_progress",
            )
            .await?;

        row.map(|row| -> Result<SessionProgress, RepoError> {
            Ok(SessionProgress {
                session_id: id,
                scenario_id: ScenarioId::from_uuid(row.col("scenario_id")?),
                current_act: row.col("current_act")?,
                current_act_id: row.col("current_act_id")?,
                current_sequence: row.col("current_sequence")?,
                current_sequence_id: row.col("current_sequence_id")?,
                current_phase: row.phase("current_phase")?,
                current_turn: row.col("current_turn")?,
                location: row.col("location")?,
                status: row.status("status")?,
            })
        })
        .transpose()
    }

    async fn context(&self, id: SessionId) -> Result<Option<SessionContext>, RepoError> {
        let row = self
            .fetch_one_session_row(
                "SELECT s.scenario_id, sc.title AS scenario_title,
                        s.current_act, s.current_act_id, a.act_name,
                        s.current_sequence, s.current_sequence_id, q.sequence_name,
                        s.location, s.current_phase, s.current_turn, s.status
                   FROM session s
                   JOIN scenario sc ON sc.scenario_id = s.scenario_id
                   LEFT JOIN scenario_act a
                     ON a.scenario_id = s.scenario_id AND a.act_id = s.current_act_id
                   LEFT JOIN scenario_sequence q
                     ON q.scenario_id = s.scenario_id AND q.sequence_id = s.current_sequence_id
                  WHERE s.session_id = $1",
                id,
                "get_context",
            )
            .await?;

        row.map(|row| -> Result<SessionContext, RepoError> {
            Ok(SessionContext {
                session_id: id,
                scenario_id: ScenarioId::from_uuid(row.col("scenario_id")?),
                scenario_title: row.col("scenario_title")?,
                current_act: row.col("current_act")?,
                current_act_id: row.col("current_act_id")?,
                act_name: row.col("act_name")?,
                current_sequence: row.col("current_sequence")?,
                current_sequence_id: row.col("current_sequence_id")?,
                sequence_name: row.col("sequence_name")?,
                location: row.col("location")?,
                current_phase: row.phase("current_phase")?,
                current_turn: row.col("current_turn")?,
                status: row.status("status")?,
            })
        })
        .transpose()
    }

    async fn get_location(&self, id: SessionId) -> Result<Option<LocationState>, RepoError> {
        let row = self
            .fetch_one_session_row(
                "SELECT location FROM session WHERE session_id = $1",
                id,
                "get_location",
            )
            .await?;

        row.map(|row| -> Result<LocationState, RepoError> {
            Ok(LocationState {
                session_id: id,
                location: row.col("location")?,
            })
        })
        .transpose()
    }

    async fn update_location(
        &self,
        id: SessionId,
        location: &str,
    ) -> Result<Option<LocationState>, RepoError> {
        let row = sqlx::query("UPDATE session SET location = $2 WHERE session_id = $1 RETURNING location")
            .bind(id.to_uuid())
            .bind(location)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| sql_error("update_location", e))?;

        row.map(|row| -> Result<LocationState, RepoError> {
            Ok(LocationState {
                session_id: id,
                location: row.col("location")?,
            })
        })
        .transpose()
    }

    // =========================================================================
    // Act
    // =========================================================================

    async fn get_act(&self, id: SessionId) -> Result<Option<ActState>, RepoError> {
        let row = self
            .fetch_one_session_row(ACT_STATE_SELECT, id, "get_act")
            .await?;
        row.map(|row| row_to_act_state(id, &row)).transpose()
    }

    async fn set_act(&self, id: SessionId, act: i32) -> Result<Option<ActState>, RepoError> {
        let updated = self
            .update_session(
                "UPDATE session
                    SET current_act = $2,
                        current_act_id = statedb_resolve_act_id(scenario_id, $2)
                  WHERE session_id = $1",
                id,
                act,
                "set_act",
            )
            .await?;
        if !updated {
            return Ok(None);
        }
        self.get_act(id).await
    }

    async fn shift_act(&self, id: SessionId, delta: i32) -> Result<Option<ActState>, RepoError> {
        let updated = self
            .update_session(
                "UPDATE session
                    SET current_act = GREATEST(current_act + $2, 1),
                        current_act_id = statedb_resolve_act_id(scenario_id, GREATEST(current_act + $2, 1))
                  WHERE session_id = $1",
                id,
                delta,
                "shift_act",
            )
            .await?;
        if !updated {
            return Ok(None);
        }
        self.get_act(id).await
    }

    async fn current_act_details(&self, id: SessionId) -> Result<Option<ActDetails>, RepoError> {
        let row = self
            .fetch_one_session_row(
                &format!(
                    "SELECT scenario_id, {ACT_COLUMNS}
                       FROM scenario_act
                      WHERE (scenario_id, act_id) =
                            (SELECT scenario_id, current_act_id FROM session WHERE session_id = $1)"
                ),
                id,
                "current_act_details",
            )
            .await?;

        row.map(|row| -> Result<ActDetails, RepoError> {
            Ok(ActDetails {
                scenario_id: ScenarioId::from_uuid(row.col("scenario_id")?),
                act: row_to_act(&row)?,
            })
        })
        .transpose()
    }

    // =========================================================================
    // Sequence
    // =========================================================================

    async fn get_sequence(&self, id: SessionId) -> Result<Option<SequenceState>, RepoError> {
        let row = self
            .fetch_one_session_row(SEQUENCE_STATE_SELECT, id, "get_sequence")
            .await?;
        row.map(|row| row_to_sequence_state(id, &row)).transpose()
    }

    async fn set_sequence(
        &self,
        id: SessionId,
        sequence: i32,
    ) -> Result<Option<SequenceState>, RepoError> {
        let updated = self
            .update_session(
                "UPDATE session
                    SET current_sequence = $2,
                        current_sequence_id = statedb_resolve_sequence_id(scenario_id, $2)
                  WHERE session_id = $1",
                id,
                sequence,
                "set_sequence",
            )
            .await?;
        if !updated {
            return Ok(None);
        }
        self.get_sequence(id).await
    }

    async fn shift_sequence(
        &self,
        id: SessionId,
        delta: i32,
    ) -> Result<Option<SequenceState>, RepoError> {
        let updated = self
            .update_session(
                "UPDATE session
                    SET current_sequence = GREATEST(current_sequence + $2, 1),
                        current_sequence_id =
                            statedb_resolve_sequence_id(scenario_id, GREATEST(current_sequence + $2, 1))
                  WHERE session_id = $1",
                id,
                delta,
                "shift_sequence",
            )
            .await?;
        if !updated {
            return Ok(None);
        }
        self.get_sequence(id).await
    }

    async fn current_sequence(
        &self,
        id: SessionId,
    ) -> Result<Option<ScenarioSequence>, RepoError> {
        let row = self
            .fetch_one_session_row(
                &format!(
                    "SELECT {SEQUENCE_COLUMNS}
                       FROM scenario_sequence
                      WHERE (scenario_id, sequence_id) =
                            (SELECT scenario_id, current_sequence_id FROM session WHERE session_id = $1)"
                ),
                id,
                "current_sequence",
            )
            .await?;
        row.as_ref().map(row_to_sequence).transpose()
    }
}
