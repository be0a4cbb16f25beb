//! Postgres implementation of the Trace repository.
//!
//! `turn_history` and `phase_history` are append-only and written by triggers on
//! `session`; everything here is a read.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use statedb_domain::*;

use super::rows::*;
use super::sql_error;
use crate::infrastructure::ports::{RepoError, TraceRepo};

pub struct PgTraceRepo {
    pool: PgPool,
}

impl PgTraceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn turn_rows(
        &self,
        filter: &str,
        session_id: SessionId,
        args: &[i64],
        operation: &'static str,
    ) -> Result<Vec<TurnRecord>, RepoError> {
        let sql = format!("SELECT {TURN_COLUMNS} FROM turn_history WHERE session_id = $1 {filter}");
        let mut query = sqlx::query(&sql).bind(session_id.to_uuid());
        for arg in args {
            query = query.bind(*arg);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| sql_error(operation, e))?;

        rows.iter().map(row_to_turn).collect()
    }

    async fn phase_rows(
        &self,
        filter: &str,
        session_id: SessionId,
        args: &[i64],
        operation: &'static str,
    ) -> Result<Vec<PhaseTransition>, RepoError> {
        let sql =
            format!("SELECT {PHASE_COLUMNS} FROM phase_history WHERE session_id = $1 {filter}");
        let mut query = sqlx::query(&sql).bind(session_id.to_uuid());
        for arg in args {
            query = query.bind(*arg);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| sql_error(operation, e))?;

        rows.iter().map(row_to_phase_transition).collect()
    }
}

fn row_to_turn_phase_statistics(row: &PgRow) -> Result<TurnPhaseStatistics, RepoError> {
    Ok(TurnPhaseStatistics {
        phase: row.phase("phase")?,
        turn_count: row.col("turn_count")?,
        first_turn: row.col("first_turn")?,
        last_turn: row.col("last_turn")?,
    })
}

fn row_to_phase_statistics(row: &PgRow) -> Result<PhaseStatistics, RepoError> {
    Ok(PhaseStatistics {
        phase: row.phase("phase")?,
        entered_count: row.col("entered_count")?,
        total_seconds: row.col("total_seconds")?,
    })
}

#[async_trait]
impl TraceRepo for PgTraceRepo {
    // =========================================================================
    // Turns
    // =========================================================================

    async fn turns(&self, session_id: SessionId) -> Result<Vec<TurnRecord>, RepoError> {
        self.turn_rows("ORDER BY turn_number", session_id, &[], "turns")
            .await
    }

    async fn recent_turns(
        &self,
        session_id: SessionId,
        limit: i64,
    ) -> Result<Vec<TurnRecord>, RepoError> {
        self.turn_rows(
            "ORDER BY turn_number DESC LIMIT $2",
            session_id,
            &[limit],
            "recent_turns",
        )
        .await
    }

    async fn turn(
        &self,
        session_id: SessionId,
        turn_number: i32,
    ) -> Result<Option<TurnRecord>, RepoError> {
        let mut rows = self
            .turn_rows(
                "AND turn_number = $2",
                session_id,
                &[i64::from(turn_number)],
                "turn",
            )
            .await?;
        Ok(rows.pop())
    }

    async fn turn_range(
        &self,
        session_id: SessionId,
        start: i32,
        end: i32,
    ) -> Result<Vec<TurnRecord>, RepoError> {
        self.turn_rows(
            "AND turn_number BETWEEN $2 AND $3 ORDER BY turn_number",
            session_id,
            &[i64::from(start), i64::from(end)],
            "turn_range",
        )
        .await
    }

    async fn latest_turn(&self, session_id: SessionId) -> Result<Option<TurnRecord>, RepoError> {
        let mut rows = self
            .turn_rows(
                "ORDER BY turn_number DESC LIMIT 1",
                session_id,
                &[],
                "latest_turn",
            )
            .await?;
        Ok(rows.pop())
    }

    async fn turn_statistics_by_phase(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<TurnPhaseStatistics>, RepoError> {
        let rows = sqlx::query(
            "SELECT phase_at_turn AS phase, COUNT(*) AS turn_count,
                    MIN(turn_number) AS first_turn, MAX(turn_number) AS last_turn
               FROM turn_history
              WHERE session_id = $1
              GROUP BY phase_at_turn
              ORDER BY MIN(turn_number)",
        )
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("turn_statistics_by_phase", e))?;

        rows.iter().map(row_to_turn_phase_statistics).collect()
    }

    async fn turn_statistics_by_type(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<TurnTypeStatistics>, RepoError> {
        let rows = sqlx::query(
            "SELECT turn_type, COUNT(*) AS turn_count
               FROM turn_history
              WHERE session_id = $1
              GROUP BY turn_type
              ORDER BY turn_count DESC, turn_type",
        )
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("turn_statistics_by_type", e))?;

        rows.iter()
            .map(|row| -> Result<TurnTypeStatistics, RepoError> {
                Ok(TurnTypeStatistics {
                    turn_type: row.col("turn_type")?,
                    turn_count: row.col("turn_count")?,
                })
            })
            .collect()
    }

    async fn turn_durations(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<TurnDuration>, RepoError> {
        let rows = sqlx::query(
            "SELECT turn_number, phase_at_turn, started_at, ended_at,
                    EXTRACT(EPOCH FROM (ended_at - started_at))::float8 AS duration_seconds
               FROM (
                    SELECT turn_number, phase_at_turn, created_at AS started_at,
                           LEAD(created_at) OVER (ORDER BY turn_number) AS ended_at
                      FROM turn_history
                     WHERE session_id = $1
               ) t
              ORDER BY turn_number",
        )
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("turn_durations", e))?;

        rows.iter()
            .map(|row| -> Result<TurnDuration, RepoError> {
                Ok(TurnDuration {
                    turn_number: row.col("turn_number")?,
                    phase_at_turn: row.phase("phase_at_turn")?,
                    started_at: row.col("started_at")?,
                    ended_at: row.col("ended_at")?,
                    duration_seconds: row.col("duration_seconds")?,
                })
            })
            .collect()
    }

    async fn turn_summary(&self, session_id: SessionId) -> Result<TurnSummary, RepoError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total_turns, MAX(turn_number) AS latest_turn,
                    MIN(created_at) AS first_turn_at, MAX(created_at) AS last_turn_at
               FROM turn_history
              WHERE session_id = $1",
        )
        .bind(session_id.to_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| sql_error("turn_summary", e))?;

        Ok(TurnSummary {
            session_id,
            total_turns: row.col("total_turns")?,
            latest_turn: row.col("latest_turn")?,
            first_turn_at: row.col("first_turn_at")?,
            last_turn_at: row.col("last_turn_at")?,
            by_phase: self.turn_statistics_by_phase(session_id).await?,
        })
    }

    // =========================================================================
    // Phases
    // =========================================================================

    async fn phases(&self, session_id: SessionId) -> Result<Vec<PhaseTransition>, RepoError> {
        self.phase_rows(
            "ORDER BY transitioned_at, history_id",
            session_id,
            &[],
            "phases",
        )
        .await
    }

    async fn recent_phases(
        &self,
        session_id: SessionId,
        limit: i64,
    ) -> Result<Vec<PhaseTransition>, RepoError> {
        self.phase_rows(
            "ORDER BY transitioned_at DESC, history_id DESC LIMIT $2",
            session_id,
            &[limit],
            "recent_phases",
        )
        .await
    }

    async fn phases_by_phase(
        &self,
        session_id: SessionId,
        phase: Phase,
    ) -> Result<Vec<PhaseTransition>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {PHASE_COLUMNS} FROM phase_history
              WHERE session_id = $1 AND new_phase = $2
              ORDER BY transitioned_at, history_id"
        ))
        .bind(session_id.to_uuid())
        .bind(phase.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("phases_by_phase", e))?;

        rows.iter().map(row_to_phase_transition).collect()
    }

    async fn phase_range(
        &self,
        session_id: SessionId,
        start_turn: i32,
        end_turn: i32,
    ) -> Result<Vec<PhaseTransition>, RepoError> {
        self.phase_rows(
            "AND turn_at_transition BETWEEN $2 AND $3 ORDER BY transitioned_at, history_id",
            session_id,
            &[i64::from(start_turn), i64::from(end_turn)],
            "phase_range",
        )
        .await
    }

    async fn latest_phase(
        &self,
        session_id: SessionId,
    ) -> Result<Option<PhaseTransition>, RepoError> {
        let mut rows = self
            .phase_rows(
                "ORDER BY transitioned_at DESC, history_id DESC LIMIT 1",
                session_id,
                &[],
                "latest_phase",
            )
            .await?;
        Ok(rows.pop())
    }

    async fn phase_statistics(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PhaseStatistics>, RepoError> {
        // The open visit of the current phase is counted up to now.
        let rows = sqlx::query(
            "WITH visits AS (
                 SELECT new_phase, transitioned_at,
                        COALESCE(
                            LEAD(transitioned_at) OVER (ORDER BY transitioned_at, history_id),
                            NOW()
                        ) AS left_at
                   FROM phase_history
                  WHERE session_id = $1
             )
             SELECT new_phase AS phase,
                    COUNT(*) AS entered_count,
                    COALESCE(SUM(EXTRACT(EPOCH FROM (left_at - transitioned_at))), 0)::float8
                        AS total_seconds
               FROM visits
              GROUP BY new_phase
              ORDER BY MIN(transitioned_at)",
        )
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("phase_statistics", e))?;

        rows.iter().map(row_to_phase_statistics).collect()
    }

    async fn phase_patterns(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PhasePattern>, RepoError> {
        let rows = sqlx::query(
            "SELECT previous_phase, new_phase, COUNT(*) AS occurrences
               FROM phase_history
              WHERE session_id = $1
              GROUP BY previous_phase, new_phase
              ORDER BY occurrences DESC, previous_phase NULLS FIRST, new_phase",
        )
        .bind(session_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("phase_patterns", e))?;

        rows.iter()
            .map(|row| -> Result<PhasePattern, RepoError> {
                Ok(PhasePattern {
                    previous_phase: row.optional_phase("previous_phase")?,
                    new_phase: row.phase("new_phase")?,
                    occurrences: row.col("occurrences")?,
                })
            })
            .collect()
    }

    async fn phase_summary(&self, session_id: SessionId) -> Result<PhaseSummary, RepoError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total_transitions,
                    MIN(transitioned_at) AS first_transition_at,
                    MAX(transitioned_at) AS last_transition_at,
                    (SELECT new_phase FROM phase_history
                      WHERE session_id = $1
                      ORDER BY transitioned_at DESC, history_id DESC
                      LIMIT 1) AS current_phase
               FROM phase_history
              WHERE session_id = $1",
        )
        .bind(session_id.to_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| sql_error("phase_summary", e))?;

        Ok(PhaseSummary {
            session_id,
            total_transitions: row.col("total_transitions")?,
            current_phase: row.optional_phase("current_phase")?,
            first_transition_at: row.col("first_transition_at")?,
            last_transition_at: row.col("last_transition_at")?,
            statistics: self.phase_statistics(session_id).await?,
        })
    }
}
