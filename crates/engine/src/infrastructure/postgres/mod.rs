//! PostgreSQL + Apache AGE implementations of the repository ports.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ports::RepoError;

mod graph;
mod rows;
mod schema;

mod api_key_repo;
mod entity_repo;
mod health_repo;
mod player_repo;
mod progress_repo;
mod scenario_repo;
mod session_repo;
mod trace_repo;

pub use graph::{cypher_literal, AgeGraph};
pub use schema::ensure_schema;

pub use api_key_repo::PgApiKeyRepo;
pub use entity_repo::PgEntityRepo;
pub use health_repo::PgHealthRepo;
pub use player_repo::PgPlayerRepo;
pub use progress_repo::PgProgressRepo;
pub use scenario_repo::PgScenarioRepo;
pub use session_repo::PgSessionRepo;
pub use trace_repo::PgTraceRepo;

/// Build the bounded pool. Every new connection loads AGE and puts `public` ahead
/// of `ag_catalog` so unqualified tables resolve to ours.
pub async fn connect(config: &AppConfig) -> Result<PgPool, RepoError> {
    PgPoolOptions::new()
        .min_connections(config.db_pool_min)
        .max_connections(config.db_pool_max)
        .acquire_timeout(Duration::from_secs(10))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("LOAD 'age'").await?;
                conn.execute(r#"SET search_path = public, ag_catalog, "$user""#)
                    .await?;
                Ok(())
            })
        })
        .connect_with(config.pg_connect_options())
        .await
        .map_err(|e| RepoError::database("connect", e))
}

/// SQLSTATE codes raised by bad input rather than a broken database:
/// not-null, foreign key, unique and check violations, and numeric overflow.
fn is_input_violation(code: &str) -> bool {
    matches!(code, "23502" | "23503" | "23505" | "23514" | "22003")
}

/// Map a sqlx failure. Constraint and range violations become
/// `ConstraintViolation` so callers answer 400 instead of 500.
pub(crate) fn sql_error(operation: &'static str, error: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &error {
        if db.code().is_some_and(|code| is_input_violation(&code)) {
            tracing::debug!(operation, code = ?db.code(), "Rejected by database constraint");
            return RepoError::constraint(db.message());
        }
    }
    RepoError::database(operation, error)
}

/// Create all Postgres repositories from a pool.
pub struct PostgresRepositories {
    pub scenario: Arc<PgScenarioRepo>,
    pub session: Arc<PgSessionRepo>,
    pub progress: Arc<PgProgressRepo>,
    pub player: Arc<PgPlayerRepo>,
    pub entity: Arc<PgEntityRepo>,
    pub trace: Arc<PgTraceRepo>,
    pub api_key: Arc<PgApiKeyRepo>,
    pub health: Arc<PgHealthRepo>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool, graph: AgeGraph) -> Self {
        Self {
            scenario: Arc::new(PgScenarioRepo::new(pool.clone(), graph.clone())),
            session: Arc::new(PgSessionRepo::new(pool.clone(), graph.clone())),
            progress: Arc::new(PgProgressRepo::new(pool.clone())),
            player: Arc::new(PgPlayerRepo::new(pool.clone())),
            entity: Arc::new(PgEntityRepo::new(pool.clone(), graph)),
            trace: Arc::new(PgTraceRepo::new(pool.clone())),
            api_key: Arc::new(PgApiKeyRepo::new(pool.clone())),
            health: Arc::new(PgHealthRepo::new(pool)),
        }
    }
}
