//! PostgreSQL + Apache AGE test harness.
//!
//! Starts an `apache/age` container, installs the schema and builds an `App`
//! whose peer-service ports are mocks.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use testcontainers::{core::WaitFor, runners::AsyncRunner, ContainerAsync, GenericImage};
use tokio::time::sleep;

use crate::app::{App, Repositories};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ports::{MockGmPort, MockRuleEnginePort};
use crate::infrastructure::postgres::{self, AgeGraph, PostgresRepositories};
use crate::infrastructure::random::SystemRandom;

pub const TEST_DB_PASSWORD: &str = "testpassword";
pub const TEST_GRAPH: &str = "state_db";

pub type HarnessResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct AgeTestHarness {
    _container: ContainerAsync<GenericImage>,
    pub pool: PgPool,
    pub app: Arc<App>,
}

impl AgeTestHarness {
    /// Start the container, wait for Postgres and install the schema.
    pub async fn start() -> HarnessResult<Self> {
        let container: ContainerAsync<GenericImage> = age_image().start().await;
        let port = container.get_host_port_ipv4(5432).await;
        let config = test_config(port);

        let pool = connect_with_retry(&config).await?;
        let graph = AgeGraph::new(TEST_GRAPH);
        postgres::ensure_schema(&pool, &graph).await?;

        let repos = PostgresRepositories::new(pool.clone(), graph);
        let app = Arc::new(App::new(
            Repositories::from(repos),
            Arc::new(MockRuleEnginePort::new()),
            Arc::new(MockGmPort::new()),
            Arc::new(SystemRandom::new()),
            false,
        ));

        Ok(Self {
            _container: container,
            pool,
            app,
        })
    }
}

pub fn age_image() -> GenericImage {
    GenericImage::new("apache/age", "release_PG16_1.5.0")
        .with_env_var("POSTGRES_USER", "postgres")
        .with_env_var("POSTGRES_PASSWORD", TEST_DB_PASSWORD)
        .with_env_var("POSTGRES_DB", "state_db")
        .with_exposed_port(5432)
        // initdb restarts the server once; readiness is checked by connect_with_retry
        .with_wait_for(WaitFor::seconds(3))
}

fn test_config(port: u16) -> AppConfig {
    AppConfig {
        db_host: "127.0.0.1".into(),
        db_port: port,
        db_user: "postgres".into(),
        db_password: TEST_DB_PASSWORD.into(),
        db_name: "state_db".into(),
        db_pool_min: 1,
        db_pool_max: 4,
        age_graph_name: TEST_GRAPH.into(),
        app_host: "127.0.0.1".into(),
        app_port: 0,
        app_env: "test".into(),
        rule_engine_url: "http://127.0.0.1:1".into(),
        gm_url: "http://127.0.0.1:1".into(),
        proxy_timeout: 1,
        proxy_max_retries: 1,
        proxy_retry_min_wait: 0,
        proxy_retry_max_wait: 0,
        require_api_key: false,
        cors_allowed_origins: None,
    }
}

/// Connect with exponential backoff, capped at 5s between attempts.
pub async fn connect_with_retry(config: &AppConfig) -> HarnessResult<PgPool> {
    let max_attempts = 30;
    let max_delay = Duration::from_secs(5);
    let mut delay = Duration::from_millis(500);
    let mut last_err = None;

    for attempt in 1..=max_attempts {
        match postgres::connect(config).await {
            Ok(pool) => {
                tracing::info!(attempt, "PostgreSQL connection established");
                return Ok(pool);
            }
            Err(e) => last_err = Some(e.to_string()),
        }

        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis(),
            error = last_err.as_deref().unwrap_or("unknown"),
            "Retrying PostgreSQL connection"
        );
        sleep(delay).await;
        delay = std::cmp::min(delay.saturating_mul(2), max_delay);
    }

    Err(format!(
        "Failed to connect to PostgreSQL after {max_attempts} attempts: {:?}",
        last_err
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires docker (testcontainers)"]
    async fn harness_installs_schema_and_graph() {
        let harness = AgeTestHarness::start()
            .await
            .expect("Failed to start AGE harness");

        let graphs: i64 =
            sqlx::query_scalar("SELECT count(*) FROM ag_catalog.ag_graph WHERE name::text = $1")
                .bind(TEST_GRAPH)
                .fetch_one(&harness.pool)
                .await
                .expect("Graph query failed");
        assert_eq!(graphs, 1);

        let sessions: i64 = sqlx::query_scalar("SELECT count(*) FROM session")
            .fetch_one(&harness.pool)
            .await
            .expect("Count query failed");
        assert_eq!(sessions, 0);

        harness.app.repositories.health.ping().await.expect("ping");
    }

    #[tokio::test]
    #[ignore = "requires docker (testcontainers)"]
    async fn schema_install_is_idempotent() {
        let harness = AgeTestHarness::start()
            .await
            .expect("Failed to start AGE harness");

        postgres::ensure_schema(&harness.pool, &AgeGraph::new(TEST_GRAPH))
            .await
            .expect("second ensure_schema");
    }
}
