//! Environment-driven configuration.
//!
//! Every key has a default so a bare `cargo run` against a local Postgres works.
//! Variable names are the upper-case form of the field names (`DB_HOST` -> `db_host`).

use anyhow::{bail, Context, Result};
use config::{Config, Environment};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::infrastructure::proxy::RetryConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_pool_min: u32,
    pub db_pool_max: u32,
    pub age_graph_name: String,

    pub app_host: String,
    pub app_port: u16,
    pub app_env: String,

    pub rule_engine_url: String,
    pub gm_url: String,
    /// Seconds.
    pub proxy_timeout: u64,
    /// Total attempts for connect/timeout failures.
    pub proxy_max_retries: u32,
    /// Seconds.
    pub proxy_retry_min_wait: u64,
    /// Seconds.
    pub proxy_retry_max_wait: u64,

    pub require_api_key: bool,

    /// `*` or a comma-separated origin list. Unset leaves CORS off.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

/// Browser origins the CORS layer admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_environment(Environment::default().try_parsing(true))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let config = Config::builder()
            .set_default("db_host", "localhost")?
            .set_default("db_port", 5432)?
            .set_default("db_user", "postgres")?
            .set_default("db_password", "postgres")?
            .set_default("db_name", "state_db")?
            .set_default("db_pool_min", 2)?
            .set_default("db_pool_max", 10)?
            .set_default("age_graph_name", "state_db")?
            .set_default("app_host", "0.0.0.0")?
            .set_default("app_port", 8030)?
            .set_default("app_env", "local")?
            .set_default("rule_engine_url", "http://localhost:8050")?
            .set_default("gm_url", "http://localhost:8020")?
            .set_default("proxy_timeout", 10)?
            .set_default("proxy_max_retries", 3)?
            .set_default("proxy_retry_min_wait", 1)?
            .set_default("proxy_retry_max_wait", 10)?
            .set_default("require_api_key", false)?
            .add_source(environment)
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !is_plain_identifier(&self.age_graph_name) {
            bail!(
                "AGE_GRAPH_NAME must be a plain identifier, got {:?}",
                self.age_graph_name
            );
        }
        if self.db_pool_min > self.db_pool_max {
            bail!(
                "DB_POOL_MIN ({}) exceeds DB_POOL_MAX ({})",
                self.db_pool_min,
                self.db_pool_max
            );
        }
        if self.proxy_max_retries == 0 {
            bail!("PROXY_MAX_RETRIES must be at least 1");
        }
        Ok(())
    }

    pub fn pg_connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }

    pub fn proxy_retry_policy(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.proxy_max_retries,
            base_delay_ms: self.proxy_retry_min_wait.saturating_mul(1000),
            max_delay_ms: self.proxy_retry_max_wait.saturating_mul(1000),
            jitter_factor: 0.2,
        }
    }

    /// `None` when no usable origin is configured.
    pub fn cors_origins(&self) -> Option<CorsOrigins> {
        let raw = self.cors_allowed_origins.as_deref()?.trim();
        if raw == "*" {
            return Some(CorsOrigins::Any);
        }
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!origins.is_empty()).then_some(CorsOrigins::List(origins))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}

/// Graph names are spliced into SQL text, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
