//! Database liveness check.

use async_trait::async_trait;
use sqlx::PgPool;

use super::sql_error;
use crate::infrastructure::ports::{HealthRepo, RepoError};

pub struct PgHealthRepo {
    pool: PgPool,
}

impl PgHealthRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthRepo for PgHealthRepo {
    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| sql_error("ping", e))?;
        Ok(())
    }
}
