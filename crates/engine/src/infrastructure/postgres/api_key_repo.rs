//! Postgres implementation of the API key repository.

use async_trait::async_trait;
use sqlx::PgPool;

use statedb_domain::*;

use super::rows::*;
use super::sql_error;
use crate::infrastructure::ports::{ApiKeyRepo, RepoError};

pub struct PgApiKeyRepo {
    pool: PgPool,
}

impl PgApiKeyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepo for PgApiKeyRepo {
    async fn create(&self, key_hash: &str, key_name: &str) -> Result<ApiKey, RepoError> {
        let row = sqlx::query(&format!(
            "INSERT INTO api_keys (key_hash, key_name) VALUES ($1, $2) RETURNING {API_KEY_COLUMNS}"
        ))
        .bind(key_hash)
        .bind(key_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| sql_error("create_api_key", e))?;

        row_to_api_key(&row)
    }

    async fn list(&self) -> Result<Vec<ApiKey>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| sql_error("list_api_keys", e))?;

        rows.iter().map(row_to_api_key).collect()
    }

    async fn deactivate(&self, id: ApiKeyId) -> Result<bool, RepoError> {
        let result = sqlx::query("UPDATE api_keys SET is_active = FALSE WHERE api_key_id = $1")
            .bind(id.to_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| sql_error("deactivate_api_key", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn verify(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError> {
        let row = sqlx::query(&format!(
            "UPDATE api_keys SET last_used_at = NOW()
              WHERE key_hash = $1 AND is_active
          RETURNING {API_KEY_COLUMNS}"
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| sql_error("verify_api_key", e))?;

        row.as_ref().map(row_to_api_key).transpose()
    }
}
