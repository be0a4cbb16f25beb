//! API key issue, revocation and verification.
//!
//! Only the SHA-256 hex digest of a key is stored. The plaintext leaves the
//! service exactly once, in the response to `create`.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use statedb_domain::{ApiKey, ApiKeyId, IssuedApiKey};

use crate::infrastructure::ports::{ApiKeyRepo, RandomPort, RepoError};

const KEY_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ApiKeyError {
    #[error("API key not found: {0}")]
    NotFound(ApiKeyId),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub fn hash_api_key(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub struct ApiKeyUseCases {
    repo: Arc<dyn ApiKeyRepo>,
    random: Arc<dyn RandomPort>,
}

impl ApiKeyUseCases {
    pub fn new(repo: Arc<dyn ApiKeyRepo>, random: Arc<dyn RandomPort>) -> Self {
        Self { repo, random }
    }

    pub async fn create(&self, key_name: &str) -> Result<IssuedApiKey, ApiKeyError> {
        let api_key = hex::encode(self.random.bytes(KEY_BYTES));
        let stored = self.repo.create(&hash_api_key(&api_key), key_name).await?;

        tracing::info!(api_key_id = %stored.api_key_id, key_name, "API key issued");
        Ok(IssuedApiKey {
            api_key,
            api_key_id: stored.api_key_id,
            key_name: stored.key_name,
            created_at: stored.created_at,
            is_active: stored.is_active,
        })
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>, ApiKeyError> {
        Ok(self.repo.list().await?)
    }

    pub async fn revoke(&self, id: ApiKeyId) -> Result<(), ApiKeyError> {
        if self.repo.deactivate(id).await? {
            tracing::info!(api_key_id = %id, "API key deactivated");
            Ok(())
        } else {
            Err(ApiKeyError::NotFound(id))
        }
    }

    /// `None` for unknown or deactivated keys.
    pub async fn verify(&self, raw: &str) -> Result<Option<ApiKey>, ApiKeyError> {
        Ok(self.repo.verify(&hash_api_key(raw)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockApiKeyRepo, MockRandomPort};
    use chrono::Utc;

    fn stored(key_name: &str) -> ApiKey {
        ApiKey {
            api_key_id: ApiKeyId::new(),
            key_name: key_name.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            is_active: true,
        }
    }

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn create_stores_hash_and_returns_plaintext_once() {
        let mut random = MockRandomPort::new();
        random
            .expect_bytes()
            .withf(|len| *len == 32)
            .returning(|len| vec![0xab; len]);

        let plaintext = "ab".repeat(32);
        let expected_hash = hash_api_key(&plaintext);
        let mut repo = MockApiKeyRepo::new();
        repo.expect_create()
            .withf(move |hash, name| hash == expected_hash && name == "gm-service")
            .times(1)
            .returning(|_, name| Ok(stored(name)));

        let use_case = ApiKeyUseCases::new(Arc::new(repo), Arc::new(random));
        let issued = use_case.create("gm-service").await.unwrap();

        assert_eq!(issued.api_key, plaintext);
        assert_eq!(issued.api_key.len(), 64);
        assert_eq!(issued.key_name, "gm-service");
        assert!(issued.is_active);
    }

    #[tokio::test]
    async fn revoke_unknown_key_is_not_found() {
        let id = ApiKeyId::new();
        let mut repo = MockApiKeyRepo::new();
        repo.expect_deactivate().returning(|_| Ok(false));

        let use_case = ApiKeyUseCases::new(Arc::new(repo), Arc::new(MockRandomPort::new()));
        let result = use_case.revoke(id).await;

        assert!(matches!(result, Err(ApiKeyError::NotFound(kid)) if kid == id));
    }

    #[tokio::test]
    async fn verify_looks_up_by_hash() {
        let mut repo = MockApiKeyRepo::new();
        repo.expect_verify()
            .withf(|hash| hash == hash_api_key("secret"))
            .returning(|_| Ok(Some(stored("gm"))));

        let use_case = ApiKeyUseCases::new(Arc::new(repo), Arc::new(MockRandomPort::new()));
        let key = use_case.verify("secret").await.unwrap();

        assert_eq!(key.map(|k| k.key_name), Some("gm".to_string()));
    }
}
