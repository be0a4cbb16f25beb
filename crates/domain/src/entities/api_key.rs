use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ApiKeyId;

/// Stored API key metadata. The key itself is only ever held as a SHA-256 hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub api_key_id: ApiKeyId,
    pub key_name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Returned once at creation; the plaintext key is not recoverable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedApiKey {
    pub api_key: String,
    pub api_key_id: ApiKeyId,
    pub key_name: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}
