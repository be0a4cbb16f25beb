//! External service port traits (HTTP transport, Rule Engine, GM).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use statedb_domain::{NpcId, SessionId};

use super::error::ProxyError;

// =============================================================================
// Transport
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// One outbound request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub bearer_token: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: String,
}

/// Transport failures, classified so the caller can decide whether to retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("request failed: {0}")]
    Other(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}

// =============================================================================
// Peer services
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionValidation {
    pub session_id: SessionId,
    pub action_type: String,
    pub action_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
    pub session_id: SessionId,
    pub context: Value,
    pub prompt_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcResponseRequest {
    pub session_id: SessionId,
    pub npc_id: NpcId,
    pub player_action: String,
    pub context: Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleEnginePort: Send + Sync {
    /// Ask the Rule Engine to judge an action. The answer carries `success`
    /// and the `state_changes` to apply.
    async fn validate_action(
        &self,
        request: ActionValidation,
        token: Option<String>,
    ) -> Result<Value, ProxyError>;
    async fn calculate(
        &self,
        session_id: SessionId,
        action_result: Value,
        token: Option<String>,
    ) -> Result<Value, ProxyError>;
    async fn health(&self) -> Result<Value, ProxyError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GmPort: Send + Sync {
    async fn generate_narrative(
        &self,
        request: NarrativeRequest,
        token: Option<String>,
    ) -> Result<Value, ProxyError>;
    async fn generate_npc_response(
        &self,
        request: NpcResponseRequest,
        token: Option<String>,
    ) -> Result<Value, ProxyError>;
    async fn health(&self) -> Result<Value, ProxyError>;
}
