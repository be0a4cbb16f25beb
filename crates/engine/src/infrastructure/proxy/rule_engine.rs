//! Rule Engine client.

use async_trait::async_trait;
use serde_json::{json, Value};
use statedb_domain::SessionId;
use std::sync::Arc;

use super::ProxyClient;
use crate::infrastructure::ports::{ActionValidation, HttpMethod, ProxyError, RuleEnginePort};

pub struct RuleEngineClient {
    proxy: Arc<ProxyClient>,
    base_url: String,
}

impl RuleEngineClient {
    pub fn new(proxy: Arc<ProxyClient>, base_url: &str) -> Self {
        Self {
            proxy,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RuleEnginePort for RuleEngineClient {
    async fn validate_action(
        &self,
        request: ActionValidation,
        token: Option<String>,
    ) -> Result<Value, ProxyError> {
        tracing::debug!(
            session_id = %request.session_id,
            action_type = %request.action_type,
            "Validating action"
        );
        let body = serde_json::to_value(&request).map_err(|e| ProxyError::Request(e.to_string()))?;
        self.proxy
            .request(
                HttpMethod::Post,
                &self.base_url,
                "/validate",
                token.as_deref(),
                Some(body),
            )
            .await
    }

    async fn calculate(
        &self,
        session_id: SessionId,
        action_result: Value,
        token: Option<String>,
    ) -> Result<Value, ProxyError> {
        tracing::debug!(session_id = %session_id, "Calculating action result");
        self.proxy
            .request(
                HttpMethod::Post,
                &self.base_url,
                "/calculate",
                token.as_deref(),
                Some(json!({
                    "session_id": session_id,
                    "action_result": action_result,
                })),
            )
            .await
    }

    async fn health(&self) -> Result<Value, ProxyError> {
        self.proxy
            .request(HttpMethod::Get, &self.base_url, "/health", None, None)
            .await
    }
}
