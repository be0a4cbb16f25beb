//! GM service client.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::ProxyClient;
use crate::infrastructure::ports::{
    GmPort, HttpMethod, NarrativeRequest, NpcResponseRequest, ProxyError,
};

pub struct GmClient {
    proxy: Arc<ProxyClient>,
    base_url: String,
}

impl GmClient {
    pub fn new(proxy: Arc<ProxyClient>, base_url: &str) -> Self {
        Self {
            proxy,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post(
        &self,
        path: &str,
        body: Value,
        token: Option<String>,
    ) -> Result<Value, ProxyError> {
        self.proxy
            .request(
                HttpMethod::Post,
                &self.base_url,
                path,
                token.as_deref(),
                Some(body),
            )
            .await
    }
}

#[async_trait]
impl GmPort for GmClient {
    async fn generate_narrative(
        &self,
        request: NarrativeRequest,
        token: Option<String>,
    ) -> Result<Value, ProxyError> {
        tracing::debug!(session_id = %request.session_id, "Generating narrative");
        let body = serde_json::to_value(&request).map_err(|e| ProxyError::Request(e.to_string()))?;
        self.post("/generate/narrative", body, token).await
    }

    async fn generate_npc_response(
        &self,
        request: NpcResponseRequest,
        token: Option<String>,
    ) -> Result<Value, ProxyError> {
        tracing::debug!(
            session_id = %request.session_id,
            npc_id = %request.npc_id,
            "Generating NPC response"
        );
        let body = serde_json::to_value(&request).map_err(|e| ProxyError::Request(e.to_string()))?;
        self.post("/generate/npc-response", body, token).await
    }

    async fn health(&self) -> Result<Value, ProxyError> {
        self.proxy
            .request(HttpMethod::Get, &self.base_url, "/health", None, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockHttpTransport, OutboundResponse};
    use crate::infrastructure::proxy::RetryConfig;
    use serde_json::json;
    use statedb_domain::{NpcId, SessionId};

    fn client_with(transport: MockHttpTransport) -> GmClient {
        let proxy = Arc::new(ProxyClient::new(Arc::new(transport), RetryConfig::default()));
        GmClient::new(proxy, "http://gm:8020")
    }

    #[tokio::test]
    async fn narrative_request_carries_prompt_type_and_token() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                let body = req.body.clone().unwrap_or_default();
                req.url == "http://gm:8020/generate/narrative"
                    && req.bearer_token.as_deref() == Some("secret")
                    && body["prompt_type"] == "default"
            })
            .times(1)
            .returning(|_| {
                Ok(OutboundResponse {
                    status: 200,
                    body: r#"{"narrative":"The gate creaks open."}"#.to_string(),
                })
            });

        let result = client_with(transport)
            .generate_narrative(
                NarrativeRequest {
                    session_id: SessionId::new(),
                    context: json!({}),
                    prompt_type: "default".to_string(),
                },
                Some("secret".to_string()),
            )
            .await
            .expect("narrative");

        assert_eq!(result["narrative"], "The gate creaks open.");
    }

    #[tokio::test]
    async fn npc_response_hits_npc_endpoint() {
        let npc_id = NpcId::new();
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(move |req| {
                let body = req.body.clone().unwrap_or_default();
                req.url == "http://gm:8020/generate/npc-response"
                    && body["npc_id"] == json!(npc_id.to_string())
                    && body["player_action"] == "greet"
            })
            .times(1)
            .returning(|_| {
                Ok(OutboundResponse {
                    status: 200,
                    body: r#"{"reply":"Well met."}"#.to_string(),
                })
            });

        let result = client_with(transport)
            .generate_npc_response(
                NpcResponseRequest {
                    session_id: SessionId::new(),
                    npc_id,
                    player_action: "greet".to_string(),
                    context: json!({}),
                },
                None,
            )
            .await
            .expect("npc response");

        assert_eq!(result["reply"], "Well met.");
    }
}
