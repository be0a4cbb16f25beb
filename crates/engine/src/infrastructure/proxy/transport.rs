//! reqwest-backed transport with a shared connection pool.

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;

use crate::infrastructure::ports::{
    HttpMethod, HttpTransport, OutboundRequest, OutboundResponse, TransportError,
};

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(20)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let mut builder = self.client.request(to_method(request.method), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;
        Ok(OutboundResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_classified_as_connect_failure() {
        let transport = ReqwestTransport::new(Duration::from_secs(2));
        let result = transport
            .send(OutboundRequest {
                method: HttpMethod::Get,
                // Port 9 (discard) on loopback is closed in test environments.
                url: "http://127.0.0.1:9/health".to_string(),
                bearer_token: None,
                query: vec![],
                body: None,
            })
            .await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
