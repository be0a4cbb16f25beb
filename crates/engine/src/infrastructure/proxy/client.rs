//! Generic forwarder to peer services with exponential backoff retry.
//!
//! Only connection failures and timeouts are retried. An upstream 4xx/5xx is an
//! answer, not a transient failure, and is surfaced as `ProxyError::Upstream`.

use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{
    HttpMethod, HttpTransport, OutboundRequest, OutboundResponse, ProxyError, TransportError,
};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay in milliseconds before the first retry; jittered delays never go below it
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds; caps exponential growth and jitter
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing delays to prevent thundering herd
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            jitter_factor: 0.2,
        }
    }
}

pub struct ProxyClient {
    transport: Arc<dyn HttpTransport>,
    config: RetryConfig,
}

impl ProxyClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: RetryConfig) -> Self {
        Self { transport, config }
    }

    /// Calculate delay for a given attempt number using exponential backoff with jitter
    fn calculate_delay(&self, attempt: u32) -> u64 {
        let base = self.config.base_delay_ms;
        // Exponential: base * 2^(attempt-1)
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        let jitter_range = (capped as f64 * self.config.jitter_factor) as i64;
        let jittered = if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            capped.saturating_add_signed(jitter)
        } else {
            capped
        };

        // Jitter must not push the delay out of [base, max].
        let floor = base.min(self.config.max_delay_ms);
        jittered.clamp(floor, self.config.max_delay_ms)
    }

    fn is_retryable(error: &TransportError) -> bool {
        matches!(error, TransportError::Connect(_) | TransportError::Timeout(_))
    }

    async fn send_with_retry(
        &self,
        request: &OutboundRequest,
    ) -> Result<OutboundResponse, TransportError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.transport.send(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(
                            attempt,
                            method = request.method.as_str(),
                            url = %request.url,
                            "Proxy request succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if Self::is_retryable(&e) && attempt < attempts => {
                    let delay = self.calculate_delay(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay,
                        error = %e,
                        url = %request.url,
                        "Proxy request failed, retrying..."
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        attempts = attempt,
                        error = %e,
                        method = request.method.as_str(),
                        url = %request.url,
                        "Proxy request failed"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Forward one request and decode the JSON answer.
    pub async fn request(
        &self,
        method: HttpMethod,
        base_url: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value, ProxyError> {
        let request = OutboundRequest {
            method,
            url: join_url(base_url, path),
            bearer_token: token.map(str::to_string),
            query: Vec::new(),
            body,
        };

        let response = self
            .send_with_retry(&request)
            .await
            .map_err(|e| match e {
                TransportError::Connect(detail) => ProxyError::Unavailable {
                    base_url: base_url.to_string(),
                    detail,
                },
                TransportError::Timeout(detail) => ProxyError::Timeout {
                    base_url: base_url.to_string(),
                    detail,
                },
                TransportError::Other(detail) => ProxyError::Request(detail),
            })?;

        if response.status >= 400 {
            let body = serde_json::from_str(&response.body)
                .unwrap_or_else(|_| Value::String(response.body.clone()));
            return Err(ProxyError::Upstream {
                status: response.status,
                body,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ProxyError::InvalidResponse {
            base_url: base_url.to_string(),
            detail: e.to_string(),
        })
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
