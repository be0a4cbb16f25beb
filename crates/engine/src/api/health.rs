//! Liveness, database and peer-service health.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use statedb_shared::ApiResponse;

use super::{ok, ApiError, ApiResult};
use crate::app::App;
use crate::infrastructure::ports::ProxyError;

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/health/db", get(database_health))
        .route("/health/proxy", get(proxy_health))
        .route("/health/proxy/rule-engine", get(rule_engine_health))
        .route("/health/proxy/gm", get(gm_health))
}

#[derive(Debug, Serialize)]
struct PeerHealth {
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<Result<Value, ProxyError>> for PeerHealth {
    fn from(result: Result<Value, ProxyError>) -> Self {
        match result {
            Ok(response) => Self {
                connected: true,
                response: Some(response),
                error: None,
            },
            Err(e) => Self {
                connected: false,
                response: None,
                error: Some(e.to_string()),
            },
        }
    }
}

async fn banner() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({"status": "healthy"})))
}

async fn database_health(State(app): State<Arc<App>>) -> ApiResult<Value> {
    app.repositories.health.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Database health check failed");
        ApiError::Unavailable(e.to_string())
    })?;
    ok(json!({"status": "healthy", "database": "connected"}))
}

/// Reports `degraded` rather than failing when a peer is down.
async fn proxy_health(State(app): State<Arc<App>>) -> ApiResult<Value> {
    let (rule_engine, gm) = tokio::join!(app.rule_engine.health(), app.gm.health());

    let describe = |result: &Result<Value, ProxyError>| match result {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("disconnected: {e}"),
    };
    let status = if rule_engine.is_ok() && gm.is_ok() {
        "healthy"
    } else {
        "degraded"
    };

    ok(json!({
        "status": status,
        "services": {
            "rule_engine": describe(&rule_engine),
            "gm": describe(&gm),
        },
    }))
}

async fn rule_engine_health(State(app): State<Arc<App>>) -> ApiResult<PeerHealth> {
    ok(app.rule_engine.health().await.into())
}

async fn gm_health(State(app): State<Arc<App>>) -> ApiResult<PeerHealth> {
    ok(app.gm.health().await.into())
}
