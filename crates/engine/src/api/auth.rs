//! API key management and the `X-API-Key` gate.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{delete, post};
use axum::Router;
use statedb_domain::{ApiKey, ApiKeyId, IssuedApiKey};
use statedb_shared::ApiKeyCreateRequest;

use super::extract::{ApiPath, ValidJson};
use super::{ok, ok_with, ApiError, ApiResult};
use crate::app::App;

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/api-keys", post(create_api_key).get(list_api_keys))
        .route("/api-keys/{api_key_id}", delete(revoke_api_key))
}

/// Reject requests without a valid, active key when the gate is enabled.
pub async fn require_api_key(
    State(app): State<Arc<App>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !app.require_api_key {
        return Ok(next.run(request).await);
    }

    let raw = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthorized("Missing X-API-Key header".to_string()))?;

    match app.use_cases.api_keys.verify(&raw).await? {
        Some(key) => {
            tracing::debug!(api_key_id = %key.api_key_id, "API key accepted");
            Ok(next.run(request).await)
        }
        None => Err(ApiError::Unauthorized(
            "Invalid or inactive API key".to_string(),
        )),
    }
}

async fn create_api_key(
    State(app): State<Arc<App>>,
    ValidJson(request): ValidJson<ApiKeyCreateRequest>,
) -> ApiResult<IssuedApiKey> {
    let issued = app.use_cases.api_keys.create(&request.key_name).await?;
    ok_with(
        issued,
        "API key created. Store it now; it cannot be shown again",
    )
}

async fn list_api_keys(State(app): State<Arc<App>>) -> ApiResult<Vec<ApiKey>> {
    ok(app.use_cases.api_keys.list().await?)
}

async fn revoke_api_key(
    State(app): State<Arc<App>>,
    ApiPath(api_key_id): ApiPath<ApiKeyId>,
) -> ApiResult<ApiKeyId> {
    app.use_cases.api_keys.revoke(api_key_id).await?;
    ok_with(api_key_id, "API key deactivated")
}
