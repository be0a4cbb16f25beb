//! Pass-through calls to the Rule Engine and GM.
//!
//! The caller's bearer token is forwarded; peer errors keep the peer's status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use statedb_domain::{NpcId, SessionId};

use super::extract::{ApiJson, BearerToken};
use super::{ok, ApiResult};
use crate::app::App;
use crate::infrastructure::ports::{ActionValidation, NarrativeRequest, NpcResponseRequest};

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/rule-engine/validate", post(validate_action))
        .route("/rule-engine/calculate", post(calculate))
        .route("/gm/narrative", post(generate_narrative))
        .route("/gm/npc-response", post(generate_npc_response))
}

#[derive(Debug, Deserialize)]
struct ValidateBody {
    session_id: SessionId,
    action_type: String,
    #[serde(default)]
    action_data: Value,
}

#[derive(Debug, Deserialize)]
struct CalculateBody {
    session_id: SessionId,
    action_result: Value,
}

#[derive(Debug, Deserialize)]
struct NarrativeBody {
    session_id: SessionId,
    #[serde(default)]
    context: Value,
    #[serde(default = "default_prompt_type")]
    prompt_type: String,
}

fn default_prompt_type() -> String {
    "narrative".to_string()
}

#[derive(Debug, Deserialize)]
struct NpcResponseBody {
    session_id: SessionId,
    npc_id: NpcId,
    player_action: String,
    #[serde(default)]
    context: Value,
}

async fn validate_action(
    State(app): State<Arc<App>>,
    BearerToken(token): BearerToken,
    ApiJson(body): ApiJson<ValidateBody>,
) -> ApiResult<Value> {
    let request = ActionValidation {
        session_id: body.session_id,
        action_type: body.action_type,
        action_data: body.action_data,
    };
    ok(app.rule_engine.validate_action(request, token).await?)
}

async fn calculate(
    State(app): State<Arc<App>>,
    BearerToken(token): BearerToken,
    ApiJson(body): ApiJson<CalculateBody>,
) -> ApiResult<Value> {
    ok(app
        .rule_engine
        .calculate(body.session_id, body.action_result, token)
        .await?)
}

async fn generate_narrative(
    State(app): State<Arc<App>>,
    BearerToken(token): BearerToken,
    ApiJson(body): ApiJson<NarrativeBody>,
) -> ApiResult<Value> {
    let request = NarrativeRequest {
        session_id: body.session_id,
        context: body.context,
        prompt_type: body.prompt_type,
    };
    ok(app.gm.generate_narrative(request, token).await?)
}

async fn generate_npc_response(
    State(app): State<Arc<App>>,
    BearerToken(token): BearerToken,
    ApiJson(body): ApiJson<NpcResponseBody>,
) -> ApiResult<Value> {
    let request = NpcResponseRequest {
        session_id: body.session_id,
        npc_id: body.npc_id,
        player_action: body.player_action,
        context: body.context,
    };
    ok(app.gm.generate_npc_response(request, token).await?)
}
