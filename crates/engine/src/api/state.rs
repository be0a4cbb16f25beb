//! State service endpoints: snapshot, change sets, action processing.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use statedb_domain::SessionId;
use statedb_shared::{CombatEndRequest, PlayerActionRequest, StateChanges};

use super::extract::{ApiJson, ApiPath, BearerToken, ValidJson};
use super::{ok, ok_with, ApiResult};
use crate::app::App;
use crate::use_cases::state::{ActionOutcome, CombatResult, StateSnapshot, WriteResult};

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/session/{session_id}/snapshot", get(get_snapshot))
        .route("/session/{session_id}/changes", post(write_changes))
        .route("/session/{session_id}/action", post(process_action))
        .route("/session/{session_id}/combat/end", post(end_combat))
}

async fn get_snapshot(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<StateSnapshot> {
    ok(app.use_cases.state.snapshot(session_id).await?)
}

async fn write_changes(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidJson(changes): ValidJson<StateChanges>,
) -> ApiResult<WriteResult> {
    let result = app.use_cases.state.write_changes(session_id, &changes).await?;
    let message = result.message.clone();
    ok_with(result, message)
}

async fn process_action(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    BearerToken(token): BearerToken,
    ApiJson(request): ApiJson<PlayerActionRequest>,
) -> ApiResult<ActionOutcome> {
    let outcome = app
        .use_cases
        .state
        .process_action(session_id, request.player_id, request.action, token)
        .await?;
    ok(outcome)
}

async fn end_combat(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ApiJson(request): ApiJson<CombatEndRequest>,
) -> ApiResult<CombatResult> {
    let result = app
        .use_cases
        .state
        .combat_end(session_id, request.victory)
        .await?;
    let message = result.message.clone();
    ok_with(result, message)
}
