//! Session start, lifecycle and listing.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use statedb_domain::{LifecycleAction, Session, SessionId, SessionStatus};
use statedb_shared::SessionStartRequest;

use super::extract::{ApiPath, ValidJson};
use super::{ok, ok_with, ApiResult};
use crate::app::App;

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/session/start", post(start_session))
        .route(
            "/session/{session_id}",
            get(get_session).delete(delete_session),
        )
        .route("/session/{session_id}/end", post(end_session))
        .route("/session/{session_id}/pause", post(pause_session))
        .route("/session/{session_id}/resume", post(resume_session))
        .route("/sessions", get(list_sessions))
        .route("/sessions/active", get(list_active_sessions))
        .route("/sessions/paused", get(list_paused_sessions))
        .route("/sessions/ended", get(list_ended_sessions))
}

#[derive(Debug, Serialize)]
struct StatusChange {
    session_id: SessionId,
    status: SessionStatus,
}

async fn start_session(
    State(app): State<Arc<App>>,
    ValidJson(request): ValidJson<SessionStartRequest>,
) -> ApiResult<Session> {
    let session = app.use_cases.session.start(&request).await?;
    tracing::info!(
        session_id = %session.session_id,
        scenario_id = %session.scenario_id,
        "Session started"
    );
    ok_with(session, "Session started")
}

async fn change_status(
    app: &App,
    session_id: SessionId,
    action: LifecycleAction,
) -> ApiResult<StatusChange> {
    let session = app.use_cases.session.lifecycle(session_id, action).await?;
    ok_with(
        StatusChange {
            session_id,
            status: session.status,
        },
        format!("Session {session_id} {}", action.past_tense()),
    )
}

async fn end_session(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<StatusChange> {
    change_status(&app, session_id, LifecycleAction::End).await
}

async fn pause_session(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<StatusChange> {
    change_status(&app, session_id, LifecycleAction::Pause).await
}

async fn resume_session(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<StatusChange> {
    change_status(&app, session_id, LifecycleAction::Resume).await
}

async fn get_session(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Session> {
    ok(app.use_cases.session.get(session_id).await?)
}

async fn delete_session(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<SessionId> {
    app.use_cases.session.delete(session_id).await?;
    ok_with(session_id, format!("Session {session_id} deleted"))
}

async fn list_sessions(State(app): State<Arc<App>>) -> ApiResult<Vec<Session>> {
    ok(app.use_cases.session.list(None).await?)
}

async fn list_active_sessions(State(app): State<Arc<App>>) -> ApiResult<Vec<Session>> {
    ok(app.use_cases.session.list(Some(SessionStatus::Active)).await?)
}

async fn list_paused_sessions(State(app): State<Arc<App>>) -> ApiResult<Vec<Session>> {
    ok(app.use_cases.session.list(Some(SessionStatus::Paused)).await?)
}

async fn list_ended_sessions(State(app): State<Arc<App>>) -> ApiResult<Vec<Session>> {
    ok(app.use_cases.session.list(Some(SessionStatus::Ended)).await?)
}
