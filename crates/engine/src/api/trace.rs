//! Turn and phase history (read-only).

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use statedb_domain::{
    Phase, PhasePattern, PhaseStatistics, PhaseSummary, PhaseTransition, SessionId, TurnDuration,
    TurnPhaseStatistics, TurnRecord, TurnSummary, TurnTypeStatistics,
};
use statedb_shared::{PhaseFilterQuery, PhaseRangeQuery, RecentPhasesQuery, RecentTurnsQuery, TurnRangeQuery};

use super::extract::{ApiPath, ApiQuery, ValidQuery};
use super::{ok, ApiError, ApiResult};
use crate::app::App;

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        // Turns
        .route("/session/{session_id}/turns", get(list_turns))
        .route("/session/{session_id}/turns/recent", get(recent_turns))
        .route("/session/{session_id}/turns/range", get(turn_range))
        .route("/session/{session_id}/turn/latest", get(latest_turn))
        .route("/session/{session_id}/turn/{turn_number}", get(get_turn))
        .route(
            "/session/{session_id}/turns/statistics/by-phase",
            get(turn_statistics_by_phase),
        )
        .route(
            "/session/{session_id}/turns/statistics/by-type",
            get(turn_statistics_by_type),
        )
        .route("/session/{session_id}/turns/duration-analysis", get(turn_durations))
        .route("/session/{session_id}/turns/summary", get(turn_summary))
        // Phases
        .route("/session/{session_id}/phases", get(list_phases))
        .route("/session/{session_id}/phases/recent", get(recent_phases))
        .route("/session/{session_id}/phases/by-phase", get(phases_by_phase))
        .route("/session/{session_id}/phases/range", get(phase_range))
        .route("/session/{session_id}/phase/latest", get(latest_phase))
        .route("/session/{session_id}/phases/statistics", get(phase_statistics))
        .route("/session/{session_id}/phases/pattern", get(phase_patterns))
        .route("/session/{session_id}/phases/summary", get(phase_summary))
}

// =============================================================================
// Turns
// =============================================================================

async fn list_turns(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<TurnRecord>> {
    ok(app.repositories.trace.turns(session_id).await?)
}

async fn recent_turns(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidQuery(query): ValidQuery<RecentTurnsQuery>,
) -> ApiResult<Vec<TurnRecord>> {
    ok(app
        .repositories
        .trace
        .recent_turns(session_id, query.limit)
        .await?)
}

async fn turn_range(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidQuery(query): ValidQuery<TurnRangeQuery>,
) -> ApiResult<Vec<TurnRecord>> {
    if query.start > query.end {
        return Err(ApiError::BadRequest(format!(
            "start ({}) must not exceed end ({})",
            query.start, query.end
        )));
    }
    ok(app
        .repositories
        .trace
        .turn_range(session_id, query.start, query.end)
        .await?)
}

async fn latest_turn(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<TurnRecord> {
    let turn = app
        .repositories
        .trace
        .latest_turn(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Turn history of session {session_id}")))?;
    ok(turn)
}

async fn get_turn(
    State(app): State<Arc<App>>,
    ApiPath((session_id, turn_number)): ApiPath<(SessionId, i32)>,
) -> ApiResult<TurnRecord> {
    let turn = app
        .repositories
        .trace
        .turn(session_id, turn_number)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Turn {turn_number}")))?;
    ok(turn)
}

async fn turn_statistics_by_phase(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<TurnPhaseStatistics>> {
    ok(app
        .repositories
        .trace
        .turn_statistics_by_phase(session_id)
        .await?)
}

async fn turn_statistics_by_type(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<TurnTypeStatistics>> {
    ok(app
        .repositories
        .trace
        .turn_statistics_by_type(session_id)
        .await?)
}

async fn turn_durations(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<TurnDuration>> {
    ok(app.repositories.trace.turn_durations(session_id).await?)
}

async fn turn_summary(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<TurnSummary> {
    ok(app.repositories.trace.turn_summary(session_id).await?)
}

// =============================================================================
// Phases
// =============================================================================

async fn list_phases(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<PhaseTransition>> {
    ok(app.repositories.trace.phases(session_id).await?)
}

async fn recent_phases(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidQuery(query): ValidQuery<RecentPhasesQuery>,
) -> ApiResult<Vec<PhaseTransition>> {
    ok(app
        .repositories
        .trace
        .recent_phases(session_id, query.limit)
        .await?)
}

async fn phases_by_phase(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ApiQuery(query): ApiQuery<PhaseFilterQuery>,
) -> ApiResult<Vec<PhaseTransition>> {
    let phase: Phase = query.phase.parse()?;
    ok(app
        .repositories
        .trace
        .phases_by_phase(session_id, phase)
        .await?)
}

async fn phase_range(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidQuery(query): ValidQuery<PhaseRangeQuery>,
) -> ApiResult<Vec<PhaseTransition>> {
    if query.start_turn > query.end_turn {
        return Err(ApiError::BadRequest(format!(
            "start_turn ({}) must not exceed end_turn ({})",
            query.start_turn, query.end_turn
        )));
    }
    ok(app
        .repositories
        .trace
        .phase_range(session_id, query.start_turn, query.end_turn)
        .await?)
}

async fn latest_phase(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<PhaseTransition> {
    let transition = app
        .repositories
        .trace
        .latest_phase(session_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format_args!("Phase history of session {session_id}"))
        })?;
    ok(transition)
}

async fn phase_statistics(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<PhaseStatistics>> {
    ok(app.repositories.trace.phase_statistics(session_id).await?)
}

async fn phase_patterns(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<PhasePattern>> {
    ok(app.repositories.trace.phase_patterns(session_id).await?)
}

async fn phase_summary(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<PhaseSummary> {
    ok(app.repositories.trace.phase_summary(session_id).await?)
}
