//! Read-only views of a session and its player.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use statedb_domain::{
    ActDetails, ActState, Enemy, EntityRelation, InventoryEntry, Item, LocationState, Npc,
    PhaseState, Player, PlayerId, PlayerNpcRelation, SequenceDetails, SequenceState, SessionContext,
    SessionId, SessionProgress, TurnState,
};
use statedb_shared::ActiveOnlyQuery;

use super::extract::{ApiPath, ApiQuery};
use super::{ok, ApiError, ApiResult};
use crate::app::App;

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/player/{player_id}", get(get_player))
        .route("/player/{player_id}/npc-relations", get(get_player_npc_relations))
        .route("/session/{session_id}/inventory", get(get_inventory))
        .route("/session/{session_id}/npcs", get(get_npcs))
        .route("/session/{session_id}/enemies", get(get_enemies))
        .route("/session/{session_id}/items", get(get_items))
        .route("/session/{session_id}/relations", get(get_relations))
        .route("/session/{session_id}/context", get(get_context))
        .route("/session/{session_id}/progress", get(get_progress))
        .route("/session/{session_id}/phase", get(get_phase))
        .route("/session/{session_id}/turn", get(get_turn))
        .route("/session/{session_id}/act", get(get_act))
        .route("/session/{session_id}/act/details", get(get_act_details))
        .route("/session/{session_id}/sequence", get(get_sequence))
        .route("/session/{session_id}/sequence/details", get(get_sequence_details))
        .route("/session/{session_id}/location", get(get_location))
}

fn session_missing(session_id: SessionId) -> ApiError {
    ApiError::not_found(format_args!("Session {session_id}"))
}

// =============================================================================
// Player
// =============================================================================

async fn get_player(
    State(app): State<Arc<App>>,
    ApiPath(player_id): ApiPath<PlayerId>,
) -> ApiResult<Player> {
    let player = app
        .repositories
        .player
        .get(player_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Player {player_id}")))?;
    ok(player)
}

async fn get_player_npc_relations(
    State(app): State<Arc<App>>,
    ApiPath(player_id): ApiPath<PlayerId>,
) -> ApiResult<Vec<PlayerNpcRelation>> {
    ok(app.repositories.player.npc_relations(player_id).await?)
}

// =============================================================================
// Session entities
// =============================================================================

async fn get_inventory(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<InventoryEntry>> {
    ok(app.repositories.player.session_inventory(session_id).await?)
}

async fn get_npcs(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<Npc>> {
    ok(app.repositories.entity.session_npcs(session_id).await?)
}

async fn get_enemies(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ApiQuery(query): ApiQuery<ActiveOnlyQuery>,
) -> ApiResult<Vec<Enemy>> {
    ok(app
        .repositories
        .entity
        .session_enemies(session_id, query.active_only)
        .await?)
}

async fn get_items(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<Item>> {
    ok(app.repositories.entity.session_items(session_id).await?)
}

async fn get_relations(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<Vec<EntityRelation>> {
    ok(app.repositories.entity.session_relations(session_id).await?)
}

// =============================================================================
// Progress
// =============================================================================

async fn get_context(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<SessionContext> {
    let context = app
        .repositories
        .progress
        .context(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(context)
}

async fn get_progress(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<SessionProgress> {
    let progress = app
        .repositories
        .progress
        .progress(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(progress)
}

async fn get_phase(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<PhaseState> {
    let phase = app
        .repositories
        .session
        .get_phase(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(phase)
}

async fn get_turn(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<TurnState> {
    let turn = app
        .repositories
        .session
        .get_turn(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(turn)
}

async fn get_act(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<ActState> {
    let act = app
        .repositories
        .progress
        .get_act(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(act)
}

async fn get_act_details(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<ActDetails> {
    let details = app
        .repositories
        .progress
        .current_act_details(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Current act of session {session_id}")))?;
    ok(details)
}

async fn get_sequence(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<SequenceState> {
    let sequence = app
        .repositories
        .progress
        .get_sequence(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(sequence)
}

async fn get_sequence_details(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<SequenceDetails> {
    ok(app.use_cases.context.sequence_details(session_id).await?)
}

async fn get_location(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<LocationState> {
    let location = app
        .repositories
        .progress
        .get_location(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(location)
}
