//! Entity spawning and narrative navigation.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, post, put};
use axum::Router;
use serde::Serialize;
use statedb_domain::{
    ActState, EnemyId, EnemySpawn, NpcId, NpcSpawn, Phase, PhaseState, SequenceState, SessionId,
    SpawnedEntity, TurnState,
};
use statedb_shared::{
    ActChangeRequest, EnemySpawnRequest, NpcSpawnRequest, PhaseChangeRequest,
    SequenceChangeRequest,
};

use super::extract::{ApiJson, ApiPath, ValidJson};
use super::{ok, ok_with, ApiError, ApiResult};
use crate::app::App;

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/session/{session_id}/npc/spawn", post(spawn_npc))
        .route("/session/{session_id}/npc/{npc_instance_id}", delete(remove_npc))
        .route("/session/{session_id}/enemy/spawn", post(spawn_enemy))
        .route(
            "/session/{session_id}/enemy/{enemy_instance_id}",
            delete(remove_enemy),
        )
        .route("/session/{session_id}/phase", put(change_phase))
        .route("/session/{session_id}/turn/add", post(add_turn))
        .route("/session/{session_id}/act", put(change_act))
        .route("/session/{session_id}/act/add", post(next_act))
        .route("/session/{session_id}/act/back", post(previous_act))
        .route("/session/{session_id}/sequence", put(change_sequence))
        .route("/session/{session_id}/sequence/add", post(next_sequence))
        .route("/session/{session_id}/sequence/back", post(previous_sequence))
}

fn session_missing(session_id: SessionId) -> ApiError {
    ApiError::not_found(format_args!("Session {session_id}"))
}

#[derive(Debug, Serialize)]
struct Removed<T> {
    session_id: SessionId,
    instance_id: T,
}

// =============================================================================
// NPC / enemy instances
// =============================================================================

async fn spawn_npc(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidJson(request): ValidJson<NpcSpawnRequest>,
) -> ApiResult<SpawnedEntity> {
    let spawn = NpcSpawn {
        scenario_npc_id: request.npc_id,
        name: request.name,
        description: request.description,
        tags: request.tags,
        state: request.state,
        hp: request.hp,
    };
    let spawned = app
        .repositories
        .entity
        .spawn_npc(session_id, &spawn)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    tracing::info!(session_id = %session_id, npc_id = %spawned.instance_id, "NPC spawned");
    ok_with(spawned, "NPC spawned")
}

async fn remove_npc(
    State(app): State<Arc<App>>,
    ApiPath((session_id, npc_id)): ApiPath<(SessionId, NpcId)>,
) -> ApiResult<Removed<NpcId>> {
    if !app.repositories.entity.remove_npc(session_id, npc_id).await? {
        return Err(ApiError::not_found(format_args!("NPC {npc_id}")));
    }
    ok_with(
        Removed {
            session_id,
            instance_id: npc_id,
        },
        "NPC removed",
    )
}

async fn spawn_enemy(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidJson(request): ValidJson<EnemySpawnRequest>,
) -> ApiResult<SpawnedEntity> {
    let spawn = EnemySpawn {
        scenario_enemy_id: request.enemy_id,
        name: request.name,
        description: request.description,
        tags: request.tags,
        state: request.state,
        hp: request.hp,
        attack: request.attack,
        defense: request.defense,
        dropped_items: request.dropped_items,
    };
    let spawned = app
        .repositories
        .entity
        .spawn_enemy(session_id, &spawn)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    tracing::info!(session_id = %session_id, enemy_id = %spawned.instance_id, "Enemy spawned");
    ok_with(spawned, "Enemy spawned")
}

async fn remove_enemy(
    State(app): State<Arc<App>>,
    ApiPath((session_id, enemy_id)): ApiPath<(SessionId, EnemyId)>,
) -> ApiResult<Removed<EnemyId>> {
    if !app
        .repositories
        .entity
        .remove_enemy(session_id, enemy_id)
        .await?
    {
        return Err(ApiError::not_found(format_args!("Enemy {enemy_id}")));
    }
    ok_with(
        Removed {
            session_id,
            instance_id: enemy_id,
        },
        "Enemy removed",
    )
}

// =============================================================================
// Phase / turn
// =============================================================================

async fn change_phase(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ApiJson(request): ApiJson<PhaseChangeRequest>,
) -> ApiResult<PhaseState> {
    let phase: Phase = request.new_phase.parse()?;
    let state = app
        .repositories
        .session
        .change_phase(session_id, phase)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok_with(state, format!("Phase changed to {phase}"))
}

async fn add_turn(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<TurnState> {
    let turn = app
        .repositories
        .session
        .add_turn(session_id)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(turn)
}

// =============================================================================
// Act / sequence
// =============================================================================

async fn change_act(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidJson(request): ValidJson<ActChangeRequest>,
) -> ApiResult<ActState> {
    let act = app
        .repositories
        .progress
        .set_act(session_id, request.new_act)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(act)
}

async fn shift_act(app: &App, session_id: SessionId, delta: i32) -> ApiResult<ActState> {
    let act = app
        .repositories
        .progress
        .shift_act(session_id, delta)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(act)
}

async fn next_act(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<ActState> {
    shift_act(&app, session_id, 1).await
}

async fn previous_act(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<ActState> {
    shift_act(&app, session_id, -1).await
}

async fn change_sequence(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidJson(request): ValidJson<SequenceChangeRequest>,
) -> ApiResult<SequenceState> {
    let sequence = app
        .repositories
        .progress
        .set_sequence(session_id, request.new_sequence)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(sequence)
}

async fn shift_sequence(
    app: &App,
    session_id: SessionId,
    delta: i32,
) -> ApiResult<SequenceState> {
    let sequence = app
        .repositories
        .progress
        .shift_sequence(session_id, delta)
        .await?
        .ok_or_else(|| session_missing(session_id))?;
    ok(sequence)
}

async fn next_sequence(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<SequenceState> {
    shift_sequence(&app, session_id, 1).await
}

async fn previous_sequence(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
) -> ApiResult<SequenceState> {
    shift_sequence(&app, session_id, -1).await
}
