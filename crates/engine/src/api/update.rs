//! Per-field state updates.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{post, put};
use axum::Router;
use serde::Serialize;
use statedb_domain::{
    EnemyHpUpdate, EnemyId, InventoryUpdate, ItemConsumption, ItemGrant, LocationState,
    NpcAffinityUpdate, Player, PlayerHpUpdate, PlayerId, SessionId,
};
use statedb_shared::{
    EnemyHpUpdateRequest, InventoryUpdateRequest, ItemEarnRequest, ItemUseRequest,
    LocationUpdateRequest, NpcAffinityUpdateRequest, PlayerHpUpdateRequest,
    PlayerStatsUpdateRequest, SessionQuery,
};

use super::extract::{ApiJson, ApiPath, ApiQuery, ValidJson};
use super::{ok, ok_with, ApiError, ApiResult};
use crate::app::App;
use crate::infrastructure::ports::ItemUseOutcome;

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/player/{player_id}/hp", put(update_player_hp))
        .route("/player/{player_id}/stats", put(update_player_stats))
        .route("/inventory/update", put(update_inventory))
        .route("/npc/affinity", put(update_npc_affinity))
        .route("/session/{session_id}/location", put(update_location))
        .route("/enemy/{enemy_instance_id}/hp", put(update_enemy_hp))
        .route("/enemy/{enemy_instance_id}/defeat", post(defeat_enemy))
        .route("/player/item/earn", post(earn_item))
        .route("/player/item/use", post(use_item))
}

#[derive(Debug, Serialize)]
struct EnemyDefeated {
    enemy_instance_id: EnemyId,
    status: &'static str,
}

async fn update_player_hp(
    State(app): State<Arc<App>>,
    ApiPath(player_id): ApiPath<PlayerId>,
    ApiJson(request): ApiJson<PlayerHpUpdateRequest>,
) -> ApiResult<PlayerHpUpdate> {
    let update = app
        .repositories
        .player
        .update_hp(player_id, request.session_id, request.hp_change)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Player {player_id}")))?;
    tracing::debug!(
        player_id = %player_id,
        hp = update.current_hp,
        reason = %request.reason,
        "Player HP updated"
    );
    ok(update)
}

async fn update_player_stats(
    State(app): State<Arc<App>>,
    ApiPath(player_id): ApiPath<PlayerId>,
    ApiJson(request): ApiJson<PlayerStatsUpdateRequest>,
) -> ApiResult<Player> {
    let player = app
        .repositories
        .player
        .update_stats(player_id, request.session_id, &request.stat_changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Player {player_id}")))?;
    ok(player)
}

async fn update_inventory(
    State(app): State<Arc<App>>,
    ValidJson(request): ValidJson<InventoryUpdateRequest>,
) -> ApiResult<InventoryUpdate> {
    let update = app
        .repositories
        .player
        .set_inventory_quantity(request.player_id, request.item_id, request.quantity)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Player {}", request.player_id)))?;
    ok(update)
}

async fn update_npc_affinity(
    State(app): State<Arc<App>>,
    ApiJson(request): ApiJson<NpcAffinityUpdateRequest>,
) -> ApiResult<NpcAffinityUpdate> {
    let update = app
        .repositories
        .player
        .update_npc_affinity(request.player_id, request.npc_id, request.affinity_change)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format_args!(
                "NPC {} for player {}",
                request.npc_id, request.player_id
            ))
        })?;
    ok(update)
}

async fn update_location(
    State(app): State<Arc<App>>,
    ApiPath(session_id): ApiPath<SessionId>,
    ValidJson(request): ValidJson<LocationUpdateRequest>,
) -> ApiResult<LocationState> {
    let location = app
        .repositories
        .progress
        .update_location(session_id, &request.new_location)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Session {session_id}")))?;
    ok(location)
}

async fn update_enemy_hp(
    State(app): State<Arc<App>>,
    ApiPath(enemy_id): ApiPath<EnemyId>,
    ApiJson(request): ApiJson<EnemyHpUpdateRequest>,
) -> ApiResult<EnemyHpUpdate> {
    let update = app
        .repositories
        .entity
        .update_enemy_hp(request.session_id, enemy_id, request.hp_change)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Enemy {enemy_id}")))?;
    if update.is_defeated {
        tracing::debug!(enemy_id = %enemy_id, "Enemy defeated by HP update");
    }
    ok(update)
}

async fn defeat_enemy(
    State(app): State<Arc<App>>,
    ApiPath(enemy_id): ApiPath<EnemyId>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> ApiResult<EnemyDefeated> {
    if !app
        .repositories
        .entity
        .defeat_enemy(query.session_id, enemy_id)
        .await?
    {
        return Err(ApiError::not_found(format_args!("Enemy {enemy_id}")));
    }
    ok(EnemyDefeated {
        enemy_instance_id: enemy_id,
        status: "defeated",
    })
}

async fn earn_item(
    State(app): State<Arc<App>>,
    ValidJson(request): ValidJson<ItemEarnRequest>,
) -> ApiResult<ItemGrant> {
    let grant = app
        .repositories
        .player
        .earn_item(
            request.session_id,
            request.player_id,
            request.item_id,
            request.quantity,
        )
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Player {}", request.player_id)))?;
    ok_with(grant, "Item earned")
}

async fn use_item(
    State(app): State<Arc<App>>,
    ValidJson(request): ValidJson<ItemUseRequest>,
) -> ApiResult<ItemConsumption> {
    let outcome = app
        .repositories
        .player
        .use_item(
            request.session_id,
            request.player_id,
            request.item_id,
            request.quantity,
        )
        .await?;

    match outcome {
        ItemUseOutcome::Used(consumption) => ok_with(consumption, "Item used"),
        ItemUseOutcome::NotOwned => Err(ApiError::NotFound(format!(
            "Item {} is not in the player's inventory",
            request.item_id
        ))),
        ItemUseOutcome::Insufficient { available } => Err(ApiError::BadRequest(format!(
            "Not enough of item {}: requested {}, available {}",
            request.item_id, request.quantity, available
        ))),
    }
}
