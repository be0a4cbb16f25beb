//! State DB wire contract - types shared by the engine and its HTTP clients.
//!
//! - `envelope` - the uniform `{status, data, message}` response wrapper
//! - `requests` - JSON request bodies, validated with `validator`
//! - `queries` - query-string parameters
//!
//! No business logic lives here; handlers convert into domain types.

pub mod envelope;
pub mod queries;
pub mod requests;

pub use envelope::{ApiResponse, ErrorBody, ResponseStatus};
pub use queries::{
    ActiveOnlyQuery, PhaseFilterQuery, PhaseRangeQuery, RecentPhasesQuery, RecentTurnsQuery,
    SessionQuery, TurnRangeQuery,
};
pub use requests::{
    ActChangeRequest, ApiKeyCreateRequest, CombatEndRequest, EnemyHpUpdateRequest,
    EnemySpawnRequest, InventoryUpdateRequest, ItemEarnRequest, ItemUseRequest,
    LocationUpdateRequest, NpcAffinityUpdateRequest, NpcSpawnRequest, PhaseChangeRequest,
    PlayerActionRequest, PlayerHpUpdateRequest, PlayerStatsUpdateRequest, SequenceChangeRequest,
    SessionStartRequest, StateChanges,
};
