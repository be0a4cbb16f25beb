//! Entity records persisted by the engine.

mod api_key;
mod enemy;
mod history;
mod item;
mod npc;
mod player;
mod relation;
mod scenario;
mod session;

pub use api_key::{ApiKey, IssuedApiKey};
pub use enemy::{Enemy, EnemyHpUpdate, EnemySpawn};
pub use history::{
    PhasePattern, PhaseStatistics, PhaseSummary, PhaseTransition, TurnDuration,
    TurnPhaseStatistics, TurnRecord, TurnSummary, TurnTypeStatistics,
};
pub use item::Item;
pub use npc::{Npc, NpcSpawn, SpawnedEntity};
pub use player::{
    InventoryEntry, InventoryUpdate, ItemConsumption, ItemGrant, NpcAffinityUpdate, Player,
    PlayerHpUpdate, PlayerNpcRelation, PlayerState,
};
pub use relation::{EntityKind, EntityRelation};
pub use scenario::{ActDetails, Scenario, ScenarioAct, ScenarioDetail, ScenarioSequence};
pub use session::{
    ActState, LocationState, PhaseState, SequenceDetails, SequenceEntity, Session,
    SessionContext, SessionProgress, SequenceState, TurnState,
};
