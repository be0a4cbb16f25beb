//! State DB domain: identifiers, value objects and entity records for
//! scenario templates and the sessions cloned from them.

pub mod entities;
pub mod error;
pub mod ids;
pub mod scenario_definition;
pub mod value_objects;

pub use entities::{
    ActDetails, ActState, ApiKey, Enemy, EnemyHpUpdate, EnemySpawn, EntityKind, EntityRelation,
    InventoryEntry, InventoryUpdate, IssuedApiKey, Item, ItemConsumption, ItemGrant,
    LocationState, Npc, NpcAffinityUpdate, NpcSpawn, PhasePattern, PhaseState, PhaseStatistics,
    PhaseSummary, PhaseTransition, Player, PlayerHpUpdate, PlayerNpcRelation, PlayerState,
    Scenario, ScenarioAct, ScenarioDetail, ScenarioSequence, SequenceDetails, SequenceEntity,
    SequenceState, Session, SessionContext, SessionProgress, SpawnedEntity, TurnDuration,
    TurnPhaseStatistics, TurnRecord, TurnState, TurnSummary, TurnTypeStatistics,
};
pub use error::DomainError;
pub use ids::{
    ApiKeyId, EnemyId, NpcId, PlayerId, ScenarioId, SessionId, TEMPLATE_SESSION_ID,
};
pub use scenario_definition::{
    ActDefinition, EnemyDefinition, InjectionPlan, ItemDefinition, NpcDefinition, PlacedEnemy,
    PlacedNpc, PlannedAct, PlannedRelation, PlannedSequence, RelationDefinition,
    ScenarioDefinition, SequenceDefinition,
};
pub use value_objects::{LifecycleAction, Phase, SessionStatus};
