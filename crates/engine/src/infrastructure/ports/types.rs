//! Value types exchanged across repository ports that have no home in the domain crate.

use statedb_domain::{ItemConsumption, ScenarioId, SequenceEntity};

/// Arguments to the database-side `create_session` function.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStart {
    pub scenario_id: ScenarioId,
    pub current_act: i32,
    pub current_sequence: i32,
    pub location: String,
}

/// NPCs and enemies assigned to one sequence of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceRoster {
    pub npcs: Vec<SequenceEntity>,
    pub enemies: Vec<SequenceEntity>,
}

/// Result of consuming items from a player's inventory.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemUseOutcome {
    Used(ItemConsumption),
    NotOwned,
    Insufficient { available: i32 },
}
