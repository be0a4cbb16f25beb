//! Value objects - closed vocabularies and bounded numeric rules.

mod phase;
mod session_status;
mod vitals;

pub use phase::Phase;
pub use session_status::{LifecycleAction, SessionStatus};
pub use vitals::{
    stat_from_state, AFFINITY_MAX, AFFINITY_MIN, DEFAULT_AFFINITY, DEFAULT_ENEMY_ATTACK,
    DEFAULT_ENEMY_DEFENSE, DEFAULT_ENEMY_HP, DEFAULT_NPC_HP, DEFAULT_PLAYER_HP,
};
