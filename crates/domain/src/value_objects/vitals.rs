//! Default stats, affinity bounds and stat lookup.
//!
//! HP and affinity clamping happens in SQL; the repositories bind these bounds
//! so the database and the scenario planner agree on them.

use serde_json::Value;

pub const DEFAULT_PLAYER_HP: i32 = 100;
pub const DEFAULT_NPC_HP: i32 = 100;
pub const DEFAULT_ENEMY_HP: i32 = 30;
pub const DEFAULT_ENEMY_ATTACK: i32 = 10;
pub const DEFAULT_ENEMY_DEFENSE: i32 = 5;

pub const DEFAULT_AFFINITY: i32 = 50;
pub const AFFINITY_MIN: i32 = 0;
pub const AFFINITY_MAX: i32 = 100;

/// Read an integer stat out of a free-form entity state blob.
///
/// Authors write either `{"numeric": {"HP": 20}}` or the flat `{"hp": 20}`;
/// the nested upper-case form wins when both are present.
pub fn stat_from_state(state: &Value, key: &str) -> Option<i32> {
    let upper = key.to_ascii_uppercase();
    let lower = key.to_ascii_lowercase();

    let nested = state
        .get("numeric")
        .and_then(|numeric| numeric.get(&upper).or_else(|| numeric.get(&lower)));
    let flat = state.get(&lower).or_else(|| state.get(&upper));

    nested
        .or(flat)
        .and_then(Value::as_i64)
        .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_affinity_lies_inside_bounds() {
        assert!(AFFINITY_MIN < AFFINITY_MAX);
        assert!((AFFINITY_MIN..=AFFINITY_MAX).contains(&DEFAULT_AFFINITY));
    }

    #[test]
    fn stat_lookup_prefers_nested_numeric() {
        let state = json!({"numeric": {"HP": 20}, "hp": 99});
        assert_eq!(stat_from_state(&state, "hp"), Some(20));
    }

    #[test]
    fn stat_lookup_falls_back_to_flat_keys() {
        let state = json!({"hp": 30, "attack": 5});
        assert_eq!(stat_from_state(&state, "hp"), Some(30));
        assert_eq!(stat_from_state(&state, "attack"), Some(5));
        assert_eq!(stat_from_state(&state, "defense"), None);
    }

    #[test]
    fn stat_lookup_ignores_non_numeric_values() {
        let state = json!({"mood": "worried", "hp": "lots"});
        assert_eq!(stat_from_state(&state, "hp"), None);
    }
}
