//! Author-supplied scenario definitions and the injection plan derived from them.
//!
//! A definition is what a scenario author posts; [`ScenarioDefinition::plan`]
//! validates it and resolves every cross reference up front, so the persistence
//! layer only ever sees a consistent [`InjectionPlan`].
//!
//! Placement rules:
//! - an NPC/enemy is stored as a master row only when some sequence lists it,
//!   and it is placed in the first sequence (in declaration order) that does;
//! - a sequence belongs to the first act whose `sequences` list names it;
//! - relation endpoints must name placed NPCs/enemies.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entities::EntityKind;
use crate::error::DomainError;
use crate::value_objects::{
    stat_from_state, AFFINITY_MAX, AFFINITY_MIN, DEFAULT_AFFINITY, DEFAULT_ENEMY_ATTACK,
    DEFAULT_ENEMY_DEFENSE, DEFAULT_ENEMY_HP, DEFAULT_NPC_HP,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exit_criteria: Option<String>,
    #[serde(default)]
    pub sequences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub exit_triggers: Vec<String>,
    #[serde(default)]
    pub npcs: Vec<String>,
    #[serde(default)]
    pub enemies: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDefinition {
    pub scenario_npc_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "empty_object")]
    pub state: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDefinition {
    pub scenario_enemy_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_enemy_state")]
    pub state: serde_json::Value,
    #[serde(default)]
    pub dropped_items: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub item_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_item_type")]
    pub item_type: String,
    #[serde(default = "empty_object")]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub from_id: String,
    pub to_id: String,
    #[serde(default = "default_relation_type")]
    pub relation_type: String,
    #[serde(default = "default_affinity")]
    pub affinity: i32,
    #[serde(default = "empty_object")]
    pub meta: serde_json::Value,
}

/// Full scenario as posted to the inject endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub acts: Vec<ActDefinition>,
    #[serde(default)]
    pub sequences: Vec<SequenceDefinition>,
    #[serde(default)]
    pub npcs: Vec<NpcDefinition>,
    #[serde(default)]
    pub enemies: Vec<EnemyDefinition>,
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_enemy_state() -> serde_json::Value {
    serde_json::json!({"hp": DEFAULT_ENEMY_HP, "attack": 5})
}

fn default_item_type() -> String {
    "misc".to_string()
}

fn default_relation_type() -> String {
    "neutral".to_string()
}

fn default_affinity() -> i32 {
    DEFAULT_AFFINITY
}

// =============================================================================
// Injection plan
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAct {
    pub act_order: i32,
    pub definition: ActDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSequence {
    pub sequence_order: i32,
    pub act_id: Option<String>,
    pub definition: SequenceDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNpc {
    pub definition: NpcDefinition,
    pub sequence_id: String,
    pub location: Option<String>,
    pub initial_hp: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEnemy {
    pub definition: EnemyDefinition,
    pub sequence_id: String,
    pub location: Option<String>,
    pub initial_hp: i32,
    pub attack: i32,
    pub defense: i32,
}

/// Relation whose endpoints are known to exist as template vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRelation {
    pub from_key: String,
    pub from_kind: EntityKind,
    pub to_key: String,
    pub to_kind: EntityKind,
    pub relation_type: String,
    pub affinity: i32,
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InjectionPlan {
    pub title: String,
    pub description: Option<String>,
    pub acts: Vec<PlannedAct>,
    pub sequences: Vec<PlannedSequence>,
    pub npcs: Vec<PlacedNpc>,
    pub enemies: Vec<PlacedEnemy>,
    pub items: Vec<ItemDefinition>,
    pub relations: Vec<PlannedRelation>,
}

impl ScenarioDefinition {
    /// Validate the definition and resolve placements and relation endpoints.
    ///
    /// Every problem found is reported in one `Validation` error so authors can
    /// fix a scenario in a single pass.
    pub fn plan(&self) -> Result<InjectionPlan, DomainError> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push("title cannot be empty".to_string());
        }

        report_duplicates("act", self.acts.iter().map(|a| a.id.as_str()), &mut problems);
        report_duplicates(
            "sequence",
            self.sequences.iter().map(|s| s.id.as_str()),
            &mut problems,
        );
        report_duplicates(
            "npc",
            self.npcs.iter().map(|n| n.scenario_npc_id.as_str()),
            &mut problems,
        );
        report_duplicates(
            "enemy",
            self.enemies.iter().map(|e| e.scenario_enemy_id.as_str()),
            &mut problems,
        );
        let item_keys: Vec<String> = self.items.iter().map(|i| i.item_id.to_string()).collect();
        report_duplicates("item", item_keys.iter().map(String::as_str), &mut problems);

        let npcs: HashMap<&str, &NpcDefinition> = self
            .npcs
            .iter()
            .map(|n| (n.scenario_npc_id.as_str(), n))
            .collect();
        let enemies: HashMap<&str, &EnemyDefinition> = self
            .enemies
            .iter()
            .map(|e| (e.scenario_enemy_id.as_str(), e))
            .collect();

        for key in npcs.keys() {
            if enemies.contains_key(key) {
                problems.push(format!("'{}' is declared as both an npc and an enemy", key));
            }
        }

        // Sequence -> owning act
        let sequence_ids: HashSet<&str> = self.sequences.iter().map(|s| s.id.as_str()).collect();
        let mut owning_act: HashMap<&str, &str> = HashMap::new();
        for act in &self.acts {
            for seq_id in &act.sequences {
                if !sequence_ids.contains(seq_id.as_str()) {
                    problems.push(format!(
                        "act '{}' references unknown sequence '{}'",
                        act.id, seq_id
                    ));
                    continue;
                }
                owning_act.entry(seq_id.as_str()).or_insert(act.id.as_str());
            }
        }

        // Entity placement
        let mut placed_npcs = Vec::new();
        let mut placed_enemies = Vec::new();
        let mut placed: HashMap<String, EntityKind> = HashMap::new();

        for seq in &self.sequences {
            for npc_id in &seq.npcs {
                match npcs.get(npc_id.as_str()) {
                    Some(def) => {
                        if placed.contains_key(npc_id) {
                            continue;
                        }
                        placed.insert(npc_id.clone(), EntityKind::Npc);
                        let initial_hp =
                            stat_from_state(&def.state, "hp").unwrap_or(DEFAULT_NPC_HP);
                        report_bad_stats("npc", npc_id, &[("hp", initial_hp, 1)], &mut problems);
                        placed_npcs.push(PlacedNpc {
                            definition: (*def).clone(),
                            sequence_id: seq.id.clone(),
                            location: seq.location_name.clone(),
                            initial_hp,
                        });
                    }
                    None => problems.push(format!(
                        "sequence '{}' references unknown npc '{}'",
                        seq.id, npc_id
                    )),
                }
            }
            for enemy_id in &seq.enemies {
                match enemies.get(enemy_id.as_str()) {
                    Some(def) => {
                        if placed.contains_key(enemy_id) {
                            continue;
                        }
                        placed.insert(enemy_id.clone(), EntityKind::Enemy);
                        let initial_hp =
                            stat_from_state(&def.state, "hp").unwrap_or(DEFAULT_ENEMY_HP);
                        let attack = stat_from_state(&def.state, "attack")
                            .unwrap_or(DEFAULT_ENEMY_ATTACK);
                        let defense = stat_from_state(&def.state, "defense")
                            .unwrap_or(DEFAULT_ENEMY_DEFENSE);
                        report_bad_stats(
                            "enemy",
                            enemy_id,
                            &[
                                ("hp", initial_hp, 1),
                                ("attack", attack, 0),
                                ("defense", defense, 0),
                            ],
                            &mut problems,
                        );
                        placed_enemies.push(PlacedEnemy {
                            definition: (*def).clone(),
                            sequence_id: seq.id.clone(),
                            location: seq.location_name.clone(),
                            initial_hp,
                            attack,
                            defense,
                        });
                    }
                    None => problems.push(format!(
                        "sequence '{}' references unknown enemy '{}'",
                        seq.id, enemy_id
                    )),
                }
            }
        }

        let item_ids: HashSet<&str> = item_keys.iter().map(String::as_str).collect();
        for seq in &self.sequences {
            for item in &seq.items {
                if !item_ids.contains(item.trim()) {
                    problems.push(format!(
                        "sequence '{}' references unknown item '{}'",
                        seq.id, item
                    ));
                }
            }
        }

        // Relations
        let mut relations = Vec::new();
        for rel in &self.relations {
            if !(AFFINITY_MIN..=AFFINITY_MAX).contains(&rel.affinity) {
                problems.push(format!(
                    "relation {} -> {} has affinity {} outside {}..={}",
                    rel.from_id, rel.to_id, rel.affinity, AFFINITY_MIN, AFFINITY_MAX
                ));
            }
            if !rel.meta.is_object() {
                problems.push(format!(
                    "relation {} -> {} meta must be an object",
                    rel.from_id, rel.to_id
                ));
            }
            let from_kind = placed.get(&rel.from_id).copied();
            let to_kind = placed.get(&rel.to_id).copied();
            for (key, kind) in [(&rel.from_id, from_kind), (&rel.to_id, to_kind)] {
                if kind.is_none() {
                    problems.push(describe_missing_endpoint(key, &npcs, &enemies));
                }
            }
            if let (Some(from_kind), Some(to_kind)) = (from_kind, to_kind) {
                relations.push(PlannedRelation {
                    from_key: rel.from_id.clone(),
                    from_kind,
                    to_key: rel.to_id.clone(),
                    to_kind,
                    relation_type: rel.relation_type.clone(),
                    affinity: rel.affinity,
                    meta: rel.meta.clone(),
                });
            }
        }

        if !problems.is_empty() {
            return Err(DomainError::validation(problems.join("; ")));
        }

        let acts = self
            .acts
            .iter()
            .enumerate()
            .map(|(i, act)| PlannedAct {
                act_order: i as i32 + 1,
                definition: act.clone(),
            })
            .collect();
        let sequences = self
            .sequences
            .iter()
            .enumerate()
            .map(|(i, seq)| PlannedSequence {
                sequence_order: i as i32 + 1,
                act_id: owning_act.get(seq.id.as_str()).map(|id| id.to_string()),
                definition: seq.clone(),
            })
            .collect();

        Ok(InjectionPlan {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            acts,
            sequences,
            npcs: placed_npcs,
            enemies: placed_enemies,
            items: self.items.clone(),
            relations,
        })
    }
}

fn report_duplicates<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
    problems: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            problems.push(format!("duplicate {} id '{}'", kind, id));
        }
    }
}

/// Each entry is `(stat, value, minimum)`.
fn report_bad_stats(
    kind: &str,
    key: &str,
    stats: &[(&str, i32, i32)],
    problems: &mut Vec<String>,
) {
    for &(stat, value, min) in stats {
        if value < min {
            problems.push(format!("{} '{}' has {} {} below {}", kind, key, stat, value, min));
        }
    }
}

fn describe_missing_endpoint(
    key: &str,
    npcs: &HashMap<&str, &NpcDefinition>,
    enemies: &HashMap<&str, &EnemyDefinition>,
) -> String {
    if npcs.contains_key(key) || enemies.contains_key(key) {
        format!("relation endpoint '{}' is not placed in any sequence", key)
    } else {
        format!("relation endpoint '{}' is not a declared npc or enemy", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lost_kingdom() -> ScenarioDefinition {
        serde_json::from_value(json!({
            "title": "The Lost Kingdom",
            "acts": [{"id": "act-1", "name": "The Beginning", "sequences": ["seq-1", "seq-2"]}],
            "sequences": [
                {"id": "seq-1", "name": "Town Square", "location_name": "Starting Town",
                 "npcs": ["npc-elder"], "enemies": ["enemy-goblin"]},
                {"id": "seq-2", "name": "Forest Edge", "npcs": ["npc-elder"]}
            ],
            "npcs": [{"scenario_npc_id": "npc-elder", "name": "Village Elder",
                      "state": {"mood": "worried"}}],
            "enemies": [{"scenario_enemy_id": "enemy-goblin", "name": "Forest Goblin",
                         "state": {"numeric": {"HP": 20}}, "dropped_items": [1]}],
            "items": [{"item_id": 1, "name": "Healing Potion", "item_type": "consumable"}],
            "relations": [{"from_id": "npc-elder", "to_id": "enemy-goblin",
                           "relation_type": "hostile", "affinity": 0}]
        }))
        .unwrap()
    }

    #[test]
    fn plan_places_each_entity_once_in_first_sequence() {
        let plan = lost_kingdom().plan().unwrap();

        assert_eq!(plan.npcs.len(), 1);
        assert_eq!(plan.npcs[0].sequence_id, "seq-1");
        assert_eq!(plan.npcs[0].location.as_deref(), Some("Starting Town"));
        assert_eq!(plan.npcs[0].initial_hp, DEFAULT_NPC_HP);
        assert_eq!(plan.enemies.len(), 1);
        assert_eq!(plan.enemies[0].initial_hp, 20);
    }

    #[test]
    fn plan_orders_acts_and_sequences_and_links_owning_act() {
        let plan = lost_kingdom().plan().unwrap();

        assert_eq!(plan.acts[0].act_order, 1);
        assert_eq!(plan.sequences[1].sequence_order, 2);
        assert_eq!(plan.sequences[1].act_id.as_deref(), Some("act-1"));
    }

    #[test]
    fn plan_resolves_relation_endpoint_kinds() {
        let plan = lost_kingdom().plan().unwrap();

        assert_eq!(plan.relations.len(), 1);
        assert_eq!(plan.relations[0].from_kind, EntityKind::Npc);
        assert_eq!(plan.relations[0].to_kind, EntityKind::Enemy);
        assert_eq!(plan.relations[0].relation_type, "hostile");
    }

    #[test]
    fn enemy_state_defaults_when_omitted() {
        let enemy: EnemyDefinition =
            serde_json::from_value(json!({"scenario_enemy_id": "e", "name": "Rat"})).unwrap();
        assert_eq!(enemy.state, json!({"hp": 30, "attack": 5}));
    }

    #[test]
    fn unknown_relation_endpoint_is_rejected() {
        let mut def = lost_kingdom();
        def.relations[0].to_id = "enemy-goblinn".to_string();

        let err = def.plan().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(err.to_string().contains("'enemy-goblinn' is not a declared npc or enemy"));
    }

    #[test]
    fn relation_to_unplaced_entity_is_rejected() {
        let mut def = lost_kingdom();
        def.npcs.push(NpcDefinition {
            scenario_npc_id: "npc-hermit".to_string(),
            name: "Hermit".to_string(),
            description: String::new(),
            tags: vec![],
            state: json!({}),
        });
        def.relations[0].from_id = "npc-hermit".to_string();

        let err = def.plan().unwrap_err();
        assert!(err.to_string().contains("'npc-hermit' is not placed in any sequence"));
    }

    #[test]
    fn sequence_reference_to_unknown_npc_is_rejected() {
        let mut def = lost_kingdom();
        def.sequences[1].npcs.push("npc-ghost".to_string());

        let err = def.plan().unwrap_err();
        assert!(err.to_string().contains("sequence 'seq-2' references unknown npc 'npc-ghost'"));
    }

    #[test]
    fn negative_enemy_stats_are_rejected() {
        let mut def = lost_kingdom();
        def.enemies[0].state = json!({"hp": -5, "attack": 3, "defense": -1});

        let message = def.plan().unwrap_err().to_string();
        assert!(message.contains("enemy 'enemy-goblin' has hp -5 below 1"));
        assert!(message.contains("enemy 'enemy-goblin' has defense -1 below 0"));
        assert!(!message.contains("attack"));
    }

    #[test]
    fn zero_hp_npc_is_rejected() {
        let mut def = lost_kingdom();
        def.npcs[0].state = json!({"hp": 0});

        let err = def.plan().unwrap_err();
        assert!(err.to_string().contains("npc 'npc-elder' has hp 0 below 1"));
    }

    #[test]
    fn sequence_reference_to_unknown_item_is_rejected() {
        let mut def = lost_kingdom();
        def.sequences[0].items = vec!["1".to_string(), "99".to_string()];

        let err = def.plan().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sequence 'seq-1' references unknown item '99'"));
        assert!(!message.contains("unknown item '1'"));
    }

    #[test]
    fn relation_meta_is_carried_into_plan() {
        let mut def = lost_kingdom();
        def.relations[0].meta = json!({"grudge": "stolen sheep"});

        let plan = def.plan().unwrap();
        assert_eq!(plan.relations[0].meta, json!({"grudge": "stolen sheep"}));

        def.relations[0].meta = json!("grudge");
        let err = def.plan().unwrap_err();
        assert!(err.to_string().contains("meta must be an object"));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut def = lost_kingdom();
        def.title = "  ".to_string();
        def.items.push(def.items[0].clone());
        def.relations[0].affinity = 150;

        let message = def.plan().unwrap_err().to_string();
        assert!(message.contains("title cannot be empty"));
        assert!(message.contains("duplicate item id '1'"));
        assert!(message.contains("affinity 150"));
    }
}
