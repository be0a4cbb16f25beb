use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of entity mirrored as a graph vertex. Doubles as the vertex label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Npc,
    Enemy,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Npc => "npc",
            Self::Enemy => "enemy",
        }
    }

    /// Vertex property holding the author-assigned key.
    pub fn key_property(self) -> &'static str {
        match self {
            Self::Npc => "scenario_npc_id",
            Self::Enemy => "scenario_enemy_id",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// RELATION edge between two entity vertices, identified by scenario keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRelation {
    pub from_id: String,
    pub from_name: String,
    pub to_id: String,
    pub to_name: String,
    pub relation_type: String,
    pub affinity: i32,
    /// Author metadata. Stored on the edge as JSON text.
    #[serde(default = "empty_meta", deserialize_with = "meta_from_edge")]
    pub meta: Value,
}

fn empty_meta() -> Value {
    Value::Object(serde_json::Map::new())
}

fn meta_from_edge<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(empty_meta()),
        Value::String(raw) => serde_json::from_str(&raw).map_err(serde::de::Error::custom),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edge_meta_text_is_decoded() {
        let relation: EntityRelation = serde_json::from_value(json!({
            "from_id": "elder", "from_name": "Elder", "to_id": "goblin", "to_name": "Goblin",
            "relation_type": "hostile", "affinity": 10, "meta": "{\"since\":\"the war\"}"
        }))
        .unwrap();
        assert_eq!(relation.meta, json!({"since": "the war"}));
    }

    #[test]
    fn missing_or_null_meta_is_empty_object() {
        let base = json!({
            "from_id": "elder", "from_name": "Elder", "to_id": "goblin", "to_name": "Goblin",
            "relation_type": "hostile", "affinity": 10
        });
        let relation: EntityRelation = serde_json::from_value(base.clone()).unwrap();
        assert_eq!(relation.meta, json!({}));

        let mut with_null = base;
        with_null["meta"] = Value::Null;
        let relation: EntityRelation = serde_json::from_value(with_null).unwrap();
        assert_eq!(relation.meta, json!({}));
    }
}
