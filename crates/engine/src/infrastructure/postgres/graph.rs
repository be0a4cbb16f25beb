//! Apache AGE access.
//!
//! Cypher runs through `ag_catalog.cypher(graph, $cypher$ ... $cypher$)`. The
//! query text cannot take bind parameters here, so every interpolated string goes
//! through [`cypher_literal`]. Results are returned as a single agtype column, cast
//! to text and decoded with serde_json.

use serde::de::DeserializeOwned;
use sqlx::{Executor, Postgres, Row};
use statedb_domain::{EntityKind, ScenarioId, SessionId};
use uuid::Uuid;

use super::sql_error;
use crate::infrastructure::ports::RepoError;

/// Quote `value` as a cypher string literal.
///
/// Backslashes and single quotes are escaped; `$` is written as `\u0024` so
/// the value can never close the `$cypher$` dollar quote.
pub fn cypher_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '$' => out.push_str("\\u0024"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[derive(Debug, Clone)]
pub struct AgeGraph {
    name: String,
}

impl AgeGraph {
    /// `name` must already be a plain identifier (checked when config loads).
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn statement(&self, cypher: &str) -> String {
        format!(
            "SELECT v::text AS v FROM ag_catalog.cypher('{}', $cypher$ {} $cypher$) AS (v ag_catalog.agtype)",
            self.name, cypher
        )
    }

    /// Run a cypher statement and return how many rows it produced.
    pub async fn execute<'c, E>(&self, executor: E, cypher: &str) -> Result<usize, RepoError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql = self.statement(cypher);
        let rows = sqlx::query(&sql)
            .persistent(false)
            .fetch_all(executor)
            .await
            .map_err(|e| sql_error("cypher", e))?;
        Ok(rows.len())
    }

    /// Run a cypher query whose single return column decodes as `T`.
    pub async fn fetch<'c, E, T>(&self, executor: E, cypher: &str) -> Result<Vec<T>, RepoError>
    where
        E: Executor<'c, Database = Postgres>,
        T: DeserializeOwned,
    {
        let sql = self.statement(cypher);
        let rows = sqlx::query(&sql)
            .persistent(false)
            .fetch_all(executor)
            .await
            .map_err(|e| sql_error("cypher", e))?;

        rows.iter()
            .map(|row| {
                let raw: String = row
                    .try_get("v")
                    .map_err(|e| sql_error("cypher", e))?;
                serde_json::from_str(&raw).map_err(RepoError::serialization)
            })
            .collect()
    }
}

/// Cypher returning the relation projection used by every edge read.
pub fn relation_projection(edge_filter: &str) -> String {
    format!(
        "MATCH (a)-[r:RELATION]->(b) WHERE {edge_filter} \
         RETURN {{from_id: a.entity_key, from_name: a.name, to_id: b.entity_key, to_name: b.name, \
         relation_type: r.relation_type, affinity: r.affinity, meta: r.meta}}"
    )
}

/// Properties of the vertex that mirrors one NPC or enemy row.
#[derive(Debug, Clone)]
pub struct EntityVertex<'a> {
    pub kind: EntityKind,
    pub entity_id: Uuid,
    pub key: &'a str,
    pub scenario_id: ScenarioId,
    pub session_id: SessionId,
    pub name: &'a str,
}

impl EntityVertex<'_> {
    pub fn create_cypher(&self) -> String {
        let key = cypher_literal(self.key);
        format!(
            "CREATE (:{label} {{entity_id: {id}, entity_key: {key}, entity_type: {kind}, \
             {key_prop}: {key}, scenario_id: {scenario}, session_id: {session}, name: {name}}})",
            label = self.kind.label(),
            id = cypher_literal(&self.entity_id.to_string()),
            kind = cypher_literal(self.kind.label()),
            key_prop = self.kind.key_property(),
            scenario = cypher_literal(&self.scenario_id.to_string()),
            session = cypher_literal(&self.session_id.to_string()),
            name = cypher_literal(self.name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_wraps_plain_text_in_quotes() {
        assert_eq!(cypher_literal("Goblin"), "'Goblin'");
    }

    #[test]
    fn literal_escapes_quotes_and_backslashes() {
        assert_eq!(cypher_literal("O'Brien"), r"'O\'Brien'");
        assert_eq!(cypher_literal(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn literal_cannot_close_dollar_quote() {
        let quoted = cypher_literal("$cypher$) AS (v agtype); DROP TABLE session; --");
        assert!(!quoted.contains("$cypher$"));
        assert!(!quoted.contains('$'));
    }

    #[test]
    fn statement_embeds_graph_and_cypher() {
        let graph = AgeGraph::new("state_db");
        let sql = graph.statement("MATCH (n) RETURN n");
        assert!(sql.contains("ag_catalog.cypher('state_db', $cypher$ MATCH (n) RETURN n $cypher$)"));
        assert!(sql.ends_with("AS (v ag_catalog.agtype)"));
    }

    #[test]
    fn vertex_carries_identity_and_scope() {
        let vertex = EntityVertex {
            kind: EntityKind::Enemy,
            entity_id: Uuid::nil(),
            key: "goblin",
            scenario_id: ScenarioId::from_uuid(Uuid::nil()),
            session_id: SessionId::from_uuid(Uuid::nil()),
            name: "Goblin's Boss",
        };
        let cypher = vertex.create_cypher();
        assert!(cypher.starts_with("CREATE (:enemy {entity_id: '00000000-"));
        assert!(cypher.contains("entity_type: 'enemy'"));
        assert!(cypher.contains("scenario_enemy_id: 'goblin'"));
        assert!(cypher.contains(r"name: 'Goblin\'s Boss'"));
    }

    #[test]
    fn relation_projection_returns_author_keys() {
        let cypher = relation_projection("r.session_id = 'x'");
        assert!(cypher.starts_with("MATCH (a)-[r:RELATION]->(b) WHERE r.session_id = 'x'"));
        assert!(cypher.contains("from_id: a.entity_key"));
        assert!(cypher.contains("affinity: r.affinity, meta: r.meta}"));
    }
}
