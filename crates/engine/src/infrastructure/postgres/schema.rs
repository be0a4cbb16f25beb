//! Schema initialization: AGE extension, graph, tables, triggers, functions.

use sqlx::PgPool;

use super::graph::AgeGraph;
use crate::infrastructure::ports::RepoError;

const TABLES: &str = include_str!("sql/001_tables.sql");
const TRIGGERS: &str = include_str!("sql/002_triggers.sql");
const FUNCTIONS: &str = include_str!("sql/003_functions.sql");

const VERTEX_LABELS: [&str; 2] = ["npc", "enemy"];
const EDGE_LABEL: &str = "RELATION";

/// Apply the embedded schema. Every step is idempotent, so this runs on each start-up.
pub async fn ensure_schema(pool: &PgPool, graph: &AgeGraph) -> Result<(), RepoError> {
    sqlx::raw_sql("CREATE EXTENSION IF NOT EXISTS age")
        .execute(pool)
        .await
        .map_err(|e| RepoError::database("create_extension", e))?;

    ensure_graph(pool, graph).await?;

    for (step, sql) in [("tables", TABLES), ("triggers", TRIGGERS), ("functions", FUNCTIONS)] {
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database(step, e))?;
    }

    tracing::info!(graph = graph.name(), "Schema initialized (tables, triggers, functions, graph)");
    Ok(())
}

async fn ensure_graph(pool: &PgPool, graph: &AgeGraph) -> Result<(), RepoError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM ag_catalog.ag_graph WHERE name::text = $1)",
    )
    .bind(graph.name())
    .fetch_one(pool)
    .await
    .map_err(|e| RepoError::database("graph_exists", e))?;

    if !exists {
        sqlx::raw_sql(&format!("SELECT ag_catalog.create_graph('{}')", graph.name()))
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("create_graph", e))?;
        tracing::info!(graph = graph.name(), "Created AGE graph");
    }

    for label in VERTEX_LABELS {
        ensure_label(pool, graph, label, "create_vlabel").await?;
    }
    ensure_label(pool, graph, EDGE_LABEL, "create_elabel").await
}

async fn ensure_label(
    pool: &PgPool,
    graph: &AgeGraph,
    label: &str,
    create_fn: &str,
) -> Result<(), RepoError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM ag_catalog.ag_label l
             JOIN ag_catalog.ag_graph g ON l.graph = g.graphid
             WHERE g.name::text = $1 AND l.name::text = $2
         )",
    )
    .bind(graph.name())
    .bind(label)
    .fetch_one(pool)
    .await
    .map_err(|e| RepoError::database("label_exists", e))?;

    if !exists {
        sqlx::raw_sql(&format!(
            "SELECT ag_catalog.{create_fn}('{}', '{label}')",
            graph.name()
        ))
        .execute(pool)
        .await
        .map_err(|e| RepoError::database("create_label", e))?;
    }
    Ok(())
}
