//! Scenario injection and template reads.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use statedb_domain::{EntityRelation, Scenario, ScenarioDefinition, ScenarioDetail, ScenarioId};

use super::extract::{ApiJson, ApiPath};
use super::{ok, ok_with, ApiError, ApiResult};
use crate::app::App;
use crate::use_cases::InjectionReceipt;

pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/scenario/inject", post(inject_scenario))
        .route("/scenarios", get(list_scenarios))
        .route("/scenario/{scenario_id}", get(get_scenario))
        .route("/scenario/{scenario_id}/relations", get(get_scenario_relations))
}

async fn inject_scenario(
    State(app): State<Arc<App>>,
    ApiJson(definition): ApiJson<ScenarioDefinition>,
) -> ApiResult<InjectionReceipt> {
    let receipt = app.use_cases.scenario.inject(&definition).await?;
    let message = receipt.message;
    ok_with(receipt, message)
}

async fn list_scenarios(State(app): State<Arc<App>>) -> ApiResult<Vec<Scenario>> {
    ok(app.repositories.scenario.list().await?)
}

async fn get_scenario(
    State(app): State<Arc<App>>,
    ApiPath(scenario_id): ApiPath<ScenarioId>,
) -> ApiResult<ScenarioDetail> {
    let detail = app
        .repositories
        .scenario
        .get(scenario_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format_args!("Scenario {scenario_id}")))?;
    ok(detail)
}

async fn get_scenario_relations(
    State(app): State<Arc<App>>,
    ApiPath(scenario_id): ApiPath<ScenarioId>,
) -> ApiResult<Vec<EntityRelation>> {
    ok(app.repositories.scenario.template_relations(scenario_id).await?)
}
