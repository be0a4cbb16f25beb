//! Scenario injection.

use std::sync::Arc;

use serde::Serialize;
use statedb_domain::{DomainError, ScenarioDefinition, ScenarioId};

use crate::infrastructure::ports::{RepoError, ScenarioRepo};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Body returned after a successful injection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjectionReceipt {
    pub scenario_id: ScenarioId,
    pub title: String,
    pub status: &'static str,
    pub message: &'static str,
}

pub struct ScenarioUseCases {
    repo: Arc<dyn ScenarioRepo>,
}

impl ScenarioUseCases {
    pub fn new(repo: Arc<dyn ScenarioRepo>) -> Self {
        Self { repo }
    }

    /// Validate the definition, then write it in one transaction.
    ///
    /// Nothing reaches the database when validation fails.
    pub async fn inject(
        &self,
        definition: &ScenarioDefinition,
    ) -> Result<InjectionReceipt, ScenarioError> {
        let plan = definition.plan()?;
        let scenario_id = self.repo.inject(&plan).await?;

        Ok(InjectionReceipt {
            scenario_id,
            title: plan.title,
            status: "success",
            message: "Scenario structure injected successfully",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockScenarioRepo;
    use serde_json::json;

    fn definition() -> ScenarioDefinition {
        serde_json::from_value(json!({
            "title": "Goblin Cave",
            "acts": [{"id": "act-1", "name": "Arrival", "sequences": ["seq-1"]}],
            "sequences": [{"id": "seq-1", "name": "Cave Mouth", "npcs": ["elder"], "enemies": ["goblin"]}],
            "npcs": [{"scenario_npc_id": "elder", "name": "Village Elder"}],
            "enemies": [{"scenario_enemy_id": "goblin", "name": "Goblin"}],
            "relations": [{"from_id": "elder", "to_id": "goblin", "relation_type": "enemy", "affinity": 5}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn inject_passes_resolved_plan_to_repo() {
        let scenario_id = ScenarioId::new();
        let mut repo = MockScenarioRepo::new();
        repo.expect_inject()
            .withf(|plan| {
                plan.title == "Goblin Cave"
                    && plan.npcs.len() == 1
                    && plan.enemies.len() == 1
                    && plan.relations.len() == 1
            })
            .times(1)
            .returning(move |_| Ok(scenario_id));

        let use_case = ScenarioUseCases::new(Arc::new(repo));
        let receipt = use_case.inject(&definition()).await.unwrap();

        assert_eq!(receipt.scenario_id, scenario_id);
        assert_eq!(receipt.title, "Goblin Cave");
        assert_eq!(receipt.status, "success");
    }

    #[tokio::test]
    async fn invalid_relation_never_reaches_repo() {
        let mut def = definition();
        def.relations[0].to_id = "dragon".to_string();

        let mut repo = MockScenarioRepo::new();
        repo.expect_inject().never();

        let use_case = ScenarioUseCases::new(Arc::new(repo));
        let result = use_case.inject(&def).await;

        match result {
            Err(ScenarioError::Invalid(DomainError::Validation(message))) => {
                assert!(message.contains("dragon"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
