//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    ports::{
        ApiKeyRepo, EntityRepo, GmPort, HealthRepo, PlayerRepo, ProgressRepo, RandomPort,
        RuleEnginePort, ScenarioRepo, SessionRepo, TraceRepo,
    },
    postgres::PostgresRepositories,
};
use crate::use_cases;

/// Main application state.
///
/// Holds all repository ports and use cases.
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    pub rule_engine: Arc<dyn RuleEnginePort>,
    pub gm: Arc<dyn GmPort>,
    /// Gate `/state/*` behind a valid `X-API-Key`.
    pub require_api_key: bool,
}

/// Container for all repository ports.
///
/// Single-call CRUD handlers use these directly.
pub struct Repositories {
    pub scenario: Arc<dyn ScenarioRepo>,
    pub session: Arc<dyn SessionRepo>,
    pub progress: Arc<dyn ProgressRepo>,
    pub player: Arc<dyn PlayerRepo>,
    pub entity: Arc<dyn EntityRepo>,
    pub trace: Arc<dyn TraceRepo>,
    pub api_key: Arc<dyn ApiKeyRepo>,
    pub health: Arc<dyn HealthRepo>,
}

impl From<PostgresRepositories> for Repositories {
    fn from(repos: PostgresRepositories) -> Self {
        Self {
            scenario: repos.scenario,
            session: repos.session,
            progress: repos.progress,
            player: repos.player,
            entity: repos.entity,
            trace: repos.trace,
            api_key: repos.api_key,
            health: repos.health,
        }
    }
}

/// Container for all use cases.
pub struct UseCases {
    pub scenario: use_cases::ScenarioUseCases,
    pub session: use_cases::SessionUseCases,
    pub state: use_cases::StateUseCases,
    pub context: use_cases::ContextUseCases,
    pub api_keys: use_cases::ApiKeyUseCases,
}

impl App {
    pub fn new(
        repositories: Repositories,
        rule_engine: Arc<dyn RuleEnginePort>,
        gm: Arc<dyn GmPort>,
        random: Arc<dyn RandomPort>,
        require_api_key: bool,
    ) -> Self {
        let use_cases = UseCases {
            scenario: use_cases::ScenarioUseCases::new(repositories.scenario.clone()),
            session: use_cases::SessionUseCases::new(repositories.session.clone()),
            state: use_cases::StateUseCases::new(
                repositories.session.clone(),
                repositories.player.clone(),
                repositories.entity.clone(),
                repositories.progress.clone(),
                rule_engine.clone(),
            ),
            context: use_cases::ContextUseCases::new(
                repositories.progress.clone(),
                repositories.entity.clone(),
                repositories.player.clone(),
            ),
            api_keys: use_cases::ApiKeyUseCases::new(repositories.api_key.clone(), random),
        };

        Self {
            repositories,
            use_cases,
            rule_engine,
            gm,
            require_api_key,
        }
    }
}
