//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Database access (PostgreSQL + Apache AGE today)
//! - Peer services (Rule Engine, GM) and the HTTP transport beneath them
//! - Randomness (for testing)

mod error;
mod external;
mod repos;
mod testing;
mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{
    ApiKeyRepo, EntityRepo, HealthRepo, PlayerRepo, ProgressRepo, ScenarioRepo, SessionRepo,
    TraceRepo,
};

pub use types::{ItemUseOutcome, SequenceRoster, SessionStart};

pub use error::{ProxyError, RepoError};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ActionValidation, GmPort, HttpMethod, HttpTransport, NarrativeRequest, NpcResponseRequest,
    OutboundRequest, OutboundResponse, RuleEnginePort, TransportError,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{
    MockApiKeyRepo, MockEntityRepo, MockHealthRepo, MockPlayerRepo, MockProgressRepo,
    MockScenarioRepo, MockSessionRepo, MockTraceRepo,
};

#[cfg(test)]
pub use external::{MockGmPort, MockHttpTransport, MockRuleEnginePort};

#[cfg(test)]
pub use testing::MockRandomPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::RandomPort;
