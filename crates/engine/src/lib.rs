//! State DB Engine library.
//!
//! This crate contains all server-side code for the game-state database service.
//!
//! ## Structure
//!
//! - `use_cases/` - Orchestration across repositories and peer services
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// E2E integration tests using real PostgreSQL + AGE via testcontainers.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
