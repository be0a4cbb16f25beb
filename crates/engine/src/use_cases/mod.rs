//! Use cases - orchestration that spans more than one repository call.
//!
//! Single-call CRUD endpoints talk to the port traits on `App::repositories`
//! directly; anything with branching or fan-out lives here.

pub mod auth;
pub mod context;
pub mod scenario;
pub mod session;
pub mod state;

pub use auth::{ApiKeyError, ApiKeyUseCases};
pub use context::{ContextError, ContextUseCases};
pub use scenario::{InjectionReceipt, ScenarioError, ScenarioUseCases};
pub use session::{SessionError, SessionUseCases};
pub use state::{StateError, StateUseCases};
