use statedb_domain::SessionId;

use crate::infrastructure::ports::{ProxyError, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Invalid state changes: {0}")]
    InvalidChanges(String),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

impl StateError {
    pub(super) fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}
