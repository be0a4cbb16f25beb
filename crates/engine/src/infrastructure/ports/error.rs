//! Error types for port operations.

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A stored value could not be mapped onto its domain type.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Business constraint violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl RepoError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn constraint(message: impl ToString) -> Self {
        Self::ConstraintViolation(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failures talking to a peer service (Rule Engine, GM).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProxyError {
    /// The peer answered with a 4xx/5xx status.
    #[error("Upstream service returned {status}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    /// The peer could not be reached after all attempts.
    #[error("Service unavailable: {base_url}")]
    Unavailable { base_url: String, detail: String },

    #[error("Gateway timeout: {base_url}")]
    Timeout { base_url: String, detail: String },

    /// The peer answered 2xx but the body was not JSON.
    #[error("Invalid response from {base_url}: {detail}")]
    InvalidResponse { base_url: String, detail: String },

    #[error("Request failed: {0}")]
    Request(String),
}

impl ProxyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = RepoError::not_found("Session", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Session not found: abc");
    }

    #[test]
    fn upstream_error_message_carries_status() {
        let err = ProxyError::Upstream {
            status: 422,
            body: serde_json::json!({"detail": "bad"}),
        };
        assert_eq!(err.to_string(), "Upstream service returned 422");
        assert!(!err.is_transient());
    }
}
