//! HTTP error mapping.
//!
//! Every failure leaves the service as the standard error envelope. Internal
//! errors are logged here and answered with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use statedb_domain::DomainError;
use statedb_shared::ErrorBody;

use crate::infrastructure::ports::{ProxyError, RepoError};
use crate::use_cases::{
    ApiKeyError, ContextError, ScenarioError, SessionError, StateError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    /// A peer service answered with an error status; relayed as-is.
    Upstream { status: u16, body: Value },
    Unavailable(String),
    Timeout(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::NotFound(msg) => ErrorBody::new(msg).with_code("NOT_FOUND"),
            Self::BadRequest(msg) => ErrorBody::new(msg).with_code("BAD_REQUEST"),
            Self::Unauthorized(msg) => ErrorBody::new(msg).with_code("UNAUTHORIZED"),
            Self::Conflict(msg) => ErrorBody::new(msg).with_code("CONFLICT"),
            Self::Upstream { status, body } => {
                ErrorBody::new(format!("Upstream service returned {status}"))
                    .with_code("UPSTREAM_ERROR")
                    .with_detail(body)
            }
            Self::Unavailable(detail) => ErrorBody::new("Service unavailable")
                .with_code("SERVICE_UNAVAILABLE")
                .with_detail(Value::String(detail)),
            Self::Timeout(detail) => ErrorBody::new("Gateway timeout")
                .with_code("GATEWAY_TIMEOUT")
                .with_detail(Value::String(detail)),
            Self::Internal(cause) => {
                tracing::error!(error = %cause, "Request failed");
                ErrorBody::new("Internal server error").with_code("INTERNAL_ERROR")
            }
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            RepoError::ConstraintViolation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::Upstream { status, body } => ApiError::Upstream { status, body },
            ProxyError::Unavailable { base_url, detail } => {
                ApiError::Unavailable(format!("{base_url}: {detail}"))
            }
            ProxyError::Timeout { base_url, detail } => {
                ApiError::Timeout(format!("{base_url}: {detail}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            DomainError::InvalidStateTransition(_) => ApiError::Conflict(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<ScenarioError> for ApiError {
    fn from(e: ScenarioError) -> Self {
        match e {
            ScenarioError::Invalid(e) => e.into(),
            ScenarioError::Repo(e) => e.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidScenarioId(_) => ApiError::BadRequest(e.to_string()),
            SessionError::ScenarioNotFound(_) | SessionError::NotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            SessionError::Transition(e) => e.into(),
            SessionError::Repo(e) => e.into(),
        }
    }
}

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::SessionNotFound(_) | StateError::NotFound { .. } => {
                ApiError::NotFound(e.to_string())
            }
            StateError::InvalidChanges(_) => ApiError::BadRequest(e.to_string()),
            StateError::Repo(e) => e.into(),
            StateError::Proxy(e) => e.into(),
        }
    }
}

impl From<ContextError> for ApiError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::SessionNotFound(_) => ApiError::NotFound(e.to_string()),
            ContextError::Repo(e) => e.into(),
        }
    }
}

impl From<ApiKeyError> for ApiError {
    fn from(e: ApiKeyError) -> Self {
        match e {
            ApiKeyError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ApiKeyError::Repo(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Validation failed: {e}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statedb_domain::SessionId;

    #[test]
    fn repo_not_found_is_404() {
        let err: ApiError = RepoError::not_found("Session", "x").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_error_is_500() {
        let err: ApiError = RepoError::database("get_session", "boom").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn illegal_lifecycle_move_is_409() {
        let err: ApiError =
            SessionError::Transition(DomainError::invalid_state_transition("no")).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn malformed_scenario_id_is_400() {
        let err: ApiError = SessionError::InvalidScenarioId("abc".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn proxy_failures_map_to_gateway_statuses() {
        let unavailable: ApiError = ProxyError::Unavailable {
            base_url: "http://re".into(),
            detail: "refused".into(),
        }
        .into();
        let timeout: ApiError = ProxyError::Timeout {
            base_url: "http://re".into(),
            detail: "slow".into(),
        }
        .into();
        let upstream: ApiError = ProxyError::Upstream {
            status: 422,
            body: serde_json::json!({"detail": "bad"}),
        }
        .into();

        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(upstream.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_session_in_state_service_is_404() {
        let err: ApiError = StateError::SessionNotFound(SessionId::new()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
