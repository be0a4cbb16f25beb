//! Session start and lifecycle.

use std::sync::Arc;

use statedb_domain::{DomainError, LifecycleAction, ScenarioId, Session, SessionId, SessionStatus};
use statedb_shared::SessionStartRequest;

use crate::infrastructure::ports::{RepoError, SessionRepo, SessionStart};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid scenario_id: {0}")]
    InvalidScenarioId(String),
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(ScenarioId),
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error(transparent)]
    Transition(DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct SessionUseCases {
    repo: Arc<dyn SessionRepo>,
}

impl SessionUseCases {
    pub fn new(repo: Arc<dyn SessionRepo>) -> Self {
        Self { repo }
    }

    /// Clone a scenario into a fresh session.
    ///
    /// The scenario id is parsed here rather than by serde so a malformed value
    /// is reported against the field instead of as a generic body error.
    pub async fn start(&self, request: &SessionStartRequest) -> Result<Session, SessionError> {
        let scenario_id: ScenarioId = request
            .scenario_id
            .parse()
            .map_err(|_| SessionError::InvalidScenarioId(request.scenario_id.clone()))?;

        let start = SessionStart {
            scenario_id,
            current_act: request.current_act,
            current_sequence: request.current_sequence,
            location: request.location.clone(),
        };

        let session_id = self
            .repo
            .create(&start)
            .await?
            .ok_or(SessionError::ScenarioNotFound(scenario_id))?;

        self.repo
            .get(session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))
    }

    /// Apply a lifecycle move, rejecting the ones the current status forbids.
    pub async fn lifecycle(
        &self,
        id: SessionId,
        action: LifecycleAction,
    ) -> Result<Session, SessionError> {
        let session = self.repo.get(id).await?.ok_or(SessionError::NotFound(id))?;
        let next = session
            .status
            .apply(action)
            .map_err(SessionError::Transition)?;

        let updated = self
            .repo
            .set_status(id, next)
            .await?
            .ok_or(SessionError::NotFound(id))?;

        tracing::info!(session_id = %id, status = %next, "Session {}", action.past_tense());
        Ok(updated)
    }

    pub async fn get(&self, id: SessionId) -> Result<Session, SessionError> {
        self.repo.get(id).await?.ok_or(SessionError::NotFound(id))
    }

    pub async fn list(&self, status: Option<SessionStatus>) -> Result<Vec<Session>, SessionError> {
        Ok(self.repo.list(status).await?)
    }

    pub async fn delete(&self, id: SessionId) -> Result<(), SessionError> {
        if self.repo.delete(id).await? {
            tracing::info!(session_id = %id, "Session deleted");
            Ok(())
        } else {
            Err(SessionError::NotFound(id))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infrastructure::ports::MockSessionRepo;
    use chrono::Utc;
    use statedb_domain::Phase;

    pub(crate) fn session(id: SessionId, status: SessionStatus) -> Session {
        Session {
            session_id: id,
            scenario_id: ScenarioId::new(),
            player_id: None,
            current_act: 1,
            current_act_id: "act-1".to_string(),
            current_sequence: 1,
            current_sequence_id: "seq-1".to_string(),
            current_phase: Phase::Exploration,
            current_turn: 0,
            location: Some("Starting Town".to_string()),
            status,
            started_at: Utc::now(),
            ended_at: None,
            paused_at: None,
            updated_at: Utc::now(),
        }
    }

    fn start_request(scenario_id: &str) -> SessionStartRequest {
        SessionStartRequest {
            scenario_id: scenario_id.to_string(),
            current_act: 1,
            current_sequence: 1,
            location: "Starting Town".to_string(),
        }
    }

    #[tokio::test]
    async fn start_rejects_malformed_scenario_id_before_db() {
        let mut repo = MockSessionRepo::new();
        repo.expect_create().never();

        let use_case = SessionUseCases::new(Arc::new(repo));
        let result = use_case.start(&start_request("not-a-uuid")).await;

        match result {
            Err(SessionError::InvalidScenarioId(raw)) => assert_eq!(raw, "not-a-uuid"),
            other => panic!("expected invalid scenario id, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_reports_unknown_scenario() {
        let scenario_id = ScenarioId::new();
        let mut repo = MockSessionRepo::new();
        repo.expect_create()
            .withf(move |start| start.scenario_id == scenario_id && start.current_act == 1)
            .returning(|_| Ok(None));

        let use_case = SessionUseCases::new(Arc::new(repo));
        let result = use_case
            .start(&start_request(&scenario_id.to_string()))
            .await;

        assert!(matches!(result, Err(SessionError::ScenarioNotFound(id)) if id == scenario_id));
    }

    #[tokio::test]
    async fn start_returns_created_session() {
        let scenario_id = ScenarioId::new();
        let session_id = SessionId::new();
        let mut repo = MockSessionRepo::new();
        repo.expect_create()
            .returning(move |_| Ok(Some(session_id)));
        repo.expect_get()
            .withf(move |id| *id == session_id)
            .returning(move |id| Ok(Some(session(id, SessionStatus::Active))));

        let use_case = SessionUseCases::new(Arc::new(repo));
        let started = use_case
            .start(&start_request(&scenario_id.to_string()))
            .await
            .unwrap();

        assert_eq!(started.session_id, session_id);
        assert_eq!(started.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn pause_moves_active_session_to_paused() {
        let id = SessionId::new();
        let mut repo = MockSessionRepo::new();
        repo.expect_get()
            .returning(move |id| Ok(Some(session(id, SessionStatus::Active))));
        repo.expect_set_status()
            .withf(move |sid, status| *sid == id && *status == SessionStatus::Paused)
            .times(1)
            .returning(|sid, status| Ok(Some(session(sid, status))));

        let use_case = SessionUseCases::new(Arc::new(repo));
        let paused = use_case.lifecycle(id, LifecycleAction::Pause).await.unwrap();

        assert_eq!(paused.status, SessionStatus::Paused);
    }

    #[tokio::test]
    async fn resume_of_active_session_is_rejected() {
        let id = SessionId::new();
        let mut repo = MockSessionRepo::new();
        repo.expect_get()
            .returning(move |id| Ok(Some(session(id, SessionStatus::Active))));
        repo.expect_set_status().never();

        let use_case = SessionUseCases::new(Arc::new(repo));
        let result = use_case.lifecycle(id, LifecycleAction::Resume).await;

        assert!(matches!(
            result,
            Err(SessionError::Transition(DomainError::InvalidStateTransition(_)))
        ));
    }

    #[tokio::test]
    async fn ended_session_cannot_be_ended_again() {
        let id = SessionId::new();
        let mut repo = MockSessionRepo::new();
        repo.expect_get()
            .returning(move |id| Ok(Some(session(id, SessionStatus::Ended))));

        let use_case = SessionUseCases::new(Arc::new(repo));
        let result = use_case.lifecycle(id, LifecycleAction::End).await;

        assert!(matches!(result, Err(SessionError::Transition(_))));
    }

    #[tokio::test]
    async fn delete_of_missing_session_is_not_found() {
        let id = SessionId::new();
        let mut repo = MockSessionRepo::new();
        repo.expect_delete().returning(|_| Ok(false));

        let use_case = SessionUseCases::new(Arc::new(repo));
        let result = use_case.delete(id).await;

        assert!(matches!(result, Err(SessionError::NotFound(sid)) if sid == id));
    }
}
