//! Session lifecycle status
//!
//! ```text
//! Active -> Paused (pause)
//! Paused -> Active (resume)
//! Active | Paused -> Ended (end)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Paused,
    Ended,
}

/// Lifecycle operations exposed by the MANAGE endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    End,
    Pause,
    Resume,
}

impl LifecycleAction {
    /// Past-tense verb used in response messages ("Session {id} paused").
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::End => "ended",
            Self::Pause => "paused",
            Self::Resume => "resumed",
        }
    }
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    /// Status reached by applying `action`, or an error if the move is illegal.
    pub fn apply(self, action: LifecycleAction) -> Result<SessionStatus, DomainError> {
        match (self, action) {
            (Self::Active, LifecycleAction::Pause) => Ok(Self::Paused),
            (Self::Paused, LifecycleAction::Resume) => Ok(Self::Active),
            (Self::Active | Self::Paused, LifecycleAction::End) => Ok(Self::Ended),
            (from, action) => Err(DomainError::invalid_state_transition(format!(
                "cannot {} a session that is {}",
                match action {
                    LifecycleAction::End => "end",
                    LifecycleAction::Pause => "pause",
                    LifecycleAction::Resume => "resume",
                },
                from
            ))),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "ended" => Ok(Self::Ended),
            other => Err(DomainError::parse(format!("Unknown session status: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_and_resume_toggle() {
        let paused = SessionStatus::Active.apply(LifecycleAction::Pause).unwrap();
        assert_eq!(paused, SessionStatus::Paused);
        assert_eq!(
            paused.apply(LifecycleAction::Resume).unwrap(),
            SessionStatus::Active
        );
    }

    #[test]
    fn end_is_allowed_from_active_and_paused() {
        assert_eq!(
            SessionStatus::Active.apply(LifecycleAction::End).unwrap(),
            SessionStatus::Ended
        );
        assert_eq!(
            SessionStatus::Paused.apply(LifecycleAction::End).unwrap(),
            SessionStatus::Ended
        );
    }

    #[test]
    fn ended_sessions_are_terminal() {
        for action in [LifecycleAction::End, LifecycleAction::Pause, LifecycleAction::Resume] {
            let result = SessionStatus::Ended.apply(action);
            assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
        }
    }

    #[test]
    fn resume_requires_paused() {
        let err = SessionStatus::Active.apply(LifecycleAction::Resume).unwrap_err();
        assert!(err.to_string().contains("cannot resume a session that is active"));
    }
}
