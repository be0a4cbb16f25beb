//! Narrative phase of a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Current narrative mode of a session.
///
/// Closed set: the database enforces the same four values with a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Exploration,
    Combat,
    Dialogue,
    Rest,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Exploration, Phase::Combat, Phase::Dialogue, Phase::Rest];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Combat => "combat",
            Self::Dialogue => "dialogue",
            Self::Rest => "rest",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exploration" => Ok(Self::Exploration),
            "combat" => Ok(Self::Combat),
            "dialogue" => Ok(Self::Dialogue),
            "rest" => Ok(Self::Rest),
            other => Err(DomainError::parse(format!("Unknown phase: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Combat".parse::<Phase>(), Ok(Phase::Combat));
        assert_eq!(" rest ".parse::<Phase>(), Ok(Phase::Rest));
    }

    #[test]
    fn rejects_unknown_phase() {
        let err = "shopping".parse::<Phase>().unwrap_err();
        assert_eq!(err.to_string(), "Parse error: Unknown phase: shopping");
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for phase in Phase::ALL {
            assert_eq!(phase.to_string().parse::<Phase>(), Ok(phase));
        }
    }
}
