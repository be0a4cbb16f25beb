use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| DomainError::invalid_id(format!("{} is not a valid {}", s, $label)))
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Scenario tree
define_id!(ScenarioId, "scenario id");

// Play-through instances
define_id!(SessionId, "session id");
define_id!(PlayerId, "player id");
define_id!(NpcId, "npc id");
define_id!(EnemyId, "enemy id");

// Auth
define_id!(ApiKeyId, "api key id");

/// Reserved session id under which master (un-cloned) scenario entities live.
pub const TEMPLATE_SESSION_ID: SessionId = SessionId::from_uuid(Uuid::nil());

impl SessionId {
    pub fn is_template(&self) -> bool {
        *self == TEMPLATE_SESSION_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_session_is_all_zero() {
        assert_eq!(
            TEMPLATE_SESSION_ID.to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
        assert!(TEMPLATE_SESSION_ID.is_template());
        assert!(!SessionId::new().is_template());
    }

    #[test]
    fn parse_rejects_malformed_uuid() {
        let err = "not-a-uuid".parse::<ScenarioId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
        assert!(err.to_string().contains("scenario id"));
    }

    #[test]
    fn ids_serialize_as_bare_uuid_strings() {
        let id = SessionId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
