use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(ClientId);

define_id!(RoomId);

define_id!(PlayerId);

/// Identities starting with this prefix belong to computer agents, never to a connection.
pub const COMPUTER_AGENT_PREFIX: &str = "AI_AGENT";

impl PlayerId {
    /// Reserved identity for the single computer seat of a human-vs-computer room.
    pub fn computer_agent() -> Self {
        Self(COMPUTER_AGENT_PREFIX.to_string())
    }

    /// Reserved identity for one of the two seats of a computer-vs-computer room.
    pub fn numbered_computer_agent(seat: usize) -> Self {
        Self(format!("{}_{}", COMPUTER_AGENT_PREFIX, seat))
    }

    pub fn is_computer_agent(&self) -> bool {
        self.0.starts_with(COMPUTER_AGENT_PREFIX)
    }
}

impl ClientId {
    pub fn to_player_id(&self) -> PlayerId {
        PlayerId::new(self.0.clone())
    }
}

impl PartialEq<ClientId> for PlayerId {
    fn eq(&self, other: &ClientId) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computer_agents_are_recognised_by_prefix() {
        assert!(PlayerId::computer_agent().is_computer_agent());
        assert!(PlayerId::numbered_computer_agent(2).is_computer_agent());
        assert_eq!(PlayerId::numbered_computer_agent(1).as_str(), "AI_AGENT_1");
        assert!(!PlayerId::new("5f1c-client").is_computer_agent());
    }

    #[test]
    fn client_ids_compare_against_player_ids() {
        let client = ClientId::new("abc");
        assert!(client.to_player_id() == client);
        assert!(PlayerId::new("abd") != client);
    }
}
