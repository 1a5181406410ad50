//! Type-safe ID wrappers for board-relay.
//!
//! All identifiers are issued by external services (Trello, Telegram), so
//! unlike locally minted ids there is no random constructor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate ID newtypes with common functionality.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the id is empty or only whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Remote board identifier (Trello board id or short link).
    BoardId
);

define_id!(
    /// Remote action identifier.
    ///
    /// Ordering is plain string ordering. Trello ids are fixed-width hex
    /// object ids whose leading bytes encode the creation time, so they sort
    /// increasing in creation order.
    ActionId
);

define_id!(
    /// Delivery target identifier (a chat id rendered as a string).
    ChannelId
);

define_id!(
    /// Remote card identifier.
    CardId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_string() {
        let id = BoardId::from_string("5f1a2b3c");
        assert_eq!(id.as_str(), "5f1a2b3c");
        assert_eq!(id.to_string(), "5f1a2b3c");
    }

    #[test]
    fn test_action_id_ordering_is_lexicographic() {
        let a = ActionId::from("100");
        let b = ActionId::from("101");
        let c = ActionId::from("5f0000000000000000000001");
        let d = ActionId::from("5f0000000000000000000002");

        assert!(a < b);
        assert!(c < d);
        assert!(!(a < a.clone()));
    }

    #[test]
    fn test_is_blank() {
        assert!(ChannelId::from("").is_blank());
        assert!(ChannelId::from("   ").is_blank());
        assert!(!ChannelId::from("-1001").is_blank());
    }

    #[test]
    fn test_serde_transparent() {
        let id = ActionId::from("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");

        let back: ActionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
