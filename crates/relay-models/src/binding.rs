//! Persisted channel-to-board bindings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::filter::EventTypeFilter;
use crate::ids::{ActionId, BoardId, ChannelId};

/// A chat channel bound to a board, with the state needed to resume.
///
/// Serialized in the shape of the `channels` entries of the config file:
///
/// ```json
/// {
///   "channelId": "-1001234",
///   "boardId": "5f1a...",
///   "enabledEvents": ["createCard", "updateCard"],
///   "lastActionId": ""
/// }
/// ```
///
/// An empty `lastActionId` means no action has been seen yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelBinding {
    pub channel_id: ChannelId,
    pub board_id: BoardId,
    #[serde(default)]
    pub enabled_events: EventTypeFilter,
    #[serde(
        default,
        serialize_with = "serialize_cursor",
        deserialize_with = "deserialize_cursor"
    )]
    pub last_action_id: Option<ActionId>,
}

impl ChannelBinding {
    /// Creates a binding with no cursor.
    pub fn new(
        channel_id: impl Into<ChannelId>,
        board_id: impl Into<BoardId>,
        enabled_events: EventTypeFilter,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            board_id: board_id.into(),
            enabled_events,
            last_action_id: None,
        }
    }

    /// Sets the resume cursor.
    pub fn with_cursor(mut self, cursor: impl Into<ActionId>) -> Self {
        self.last_action_id = Some(cursor.into());
        self
    }

    /// Returns a description of why this binding can't be used, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_id.is_blank() {
            return Err("channel id is empty".to_string());
        }
        if self.board_id.is_blank() {
            return Err("board id is empty".to_string());
        }
        Ok(())
    }
}

fn serialize_cursor<S: Serializer>(cursor: &Option<ActionId>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(cursor.as_ref().map(ActionId::as_str).unwrap_or(""))
}

fn deserialize_cursor<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ActionId>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(ActionId::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cursor_is_none() {
        let json = r#"{"channelId": "42", "boardId": "b1", "enabledEvents": [], "lastActionId": ""}"#;
        let binding: ChannelBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.last_action_id, None);
        assert!(binding.enabled_events.is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{"channelId": "42", "boardId": "b1"}"#;
        let binding: ChannelBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.last_action_id, None);

        let json = r#"{"channelId": "42", "boardId": "b1", "lastActionId": null}"#;
        let binding: ChannelBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.last_action_id, None);
    }

    #[test]
    fn test_cursor_serialized_as_string() {
        let binding = ChannelBinding::new("42", "b1", EventTypeFilter::allow_all());
        let value = serde_json::to_value(&binding).unwrap();
        assert_eq!(value["lastActionId"], "");
        assert_eq!(value["channelId"], "42");

        let binding = binding.with_cursor("a9");
        let value = serde_json::to_value(&binding).unwrap();
        assert_eq!(value["lastActionId"], "a9");
    }

    #[test]
    fn test_validate() {
        assert!(ChannelBinding::new("42", "b1", EventTypeFilter::allow_all())
            .validate()
            .is_ok());
        assert!(ChannelBinding::new("", "b1", EventTypeFilter::allow_all())
            .validate()
            .is_err());
        assert!(ChannelBinding::new("42", " ", EventTypeFilter::allow_all())
            .validate()
            .is_err());
    }
}
