//! Board actions as reported by the remote board service.
//!
//! The hub only looks at [`Action::id`] and [`Action::action_type`]; the rest
//! of the payload is carried through untouched for the renderer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, BoardId, CardId};

/// Type tag of a board action.
///
/// Tags the relay knows how to describe get their own variant; anything else
/// the remote service sends is kept verbatim in [`ActionType::Other`] so
/// filtering never fails on vocabulary added later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    CreateCard,
    UpdateCard,
    CommentCard,
    DeleteCard,
    CopyCard,
    MoveCardToBoard,
    MoveCardFromBoard,
    AddMemberToBoard,
    AddMemberToCard,
    RemoveMemberFromCard,
    AddChecklistToCard,
    UpdateCheckItemStateOnCard,
    AddAttachmentToCard,
    CreateList,
    UpdateList,
    /// A tag outside the known vocabulary.
    Other(String),
}

impl ActionType {
    /// Returns the wire tag for this type.
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::CreateCard => "createCard",
            ActionType::UpdateCard => "updateCard",
            ActionType::CommentCard => "commentCard",
            ActionType::DeleteCard => "deleteCard",
            ActionType::CopyCard => "copyCard",
            ActionType::MoveCardToBoard => "moveCardToBoard",
            ActionType::MoveCardFromBoard => "moveCardFromBoard",
            ActionType::AddMemberToBoard => "addMemberToBoard",
            ActionType::AddMemberToCard => "addMemberToCard",
            ActionType::RemoveMemberFromCard => "removeMemberFromCard",
            ActionType::AddChecklistToCard => "addChecklistToCard",
            ActionType::UpdateCheckItemStateOnCard => "updateCheckItemStateOnCard",
            ActionType::AddAttachmentToCard => "addAttachmentToCard",
            ActionType::CreateList => "createList",
            ActionType::UpdateList => "updateList",
            ActionType::Other(tag) => tag,
        }
    }

    /// Returns true for action types that concern a single card.
    pub fn is_card_action(&self) -> bool {
        matches!(
            self,
            ActionType::CreateCard
                | ActionType::UpdateCard
                | ActionType::CommentCard
                | ActionType::CopyCard
                | ActionType::MoveCardToBoard
                | ActionType::AddMemberToCard
                | ActionType::RemoveMemberFromCard
                | ActionType::AddChecklistToCard
                | ActionType::UpdateCheckItemStateOnCard
                | ActionType::AddAttachmentToCard
        )
    }

    /// Returns true if the type is outside the known vocabulary.
    pub fn is_unknown(&self) -> bool {
        matches!(self, ActionType::Other(_))
    }
}

impl From<&str> for ActionType {
    fn from(tag: &str) -> Self {
        match tag {
            "createCard" => ActionType::CreateCard,
            "updateCard" => ActionType::UpdateCard,
            "commentCard" => ActionType::CommentCard,
            "deleteCard" => ActionType::DeleteCard,
            "copyCard" => ActionType::CopyCard,
            "moveCardToBoard" => ActionType::MoveCardToBoard,
            "moveCardFromBoard" => ActionType::MoveCardFromBoard,
            "addMemberToBoard" => ActionType::AddMemberToBoard,
            "addMemberToCard" => ActionType::AddMemberToCard,
            "removeMemberFromCard" => ActionType::RemoveMemberFromCard,
            "addChecklistToCard" => ActionType::AddChecklistToCard,
            "updateCheckItemStateOnCard" => ActionType::UpdateCheckItemStateOnCard,
            "addAttachmentToCard" => ActionType::AddAttachmentToCard,
            "createList" => ActionType::CreateList,
            "updateList" => ActionType::UpdateList,
            other => ActionType::Other(other.to_string()),
        }
    }
}

impl From<String> for ActionType {
    fn from(tag: String) -> Self {
        ActionType::from(tag.as_str())
    }
}

impl From<ActionType> for String {
    fn from(action_type: ActionType) -> Self {
        match action_type {
            ActionType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMember {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
}

/// Card reference embedded in action data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    pub id: CardId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_link: Option<String>,
}

/// Board reference embedded in action data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRef {
    pub id: BoardId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_link: Option<String>,
}

/// List reference embedded in action data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Member reference embedded in member-related action data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Type-specific action payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_before: Option<ListRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_after: Option<ListRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberRef>,
    /// Comment text for `commentCard`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Previous field values for `update*` actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<serde_json::Value>,
}

impl ActionData {
    /// Returns true if this update moved a card between lists.
    pub fn is_list_move(&self) -> bool {
        self.list_before.is_some() && self.list_after.is_some()
    }
}

/// A single action on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_creator: Option<ActionMember>,
    #[serde(default)]
    pub data: ActionData,
}

impl Action {
    /// Creates an action with an empty payload.
    pub fn new(id: impl Into<ActionId>, action_type: impl Into<ActionType>) -> Self {
        Self {
            id: id.into(),
            action_type: action_type.into(),
            date: None,
            member_creator: None,
            data: ActionData::default(),
        }
    }

    /// Sets the payload.
    pub fn with_data(mut self, data: ActionData) -> Self {
        self.data = data;
        self
    }

    /// Sets the creating member.
    pub fn with_member_creator(mut self, member: ActionMember) -> Self {
        self.member_creator = Some(member);
        self
    }

    /// Display name of whoever performed the action.
    pub fn actor_name(&self) -> &str {
        match &self.member_creator {
            Some(m) if !m.full_name.is_empty() => &m.full_name,
            Some(m) if !m.username.is_empty() => &m.username,
            _ => "Someone",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_round_trip() {
        for tag in ["createCard", "updateCard", "commentCard", "deleteCard", "copyCard"] {
            let t = ActionType::from(tag);
            assert!(!t.is_unknown(), "{tag} should be known");
            assert_eq!(t.as_str(), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        let t = ActionType::from("enablePowerUp");
        assert_eq!(t, ActionType::Other("enablePowerUp".to_string()));
        assert_eq!(String::from(t), "enablePowerUp");
    }

    #[test]
    fn test_deserialize_trello_action() {
        let json = r#"{
            "id": "5f2b8c1d9e0a4b0012345678",
            "idMemberCreator": "5a0000000000000000000001",
            "type": "updateCard",
            "date": "2023-04-05T10:11:12.345Z",
            "data": {
                "card": {"id": "c1", "name": "Fix login", "idShort": 42, "shortLink": "AbCd"},
                "board": {"id": "b1", "name": "Roadmap", "shortLink": "XyZ"},
                "listBefore": {"id": "l1", "name": "Todo"},
                "listAfter": {"id": "l2", "name": "Doing"},
                "old": {"idList": "l1"}
            },
            "memberCreator": {"id": "m1", "fullName": "Ada Lovelace", "username": "ada"}
        }"#;

        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action.id.as_str(), "5f2b8c1d9e0a4b0012345678");
        assert_eq!(action.action_type, ActionType::UpdateCard);
        assert!(action.date.is_some());
        assert!(action.data.is_list_move());
        assert_eq!(action.data.card.as_ref().unwrap().name, "Fix login");
        assert_eq!(action.actor_name(), "Ada Lovelace");
    }

    #[test]
    fn test_deserialize_unknown_type_and_sparse_data() {
        let json = r#"{"id": "a1", "type": "somethingNew"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(action.action_type.is_unknown());
        assert_eq!(action.data, ActionData::default());
        assert_eq!(action.actor_name(), "Someone");
    }

    #[test]
    fn test_card_action_classification() {
        assert!(ActionType::CreateCard.is_card_action());
        assert!(ActionType::CommentCard.is_card_action());
        assert!(!ActionType::DeleteCard.is_card_action());
        assert!(!ActionType::CreateList.is_card_action());
        assert!(!ActionType::Other("x".into()).is_card_action());
    }
}
