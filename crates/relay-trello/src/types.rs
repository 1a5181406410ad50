//! Trello resources fetched beyond board actions.

use chrono::{DateTime, Utc};
use relay_models::{BoardId, CardId};
use serde::{Deserialize, Serialize};

/// A board, as returned by `GET /boards/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub short_url: String,
    #[serde(default)]
    pub closed: bool,
}

/// A card with members and checklists expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub short_url: String,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
}

/// A card label. Colourless labels have no `color`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub check_items: Vec<CheckItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItem {
    pub id: String,
    pub name: String,
    /// `complete` or `incomplete`.
    #[serde(default)]
    pub state: String,
}

impl CheckItem {
    pub fn is_complete(&self) -> bool {
        self.state == "complete"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_expanded_card() {
        let json = r#"{
            "id": "c1",
            "name": "Ship it",
            "desc": "Release 1.2",
            "shortUrl": "https://trello.com/c/AbCd",
            "due": "2024-03-01T12:00:00.000Z",
            "labels": [{"id": "l1", "name": "urgent", "color": "red"}, {"id": "l2", "name": "", "color": null}],
            "members": [{"id": "m1", "username": "ada", "fullName": "Ada"}],
            "checklists": [{
                "id": "k1",
                "name": "Steps",
                "checkItems": [
                    {"id": "i1", "name": "tag", "state": "complete"},
                    {"id": "i2", "name": "publish", "state": "incomplete"}
                ]
            }]
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.labels[0].color.as_deref(), Some("red"));
        assert!(card.labels[1].color.is_none());
        assert_eq!(card.members[0].username, "ada");
        assert!(card.checklists[0].check_items[0].is_complete());
        assert!(!card.checklists[0].check_items[1].is_complete());
        assert!(card.due.is_some());
    }

    #[test]
    fn test_minimal_card() {
        let card: Card = serde_json::from_str(r#"{"id": "c1", "name": "Bare", "due": null}"#).unwrap();
        assert!(card.desc.is_empty());
        assert!(card.due.is_none());
        assert!(card.checklists.is_empty());
    }
}
