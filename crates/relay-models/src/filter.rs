//! Event-type filter for board subscriptions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::action::ActionType;

/// Set of enabled action types. An empty set allows every type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTypeFilter(BTreeSet<ActionType>);

impl EventTypeFilter {
    /// Creates a filter that allows every type.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// The card events enabled for boards subscribed from chat.
    pub fn default_card_events() -> Self {
        [
            ActionType::CreateCard,
            ActionType::CopyCard,
            ActionType::CommentCard,
            ActionType::DeleteCard,
            ActionType::UpdateCard,
        ]
        .into_iter()
        .collect()
    }

    /// Adds a type to the filter.
    pub fn with_type(mut self, action_type: impl Into<ActionType>) -> Self {
        self.0.insert(action_type.into());
        self
    }

    /// Returns true if the filter places no restriction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of enabled types.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if actions of this type pass the filter.
    pub fn allows(&self, action_type: &ActionType) -> bool {
        self.0.is_empty() || self.0.contains(action_type)
    }

    /// Iterates the enabled types in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionType> {
        self.0.iter()
    }

    /// Comma-joined tags for a server-side filter parameter, if any.
    pub fn to_query(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let tags: Vec<&str> = self.0.iter().map(ActionType::as_str).collect();
        Some(tags.join(","))
    }
}

impl<T: Into<ActionType>> FromIterator<T> for EventTypeFilter {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
