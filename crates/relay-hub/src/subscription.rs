//! Subscription snapshots and the capabilities a subscription is built from.

use async_trait::async_trait;

use relay_models::{Action, ActionId, BoardId, EventTypeFilter};

use crate::error::{FetchError, HandlerError};

/// Read-only view of a subscription.
///
/// Returned by lookups and listings; owned, so it can be kept without
/// holding the registry lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Watched board.
    pub board_id: BoardId,
    /// Enabled action types (empty = all).
    pub event_types: EventTypeFilter,
    /// Last dispatched action, if any.
    pub cursor: Option<ActionId>,
}

/// Context passed to a handler alongside each action.
#[derive(Debug, Clone)]
pub struct SubscriptionContext {
    /// Board the action belongs to.
    pub board_id: BoardId,
    /// The subscription's filter.
    pub event_types: EventTypeFilter,
    /// Cursor before this action is dispatched.
    pub cursor: Option<ActionId>,
}

/// Source of board actions (the remote board service).
#[async_trait]
pub trait ActionSource: Send + Sync {
    /// Fetches a board's recent actions, newest first.
    ///
    /// `filter` is a hint for server-side filtering; the hub filters again.
    async fn fetch_board_actions(
        &self,
        board_id: &BoardId,
        filter: &EventTypeFilter,
    ) -> Result<Vec<Action>, FetchError>;
}

/// Receives every new qualifying action of one subscription, oldest first.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handles one action.
    async fn handle(
        &self,
        ctx: &SubscriptionContext,
        action: &Action,
    ) -> Result<(), HandlerError>;
}
