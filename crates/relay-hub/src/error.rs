//! Error types for the hub crate.

use thiserror::Error;

use relay_models::BoardId;

use crate::subscription::Subscription;

/// Errors returned by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// The board already has a subscription. Carries the existing one.
    #[error("already subscribed to board {}", .existing.board_id)]
    AlreadySubscribed { existing: Subscription },

    /// The background poll task panicked or was cancelled.
    #[error("poll task failed: {0}")]
    PollTask(String),
}

/// Failure fetching a board's actions. Transient: the board is retried on
/// the next cycle from the same cursor.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The board does not exist or is not visible with these credentials.
    #[error("board not found: {0}")]
    NotFound(BoardId),

    /// The remote service asked us to slow down.
    #[error("rate limited by remote service")]
    RateLimited,

    /// The remote service could not be reached or returned an error status.
    #[error("remote service unavailable: {0}")]
    Unavailable(String),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure delivering an action downstream. The action still counts as seen.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// Sending the notification failed.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for hub operations.
pub type Result<T> = std::result::Result<T, HubError>;
