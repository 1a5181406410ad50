//! Error types for the Trello client.

use relay_hub::FetchError;
use relay_models::BoardId;
use thiserror::Error;

/// Errors returned by [`TrelloClient`](crate::TrelloClient) calls.
#[derive(Error, Debug)]
pub enum TrelloError {
    /// The requested resource does not exist or is not visible.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// HTTP 429.
    #[error("rate limited by Trello")]
    RateLimited,

    /// Any other non-success status.
    #[error("Trello API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be sent or the response not read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("failed to decode Trello response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias for Trello operations.
pub type Result<T> = std::result::Result<T, TrelloError>;

impl TrelloError {
    /// Maps a client error onto the hub's fetch failure for `board_id`.
    pub fn into_fetch_error(self, board_id: &BoardId) -> FetchError {
        match self {
            TrelloError::NotFound { .. } => FetchError::NotFound(board_id.clone()),
            TrelloError::RateLimited => FetchError::RateLimited,
            TrelloError::Decode(e) => FetchError::Malformed(e.to_string()),
            other @ (TrelloError::Status { .. } | TrelloError::Http(_)) => {
                FetchError::Unavailable(other.to_string())
            }
        }
    }
}
