//! Error types for channel binding operations.

use relay_hub::HubError;
use relay_models::{BoardId, ChannelId};
use thiserror::Error;

/// Errors that can occur while binding channels to boards.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The channel already watches a board.
    #[error("channel {channel_id} already watches board {board_id}")]
    AlreadyBound {
        channel_id: ChannelId,
        board_id: BoardId,
    },

    /// Another subscription already watches the board.
    #[error("already watching board {board_id}")]
    BoardAlreadyWatched {
        board_id: BoardId,
        /// The channel holding the board, when it is one of ours.
        channel_id: Option<ChannelId>,
    },

    /// The binding has a blank channel or board id.
    #[error("invalid binding: {0}")]
    InvalidBinding(String),

    #[error(transparent)]
    Hub(#[from] HubError),
}

/// Result type alias for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
