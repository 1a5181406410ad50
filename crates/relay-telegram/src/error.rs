//! Error types for the Telegram relay.

use relay_channels::ChannelError;
use relay_core::ConfigError;
use relay_hub::HubError;
use relay_persistence::PersistenceError;
use relay_trello::TrelloError;
use thiserror::Error;

/// Errors that can occur starting or running the relay bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Channel bindings could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Trello client error.
    #[error("Trello error: {0}")]
    Trello(#[from] TrelloError),

    /// Hub error.
    #[error("hub error: {0}")]
    Hub(#[from] HubError),

    /// Channel binding error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Failed to start the bot.
    #[error("failed to start bot: {0}")]
    BotStartFailed(String),

    /// Telegram API request failed.
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<teloxide::RequestError> for TelegramError {
    fn from(e: teloxide::RequestError) -> Self {
        TelegramError::Api(e.to_string())
    }
}
