//! Telegram front end for board-relay.
//!
//! Posts Trello board activity to Telegram chats. Each chat can watch one
//! board; each board is watched by at most one chat.
//!
//! # Environment Variables
//!
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `TRELLO_API_KEY`, `TRELLO_TOKEN`: Trello credentials
//! - `BOARD_RELAY_CONFIG`: config file path
//! - `BOARD_RELAY_POLL_INTERVAL_MS`: poll interval override
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Show available commands
//! - `/subscribe <board>` - Watch a board in this chat
//! - `/unsubscribe` - Stop watching
//! - `/status` - Board watched by this chat and its last action
//! - `/boards` - Every watched board

pub mod bot;
pub mod channel;
pub mod error;
pub mod handlers;
pub mod render;
pub mod state;
pub mod version;

pub use bot::RelayBot;
pub use channel::{TelegramChannel, TelegramHandlerFactory};
pub use error::{Result, TelegramError};
pub use state::{create_shared_state, RelayState};
