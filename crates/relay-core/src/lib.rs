//! Shared configuration for board-relay.
//!
//! Settings come from a JSON file (the same file that stores channel
//! bindings), overridden by environment variables. Secrets can live in
//! `.env.local` or `.env`.

pub mod config;
pub mod error;

pub use config::{
    load_env_files, resolve_config_path, AppConfig, CONFIG_PATH_ENV, POLL_INTERVAL_ENV,
    TELEGRAM_TOKEN_ENV, TRELLO_KEY_ENV, TRELLO_TOKEN_ENV,
};
pub use error::{ConfigError, Result};
