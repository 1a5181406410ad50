//! Persistence layer for board-relay.
//!
//! Channel bindings live in the `channels` key of the same JSON file as
//! the rest of the configuration. Writes are atomic (temp file, then
//! rename) and leave the other keys untouched.
//!
//! # Example
//!
//! ```no_run
//! use relay_models::{ChannelBinding, EventTypeFilter};
//! use relay_persistence::ChannelStore;
//!
//! let store = ChannelStore::new("/etc/board-relay/config.json");
//!
//! let mut channels = store.load_channels().unwrap();
//! channels.push(ChannelBinding::new("-1001234", "5f1a", EventTypeFilter::default_card_events()));
//! store.save_channels(&channels).unwrap();
//! ```

pub mod atomic;
pub mod channel_store;
pub mod error;

pub use channel_store::{ChannelStore, CHANNELS_KEY};
pub use error::{PersistenceError, Result};
