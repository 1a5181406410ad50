//! Trello client for board-relay.
//!
//! [`TrelloClient`] wraps the few REST endpoints the relay needs and
//! implements the hub's [`ActionSource`](relay_hub::ActionSource), so it
//! can be handed straight to an [`EventHub`](relay_hub::EventHub).

pub mod client;
pub mod error;
pub mod types;

pub use client::{TrelloClient, DEFAULT_ACTION_LIMIT, DEFAULT_API_URL};
pub use error::{Result, TrelloError};
pub use types::{Board, Card, CheckItem, Checklist, Label, Member};
