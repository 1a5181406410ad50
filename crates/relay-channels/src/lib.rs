//! Channel bindings for board-relay.
//!
//! A [`ChannelManager`] sits on top of the [`EventHub`](relay_hub::EventHub)
//! and keeps a one-to-one map between chat channels and watched boards.
//! The handler for each channel comes from an injected [`HandlerFactory`].

pub mod error;
pub mod factory;
pub mod manager;

pub use error::{ChannelError, Result};
pub use factory::HandlerFactory;
pub use manager::{ChannelManager, RestoreReport, SkippedBinding};
