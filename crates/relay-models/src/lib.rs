//! Core data models for board-relay.
//!
//! Shared between the event hub, the channel manager, the remote board
//! client and the chat surface:
//! - typed identifiers ([`BoardId`], [`ActionId`], [`ChannelId`], [`CardId`])
//! - board [`Action`]s and the [`ActionType`] vocabulary
//! - the [`EventTypeFilter`] attached to each subscription
//! - persisted [`ChannelBinding`]s

pub mod action;
pub mod binding;
pub mod filter;
pub mod ids;

pub use action::{Action, ActionData, ActionMember, ActionType, BoardRef, CardRef, ListRef, MemberRef};
pub use binding::ChannelBinding;
pub use filter::EventTypeFilter;
pub use ids::{ActionId, BoardId, CardId, ChannelId};
