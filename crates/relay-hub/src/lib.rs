//! Board event hub for board-relay.
//!
//! The hub watches remote boards and relays their new actions, oldest
//! first and at most once, to a handler registered per board:
//! - `EventHub` - subscription registry and per-board dispatch
//! - `HubPoller` - interval loop running one poll cycle per tick
//! - `PollHandle` - stops a poll loop started with `EventHub::spawn`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use relay_hub::{EventHub, HubConfig};
//! use relay_models::{BoardId, EventTypeFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Arc::new(EventHub::new(HubConfig::default(), Arc::new(my_source)));
//!
//!     hub.subscribe(
//!         BoardId::from("5f1a..."),
//!         EventTypeFilter::default_card_events(),
//!         None,
//!         Arc::new(my_handler),
//!     )
//!     .await?;
//!
//!     let poller = hub.spawn();
//!
//!     tokio::signal::ctrl_c().await?;
//!     poller.stop().await?;
//!
//!     // Persist hub.subscriptions() here.
//!     Ok(())
//! }
//! ```
//!
//! # Poll cycle
//!
//! Each cycle snapshots the registry, then for every board:
//! - fetches recent actions (newest first) from the [`ActionSource`]
//! - walks them oldest first, keeping actions strictly newer than the
//!   cursor whose type passes the subscription's filter
//! - awaits the handler for each kept action and advances the cursor
//!
//! A failed fetch skips the board for this cycle and leaves its cursor
//! alone. A fetch pending at shutdown is abandoned the same way. A failed handler is reported and the cursor still advances.

pub mod config;
pub mod error;
pub mod hub;
pub mod poller;
pub mod subscription;

pub use config::HubConfig;
pub use error::{FetchError, HandlerError, HubError, Result};
pub use hub::{select_new_actions, EventHub};
pub use poller::{CycleReport, HubPoller, PollHandle};
pub use subscription::{ActionHandler, ActionSource, Subscription, SubscriptionContext};
