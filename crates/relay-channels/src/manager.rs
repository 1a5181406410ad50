//! ChannelManager - maps chat channels to the boards they watch.

use std::collections::HashMap;
use std::sync::Arc;

use relay_hub::{EventHub, HubError, Subscription};
use relay_models::{ActionId, BoardId, ChannelBinding, ChannelId, EventTypeFilter};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{ChannelError, Result};
use crate::factory::HandlerFactory;

/// A persisted binding that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBinding {
    pub binding: ChannelBinding,
    pub reason: String,
}

/// Outcome of [`ChannelManager::restore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: Vec<SkippedBinding>,
}

/// Binds each chat channel to at most one board, and each board to at most
/// one channel.
///
/// Every operation that changes bindings holds one async lock across the
/// hub call, so the local map and the hub's registry never disagree.
pub struct ChannelManager {
    hub: Arc<EventHub>,
    factory: Arc<dyn HandlerFactory>,
    bindings: Mutex<HashMap<ChannelId, BoardId>>,
}

impl ChannelManager {
    pub fn new(hub: Arc<EventHub>, factory: Arc<dyn HandlerFactory>) -> Self {
        Self {
            hub,
            factory,
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// The hub this manager subscribes on.
    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Starts delivering a board's actions to a channel.
    pub async fn bind(
        &self,
        channel_id: ChannelId,
        board_id: BoardId,
        event_types: EventTypeFilter,
        cursor: Option<ActionId>,
    ) -> Result<Subscription> {
        if channel_id.is_blank() || board_id.is_blank() {
            return Err(ChannelError::InvalidBinding(
                "channel and board ids must not be empty".to_string(),
            ));
        }

        let mut bindings = self.bindings.lock().await;

        if let Some(existing) = bindings.get(&channel_id) {
            return Err(ChannelError::AlreadyBound {
                channel_id,
                board_id: existing.clone(),
            });
        }
        if self.hub.lookup(&board_id).await.is_some() {
            return Err(ChannelError::BoardAlreadyWatched {
                channel_id: owner_of(&bindings, &board_id),
                board_id,
            });
        }

        let subscription = self.subscribe(&channel_id, &board_id, event_types, cursor).await?;
        bindings.insert(channel_id.clone(), board_id.clone());

        info!(channel_id = %channel_id, board_id = %board_id, "channel bound to board");
        Ok(subscription)
    }

    /// Stops delivery to a channel. Returns the board it watched, if any.
    pub async fn unbind(&self, channel_id: &ChannelId) -> Option<BoardId> {
        let mut bindings = self.bindings.lock().await;
        let board_id = bindings.remove(channel_id)?;
        self.hub.unsubscribe(&board_id).await;

        info!(channel_id = %channel_id, board_id = %board_id, "channel unbound");
        Some(board_id)
    }

    /// The board a channel watches.
    pub async fn board_for(&self, channel_id: &ChannelId) -> Option<BoardId> {
        self.bindings.lock().await.get(channel_id).cloned()
    }

    /// The channel watching a board.
    pub async fn find_channel_by_board(&self, board_id: &BoardId) -> Option<ChannelId> {
        owner_of(&*self.bindings.lock().await, board_id)
    }

    /// Whether any subscription on the hub watches the board.
    pub async fn is_watching(&self, board_id: &BoardId) -> bool {
        self.hub.lookup(board_id).await.is_some()
    }

    /// Current channel → board pairs, sorted by channel.
    pub async fn bindings(&self) -> Vec<(ChannelId, BoardId)> {
        let mut pairs: Vec<_> = self
            .bindings
            .lock()
            .await
            .iter()
            .map(|(c, b)| (c.clone(), b.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Re-creates persisted bindings at startup.
    ///
    /// Blank entries and boards already watched by another channel are
    /// skipped. A later entry for the same channel replaces the earlier one.
    pub async fn restore(&self, saved: Vec<ChannelBinding>) -> RestoreReport {
        let mut report = RestoreReport::default();
        let mut bindings = self.bindings.lock().await;

        for binding in saved {
            if let Err(reason) = binding.validate() {
                warn!(reason = %reason, "skipping invalid channel binding");
                report.skipped.push(SkippedBinding { binding, reason });
                continue;
            }

            let owner = owner_of(&bindings, &binding.board_id);
            let watched = self.hub.lookup(&binding.board_id).await.is_some();
            if watched && owner.as_ref() != Some(&binding.channel_id) {
                let reason = match owner {
                    Some(other) => format!("board already watched by channel {}", other),
                    None => "board already watched".to_string(),
                };
                warn!(
                    channel_id = %binding.channel_id,
                    board_id = %binding.board_id,
                    reason = %reason,
                    "skipping duplicate board binding"
                );
                report.skipped.push(SkippedBinding { binding, reason });
                continue;
            }

            if let Some(previous) = bindings.remove(&binding.channel_id) {
                warn!(
                    channel_id = %binding.channel_id,
                    previous = %previous,
                    board_id = %binding.board_id,
                    "duplicate channel binding replaces earlier one"
                );
                self.hub.unsubscribe(&previous).await;
            }

            match self
                .subscribe(
                    &binding.channel_id,
                    &binding.board_id,
                    binding.enabled_events.clone(),
                    binding.last_action_id.clone(),
                )
                .await
            {
                Ok(_) => {
                    bindings.insert(binding.channel_id.clone(), binding.board_id.clone());
                    report.restored += 1;
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(board_id = %binding.board_id, error = %reason, "failed to restore binding");
                    report.skipped.push(SkippedBinding { binding, reason });
                }
            }
        }

        info!(
            restored = report.restored,
            skipped = report.skipped.len(),
            "channel bindings restored"
        );
        report
    }

    /// Bindings with each board's current cursor and filter, sorted by
    /// channel. This is what gets persisted.
    pub async fn snapshot(&self) -> Vec<ChannelBinding> {
        let bindings = self.bindings.lock().await;
        let mut out = Vec::with_capacity(bindings.len());

        for (channel_id, board_id) in bindings.iter() {
            match self.hub.lookup(board_id).await {
                Some(sub) => out.push(ChannelBinding {
                    channel_id: channel_id.clone(),
                    board_id: board_id.clone(),
                    enabled_events: sub.event_types,
                    last_action_id: sub.cursor,
                }),
                None => warn!(
                    channel_id = %channel_id,
                    board_id = %board_id,
                    "bound board has no hub subscription"
                ),
            }
        }

        out.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        out
    }

    async fn subscribe(
        &self,
        channel_id: &ChannelId,
        board_id: &BoardId,
        event_types: EventTypeFilter,
        cursor: Option<ActionId>,
    ) -> Result<Subscription> {
        let handler = self.factory.handler_for(channel_id);
        self.hub
            .subscribe(board_id.clone(), event_types, cursor, handler)
            .await
            .map_err(|e| match e {
                HubError::AlreadySubscribed { existing } => ChannelError::BoardAlreadyWatched {
                    board_id: existing.board_id,
                    channel_id: None,
                },
                other => ChannelError::Hub(other),
            })
    }
}

fn owner_of(bindings: &HashMap<ChannelId, BoardId>, board_id: &BoardId) -> Option<ChannelId> {
    bindings
        .iter()
        .find(|(_, b)| *b == board_id)
        .map(|(c, _)| c.clone())
}
