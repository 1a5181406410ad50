//! The event hub: subscription registry and per-board dispatch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, trace, warn};

use relay_models::{Action, ActionId, BoardId, EventTypeFilter};

use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::poller::{self, CycleReport, HubPoller, PollHandle};
use crate::subscription::{ActionHandler, ActionSource, Subscription, SubscriptionContext};

/// Registry entry for one watched board.
struct Entry {
    event_types: EventTypeFilter,
    cursor: Option<ActionId>,
    handler: Arc<dyn ActionHandler>,
    /// Distinguishes a re-subscription from the entry a cycle snapshotted.
    generation: u64,
}

impl Entry {
    fn snapshot(&self, board_id: &BoardId) -> Subscription {
        Subscription {
            board_id: board_id.clone(),
            event_types: self.event_types.clone(),
            cursor: self.cursor.clone(),
        }
    }
}

#[derive(Default)]
struct Registry {
    entries: HashMap<BoardId, Entry>,
    next_generation: u64,
}

/// Everything a cycle needs to poll one board, copied out of the registry.
pub(crate) struct PollTarget {
    pub(crate) board_id: BoardId,
    pub(crate) event_types: EventTypeFilter,
    pub(crate) cursor: Option<ActionId>,
    pub(crate) handler: Arc<dyn ActionHandler>,
    pub(crate) generation: u64,
}

/// Watches boards and dispatches their new actions to per-board handlers.
///
/// The registry is the only shared mutable state and sits behind a single
/// mutex. The lock is never held across a fetch or a handler call.
pub struct EventHub {
    /// Configuration.
    config: HubConfig,
    /// Remote board service.
    source: Arc<dyn ActionSource>,
    /// Subscriptions keyed by board ID.
    registry: Mutex<Registry>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EventHub {
    /// Creates a hub polling the given source.
    pub fn new(config: HubConfig, source: Arc<dyn ActionSource>) -> Self {
        Self {
            config,
            source,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Registers a watch on a board.
    ///
    /// Fails with [`HubError::AlreadySubscribed`] (carrying the existing
    /// subscription) without touching the registry if the board is watched.
    pub async fn subscribe(
        &self,
        board_id: BoardId,
        event_types: EventTypeFilter,
        cursor: Option<ActionId>,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<Subscription> {
        let subscription = {
            let mut registry = self.registry.lock().await;

            if let Some(existing) = registry.entries.get(&board_id) {
                return Err(HubError::AlreadySubscribed {
                    existing: existing.snapshot(&board_id),
                });
            }

            registry.next_generation += 1;
            let entry = Entry {
                event_types,
                cursor,
                handler,
                generation: registry.next_generation,
            };
            let subscription = entry.snapshot(&board_id);
            registry.entries.insert(board_id.clone(), entry);
            subscription
        };

        info!(
            board_id = %board_id,
            cursor = ?subscription.cursor,
            "subscribed to board"
        );

        Ok(subscription)
    }

    /// Removes a board's subscription. Absent boards are a no-op.
    pub async fn unsubscribe(&self, board_id: &BoardId) -> Option<Subscription> {
        let removed = {
            let mut registry = self.registry.lock().await;
            registry
                .entries
                .remove(board_id)
                .map(|entry| entry.snapshot(board_id))
        };

        match &removed {
            Some(_) => info!(board_id = %board_id, "unsubscribed from board"),
            None => debug!(board_id = %board_id, "unsubscribe for unknown board ignored"),
        }

        removed
    }

    /// Returns the board's subscription, if any.
    pub async fn lookup(&self, board_id: &BoardId) -> Option<Subscription> {
        let registry = self.registry.lock().await;
        registry
            .entries
            .get(board_id)
            .map(|entry| entry.snapshot(board_id))
    }

    /// Returns snapshots of all subscriptions, sorted by board ID.
    pub async fn subscriptions(&self) -> Vec<Subscription> {
        let mut subs: Vec<Subscription> = {
            let registry = self.registry.lock().await;
            registry
                .entries
                .iter()
                .map(|(board_id, entry)| entry.snapshot(board_id))
                .collect()
        };
        subs.sort_by(|a, b| a.board_id.cmp(&b.board_id));
        subs
    }

    /// Number of watched boards.
    pub async fn len(&self) -> usize {
        self.registry.lock().await.entries.len()
    }

    /// Returns true if no board is watched.
    pub async fn is_empty(&self) -> bool {
        self.registry.lock().await.entries.is_empty()
    }

    /// Runs one poll cycle over all current subscriptions.
    pub async fn poll_cycle(&self) -> CycleReport {
        poller::run_cycle(self, None).await
    }

    /// Polls on the configured interval until `shutdown` turns true or its
    /// sender is dropped.
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        let mut poller = HubPoller::new(self, shutdown);
        poller.run().await;
    }

    /// Starts [`EventHub::run`] on a background task.
    ///
    /// Stop it with [`PollHandle::stop`]. Dropping the handle also ends the
    /// loop, without waiting for it.
    pub fn spawn(self: &Arc<Self>) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(self).run(shutdown_rx));
        info!("hub poll loop started");
        PollHandle::new(shutdown_tx, task)
    }

    /// Copies the poll targets out of the registry.
    pub(crate) async fn snapshot_targets(&self) -> Vec<PollTarget> {
        let registry = self.registry.lock().await;
        registry
            .entries
            .iter()
            .map(|(board_id, entry)| PollTarget {
                board_id: board_id.clone(),
                event_types: entry.event_types.clone(),
                cursor: entry.cursor.clone(),
                handler: Arc::clone(&entry.handler),
                generation: entry.generation,
            })
            .collect()
    }

    /// Fetches and dispatches one board's new actions.
    ///
    /// With a shutdown receiver, a fetch still in flight when shutdown is
    /// requested is dropped and nothing is dispatched. Dispatch itself is
    /// never interrupted.
    pub(crate) async fn poll_board(
        &self,
        target: &PollTarget,
        shutdown: Option<&watch::Receiver<bool>>,
        report: &mut CycleReport,
    ) {
        trace!(board_id = %target.board_id, cursor = ?target.cursor, "polling board");
        report.boards_polled += 1;

        let fetch = self
            .source
            .fetch_board_actions(&target.board_id, &target.event_types);
        let fetched = match shutdown {
            Some(rx) => {
                let mut rx = rx.clone();
                tokio::select! {
                    biased;

                    _ = poller::wait_for_shutdown(&mut rx) => {
                        debug!(board_id = %target.board_id, "fetch abandoned on shutdown");
                        report.interrupted = true;
                        return;
                    }
                    result = fetch => result,
                }
            }
            None => fetch.await,
        };

        let actions = match fetched {
            Ok(actions) => actions,
            Err(e) => {
                warn!(
                    board_id = %target.board_id,
                    error = %e,
                    "could not fetch board actions"
                );
                report.fetch_failures += 1;
                return;
            }
        };

        let fetched = actions.len();
        let pending = select_new_actions(actions, target.cursor.as_ref(), &target.event_types);
        report.skipped += fetched - pending.len();

        let mut cursor = target.cursor.clone();
        for action in pending {
            if !self.is_current(&target.board_id, target.generation).await {
                debug!(board_id = %target.board_id, "board unsubscribed mid-cycle");
                break;
            }

            let ctx = SubscriptionContext {
                board_id: target.board_id.clone(),
                event_types: target.event_types.clone(),
                cursor: cursor.clone(),
            };

            if let Err(e) = target.handler.handle(&ctx, &action).await {
                warn!(
                    board_id = %target.board_id,
                    action_id = %action.id,
                    error = %e,
                    "handler failed, action marked as seen"
                );
                report.handler_failures += 1;
            }

            report.dispatched += 1;

            if !self
                .advance_cursor(&target.board_id, target.generation, &action.id)
                .await
            {
                debug!(board_id = %target.board_id, "board unsubscribed mid-cycle");
                break;
            }
            cursor = Some(action.id);
        }
    }

    /// Returns true if the snapshotted entry is still the registered one.
    async fn is_current(&self, board_id: &BoardId, generation: u64) -> bool {
        let registry = self.registry.lock().await;
        registry
            .entries
            .get(board_id)
            .is_some_and(|entry| entry.generation == generation)
    }

    /// Moves the board's cursor forward to `action_id`.
    ///
    /// Returns false if the entry is gone or was replaced since the cycle
    /// snapshotted it.
    async fn advance_cursor(&self, board_id: &BoardId, generation: u64, action_id: &ActionId) -> bool {
        let mut registry = self.registry.lock().await;
        match registry.entries.get_mut(board_id) {
            Some(entry) if entry.generation == generation => {
                if entry.cursor.as_ref().map_or(true, |c| action_id > c) {
                    entry.cursor = Some(action_id.clone());
                }
                true
            }
            _ => false,
        }
    }
}

/// Picks the actions to dispatch from a newest-first batch.
///
/// Returns them oldest first, keeping only those strictly newer than the
/// running cursor and allowed by the filter. The running cursor moves only
/// on kept actions, so the result is strictly increasing.
pub fn select_new_actions(
    newest_first: Vec<Action>,
    cursor: Option<&ActionId>,
    filter: &EventTypeFilter,
) -> Vec<Action> {
    let mut running = cursor.cloned();
    let mut selected = Vec::new();

    for action in newest_first.into_iter().rev() {
        let is_new = running.as_ref().map_or(true, |c| action.id > *c);
        if !is_new || !filter.allows(&action.action_type) {
            continue;
        }
        running = Some(action.id.clone());
        selected.push(action);
    }

    selected
}
