//! Poll loop driving the hub.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::error::{self, HubError};
use crate::hub::EventHub;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Boards whose actions were fetched (or attempted).
    pub boards_polled: usize,
    /// Boards whose fetch failed.
    pub fetch_failures: usize,
    /// Actions handed to a handler, failed or not.
    pub dispatched: usize,
    /// Fetched actions that were old or filtered out.
    pub skipped: usize,
    /// Handler invocations that returned an error.
    pub handler_failures: usize,
    /// The cycle stopped early because shutdown was requested.
    pub interrupted: bool,
}

/// Runs one cycle over a snapshot of the hub's subscriptions.
///
/// With a shutdown receiver, no new board is started once shutdown is
/// requested and a pending fetch is abandoned. A board already dispatching
/// finishes.
pub(crate) async fn run_cycle(
    hub: &EventHub,
    shutdown: Option<&watch::Receiver<bool>>,
) -> CycleReport {
    let mut report = CycleReport::default();

    for target in hub.snapshot_targets().await {
        if shutdown.is_some_and(|rx| *rx.borrow()) {
            report.interrupted = true;
        }
        if report.interrupted {
            break;
        }
        hub.poll_board(&target, shutdown, &mut report).await;
    }

    report
}

/// Resolves once shutdown is requested or the sender is gone.
pub(crate) async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Handle to a poll loop started with [`EventHub::spawn`].
#[derive(Debug)]
pub struct PollHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub(crate) fn new(shutdown_tx: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self { shutdown_tx, task }
    }

    /// A receiver that turns true when the loop is told to stop.
    ///
    /// Lets sibling tasks (periodic saves) stop with the hub.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Stops the loop and waits for it to finish.
    ///
    /// A fetch in flight is abandoned; a board already dispatching finishes.
    pub async fn stop(self) -> error::Result<()> {
        self.shutdown_tx.send_replace(true);
        self.task
            .await
            .map_err(|e| HubError::PollTask(e.to_string()))?;
        info!("hub poll loop stopped");
        Ok(())
    }
}

/// Polls every subscribed board on the hub's interval.
pub struct HubPoller {
    /// The hub to poll.
    hub: Arc<EventHub>,
    /// Shutdown signal receiver.
    shutdown: watch::Receiver<bool>,
}

impl HubPoller {
    /// Creates a new hub poller.
    pub fn new(hub: Arc<EventHub>, shutdown: watch::Receiver<bool>) -> Self {
        Self { hub, shutdown }
    }

    /// Run the polling loop until shutdown signal.
    ///
    /// The first cycle runs immediately.
    pub async fn run(&mut self) {
        let poll_interval = self.hub.config().poll_interval;
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            poll_interval_ms = poll_interval.as_millis(),
            "starting hub poller"
        );

        loop {
            if *self.shutdown.borrow() {
                debug!("poller received shutdown signal");
                break;
            }

            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        debug!("poller received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let report = run_cycle(&self.hub, Some(&self.shutdown)).await;
                    trace!(
                        boards = report.boards_polled,
                        dispatched = report.dispatched,
                        fetch_failures = report.fetch_failures,
                        handler_failures = report.handler_failures,
                        "poll cycle finished"
                    );
                }
            }
        }

        debug!("hub poller stopped");
    }
}
