//! Main relay bot: wires the hub, channel manager and Telegram dispatcher.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use relay_channels::ChannelManager;
use relay_core::AppConfig;
use relay_hub::{EventHub, HubConfig, PollHandle};
use relay_persistence::ChannelStore;
use relay_trello::TrelloClient;
use teloxide::dispatching::{ShutdownToken, UpdateFilterExt};
use teloxide::prelude::*;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::channel::TelegramHandlerFactory;
use crate::error::{Result, TelegramError};
use crate::handlers::{handle_command, Command};
use crate::state::{create_shared_state, RelayState};

/// The Telegram front end of board-relay.
pub struct RelayBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers.
    state: Arc<RelayState>,
    /// The hub polled while the bot runs.
    hub: Arc<EventHub>,
}

impl RelayBot {
    /// Build the bot from validated configuration.
    ///
    /// `config_path` is the file channel bindings are saved to.
    pub fn new(config: AppConfig, config_path: &Path) -> Result<Self> {
        config.validate()?;

        let bot = Bot::new(config.telegram_token.clone());
        let trello = TrelloClient::new(config.trello_api_key.clone(), config.trello_token.clone())?
            .with_base_url(config.trello_api_url.clone())
            .with_action_limit(config.action_limit);

        let hub_config = HubConfig::new().with_poll_interval(config.poll_interval());
        let hub = Arc::new(EventHub::new(hub_config, Arc::new(trello.clone())));
        let factory = Arc::new(TelegramHandlerFactory::new(bot.clone(), trello.clone()));
        let manager = Arc::new(ChannelManager::new(Arc::clone(&hub), factory));

        let store = ChannelStore::new(config_path);
        let state = create_shared_state(config, manager, trello, store);

        Ok(Self { bot, state, hub })
    }

    pub fn state(&self) -> &Arc<RelayState> {
        &self.state
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Run until Ctrl-C or SIGTERM: restore bindings, poll boards, answer
    /// commands, then stop polling and save bindings.
    pub async fn run(self) -> Result<()> {
        let restored = self.state.restore_bindings().await?;
        info!(restored, "restored channel bindings");

        let poller: PollHandle = self.hub.spawn();

        let saver = self.state.config().save_interval().map(|every| {
            spawn_periodic_save(Arc::clone(&self.state), every, poller.shutdown_signal())
        });

        info!("Bot is running! Send /start to begin.");
        self.dispatch().await;

        info!("Stopping board relay...");
        poller.stop().await?;
        if let Some(handle) = saver {
            if let Err(e) = handle.await {
                warn!(error = %e, "periodic save task failed");
            }
        }

        self.state.save_bindings().await?;
        info!("Board relay stopped");
        Ok(())
    }

    async fn dispatch(&self) {
        let state_for_commands = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        debug!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.text().is_some_and(|t| t.starts_with('/')))
                    .endpoint(|bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            let name = text.split_whitespace().next().unwrap_or(text);
                            bot.send_message(
                                msg.chat.id,
                                format!("Unknown command: {}\n\nUse /help to see available commands.", name),
                            )
                            .await?;
                        }
                        Ok(())
                    }),
            );

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd.id);
            })
            .enable_ctrlc_handler()
            .build();

        let terminate = on_terminate(dispatcher.shutdown_token());
        dispatcher.dispatch().await;
        if let Some(listener) = terminate {
            listener.abort();
        }
    }
}

/// Stops the dispatcher on SIGTERM, the way Ctrl-C already does.
fn on_terminate(token: ShutdownToken) -> Option<JoinHandle<()>> {
    spawn_terminate_listener(move || match token.shutdown() {
        Ok(_) => info!("SIGTERM received, stopping dispatcher"),
        Err(e) => warn!(error = ?e, "SIGTERM received while dispatcher idle"),
    })
}

/// Runs `on_signal` once the process receives SIGTERM.
///
/// The handler is installed before this returns. `None` if it could not be.
#[cfg(unix)]
pub(crate) fn spawn_terminate_listener<F>(on_signal: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            return None;
        }
    };

    Some(tokio::spawn(async move {
        if terminate.recv().await.is_some() {
            on_signal();
        }
    }))
}

#[cfg(not(unix))]
pub(crate) fn spawn_terminate_listener<F>(_on_signal: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    None
}

/// Saves bindings every `every` until `shutdown` turns true.
fn spawn_periodic_save(
    state: Arc<RelayState>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; nothing to save yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("periodic save stopped");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = state.save_bindings().await {
                        error!(error = %e, "periodic save failed");
                    }
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_sigterm_triggers_shutdown() {
        let (tx, rx) = oneshot::channel();
        let listener = spawn_terminate_listener(move || {
            let _ = tx.send(());
        })
        .expect("SIGTERM handler installed");

        let status = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(std::process::id().to_string())
            .status()
            .expect("run kill");
        assert!(status.success());

        let fired = tokio::time::timeout(Duration::from_secs(2), rx).await;
        assert!(matches!(fired, Ok(Ok(()))), "SIGTERM should reach the listener");
        listener.await.unwrap();
    }
}
