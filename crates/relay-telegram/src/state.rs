//! Shared state for the relay bot.

use std::sync::Arc;

use relay_channels::ChannelManager;
use relay_core::AppConfig;
use relay_hub::EventHub;
use relay_persistence::ChannelStore;
use relay_trello::TrelloClient;
use tracing::info;

use crate::error::Result;

/// State shared by command handlers and background tasks.
pub struct RelayState {
    config: AppConfig,
    manager: Arc<ChannelManager>,
    trello: TrelloClient,
    store: ChannelStore,
}

impl RelayState {
    pub fn new(
        config: AppConfig,
        manager: Arc<ChannelManager>,
        trello: TrelloClient,
        store: ChannelStore,
    ) -> Self {
        Self {
            config,
            manager,
            trello,
            store,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<ChannelManager> {
        &self.manager
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        self.manager.hub()
    }

    pub fn trello(&self) -> &TrelloClient {
        &self.trello
    }

    /// Whether the Telegram user may change subscriptions.
    pub fn can_manage(&self, user_id: Option<u64>) -> bool {
        match user_id {
            Some(id) => self.config.is_admin(id),
            None => self.config.admin_users.is_empty(),
        }
    }

    /// Loads persisted bindings and re-creates them on the hub.
    pub async fn restore_bindings(&self) -> Result<usize> {
        let saved = self.store.load_channels()?;
        let report = self.manager.restore(saved).await;
        Ok(report.restored)
    }

    /// Writes the current bindings and cursors to the config file.
    pub async fn save_bindings(&self) -> Result<usize> {
        let snapshot = self.manager.snapshot().await;
        self.store.save_channels(&snapshot)?;
        info!(count = snapshot.len(), "channel bindings saved");
        Ok(snapshot.len())
    }
}

/// Create shared state wrapped in Arc.
pub fn create_shared_state(
    config: AppConfig,
    manager: Arc<ChannelManager>,
    trello: TrelloClient,
    store: ChannelStore,
) -> Arc<RelayState> {
    Arc::new(RelayState::new(config, manager, trello, store))
}
