//! Builds per-channel action handlers.

use std::sync::Arc;

use relay_hub::ActionHandler;
use relay_models::ChannelId;

/// Creates the handler that delivers a board's actions to a channel.
///
/// Injected into the [`ChannelManager`](crate::ChannelManager) so the
/// manager stays independent of any chat service.
pub trait HandlerFactory: Send + Sync {
    fn handler_for(&self, channel_id: &ChannelId) -> Arc<dyn ActionHandler>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&ChannelId) -> Arc<dyn ActionHandler> + Send + Sync,
{
    fn handler_for(&self, channel_id: &ChannelId) -> Arc<dyn ActionHandler> {
        self(channel_id)
    }
}
