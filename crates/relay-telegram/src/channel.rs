//! Delivers board actions to a Telegram chat.

use std::sync::Arc;

use async_trait::async_trait;
use relay_channels::HandlerFactory;
use relay_hub::{ActionHandler, HandlerError, SubscriptionContext};
use relay_models::{Action, ChannelId};
use relay_trello::TrelloClient;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, error, warn};

use crate::render::{render_action, INTERNAL_ERROR_NOTICE};

/// Parses a channel id into a Telegram chat id.
pub fn chat_id_of(channel_id: &ChannelId) -> Option<ChatId> {
    channel_id.as_str().trim().parse().ok().map(ChatId)
}

/// Channel id for a Telegram chat.
pub fn channel_id_of(chat_id: ChatId) -> ChannelId {
    ChannelId::from(chat_id.0.to_string())
}

/// Handler posting one subscription's actions to one chat.
pub struct TelegramChannel {
    bot: Bot,
    trello: TrelloClient,
    channel_id: ChannelId,
    chat_id: Option<ChatId>,
}

impl TelegramChannel {
    pub fn new(bot: Bot, trello: TrelloClient, channel_id: ChannelId) -> Self {
        let chat_id = chat_id_of(&channel_id);
        Self {
            bot,
            trello,
            channel_id,
            chat_id,
        }
    }

    /// Renders the message, with the card block when the card can be fetched.
    ///
    /// Cards deleted or archived before the poll cannot be; the headline is
    /// still sent.
    async fn render(&self, action: &Action) -> String {
        let card_id = action
            .data
            .card
            .as_ref()
            .filter(|_| action.action_type.is_card_action())
            .map(|c| c.id.clone());

        let card = match card_id {
            Some(id) => match self.trello.get_card(&id).await {
                Ok(card) => Some(card),
                Err(e) => {
                    warn!(card_id = %id, action_id = %action.id, error = %e, "card details unavailable");
                    None
                }
            },
            None => None,
        };

        render_action(action, card.as_ref())
    }

    async fn send(&self, chat_id: ChatId, text: String) -> Result<(), HandlerError> {
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(|e| HandlerError::Delivery(e.to_string()))
    }
}

#[async_trait]
impl ActionHandler for TelegramChannel {
    async fn handle(&self, ctx: &SubscriptionContext, action: &Action) -> Result<(), HandlerError> {
        let Some(chat_id) = self.chat_id else {
            return Err(HandlerError::Delivery(format!(
                "not a Telegram chat id: {}",
                self.channel_id
            )));
        };

        let text = self.render(action).await;
        let result = self.send(chat_id, text).await;

        match &result {
            Ok(()) => debug!(
                chat_id = %chat_id,
                board_id = %ctx.board_id,
                action_id = %action.id,
                "action delivered"
            ),
            Err(e) => {
                error!(
                    chat_id = %chat_id,
                    board_id = %ctx.board_id,
                    action_id = %action.id,
                    error = %e,
                    "could not process board event"
                );
                if let Err(notice_err) = self.bot.send_message(chat_id, INTERNAL_ERROR_NOTICE).await {
                    debug!(chat_id = %chat_id, error = %notice_err, "error notice not sent");
                }
            }
        }

        result
    }
}

/// Builds a [`TelegramChannel`] for each bound chat.
#[derive(Clone)]
pub struct TelegramHandlerFactory {
    bot: Bot,
    trello: TrelloClient,
}

impl TelegramHandlerFactory {
    pub fn new(bot: Bot, trello: TrelloClient) -> Self {
        Self { bot, trello }
    }
}

impl HandlerFactory for TelegramHandlerFactory {
    fn handler_for(&self, channel_id: &ChannelId) -> Arc<dyn ActionHandler> {
        Arc::new(TelegramChannel::new(
            self.bot.clone(),
            self.trello.clone(),
            channel_id.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_models::{ActionData, CardRef};

    #[test]
    fn test_chat_id_round_trip() {
        let channel = channel_id_of(ChatId(-1001234567890));
        assert_eq!(channel.as_str(), "-1001234567890");
        assert_eq!(chat_id_of(&channel), Some(ChatId(-1001234567890)));
    }

    #[test]
    fn test_chat_id_rejects_non_numeric() {
        assert_eq!(chat_id_of(&ChannelId::from("general")), None);
    }

    #[tokio::test]
    async fn test_render_falls_back_when_card_unavailable() {
        // A port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let trello = TrelloClient::new("key", "token")
            .unwrap()
            .with_base_url(format!("http://127.0.0.1:{}/1", port));
        let channel = TelegramChannel::new(Bot::new("123:abc"), trello, ChannelId::from("-100"));

        let action = Action::new("a1", "createCard").with_data(ActionData {
            card: Some(CardRef {
                id: "c1".into(),
                name: "Old card".into(),
                id_short: Some(12),
                short_link: None,
            }),
            ..ActionData::default()
        });

        let message = channel.render(&action).await;

        assert_eq!(message, render_action(&action, None));
        assert_eq!(message, "Someone created <b>Old card</b> in a list");
    }
}
