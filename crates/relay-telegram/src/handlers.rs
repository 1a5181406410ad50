//! Command handlers for the relay bot.
//!
//! Each command builds its reply in a `*_reply` function that only
//! touches relay state; the teloxide handlers send the result.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use relay_channels::ChannelError;
use relay_models::{BoardId, EventTypeFilter};
use relay_trello::TrelloError;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use tracing::{error, info, warn};

use crate::channel::channel_id_of;
use crate::state::RelayState;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Watch a board in this chat: /subscribe <boardId or board URL>")]
    Subscribe(String),

    #[command(description = "Stop watching the board bound to this chat")]
    Unsubscribe,

    #[command(description = "Show the board watched by this chat")]
    Status,

    #[command(description = "List every watched board")]
    Boards,
}

const NOT_ALLOWED: &str = "⛔ You are not allowed to manage board subscriptions.";
const NOT_WATCHING: &str = "Not watching any board";

/// What a command answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// HTML text for the chat.
    Text(String),
    /// The caller may not run the command.
    NotAllowed,
}

impl Reply {
    /// The HTML sent to the chat.
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(text) => text,
            Reply::NotAllowed => NOT_ALLOWED,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Text(text) => text,
            Reply::NotAllowed => NOT_ALLOWED.to_string(),
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

fn board_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:www\.)?trello\.com/b/([A-Za-z0-9]+)(?:/.*)?$")
            .expect("Invalid regex pattern")
    })
}

fn board_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("Invalid regex pattern"))
}

/// Extracts a board id or short link from a command argument.
///
/// Accepts a bare id (`5f1a...`, `AbCd1234`) or a board URL
/// (`https://trello.com/b/AbCd1234/roadmap`).
pub fn parse_board_ref(arg: &str) -> Option<BoardId> {
    let arg = arg.split_whitespace().next()?;
    if let Some(caps) = board_url_pattern().captures(arg) {
        return caps.get(1).map(|m| BoardId::from(m.as_str()));
    }
    board_id_pattern()
        .is_match(arg)
        .then(|| BoardId::from(arg))
}

/// Reply for /subscribe.
pub async fn subscribe_reply(
    state: &RelayState,
    chat_id: ChatId,
    user_id: Option<u64>,
    arg: &str,
) -> Reply {
    if !state.can_manage(user_id) {
        return Reply::NotAllowed;
    }

    let Some(board_ref) = parse_board_ref(arg) else {
        return "Please provide a board.\n\n<b>Usage:</b> <code>/subscribe &lt;boardId&gt;</code>"
            .into();
    };

    let board = match state.trello().get_board(&board_ref).await {
        Ok(board) => board,
        Err(TrelloError::NotFound { .. }) | Err(TrelloError::Status { status: 400, .. }) => {
            return format!("Could not find board {}", escape(board_ref.as_str())).into();
        }
        Err(e) => {
            error!(board = %board_ref, error = %e, "board lookup failed");
            return format!(
                "Failed to watch board events, see log for more detail. (boardId: {})",
                escape(board_ref.as_str())
            )
            .into();
        }
    };

    if state.manager().is_watching(&board.id).await {
        return format!("Already watching board {}", escape(board.id.as_str())).into();
    }

    let channel_id = channel_id_of(chat_id);
    let text = match state
        .manager()
        .bind(
            channel_id,
            board.id.clone(),
            EventTypeFilter::default_card_events(),
            None,
        )
        .await
    {
        Ok(_) => {
            info!(chat_id = %chat_id, board_id = %board.id, "chat subscribed to board");
            format!(
                "Start watching board <b>{}</b> on this channel",
                escape(&board.name)
            )
        }
        Err(ChannelError::AlreadyBound { board_id, .. }) => format!(
            "This chat already watches board {}. Use /unsubscribe first.",
            escape(board_id.as_str())
        ),
        Err(ChannelError::BoardAlreadyWatched { board_id, .. }) => {
            format!("Already watching board {}", escape(board_id.as_str()))
        }
        Err(e) => {
            error!(chat_id = %chat_id, board_id = %board.id, error = %e, "bind failed");
            format!(
                "Failed to watch board events, see log for more detail. (boardId: {})",
                escape(board.id.as_str())
            )
        }
    };
    Reply::Text(text)
}

/// Reply for /unsubscribe.
pub async fn unsubscribe_reply(state: &RelayState, chat_id: ChatId, user_id: Option<u64>) -> Reply {
    if !state.can_manage(user_id) {
        return Reply::NotAllowed;
    }

    match state.manager().unbind(&channel_id_of(chat_id)).await {
        Some(board_id) => {
            info!(chat_id = %chat_id, board_id = %board_id, "chat unsubscribed");
            "OK!".into()
        }
        None => NOT_WATCHING.into(),
    }
}

/// Reply for /status.
pub async fn status_reply(state: &RelayState, chat_id: ChatId) -> String {
    let Some(board_id) = state.manager().board_for(&channel_id_of(chat_id)).await else {
        return NOT_WATCHING.to_string();
    };
    let Some(sub) = state.hub().lookup(&board_id).await else {
        return NOT_WATCHING.to_string();
    };

    let events = if sub.event_types.is_empty() {
        "all".to_string()
    } else {
        sub.event_types
            .iter()
            .map(|t| t.as_str().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let cursor = sub
        .cursor
        .map(|c| format!("<code>{}</code>", escape(c.as_str())))
        .unwrap_or_else(|| "none yet".to_string());

    format!(
        "<b>Watching board</b> <code>{}</code>\n\
        Events: {}\n\
        Last action: {}",
        escape(board_id.as_str()),
        escape(&events),
        cursor
    )
}

/// Reply for /boards.
///
/// Only a configured admin sees every chat's binding; anyone else sees the
/// calling chat's own.
pub async fn boards_reply(state: &RelayState, chat_id: ChatId, user_id: Option<u64>) -> Reply {
    let sees_all = user_id.is_some_and(|id| state.config().admin_users.contains(&id));

    let mut bindings = state.manager().bindings().await;
    if !sees_all {
        let own = channel_id_of(chat_id);
        bindings.retain(|(channel_id, _)| *channel_id == own);
    }
    if bindings.is_empty() {
        return "No boards are being watched.".into();
    }

    let mut out = format!("<b>Watched boards ({}):</b>\n", bindings.len());
    for (channel_id, board_id) in bindings {
        out.push_str(&format!(
            "• <code>{}</code> → chat <code>{}</code>\n",
            escape(board_id.as_str()),
            escape(channel_id.as_str())
        ));
    }
    Reply::Text(out)
}

fn user_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

async fn reply_html(bot: &Bot, msg: &Message, text: String) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message, state: Arc<RelayState>) -> ResponseResult<()> {
    let watching = state.manager().board_for(&channel_id_of(msg.chat.id)).await;
    let welcome = format!(
        "Welcome to Board Relay! 📋\n\n\
        I post Trello board activity to this chat.\n\n\
        <b>Getting Started:</b>\n\
        1. Use /subscribe &lt;board&gt; to watch a board\n\
        2. Card activity shows up here as it happens\n\
        3. Use /unsubscribe to stop\n\n\
        <b>This chat:</b> {}\n\n\
        Type /help for all commands.",
        match watching {
            Some(board) => format!("watching <code>{}</code>", escape(board.as_str())),
            None => "not watching a board".to_string(),
        }
    );

    reply_html(&bot, &msg, welcome).await?;
    info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

/// Dispatch a parsed command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<RelayState>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let user = user_id(&msg);
    let reply = match cmd {
        Command::Start => return handle_start(bot, msg, state).await,
        Command::Help => return handle_help(bot, msg).await,
        Command::Subscribe(arg) => subscribe_reply(&state, chat_id, user, &arg).await,
        Command::Unsubscribe => unsubscribe_reply(&state, chat_id, user).await,
        Command::Status => Reply::Text(status_reply(&state, chat_id).await),
        Command::Boards => boards_reply(&state, chat_id, user).await,
    };

    if reply == Reply::NotAllowed {
        warn!(chat_id = %chat_id, user = ?user, "command refused: not an admin");
    }
    reply_html(&bot, &msg, reply.into_text()).await
}
