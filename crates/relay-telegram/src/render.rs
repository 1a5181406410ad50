//! Formats board actions as Telegram HTML messages.
//!
//! Everything here is pure: callers fetch the card (when there is one)
//! and send the resulting string with `ParseMode::Html`.

use relay_models::{Action, ActionType};
use relay_trello::{Card, Checklist};
use teloxide::utils::html::escape;

/// Sent to a chat when an action could not be delivered.
pub const INTERNAL_ERROR_NOTICE: &str = "❌ Internal error occured, check log for more detail.";

/// Telegram rejects messages longer than this (in characters).
pub const MAX_MESSAGE_CHARS: usize = 4096;

const MAX_DESCRIPTION_CHARS: usize = 600;
const MAX_COMMENT_CHARS: usize = 600;
const MAX_CHECK_ITEMS: usize = 20;
const MAX_NAME_CHARS: usize = 200;

/// Marker used when a card has no coloured label.
const DEFAULT_MARKER: &str = "🔷";

/// Coloured marker for a Trello label colour.
pub fn label_marker(color: &str) -> &'static str {
    match color {
        "green" | "lime" => "🟢",
        "yellow" => "🟡",
        "orange" => "🟠",
        "red" => "🔴",
        "purple" | "pink" => "🟣",
        "blue" | "sky" => "🔵",
        "black" => "⚫",
        _ => DEFAULT_MARKER,
    }
}

/// Truncates to `max_chars` characters, ending with `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Shortens a user-supplied name, then escapes it.
fn name(text: &str) -> String {
    escape(&truncate(text, MAX_NAME_CHARS))
}

/// One-line summary of who did what.
pub fn headline(action: &Action) -> String {
    let actor = name(action.actor_name());
    let data = &action.data;
    let card = data
        .card
        .as_ref()
        .map(|c| format!("<b>{}</b>", name(&c.name)))
        .unwrap_or_else(|| "a card".to_string());
    let list = |l: Option<&relay_models::ListRef>| {
        l.map(|l| name(&l.name)).unwrap_or_else(|| "a list".to_string())
    };

    let mut line = match &action.action_type {
        ActionType::CreateCard => format!("{} created {} in {}", actor, card, list(data.list.as_ref())),
        ActionType::UpdateCard if data.is_list_move() => {
            format!("{} moved a card to {}", actor, list(data.list_after.as_ref()))
        }
        ActionType::UpdateCard => format!("{} updated {}", actor, card),
        ActionType::CommentCard => format!("{} commented on {}", actor, card),
        ActionType::DeleteCard => {
            let short = data.card.as_ref().and_then(|c| c.id_short);
            match short {
                Some(n) => format!("{} deleted card #{}", actor, n),
                None => format!("{} deleted a card", actor),
            }
        }
        ActionType::CopyCard => format!("{} copied {}", actor, card),
        ActionType::AddMemberToCard => {
            let member = data
                .member
                .as_ref()
                .map(|m| name(&m.name))
                .unwrap_or_else(|| "a member".to_string());
            format!("{} added {} to {}", actor, member, card)
        }
        other => format!("{} did <code>{}</code> on {}", actor, escape(other.as_str()), card),
    };

    if let Some(board) = &data.board {
        line.push_str(" - ");
        line.push_str(&name(&board.name));
    }
    line
}

/// Detailed card block: name, description, checklists, assignees, due date.
pub fn card_block(card: &Card) -> String {
    let marker = card
        .labels
        .iter()
        .find_map(|l| l.color.as_deref())
        .map(label_marker)
        .unwrap_or(DEFAULT_MARKER);

    let mut out = format!("{} 🪧 <b>{}</b>\n", marker, name(&card.name));

    if !card.desc.trim().is_empty() {
        out.push_str(&escape(&truncate(card.desc.trim(), MAX_DESCRIPTION_CHARS)));
        out.push('\n');
    }

    for checklist in &card.checklists {
        out.push('\n');
        out.push_str(&checklist_block(checklist));
    }

    out.push_str("\n👥 <b>Assignees</b>\n");
    if card.members.is_empty() {
        out.push_str("Not assigned yet\n");
    } else {
        let names: Vec<String> = card
            .members
            .iter()
            .map(|m| format!("@{}", escape(&m.username)))
            .collect();
        out.push_str(&names.join(" "));
        out.push('\n');
    }

    out.push_str("\n🕒 <b>Due date</b>\n");
    match card.due {
        Some(due) => out.push_str(&due.format("%Y-%m-%d %H:%M UTC").to_string()),
        None => out.push_str("No due time"),
    }
    out.push('\n');

    if !card.short_url.is_empty() {
        out.push('\n');
        out.push_str(&escape(&card.short_url));
    }

    out
}

fn checklist_block(checklist: &Checklist) -> String {
    let mut out = format!("📝 <b>{}</b>\n", escape(&checklist.name));
    for item in checklist.check_items.iter().take(MAX_CHECK_ITEMS) {
        let mark = if item.is_complete() { "✅" } else { "⭕️" };
        out.push_str(&format!("{} {}\n", mark, escape(&item.name)));
    }
    let hidden = checklist.check_items.len().saturating_sub(MAX_CHECK_ITEMS);
    if hidden > 0 {
        out.push_str(&format!("… and {} more\n", hidden));
    }
    out
}

/// Full message for an action, with the card block when available.
pub fn render_action(action: &Action, card: Option<&Card>) -> String {
    let mut out = headline(action);

    if action.action_type == ActionType::CommentCard {
        if let Some(text) = action.data.text.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push_str("\n\n<blockquote>");
            out.push_str(&escape(&truncate(text.trim(), MAX_COMMENT_CHARS)));
            out.push_str("</blockquote>");
        }
    }

    if let Some(card) = card {
        let block = card_block(card);
        if out.chars().count() + block.chars().count() + 2 <= MAX_MESSAGE_CHARS {
            out.push_str("\n\n");
            out.push_str(&block);
        }
    }

    out
}
