//! Message Handler module for processing incoming Telegram messages

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use crate::action::Command;
use crate::catalog::{Media, MediaKind};
use crate::router::{Event, EventKind};

use super::ui_builder::deliver;
use super::{process_event, sender_from, SessionStorage, SharedRouter};

/// Handle `/start`, `/admin`, `/help` and `/cart`
pub async fn command_handler(
    bot: Bot,
    msg: Message,
    command: Command,
    router: SharedRouter,
    sessions: Arc<SessionStorage>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    debug!(user_id = %user.id, command = ?command, "Received command");

    let event = Event {
        sender: sender_from(user),
        kind: EventKind::Command(command),
    };
    let outcome = process_event(&router, sessions, event).await?;

    deliver(&bot, msg.chat.id, None, outcome.replies).await
}

/// Extract the event carried by a non-command message, if any
fn message_event_kind(msg: &Message) -> Option<EventKind> {
    if let Some(text) = msg.text() {
        return Some(EventKind::Text(text.to_string()));
    }
    if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
        return Some(EventKind::Media(Media {
            id: largest_photo.file.id.0.clone(),
            kind: MediaKind::Photo,
        }));
    }
    if let Some(video) = msg.video() {
        return Some(EventKind::Media(Media {
            id: video.file.id.0.clone(),
            kind: MediaKind::Video,
        }));
    }
    None
}

/// Handle free text and media, which only matter during admin creation dialogues
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    router: SharedRouter,
    sessions: Arc<SessionStorage>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(kind) = message_event_kind(&msg) else {
        debug!(user_id = %user.id, "Ignoring unsupported message type");
        return Ok(());
    };

    let event = Event {
        sender: sender_from(user),
        kind,
    };
    let outcome = process_event(&router, sessions, event).await?;

    deliver(&bot, msg.chat.id, None, outcome.replies).await
}
