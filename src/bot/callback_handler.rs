//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;
use tracing::{debug, error};

use crate::router::{Event, EventKind};

use super::ui_builder::deliver;
use super::{process_event, sender_from, SessionStorage, SharedRouter};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    router: SharedRouter,
    sessions: Arc<SessionStorage>,
) -> Result<()> {
    let payload = q.data.clone().unwrap_or_default();
    debug!(user_id = %q.from.id, payload = %payload, "Received callback query from user");

    let from_media_message = matches!(
        &q.message,
        Some(MaybeInaccessibleMessage::Regular(msg)) if msg.photo().is_some() || msg.video().is_some()
    );
    let event = Event {
        sender: sender_from(&q.from),
        kind: EventKind::Callback {
            payload,
            from_media_message,
        },
    };
    let outcome = process_event(&router, sessions, event).await?;

    // Answer the callback query to remove the loading state
    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(notice) = outcome.notice {
        answer = answer.text(notice.text).show_alert(notice.alert);
    }
    if let Err(e) = answer.await {
        error!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    match &q.message {
        Some(msg) => deliver(&bot, msg.chat().id, Some(msg.id()), outcome.replies).await,
        None => Ok(()),
    }
}
