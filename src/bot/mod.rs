//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles slash commands and incoming text, photo and video messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Turns screens into keyboards and Telegram API calls

use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::{InMemStorage, InMemStorageError, Storage};
use teloxide::types::{ChatId, User, UserId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::dialogue::CreationSession;
use crate::router::{Event, Outcome, Router, Sender, SessionUpdate};

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::{command_handler, message_handler};

/// Router shared by all handlers. Holding the lock while an event is
/// processed serializes state changes across chats.
pub type SharedRouter = Arc<Mutex<Router>>;

/// Creation sessions, keyed by the admin's private chat
pub type SessionStorage = InMemStorage<CreationSession>;

pub fn sender_from(user: &User) -> Sender {
    Sender {
        id: user.id.0,
        first_name: user.first_name.clone(),
    }
}

/// Run one event through the router, loading the sender's session before
/// and storing its update after. Both happen under the router lock.
pub async fn process_event(
    router: &SharedRouter,
    sessions: Arc<SessionStorage>,
    event: Event,
) -> Result<Outcome> {
    let chat_id = ChatId::from(UserId(event.sender.id));
    let mut router = router.lock().await;

    let session = sessions
        .clone()
        .get_dialogue(chat_id)
        .await?
        .unwrap_or_default();
    let outcome = router.handle(&event, session);

    match &outcome.session {
        SessionUpdate::Keep => {}
        SessionUpdate::Set(next) => {
            sessions.update_dialogue(chat_id, next.clone()).await?;
        }
        SessionUpdate::Clear => match sessions.remove_dialogue(chat_id).await {
            Ok(()) | Err(InMemStorageError::DialogueNotFound) => {}
        },
    }
    debug!(user_id = event.sender.id, session = ?outcome.session, "Event processed");
    Ok(outcome)
}

/// Current session of a user, `Idle` when none is stored
pub async fn current_session(sessions: Arc<SessionStorage>, user_id: u64) -> Result<CreationSession> {
    let chat_id = ChatId::from(UserId(user_id));
    Ok(sessions.get_dialogue(chat_id).await?.unwrap_or_default())
}
