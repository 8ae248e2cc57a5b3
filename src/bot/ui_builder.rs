//! UI Builder module: turns screens into inline keyboards and Telegram API calls

use anyhow::Result;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, warn};

use crate::catalog::MediaKind;
use crate::router::Reply;
use crate::screens::{Button, Keyboard, Screen};

/// Create the inline keyboard of a screen. Url buttons with an invalid URL are dropped.
pub fn create_inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .iter()
        .map(|row| row.iter().filter_map(create_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

fn create_button(button: &Button) -> Option<InlineKeyboardButton> {
    match button {
        Button::Callback { label, action } => {
            Some(InlineKeyboardButton::callback(label.clone(), action.to_string()))
        }
        Button::Url { label, url } => match Url::parse(url) {
            Ok(url) => Some(InlineKeyboardButton::url(label.clone(), url)),
            Err(e) => {
                warn!(url = %url, error = %e, "Skipping button with invalid URL");
                None
            }
        },
    }
}

/// Send a screen as a new message, as a photo or video when it carries media
pub async fn send_screen(bot: &Bot, chat_id: ChatId, screen: &Screen) -> Result<()> {
    let markup = create_inline_keyboard(&screen.keyboard);

    match &screen.media {
        Some(media) if media.kind == MediaKind::Video => {
            bot.send_video(chat_id, InputFile::file_id(FileId(media.id.clone())))
                .caption(screen.text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
        Some(media) => {
            bot.send_photo(chat_id, InputFile::file_id(FileId(media.id.clone())))
                .caption(screen.text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
        None => {
            bot.send_message(chat_id, screen.text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(())
}

/// Telegram refuses edits that would not change the message
fn is_not_modified(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

/// Perform the replies of an outcome. `origin` is the message a pressed
/// button belongs to; without it every reply becomes a new message.
pub async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    origin: Option<MessageId>,
    replies: Vec<Reply>,
) -> Result<()> {
    for reply in replies {
        match (reply, origin) {
            (Reply::Edit(screen), Some(message_id)) => {
                let markup = create_inline_keyboard(&screen.keyboard);
                let edited = bot
                    .edit_message_text(chat_id, message_id, screen.text.clone())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup)
                    .await;
                match edited {
                    Ok(_) => {}
                    Err(e) if is_not_modified(&e) => {
                        debug!(chat_id = %chat_id, "Message already shows this screen");
                    }
                    Err(e) => {
                        warn!(chat_id = %chat_id, error = %e, "Failed to edit message, sending a new one");
                        send_screen(bot, chat_id, &screen).await?;
                    }
                }
            }
            (Reply::Replace(screen), Some(message_id)) => {
                send_screen(bot, chat_id, &screen).await?;
                if let Err(e) = bot.delete_message(chat_id, message_id).await {
                    error!(chat_id = %chat_id, error = %e, "Failed to delete replaced message");
                }
            }
            (reply, _) => send_screen(bot, chat_id, reply.screen()).await?,
        }
    }
    Ok(())
}
