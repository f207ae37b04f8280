use async_trait::async_trait;
use teloxide::{
    payloads::{SendMessageSetters, SendPhotoSetters},
    prelude::Requester,
    types::{ChatId, InputFile, Recipient},
    Bot,
};
use url::Url;

use crate::{keyboard::inline_keyboard, message::Controls, BoxError};

/// Outbound side of the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        controls: Option<&Controls>,
    ) -> Result<(), BoxError>;

    async fn send_image(
        &self,
        chat_id: ChatId,
        url: &Url,
        caption: &str,
        controls: Option<&Controls>,
    ) -> Result<(), BoxError>;
}

/// Delivers completion notices to the secondary audience.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, recipient: &Recipient, text: &str) -> Result<(), BoxError>;
}

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        controls: Option<&Controls>,
    ) -> Result<(), BoxError> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(controls) = controls {
            request = request.reply_markup(inline_keyboard(controls));
        }
        request.await?;
        Ok(())
    }

    async fn send_image(
        &self,
        chat_id: ChatId,
        url: &Url,
        caption: &str,
        controls: Option<&Controls>,
    ) -> Result<(), BoxError> {
        let mut request = self
            .bot
            .send_photo(chat_id, InputFile::url(url.clone()))
            .caption(caption);
        if let Some(controls) = controls {
            request = request.reply_markup(inline_keyboard(controls));
        }
        request.await?;
        Ok(())
    }
}

/// A second bot account that posts `{chat_id, text}` to `sendMessage`.
pub struct SecondaryBot {
    bot: Bot,
}

impl SecondaryBot {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl Notify for SecondaryBot {
    async fn notify(&self, recipient: &Recipient, text: &str) -> Result<(), BoxError> {
        self.bot.send_message(recipient.clone(), text).await?;
        Ok(())
    }
}

/// Parses a comma separated recipient list. Numeric entries are chat ids,
/// `@name` entries are public channel usernames.
pub fn parse_recipients(raw: &str) -> Result<Vec<Recipient>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if entry.starts_with('@') {
                Ok(Recipient::ChannelUsername(entry.to_owned()))
            } else {
                entry
                    .parse::<i64>()
                    .map(|id| Recipient::Id(ChatId(id)))
                    .map_err(|_| format!("'{entry}' is neither a chat id nor an @username"))
            }
        })
        .collect()
}
