//! Telegram adapter (teloxide).
//!
//! This crate implements the `ldb-core` messaging and admin ports over the
//! Telegram Bot API and routes updates into the draw service.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use ldb_core::{
    domain::{ChatId, Destination, MessageId, MessageRef, Participant, UserId},
    errors::Error,
    messaging::port::{ChatAdminPort, MessagingPort},
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Private chats share the user's numeric id.
    fn tg_chat(dest: Destination) -> teloxide::types::ChatId {
        teloxide::types::ChatId(dest.key())
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, dest: Destination, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(dest), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        })
    }
}

#[async_trait]
impl ChatAdminPort for TelegramMessenger {
    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> Result<bool> {
        let admins = self
            .with_retry(|| {
                self.bot
                    .get_chat_administrators(teloxide::types::ChatId(chat_id.0))
            })
            .await?;
        Ok(admins.iter().any(|m| m.user.id.0 as i64 == user_id.0))
    }
}

/// Map a Telegram user into the engine's participant type.
pub fn participant_from_user(user: &teloxide::types::User) -> Participant {
    Participant::new(
        UserId(user.id.0 as i64),
        user.username.clone(),
        user.full_name(),
    )
}
