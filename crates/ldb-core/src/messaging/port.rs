use async_trait::async_trait;

use crate::{
    domain::{ChatId, Destination, MessageRef, UserId},
    Result,
};

/// Outbound messaging port.
///
/// The draw engine only ever sends HTML text, either to the group or privately
/// to one participant.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, dest: Destination, html: &str) -> Result<MessageRef>;
}

/// Chat membership port: the only authorization question the engine asks.
#[async_trait]
pub trait ChatAdminPort: Send + Sync {
    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> Result<bool>;
}
