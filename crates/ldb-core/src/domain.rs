use crate::formatting::escape_html;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Where an outbound message goes: the group itself or one participant privately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    Chat(ChatId),
    User(UserId),
}

impl Destination {
    /// Numeric key used for per-destination throttling.
    pub fn key(&self) -> i64 {
        match self {
            Destination::Chat(c) => c.0,
            Destination::User(u) => u.0,
        }
    }
}

/// Someone taking part in a draw (organizer or entrant).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub username: Option<String>,
    pub full_name: String,
}

impl Participant {
    pub fn new(id: UserId, username: Option<String>, full_name: impl Into<String>) -> Self {
        Self {
            id,
            username: username.filter(|u| !u.trim().is_empty()),
            full_name: full_name.into(),
        }
    }

    /// HTML mention: `@username` when set, otherwise a `tg://user` link.
    pub fn mention_html(&self) -> String {
        if let Some(username) = &self.username {
            return format!("@{}", escape_html(username));
        }
        let name = if self.full_name.trim().is_empty() {
            self.id.0.to_string()
        } else {
            self.full_name.trim().to_string()
        };
        format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            self.id.0,
            escape_html(&name)
        )
    }
}
