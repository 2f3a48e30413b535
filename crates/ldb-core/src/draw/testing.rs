//! Test doubles shared by the draw engine tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, Destination, MessageId, MessageRef, Participant, UserId},
    messaging::port::{ChatAdminPort, MessagingPort},
    Error, Result,
};

pub fn participant(id: i64, username: &str) -> Participant {
    Participant::new(UserId(id), Some(username.to_string()), username)
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sends: Mutex<Vec<(Destination, String)>>,
    fail_private: AtomicBool,
    fail_all: AtomicBool,
}

impl FakeMessenger {
    /// Private sends fail, as when a winner never opened a chat with the bot.
    pub fn fail_private(&self, on: bool) {
        self.fail_private.store(on, Ordering::SeqCst);
    }

    pub fn fail_all(&self, on: bool) {
        self.fail_all.store(on, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(Destination, String)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, t)| t).collect()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, dest: Destination, html: &str) -> Result<MessageRef> {
        if self.fail_all.load(Ordering::SeqCst)
            || (matches!(dest, Destination::User(_)) && self.fail_private.load(Ordering::SeqCst))
        {
            return Err(Error::External("forbidden: bot can't initiate conversation".to_string()));
        }

        self.sends.lock().unwrap().push((dest, html.to_string()));
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        Ok(MessageRef {
            chat_id: ChatId(dest.key()),
            message_id: MessageId(*guard),
        })
    }
}

/// Admin lookup answering from a fixed list; `None` simulates an API failure.
pub struct FakeAdmins {
    pub admins: Option<Vec<UserId>>,
}

impl FakeAdmins {
    pub fn of(ids: &[i64]) -> Self {
        Self {
            admins: Some(ids.iter().copied().map(UserId).collect()),
        }
    }

    pub fn failing() -> Self {
        Self { admins: None }
    }
}

#[async_trait]
impl ChatAdminPort for FakeAdmins {
    async fn is_admin(&self, _chat_id: ChatId, user_id: UserId) -> Result<bool> {
        match &self.admins {
            Some(ids) => Ok(ids.contains(&user_id)),
            None => Err(Error::External("getChatAdministrators failed".to_string())),
        }
    }
}
