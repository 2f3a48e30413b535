use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    domain::ChatId,
    draw::{
        session::{DrawSession, DrawStatus},
        DrawRejection,
    },
};

/// Process-wide chat -> session map.
///
/// At most one non-closed session per chat. Closed sessions stay until the next
/// accepted draw in that chat replaces them. Session status is read without the
/// session lock, so holding the map lock never waits on a running draw.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ChatId, Arc<DrawSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<Arc<DrawSession>> {
        self.sessions.lock().await.get(&chat_id).cloned()
    }

    pub async fn register(&self, session: Arc<DrawSession>) -> Result<(), DrawRejection> {
        let mut map = self.sessions.lock().await;
        if let Some(existing) = map.get(&session.chat_id()) {
            if existing.status() != DrawStatus::Closed {
                return Err(DrawRejection::AlreadyRunning);
            }
        }
        map.insert(session.chat_id(), session);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{parse::PrizeSpec, session::DrawTiming, testing::participant};

    fn session(chat: i64) -> Arc<DrawSession> {
        Arc::new(DrawSession::new(
            ChatId(chat),
            "group",
            participant(1, "org"),
            &[PrizeSpec {
                name: "gold".to_string(),
                quantity: 1,
            }],
            DrawTiming::default(),
        ))
    }

    #[tokio::test]
    async fn starts_empty() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty().await);
        assert!(registry.get(ChatId(-1)).await.is_none());
    }

    #[tokio::test]
    async fn refuses_second_session_while_first_is_active() {
        let registry = SessionRegistry::new();
        let first = session(-1);
        registry.register(first.clone()).await.unwrap();

        assert_eq!(
            registry.register(session(-1)).await,
            Err(DrawRejection::AlreadyRunning)
        );

        first.begin_resolution().await;
        assert_eq!(
            registry.register(session(-1)).await,
            Err(DrawRejection::AlreadyRunning)
        );
        let current = registry.get(ChatId(-1)).await.unwrap();
        assert!(Arc::ptr_eq(&current, &first));
        assert_eq!(current.status(), DrawStatus::Resolving);
    }

    #[tokio::test]
    async fn closed_session_is_replaced() {
        let registry = SessionRegistry::new();
        let first = session(-1);
        registry.register(first.clone()).await.unwrap();
        first.close().await;

        let second = session(-1);
        registry.register(second.clone()).await.unwrap();
        let current = registry.get(ChatId(-1)).await.unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn chats_are_independent() {
        let registry = SessionRegistry::new();
        registry.register(session(-1)).await.unwrap();
        registry.register(session(-2)).await.unwrap();
        assert_eq!(registry.len().await, 2);
    }
}
