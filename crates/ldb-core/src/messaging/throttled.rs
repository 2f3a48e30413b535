use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{Destination, MessageRef},
    messaging::port::MessagingPort,
    Result,
};

/// Per-destination limiters are swept once the map grows past this.
const PRUNE_AT: usize = 64;

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per destination (Telegram 1 msg/sec style limits).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// Several draws finishing at the same time can burst announcements; this keeps
/// them under Telegram's flood limits. It does not guarantee zero 429s.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_dest: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_dest: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for(&self, key: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_dest.lock().await;
        if map.len() >= PRUNE_AT && !map.contains_key(&key) {
            prune_idle(&mut map, Instant::now());
        }
        map.entry(key)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle(&self, dest: Destination) {
        let global_wait = { self.global.lock().await.reserve() };
        let dest_wait = {
            let lim = self.limiter_for(dest.key()).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(dest_wait);
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }
}

/// Drop limiters whose reservation has already passed; a fresh limiter behaves
/// the same. Limiters still referenced or locked by a sender are kept.
fn prune_idle(map: &mut HashMap<i64, Arc<Mutex<IntervalLimiter>>>, now: Instant) {
    let before = map.len();
    map.retain(|_, lim| {
        if Arc::strong_count(lim) > 1 {
            return true;
        }
        match lim.try_lock() {
            Ok(guard) => guard.next > now,
            Err(_) => true,
        }
    });
    tracing::debug!("throttle: pruned {} idle destination(s)", before - map.len());
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    async fn send_html(&self, dest: Destination, html: &str) -> Result<MessageRef> {
        self.throttle(dest).await;
        self.inner.send_html(dest, html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingMessenger {
        sent_at: StdMutex<Vec<(i64, Instant)>>,
    }

    #[async_trait::async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_html(&self, dest: Destination, _html: &str) -> Result<MessageRef> {
            self.sent_at.lock().unwrap().push((dest.key(), Instant::now()));
            Ok(MessageRef {
                chat_id: ChatId(dest.key()),
                message_id: MessageId(1),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_out_sends_to_the_same_destination() {
        let inner = Arc::new(RecordingMessenger::default());
        let throttled = ThrottledMessenger::new(
            inner.clone(),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_chat_min_interval: Duration::from_secs(1),
            },
        );

        let dest = Destination::Chat(ChatId(-1));
        throttled.send_html(dest, "a").await.unwrap();
        throttled.send_html(dest, "b").await.unwrap();

        let sent = inner.sent_at.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].1.duration_since(sent[0].1) >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn different_destinations_do_not_wait_on_each_other() {
        let inner = Arc::new(RecordingMessenger::default());
        let throttled = ThrottledMessenger::new(
            inner.clone(),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_chat_min_interval: Duration::from_secs(5),
            },
        );

        throttled
            .send_html(Destination::Chat(ChatId(-1)), "a")
            .await
            .unwrap();
        throttled
            .send_html(Destination::User(crate::domain::UserId(9)), "b")
            .await
            .unwrap();

        let sent = inner.sent_at.lock().unwrap().clone();
        assert!(sent[1].1.duration_since(sent[0].1) < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_destinations_are_pruned() {
        let inner = Arc::new(RecordingMessenger::default());
        let throttled = ThrottledMessenger::new(
            inner.clone(),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_chat_min_interval: Duration::from_secs(1),
            },
        );

        for id in 0..(PRUNE_AT as i64 + 6) {
            throttled
                .send_html(Destination::User(crate::domain::UserId(id)), "a")
                .await
                .unwrap();
        }
        // Reservations are still pending, nothing can be dropped yet.
        assert_eq!(throttled.per_dest.lock().await.len(), PRUNE_AT + 6);

        tokio::time::advance(Duration::from_secs(2)).await;
        throttled
            .send_html(Destination::Chat(ChatId(-1)), "b")
            .await
            .unwrap();

        let map = throttled.per_dest.lock().await;
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&-1));
    }
}
