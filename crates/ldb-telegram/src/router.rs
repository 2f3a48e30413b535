use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use ldb_core::{
    config::Config,
    draw::service::LuckyDrawService,
    messaging::{
        port::{ChatAdminPort, MessagingPort},
        throttled::ThrottledMessenger,
    },
    template::PlaceholderRenderer,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub draws: Arc<LuckyDrawService>,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!("lucky draw bot started: @{}", me.username()),
        Err(e) => tracing::warn!("get_me failed: {e}"),
    }
    tracing::info!(
        "join window {}s, prize delay {}ms, winner delay {}ms",
        cfg.timing.join_window.as_secs(),
        cfg.timing.prize_announce_delay.as_millis(),
        cfg.timing.inter_winner_delay.as_millis()
    );

    // Announcements from several chats can burst at once; throttle outbound sends.
    // Telegram 429 RetryAfter is still retried once at the adapter layer.
    let telegram = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> =
        Arc::new(ThrottledMessenger::new(telegram.clone(), cfg.throttle));
    let admins: Arc<dyn ChatAdminPort> = telegram;

    let draws = Arc::new(LuckyDrawService::new(
        messenger.clone(),
        admins,
        Arc::new(PlaceholderRenderer),
        cfg.messages.clone(),
        cfg.timing,
    ));

    let state = Arc::new(AppState { draws, messenger });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
