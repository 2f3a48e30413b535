//! Telegram update handlers.
//!
//! Commands go to `commands`; plain replies may be joins (reply to the draw
//! announcement). Everything else is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use ldb_core::domain::Destination;

use crate::router::AppState;

mod commands;
mod reply;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        return commands::handle_command(msg, state).await;
    }

    if msg.reply_to_message().is_some() {
        return reply::handle_reply(msg, state).await;
    }

    Ok(())
}

/// Best-effort send; failures are logged.
async fn send(state: &AppState, dest: Destination, html: &str) {
    if html.trim().is_empty() {
        return;
    }
    if let Err(e) = state.messenger.send_html(dest, html).await {
        tracing::warn!("send to {dest:?} failed: {e}");
    }
}
