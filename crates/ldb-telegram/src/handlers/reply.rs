use std::sync::Arc;

use teloxide::prelude::*;

use ldb_core::domain::{ChatId, Destination, MessageId};

use crate::participant_from_user;
use crate::router::AppState;

use super::send;

/// A reply to the draw announcement counts as a join.
pub async fn handle_reply(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(replied) = msg.reply_to_message() else {
        return Ok(());
    };

    let participant = participant_from_user(user);
    let user_id = participant.id;
    let outcome = state
        .draws
        .join_by_reply(
            ChatId(msg.chat.id.0),
            MessageId(replied.id.0),
            participant,
        )
        .await;

    if let Some(Err(rejection)) = outcome {
        let text = state.draws.rejection_message(&rejection);
        send(&state, Destination::User(user_id), &text).await;
    }

    Ok(())
}
