use std::sync::Arc;

use rand::seq::SliceRandom;
use teloxide::prelude::*;

use ldb_core::{
    domain::{ChatId, Destination, UserId},
    draw::{service::StartDrawRequest, session::JoinOutcome, DrawRejection},
};

use crate::participant_from_user;
use crate::router::AppState;

use super::send;

const TOSS_CUP_IMAGES: [&str; 4] = [
    "https://i.imgur.com/Lrfi37a.jpg",
    "https://i.imgur.com/HAb9sjh.jpg",
    "https://i.imgur.com/Fy5hmD7.jpg",
    "https://i.imgur.com/fPuAt7T.jpg",
];

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Where a rejection is shown: join problems privately, everything else in chat.
fn rejection_destination(rejection: &DrawRejection, chat: ChatId, user: UserId) -> Destination {
    match rejection {
        DrawRejection::PrivateChat | DrawRejection::NotStarted | DrawRejection::AlreadyOver => {
            Destination::User(user)
        }
        _ => Destination::Chat(chat),
    }
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let participant = participant_from_user(user);
    let user_id = participant.id;
    let chat_id = ChatId(msg.chat.id.0);
    let chat = Destination::Chat(chat_id);
    let messages = state.draws.messages();

    let (cmd, _arg) = parse_command(text);
    tracing::debug!("chat {}: /{cmd} from {}", chat_id.0, user_id.0);

    match cmd.as_str() {
        "start" => {
            send(&state, chat, &messages.greeting).await;
        }

        "help" => {
            send(&state, chat, &messages.help).await;
        }

        "luckydraw" => {
            let req = StartDrawRequest {
                chat_id,
                chat_title: msg.chat.title().unwrap_or("the group").to_string(),
                is_private: msg.chat.is_private(),
                organizer: participant,
                text: text.to_string(),
            };
            if let Err(rejection) = state.draws.start_draw(req).await {
                tracing::info!("chat {}: draw request rejected: {rejection}", chat_id.0);
                let reply = state.draws.rejection_message(&rejection);
                send(
                    &state,
                    rejection_destination(&rejection, chat_id, user_id),
                    &reply,
                )
                .await;
            }
        }

        "joindraw" => match state.draws.join(chat_id, participant).await {
            Ok(JoinOutcome::Joined) => {
                tracing::info!("chat {}: user {} joined", chat_id.0, user_id.0);
            }
            Ok(JoinOutcome::AlreadyJoined) => {}
            Err(rejection) => {
                let reply = state.draws.rejection_message(&rejection);
                send(
                    &state,
                    rejection_destination(&rejection, chat_id, user_id),
                    &reply,
                )
                .await;
            }
        },

        "drawstatus" => {
            let html = state.draws.status_html(chat_id).await;
            send(&state, chat, &html).await;
        }

        "canceldraw" => {
            if let Err(rejection) = state.draws.cancel_draw(chat_id, user_id).await {
                let reply = state.draws.rejection_message(&rejection);
                send(&state, chat, &reply).await;
            }
        }

        "toss" => {
            let image = TOSS_CUP_IMAGES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(TOSS_CUP_IMAGES[0]);
            send(&state, chat, image).await;
        }

        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix_and_args() {
        assert_eq!(
            parse_command("/luckyDraw@lottery_bot\n1 x Gold"),
            ("luckydraw".to_string(), "1 x Gold".to_string())
        );
        assert_eq!(
            parse_command("/joinDraw"),
            ("joindraw".to_string(), String::new())
        );
    }

    #[test]
    fn join_rejections_go_to_the_user() {
        let chat = ChatId(-1);
        let user = UserId(7);
        assert_eq!(
            rejection_destination(&DrawRejection::NotStarted, chat, user),
            Destination::User(user)
        );
        assert_eq!(
            rejection_destination(&DrawRejection::AlreadyRunning, chat, user),
            Destination::Chat(chat)
        );
    }
}
