//! Entry points used by the command layer.

use std::{sync::Arc, time::Duration};

use crate::{
    config::Messages,
    context,
    domain::{ChatId, Destination, MessageId, Participant, UserId},
    draw::{
        announcer::Announcer,
        parse::parse_prize_lines,
        registry::SessionRegistry,
        session::{DrawSession, DrawSnapshot, DrawStatus, DrawTiming, JoinOutcome},
        DrawRejection,
    },
    formatting::{escape_html, pluralize},
    messaging::port::{ChatAdminPort, MessagingPort},
    template::{TemplateRenderer, Value},
};

/// A `/luckydraw` request as seen by the engine.
#[derive(Clone, Debug)]
pub struct StartDrawRequest {
    pub chat_id: ChatId,
    pub chat_title: String,
    pub is_private: bool,
    pub organizer: Participant,
    /// Full message text; the first line is the command header.
    pub text: String,
}

pub struct LuckyDrawService {
    registry: SessionRegistry,
    admins: Arc<dyn ChatAdminPort>,
    announcer: Arc<Announcer>,
    messages: Arc<Messages>,
    timing: DrawTiming,
}

impl LuckyDrawService {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        admins: Arc<dyn ChatAdminPort>,
        renderer: Arc<dyn TemplateRenderer>,
        messages: Messages,
        timing: DrawTiming,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            admins,
            announcer: Arc::new(Announcer::new(messenger, renderer)),
            messages: Arc::new(messages),
            timing,
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn renderer(&self) -> &dyn TemplateRenderer {
        self.announcer.renderer()
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    /// User-facing text for a rejection.
    pub fn rejection_message(&self, rejection: &DrawRejection) -> String {
        rejection.user_message(&self.messages, self.renderer())
    }

    /// Validate, register and launch a draw. Nothing is created unless every
    /// check passes.
    pub async fn start_draw(
        &self,
        req: StartDrawRequest,
    ) -> Result<Arc<DrawSession>, DrawRejection> {
        if req.is_private {
            return Err(DrawRejection::PrivateChat);
        }

        match self.admins.is_admin(req.chat_id, req.organizer.id).await {
            Ok(true) => {}
            Ok(false) => return Err(DrawRejection::NotAdmin),
            Err(e) => {
                tracing::warn!("admin lookup for chat {} failed: {e}", req.chat_id.0);
                return Err(DrawRejection::AdminCheckFailed);
            }
        }

        if let Some(existing) = self.registry.get(req.chat_id).await {
            if existing.status() != DrawStatus::Closed {
                return Err(DrawRejection::AlreadyRunning);
            }
        }

        let prizes = parse_prize_lines(&req.text)?;

        let session = Arc::new(DrawSession::new(
            req.chat_id,
            req.chat_title,
            req.organizer,
            &prizes,
            self.timing,
        ));
        self.registry.register(session.clone()).await?;

        let anchor = self
            .announcer
            .try_announce(
                Destination::Chat(req.chat_id),
                &self.messages.lucky_draw_start,
                &context! { "joinDuration" => minutes_value(self.timing.join_window) },
            )
            .await;
        match anchor {
            Ok(anchor) => session.set_anchor(anchor).await,
            Err(e) => {
                tracing::warn!("chat {}: failed to announce draw: {e}", req.chat_id.0);
                session.close().await;
                return Err(DrawRejection::Unavailable(e.to_string()));
            }
        }

        tracing::info!(
            "chat {}: lucky draw started by {} with {}",
            req.chat_id.0,
            session.organizer().mention_html(),
            pluralize(prizes.len(), "prize entry", "prize entries")
        );

        tokio::spawn(
            session
                .clone()
                .run(self.announcer.clone(), self.messages.clone()),
        );
        Ok(session)
    }

    pub async fn join(
        &self,
        chat_id: ChatId,
        participant: Participant,
    ) -> Result<JoinOutcome, DrawRejection> {
        let Some(session) = self.registry.get(chat_id).await else {
            return Err(DrawRejection::NotStarted);
        };
        session.join(participant).await
    }

    /// Join via a reply. `None` when the reply does not target the draw's anchor
    /// message; such replies are ordinary chat and ignored.
    pub async fn join_by_reply(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        participant: Participant,
    ) -> Option<Result<JoinOutcome, DrawRejection>> {
        let session = self.registry.get(chat_id).await?;
        if !session.is_anchor(reply_to).await {
            return None;
        }
        Some(session.join(participant).await)
    }

    pub async fn status(&self, chat_id: ChatId) -> Option<DrawSnapshot> {
        let session = self.registry.get(chat_id).await?;
        Some(session.snapshot().await)
    }

    /// Status text for `/drawstatus`.
    pub async fn status_html(&self, chat_id: ChatId) -> String {
        let Some(snap) = self.status(chat_id).await else {
            return self.rejection_message(&DrawRejection::NotStarted);
        };

        let prizes = snap
            .prizes
            .iter()
            .map(|p| {
                format!(
                    "• {} × {} ({} drawn)",
                    p.quantity,
                    escape_html(&p.name),
                    p.winners.len()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let ctx = context! {
            "status" => snap.status.label(),
            "opened" => snap.opened_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            "members" => snap.roster.len() + snap.winners.len(),
            "prizes" => prizes,
        };
        self.renderer()
            .render(&self.messages.draw_status, &ctx)
            .unwrap_or_else(|e| {
                tracing::warn!("failed to render draw status: {e}");
                String::new()
            })
    }

    /// Cancel an open draw. Allowed for the organizer and chat admins.
    pub async fn cancel_draw(
        &self,
        chat_id: ChatId,
        requester: UserId,
    ) -> Result<(), DrawRejection> {
        let Some(session) = self.registry.get(chat_id).await else {
            return Err(DrawRejection::NotStarted);
        };

        if session.organizer().id != requester {
            match self.admins.is_admin(chat_id, requester).await {
                Ok(true) => {}
                Ok(false) => return Err(DrawRejection::NotAdmin),
                Err(e) => {
                    tracing::warn!("admin lookup for chat {} failed: {e}", chat_id.0);
                    return Err(DrawRejection::AdminCheckFailed);
                }
            }
        }

        session.cancel().await?;
        self.announcer
            .announce(
                Destination::Chat(chat_id),
                &self.messages.draw_cancelled,
                &context! { "organizer" => session.organizer().mention_html() },
            )
            .await;
        tracing::info!("chat {}: draw cancelled", chat_id.0);
        Ok(())
    }
}

/// Whole minutes as an integer, otherwise one decimal place.
fn minutes_value(d: Duration) -> Value {
    let secs = d.as_secs();
    if secs % 60 == 0 {
        return Value::from(secs / 60);
    }
    Value::from((d.as_secs_f64() / 60.0 * 10.0).round() / 10.0)
}
