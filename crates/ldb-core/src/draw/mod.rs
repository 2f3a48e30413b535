//! Lucky draw engine: join window, winner selection and staged announcements.

pub mod announcer;
pub mod ledger;
pub mod ordinal;
pub mod parse;
pub mod registry;
pub mod selector;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use crate::{config::Messages, formatting::escape_html, template::TemplateRenderer};

pub use parse::PrizeParseError;

/// Why a draw request was refused. Every variant maps to a short user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawRejection {
    #[error("lucky draws can not run in a private chat")]
    PrivateChat,

    #[error("sender is not a chat admin")]
    NotAdmin,

    #[error("admin status lookup failed")]
    AdminCheckFailed,

    #[error("invalid draw request: {0}")]
    InvalidInput(#[from] PrizeParseError),

    #[error("a draw is already running in this chat")]
    AlreadyRunning,

    #[error("no draw has been started in this chat")]
    NotStarted,

    #[error("the draw is no longer open")]
    AlreadyOver,

    #[error("draw could not be started: {0}")]
    Unavailable(String),
}

impl DrawRejection {
    /// Text shown to the user in chat.
    pub fn user_message(&self, messages: &Messages, renderer: &dyn TemplateRenderer) -> String {
        let mut ctx = crate::context!();
        let template = match self {
            DrawRejection::PrivateChat => &messages.private_chat_not_allowed,
            DrawRejection::NotAdmin => &messages.not_admin,
            DrawRejection::AdminCheckFailed => &messages.admin_check_failed,
            // Parse errors quote the expected syntax and the user's own text.
            DrawRejection::InvalidInput(e) => return escape_html(&e.to_string()),
            DrawRejection::AlreadyRunning => {
                &messages.the_draw_is_already_started_and_has_not_stopped_yet
            }
            DrawRejection::NotStarted => &messages.the_draw_is_not_started_yet,
            DrawRejection::AlreadyOver => &messages.the_draw_is_over,
            DrawRejection::Unavailable(reason) => {
                ctx.insert("reason".to_string(), escape_html(reason).into());
                &messages.draw_unavailable
            }
        };
        renderer
            .render(template, &ctx)
            .unwrap_or_else(|e| {
                tracing::warn!("failed to render rejection message: {e}");
                template.clone()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::PlaceholderRenderer;

    #[test]
    fn rejections_use_configured_messages() {
        let messages = Messages::default();
        assert_eq!(
            DrawRejection::AlreadyRunning.user_message(&messages, &PlaceholderRenderer),
            messages.the_draw_is_already_started_and_has_not_stopped_yet
        );
        assert_eq!(
            DrawRejection::NotStarted.user_message(&messages, &PlaceholderRenderer),
            messages.the_draw_is_not_started_yet
        );
        assert_eq!(
            DrawRejection::AlreadyOver.user_message(&messages, &PlaceholderRenderer),
            messages.the_draw_is_over
        );
    }

    #[test]
    fn parse_errors_are_shown_as_text() {
        let rejection = DrawRejection::from(PrizeParseError::MissingPrizes);
        assert_eq!(
            rejection.user_message(&Messages::default(), &PlaceholderRenderer),
            "invalid input format: put at least one prize line (e.g. `1 x Gold`) below the command"
        );
    }

    #[test]
    fn parse_errors_are_html_escaped() {
        let rejection = DrawRejection::from(PrizeParseError::MissingSeparator { line: 2 });
        let msg = rejection.user_message(&Messages::default(), &PlaceholderRenderer);
        assert!(!msg.contains('<'), "{msg}");
        assert!(msg.contains("&lt;quantity&gt; x &lt;prize&gt;"), "{msg}");

        let rejection = DrawRejection::from(PrizeParseError::InvalidQuantity {
            line: 3,
            value: "<b>&".to_string(),
        });
        let msg = rejection.user_message(&Messages::default(), &PlaceholderRenderer);
        assert!(!msg.contains('<'), "{msg}");
        assert!(msg.contains("&lt;b&gt;&amp;"), "{msg}");
    }

    #[test]
    fn unavailable_uses_configured_message() {
        let messages = Messages {
            draw_unavailable: "could not start: {{.reason}}".to_string(),
            ..Messages::default()
        };
        let msg = DrawRejection::Unavailable("bad <chat>".to_string())
            .user_message(&messages, &PlaceholderRenderer);
        assert_eq!(msg, "could not start: bad &lt;chat&gt;");

        let msg = DrawRejection::Unavailable("x".to_string())
            .user_message(&Messages::default(), &PlaceholderRenderer);
        assert_eq!(msg, Messages::default().draw_unavailable);
    }
}
