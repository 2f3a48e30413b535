use std::sync::Arc;

use crate::{
    domain::{Destination, MessageRef},
    messaging::port::MessagingPort,
    template::{Context, TemplateRenderer},
    Error, Result,
};

/// Renders a template and sends it. Pacing is the caller's business.
pub struct Announcer {
    messenger: Arc<dyn MessagingPort>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl Announcer {
    pub fn new(messenger: Arc<dyn MessagingPort>, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            messenger,
            renderer,
        }
    }

    pub fn renderer(&self) -> &dyn TemplateRenderer {
        self.renderer.as_ref()
    }

    /// Best-effort send: render and delivery failures are logged and swallowed.
    pub async fn announce(
        &self,
        dest: Destination,
        template: &str,
        ctx: &Context,
    ) -> Option<MessageRef> {
        match self.try_announce(dest, template, ctx).await {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::warn!("announcement to {dest:?} failed: {e}");
                None
            }
        }
    }

    pub async fn try_announce(
        &self,
        dest: Destination,
        template: &str,
        ctx: &Context,
    ) -> Result<MessageRef> {
        let text = self.renderer.render(template, ctx)?;
        if text.trim().is_empty() {
            return Err(Error::Template("rendered message is empty".to_string()));
        }
        self.messenger.send_html(dest, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context;
    use crate::domain::{ChatId, UserId};
    use crate::draw::testing::FakeMessenger;
    use crate::template::PlaceholderRenderer;

    fn announcer(messenger: Arc<FakeMessenger>) -> Announcer {
        Announcer::new(messenger, Arc::new(PlaceholderRenderer))
    }

    #[tokio::test]
    async fn renders_and_sends() {
        let messenger = Arc::new(FakeMessenger::default());
        let a = announcer(messenger.clone());

        let sent = a
            .announce(
                Destination::Chat(ChatId(-5)),
                "{{.n}} joined",
                &context! { "n" => 3 },
            )
            .await;

        assert!(sent.is_some());
        assert_eq!(
            messenger.sent(),
            vec![(Destination::Chat(ChatId(-5)), "3 joined".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_key_skips_the_message() {
        let messenger = Arc::new(FakeMessenger::default());
        let a = announcer(messenger.clone());

        let sent = a
            .announce(Destination::Chat(ChatId(-5)), "{{.missing}}", &context!())
            .await;

        assert!(sent.is_none());
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_reported_by_try_announce_only() {
        let messenger = Arc::new(FakeMessenger::default());
        messenger.fail_private(true);
        let a = announcer(messenger.clone());
        let dest = Destination::User(UserId(9));

        assert!(a.announce(dest, "hi", &context!()).await.is_none());
        assert!(matches!(
            a.try_announce(dest, "hi", &context!()).await,
            Err(Error::External(_))
        ));
    }
}
