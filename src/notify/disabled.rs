use crate::notify::{EmailOutcome, Notifier};
use anyhow::Result;

/// Used when `EMAIL_DISABLED` is set: nothing leaves the process.
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn send_email(&self, to: &str, subject: &str, _html: &str) -> Result<EmailOutcome> {
        tracing::info!(to, subject, "email sending disabled, skipping");
        Ok(EmailOutcome::sent(self.name()))
    }
}
