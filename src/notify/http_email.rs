use crate::notify::{EmailOutcome, Notifier};
use anyhow::Result;
use serde_json::json;

pub struct HttpEmailNotifier {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

#[async_trait::async_trait]
impl Notifier for HttpEmailNotifier {
    fn name(&self) -> &'static str {
        "http_email"
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<EmailOutcome> {
        let body = json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(EmailOutcome::sent(self.name()));
        }

        let text = resp.text().await.unwrap_or_default();
        Ok(EmailOutcome::rejected(
            self.name(),
            format!("HTTP_{}: {}", status.as_u16(), text.chars().take(200).collect::<String>()),
        ))
    }
}
