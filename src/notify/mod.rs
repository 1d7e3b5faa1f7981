use anyhow::Result;
use serde::Serialize;

pub mod disabled;
pub mod http_email;
pub mod templates;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub provider: Option<String>,
    pub error: Option<String>,
}

impl EmailOutcome {
    pub fn sent(provider: &str) -> Self {
        Self {
            success: true,
            provider: Some(provider.to_string()),
            error: None,
        }
    }

    pub fn rejected(provider: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider: Some(provider.to_string()),
            error: Some(error.into()),
        }
    }
}

/// Outbound email collaborator. Callers treat every send as best-effort.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<EmailOutcome>;
}
