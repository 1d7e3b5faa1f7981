use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Success,
    Failed,
    Pending,
}

impl WebhookStatus {
    /// Exact, lowercase wire values only.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }

    /// Message returned in the 200 acknowledgement.
    pub fn ack_message(&self) -> &'static str {
        match self {
            Self::Success => "Payment processed successfully",
            Self::Failed => "Payment failure processed",
            Self::Pending => "Payment pending notification processed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A validated provider callback. Only lives for the duration of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentNotification {
    pub reference: String,
    pub status: WebhookStatus,
    pub amount: f64,
    pub currency: String,
    pub customer: Option<Customer>,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
}

impl PaymentNotification {
    pub fn customer_email(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookAck {
    pub message: String,
    pub reference: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
