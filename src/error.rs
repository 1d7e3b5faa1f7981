use crate::domain::notification::{ErrorEnvelope, ErrorPayload};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Internal server error")]
    Unhandled {
        #[source]
        source: anyhow::Error,
        expose_details: bool,
    },
}

impl WebhookError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        WebhookError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::validation(field, format!("{field} is required"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::Validation { .. } => StatusCode::BAD_REQUEST,
            WebhookError::Unhandled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::Validation { .. } => "VALIDATION_ERROR",
            WebhookError::Unhandled { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let details = match self {
            WebhookError::Validation { field, .. } => Some(format!("field: {field}")),
            WebhookError::Unhandled {
                source,
                expose_details: true,
            } => Some(format!("{source:#}")),
            _ => None,
        };

        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
                details,
            },
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}
