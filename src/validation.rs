use crate::domain::notification::{Customer, PaymentNotification, WebhookStatus};
use crate::error::WebhookError;
use serde_json::{Map, Value};

const REQUIRED: [&str; 4] = ["reference", "status", "amount", "currency"];

/// Turns a sanitized body into a typed notification, or names the first
/// offending field.
pub fn validate(body: &Map<String, Value>) -> Result<PaymentNotification, WebhookError> {
    for field in REQUIRED {
        if body.get(field).map_or(true, Value::is_null) {
            return Err(WebhookError::required(field));
        }
    }

    let reference = string_field(body, "reference")?;
    if reference.is_empty() {
        return Err(WebhookError::validation(
            "reference",
            "reference must not be empty",
        ));
    }

    let status_raw = string_field(body, "status")?;
    let status = WebhookStatus::parse(&status_raw).ok_or_else(|| {
        WebhookError::validation(
            "status",
            "status must be one of: success, failed, pending",
        )
    })?;

    let amount = body["amount"]
        .as_f64()
        .ok_or_else(|| WebhookError::validation("amount", "amount must be a number"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(WebhookError::validation(
            "amount",
            "amount must be a positive number",
        ));
    }

    let currency = string_field(body, "currency")?;
    if currency.chars().count() != 3 {
        return Err(WebhookError::validation(
            "currency",
            "currency must be a 3-letter code",
        ));
    }

    let customer = match body.get("customer") {
        None | Some(Value::Null) => None,
        Some(Value::Object(c)) => Some(Customer {
            name: optional_string(c.get("name")),
            phone: optional_string(c.get("phone")),
            email: optional_string(c.get("email")),
        }),
        Some(_) => {
            return Err(WebhookError::validation(
                "customer",
                "customer must be an object",
            ))
        }
    };

    Ok(PaymentNotification {
        reference,
        status,
        amount,
        currency: currency.to_ascii_uppercase(),
        customer,
        transaction_id: optional_string(body.get("transaction_id")),
        payment_method: optional_string(body.get("payment_method")),
    })
}

fn string_field(body: &Map<String, Value>, field: &str) -> Result<String, WebhookError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| WebhookError::validation(field, format!("{field} must be a string")))
}

fn optional_string(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
