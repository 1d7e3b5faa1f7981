use crate::config::AppConfig;
use crate::domain::notification::{PaymentNotification, WebhookAck, WebhookStatus};
use crate::domain::order::{Delivery, OrderPatch, OrderStatus, OrderTable, PaymentRecord, UpdateOutcome};
use crate::error::WebhookError;
use crate::notify::templates::{self, Email};
use crate::notify::Notifier;
use crate::repo::order_store::OrderStore;
use crate::sanitize::sanitize_object;
use crate::service::retry::{with_retry, RetryPolicy};
use crate::signature::{self, DevBypass, SignedPayload};
use crate::validation::validate;
use axum::body::Bytes;
use axum::http::HeaderMap;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub webhook_secret: String,
    pub signature_headers: Vec<String>,
    pub signed_payload: SignedPayload,
    pub dev_bypass: DevBypass,
    pub admin_email: String,
    pub debug_errors: bool,
    pub store_retry: RetryPolicy,
    pub email_timeout: Duration,
}

impl From<&AppConfig> for ReconcilerConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            webhook_secret: cfg.webhook_secret.clone(),
            signature_headers: cfg.signature_headers.clone(),
            signed_payload: cfg.signed_payload,
            dev_bypass: DevBypass {
                enabled: cfg.dev_bypass,
                token: cfg.dev_bypass_token.clone(),
                app_env: cfg.app_env.clone(),
            },
            admin_email: cfg.admin_email.clone(),
            debug_errors: cfg.debug_errors,
            store_retry: RetryPolicy {
                max_attempts: cfg.store_retry_attempts,
                base_backoff: Duration::from_millis(cfg.store_retry_backoff_ms),
                call_timeout: Duration::from_millis(cfg.store_timeout_ms),
            },
            email_timeout: Duration::from_millis(cfg.email_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            client_ip: headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_string()),
            user_agent: headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Applies provider payment callbacks to orders.
#[derive(Clone)]
pub struct WebhookReconciler {
    pub store: Arc<dyn OrderStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<ReconcilerConfig>,
}

impl WebhookReconciler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        notifier: Arc<dyn Notifier>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config: Arc::new(config),
        }
    }

    /// Runs the whole pipeline. A panic inside it surfaces as an unhandled
    /// error rather than a dropped connection.
    pub async fn handle(&self, headers: HeaderMap, body: Bytes) -> Result<WebhookAck, WebhookError> {
        let meta = RequestMeta::from_headers(&headers);
        let this = self.clone();
        let result = match tokio::spawn(async move { this.process(&headers, &body).await }).await {
            Ok(result) => result,
            Err(e) => Err(self.unhandled(anyhow::anyhow!("webhook task aborted: {e}"))),
        };

        match &result {
            Ok(ack) => tracing::info!(
                reference = %ack.reference,
                client_ip = meta.client_ip.as_deref().unwrap_or("unknown"),
                user_agent = meta.user_agent.as_deref().unwrap_or("unknown"),
                "payment webhook accepted"
            ),
            Err(WebhookError::Unhandled { source, .. }) => tracing::error!(
                client_ip = meta.client_ip.as_deref().unwrap_or("unknown"),
                error = ?source,
                "payment webhook failed"
            ),
            Err(e) => tracing::warn!(
                code = e.code(),
                error = %e,
                client_ip = meta.client_ip.as_deref().unwrap_or("unknown"),
                user_agent = meta.user_agent.as_deref().unwrap_or("unknown"),
                "payment webhook rejected"
            ),
        }

        result
    }

    pub async fn process(&self, headers: &HeaderMap, body: &[u8]) -> Result<WebhookAck, WebhookError> {
        let provided = signature::extract(headers, &self.config.signature_headers)
            .ok_or(WebhookError::MissingSignature)?;

        let parsed: Value = serde_json::from_slice(body)
            .map_err(|_| WebhookError::validation("body", "body must be valid JSON"))?;
        let Value::Object(map) = parsed else {
            return Err(WebhookError::validation("body", "body must be a JSON object"));
        };
        let sanitized = sanitize_object(map);

        if self.config.dev_bypass.accepts(provided) {
            tracing::warn!("signature check skipped by development bypass token");
        } else {
            let signed: Cow<'_, [u8]> = match self.config.signed_payload {
                SignedPayload::Raw => Cow::Borrowed(body),
                SignedPayload::Sanitized => Cow::Owned(
                    serde_json::to_vec(&sanitized).map_err(|e| self.unhandled(e.into()))?,
                ),
            };
            if !signature::verify(&self.config.webhook_secret, &signed, provided) {
                return Err(WebhookError::InvalidSignature);
            }
        }

        let notification = validate(&sanitized)?;
        tracing::info!(
            reference = %notification.reference,
            status = notification.status.as_str(),
            amount = notification.amount,
            currency = %notification.currency,
            "payment webhook verified"
        );

        match notification.status {
            WebhookStatus::Success => self.on_success(&notification).await,
            WebhookStatus::Failed => self.on_failed(&notification).await,
            WebhookStatus::Pending => self.on_pending(&notification).await,
        }

        Ok(WebhookAck {
            message: notification.status.ack_message().to_string(),
            reference: notification.reference,
        })
    }

    async fn on_success(&self, n: &PaymentNotification) {
        let patch = OrderPatch::paid(n.amount, &n.currency);
        let outcomes = self.update_tables(&n.reference, &patch).await;
        match classify(&outcomes, &patch.status) {
            Delivery::Replay => {
                tracing::info!(reference = %n.reference, "order already paid, ignoring repeated success webhook");
                return;
            }
            Delivery::Conflict(current) => {
                tracing::warn!(reference = %n.reference, current = %current, "payment captured for a closed order, order left unchanged");
                self.record_payment(n).await;
                self.send_admin(templates::admin_status_conflict(n, &current)).await;
                return;
            }
            Delivery::Fresh => {}
        }

        self.record_payment(n).await;

        if let Some(email) = n.customer_email() {
            self.send(email, templates::customer_confirmation(n)).await;
        } else {
            tracing::info!(reference = %n.reference, "no customer email on webhook, skipping confirmation");
        }
        self.send_admin(templates::admin_payment_received(n)).await;
    }

    async fn on_failed(&self, n: &PaymentNotification) {
        let patch = OrderPatch::failed();
        let outcomes = self.update_tables(&n.reference, &patch).await;
        match classify(&outcomes, &patch.status) {
            Delivery::Replay => {
                tracing::info!(reference = %n.reference, "order already failed, ignoring repeated failed webhook");
            }
            Delivery::Conflict(current) => {
                tracing::warn!(reference = %n.reference, current = %current, "failure reported for a closed order, order left unchanged");
                self.send_admin(templates::admin_status_conflict(n, &current)).await;
            }
            Delivery::Fresh => self.send_admin(templates::admin_payment_failed(n)).await,
        }
    }

    async fn on_pending(&self, n: &PaymentNotification) {
        self.send_admin(templates::admin_payment_pending(n)).await;
    }

    /// Updates every order table independently; a failure in one never
    /// stops the next. `None` marks a write that failed outright.
    async fn update_tables(
        &self,
        reference: &str,
        patch: &OrderPatch,
    ) -> Vec<(OrderTable, Option<UpdateOutcome>)> {
        let mut outcomes = Vec::with_capacity(OrderTable::ALL.len());
        for table in OrderTable::ALL {
            let label = format!("update {}", table.table_name());
            let attempts = AtomicU32::new(0);
            let attempts = &attempts;
            let res = with_retry(&label, self.config.store_retry, move || {
                attempts.fetch_add(1, Ordering::Relaxed);
                self.store.update_order(table, reference, patch)
            })
            .await;

            let outcome = match res {
                Ok(UpdateOutcome::Applied) => {
                    tracing::info!(reference, table = table.table_name(), status = patch.status.as_str(), "order updated");
                    Some(UpdateOutcome::Applied)
                }
                // An earlier attempt that timed out or errored may have
                // committed before the retry ran.
                Ok(UpdateOutcome::Terminal(current))
                    if attempts.load(Ordering::Relaxed) > 1 && current == patch.status.as_str() =>
                {
                    tracing::info!(reference, table = table.table_name(), status = %current, "order update landed on an earlier attempt");
                    Some(UpdateOutcome::Applied)
                }
                Ok(UpdateOutcome::Missing) => {
                    tracing::warn!(reference, table = table.table_name(), "no row with this order reference");
                    Some(UpdateOutcome::Missing)
                }
                Ok(UpdateOutcome::Terminal(current)) => {
                    tracing::warn!(reference, table = table.table_name(), current = %current, "order in terminal status, not updated");
                    Some(UpdateOutcome::Terminal(current))
                }
                Err(e) => {
                    tracing::warn!(reference, table = table.table_name(), error = ?e, "order update failed");
                    None
                }
            };
            outcomes.push((table, outcome));
        }
        outcomes
    }

    async fn record_payment(&self, n: &PaymentNotification) {
        let customer = n.customer.clone().unwrap_or_default();
        let record = PaymentRecord {
            id: uuid::Uuid::new_v4(),
            order_reference: n.reference.clone(),
            payment_reference: n.transaction_id.clone().unwrap_or_else(|| n.reference.clone()),
            payment_method: n
                .payment_method
                .clone()
                .unwrap_or_else(|| "mobile_money".to_string()),
            payment_status: n.status.as_str().to_string(),
            amount: n.amount,
            currency: n.currency.clone(),
            customer_name: customer.name,
            customer_phone: customer.phone,
            customer_email: customer.email,
            created_at: chrono::Utc::now(),
        };

        let record = &record;
        let res = with_retry("insert payment record", self.config.store_retry, move || {
            self.store.insert_payment_record(record)
        })
        .await;
        if let Err(e) = res {
            tracing::warn!(reference = %n.reference, error = ?e, "payment record not stored");
        }
    }

    async fn send_admin(&self, email: Email) {
        if self.config.admin_email.is_empty() {
            tracing::warn!(subject = %email.subject, "ADMIN_EMAIL not configured, admin notification skipped");
            return;
        }
        self.send(&self.config.admin_email, email).await;
    }

    async fn send(&self, to: &str, email: Email) {
        let sent = tokio::time::timeout(
            self.config.email_timeout,
            self.notifier.send_email(to, &email.subject, &email.html),
        )
        .await;

        match sent {
            Ok(Ok(outcome)) if outcome.success => {
                tracing::info!(to, subject = %email.subject, provider = outcome.provider.as_deref().unwrap_or(self.notifier.name()), "email sent");
            }
            Ok(Ok(outcome)) => {
                tracing::warn!(to, subject = %email.subject, error = outcome.error.as_deref().unwrap_or("unknown"), "email not sent");
            }
            Ok(Err(e)) => {
                tracing::warn!(to, subject = %email.subject, error = ?e, "email send failed");
            }
            Err(_) => {
                tracing::warn!(to, subject = %email.subject, "email send timed out");
            }
        }
    }

    fn unhandled(&self, source: anyhow::Error) -> WebhookError {
        WebhookError::Unhandled {
            source,
            expose_details: self.config.debug_errors,
        }
    }
}

/// Relates per-table update outcomes to the status the webhook wanted to
/// write. Anything that moved a row, or found no row at all, is fresh.
pub fn classify(outcomes: &[(OrderTable, Option<UpdateOutcome>)], target: &OrderStatus) -> Delivery {
    if outcomes
        .iter()
        .any(|(_, o)| matches!(o, Some(UpdateOutcome::Applied)))
    {
        return Delivery::Fresh;
    }

    let terminal: Vec<&str> = outcomes
        .iter()
        .filter_map(|(_, o)| match o {
            Some(UpdateOutcome::Terminal(current)) => Some(current.as_str()),
            _ => None,
        })
        .collect();

    if terminal
        .iter()
        .any(|s| OrderStatus::parse(s).is_some_and(|s| s.reflects(target)))
    {
        return Delivery::Replay;
    }
    match terminal.first() {
        Some(current) => Delivery::Conflict(current.to_string()),
        None => Delivery::Fresh,
    }
}
