#![allow(dead_code)]

use anyhow::{bail, Result};
use axum::http::{HeaderMap, HeaderValue};
use choptym_payments::config::default_signature_headers;
use choptym_payments::domain::order::{
    OrderPatch, OrderState, OrderStatus, OrderTable, PaymentRecord, UpdateOutcome,
};
use choptym_payments::notify::{EmailOutcome, Notifier};
use choptym_payments::repo::order_store::OrderStore;
use choptym_payments::service::reconciler::{ReconcilerConfig, WebhookReconciler};
use choptym_payments::service::retry::RetryPolicy;
use choptym_payments::signature::{self, DevBypass, SignedPayload};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "whsec_choptym_test";
pub const ADMIN: &str = "admin@choptym.com";

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub status: String,
    pub payment_status: String,
    pub payment_amount: Option<f64>,
    pub payment_currency: Option<String>,
}

impl Row {
    pub fn pending() -> Self {
        Self {
            status: "pending".to_string(),
            payment_status: "unpaid".to_string(),
            payment_amount: None,
            payment_currency: None,
        }
    }
}

/// In-memory `orders` / `custom_orders` / `payments`, with per-table failure
/// injection.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<HashMap<(OrderTable, String), Row>>,
    pub payments: Mutex<Vec<PaymentRecord>>,
    pub failing_tables: Mutex<HashSet<OrderTable>>,
    pub fail_payments: Mutex<bool>,
    pub update_calls: Mutex<Vec<(OrderTable, String)>>,
    /// Tables whose next update commits and then hangs past any timeout.
    pub stall_after_commit: Mutex<HashSet<OrderTable>>,
}

impl MemoryStore {
    pub fn with_order(table: OrderTable, reference: &str) -> Self {
        let store = Self::default();
        store.insert(table, reference, Row::pending());
        store
    }

    pub fn insert(&self, table: OrderTable, reference: &str, row: Row) {
        self.rows
            .lock()
            .unwrap()
            .insert((table, reference.to_string()), row);
    }

    pub fn row(&self, table: OrderTable, reference: &str) -> Option<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(&(table, reference.to_string()))
            .cloned()
    }

    pub fn fail_table(&self, table: OrderTable) {
        self.failing_tables.lock().unwrap().insert(table);
    }

    pub fn update_attempts(&self, table: OrderTable) -> usize {
        self.update_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == table)
            .count()
    }

    pub fn stall_next_update(&self, table: OrderTable) {
        self.stall_after_commit.lock().unwrap().insert(table);
    }

    pub fn payment_count(&self) -> usize {
        self.payments.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl OrderStore for MemoryStore {
    async fn update_order(
        &self,
        table: OrderTable,
        reference: &str,
        patch: &OrderPatch,
    ) -> Result<UpdateOutcome> {
        self.update_calls
            .lock()
            .unwrap()
            .push((table, reference.to_string()));
        if self.failing_tables.lock().unwrap().contains(&table) {
            bail!("connection reset updating {}", table.table_name());
        }

        {
            let mut rows = self.rows.lock().unwrap();
            let Some(row) = rows.get_mut(&(table, reference.to_string())) else {
                return Ok(UpdateOutcome::Missing);
            };
            if OrderStatus::parse(&row.status).map_or(false, |s| s.is_terminal()) {
                return Ok(UpdateOutcome::Terminal(row.status.clone()));
            }

            row.status = patch.status.as_str().to_string();
            row.payment_status = patch.payment_status.as_str().to_string();
            if patch.payment_amount.is_some() {
                row.payment_amount = patch.payment_amount;
            }
            if patch.payment_currency.is_some() {
                row.payment_currency = patch.payment_currency.clone();
            }
        }

        let stall = self.stall_after_commit.lock().unwrap().remove(&table);
        if stall {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(UpdateOutcome::Applied)
    }

    async fn insert_payment_record(&self, record: &PaymentRecord) -> Result<()> {
        if *self.fail_payments.lock().unwrap() {
            bail!("relation \"payments\" does not exist");
        }
        let mut payments = self.payments.lock().unwrap();
        let duplicate = payments.iter().any(|p| {
            p.order_reference == record.order_reference
                && p.payment_reference == record.payment_reference
        });
        if !duplicate {
            payments.push(record.clone());
        }
        Ok(())
    }

    async fn order_state(&self, table: OrderTable, reference: &str) -> Result<Option<OrderState>> {
        Ok(self.row(table, reference).map(|r| OrderState {
            table,
            order_reference: reference.to_string(),
            status: r.status,
            payment_status: Some(r.payment_status),
            payment_amount: r.payment_amount,
            payment_currency: r.payment_currency,
            updated_at: None,
        }))
    }

    async fn payment_records(&self, reference: &str) -> Result<Vec<PaymentRecord>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.order_reference == reference)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> usize {
        self.sent().iter().filter(|e| e.to == to).count()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<EmailOutcome> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        if self.fail {
            bail!("smtp connection refused");
        }
        Ok(EmailOutcome::sent(self.name()))
    }
}

/// Notifier that panics on any send, to exercise the unhandled-error path.
pub struct PanickingNotifier;

#[async_trait::async_trait]
impl Notifier for PanickingNotifier {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn send_email(&self, _to: &str, _subject: &str, _html: &str) -> Result<EmailOutcome> {
        panic!("email client state corrupted");
    }
}

pub fn config() -> ReconcilerConfig {
    ReconcilerConfig {
        webhook_secret: SECRET.to_string(),
        signature_headers: default_signature_headers(),
        signed_payload: SignedPayload::Sanitized,
        dev_bypass: DevBypass::default(),
        admin_email: ADMIN.to_string(),
        debug_errors: false,
        store_retry: RetryPolicy {
            max_attempts: 2,
            base_backoff: Duration::from_millis(1),
            call_timeout: Duration::from_millis(500),
        },
        email_timeout: Duration::from_millis(500),
    }
}

pub fn reconciler(
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    config: ReconcilerConfig,
) -> WebhookReconciler {
    WebhookReconciler::new(store, notifier, config)
}

/// Signs `body` the same way the default config verifies it.
pub fn signed_headers(body: &[u8]) -> HeaderMap {
    let value: serde_json::Value = serde_json::from_slice(body).unwrap();
    let map = match value {
        serde_json::Value::Object(m) => m,
        _ => panic!("test bodies are objects"),
    };
    let sanitized = choptym_payments::sanitize::sanitize_object(map);
    let sig = signature::sign(SECRET, &serde_json::to_vec(&sanitized).unwrap()).unwrap();
    let mut headers = HeaderMap::new();
    headers.insert("x-fapshi-signature", HeaderValue::from_str(&sig).unwrap());
    headers
}

pub fn body(v: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&v).unwrap()
}
