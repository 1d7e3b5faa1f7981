use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tables that carry an `order_reference` the reconciler can update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTable {
    Orders,
    CustomOrders,
}

impl OrderTable {
    pub const ALL: [OrderTable; 2] = [OrderTable::Orders, OrderTable::CustomOrders];

    pub fn table_name(&self) -> &'static str {
        match self {
            OrderTable::Orders => "orders",
            OrderTable::CustomOrders => "custom_orders",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Delivering,
    Delivered,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "delivering" => Some(OrderStatus::Delivering),
            "delivered" => Some(OrderStatus::Delivered),
            "failed" => Some(OrderStatus::Failed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Once paid for or abandoned, a webhook may no longer move the order.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Whether an order sitting in this status already carries the outcome
    /// a webhook targeting `target` would have written. Fulfilment statuses
    /// only follow a confirmed payment.
    pub fn reflects(&self, target: &OrderStatus) -> bool {
        match target {
            OrderStatus::Confirmed => matches!(
                self,
                OrderStatus::Confirmed
                    | OrderStatus::Preparing
                    | OrderStatus::Delivering
                    | OrderStatus::Delivered
            ),
            other => self == other,
        }
    }

    /// Statuses the store must refuse to overwrite, as stored strings.
    pub fn terminal_names() -> Vec<String> {
        [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ]
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    Paid,
    Failed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Unpaid => "unpaid",
            PaymentState::Paid => "paid",
            PaymentState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPatch {
    pub status: OrderStatus,
    pub payment_status: PaymentState,
    pub payment_amount: Option<f64>,
    pub payment_currency: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl OrderPatch {
    pub fn paid(amount: f64, currency: &str) -> Self {
        Self {
            status: OrderStatus::Confirmed,
            payment_status: PaymentState::Paid,
            payment_amount: Some(amount),
            payment_currency: Some(currency.to_string()),
            updated_at: Utc::now(),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: OrderStatus::Failed,
            payment_status: PaymentState::Failed,
            payment_amount: None,
            payment_currency: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    Missing,
    Terminal(String),
}

/// How a status webhook relates to what the order tables already hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A row moved, or no table knows the reference.
    Fresh,
    /// Nothing moved and a row already carries this webhook's outcome.
    Replay,
    /// Nothing moved and a row was closed with a different outcome, held
    /// here as its stored status.
    Conflict(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderState {
    pub table: OrderTable,
    pub order_reference: String,
    pub status: String,
    pub payment_status: Option<String>,
    pub payment_amount: Option<f64>,
    pub payment_currency: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Append-only log row written to `payments` after a successful payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub order_reference: String,
    pub payment_reference: String,
    pub payment_method: String,
    pub payment_status: String,
    pub amount: f64,
    pub currency: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
}
