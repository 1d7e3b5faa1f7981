use crate::domain::order::{OrderPatch, OrderState, OrderTable, PaymentRecord, UpdateOutcome};
use anyhow::Result;

/// Datastore collaborator the reconciler writes through.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    /// Applies `patch` to the row keyed by `reference`, unless that row is
    /// already in a terminal status.
    async fn update_order(
        &self,
        table: OrderTable,
        reference: &str,
        patch: &OrderPatch,
    ) -> Result<UpdateOutcome>;

    /// Logs a captured payment. A second record for the same order and
    /// payment reference is dropped.
    async fn insert_payment_record(&self, record: &PaymentRecord) -> Result<()>;

    async fn order_state(&self, table: OrderTable, reference: &str) -> Result<Option<OrderState>>;

    async fn payment_records(&self, reference: &str) -> Result<Vec<PaymentRecord>>;

    async fn ping(&self) -> Result<()>;
}
