use crate::domain::order::{OrderPatch, OrderState, OrderStatus, OrderTable, PaymentRecord, UpdateOutcome};
use crate::repo::order_store::OrderStore;
use anyhow::Result;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct PgOrderStore {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl OrderStore for PgOrderStore {
    async fn update_order(
        &self,
        table: OrderTable,
        reference: &str,
        patch: &OrderPatch,
    ) -> Result<UpdateOutcome> {
        // Table names come from a closed enum, never from input.
        let sql = format!(
            r#"
            UPDATE {}
            SET status = $2,
                payment_status = $3,
                payment_amount = COALESCE($4, payment_amount),
                payment_currency = COALESCE($5, payment_currency),
                updated_at = $6
            WHERE order_reference = $1 AND NOT (status = ANY($7))
            "#,
            table.table_name()
        );

        let result = sqlx::query(&sql)
            .bind(reference)
            .bind(patch.status.as_str())
            .bind(patch.payment_status.as_str())
            .bind(patch.payment_amount)
            .bind(patch.payment_currency.clone())
            .bind(patch.updated_at)
            .bind(OrderStatus::terminal_names())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(UpdateOutcome::Applied);
        }

        let current: Option<String> = sqlx::query_scalar(&format!(
            "SELECT status FROM {} WHERE order_reference = $1 LIMIT 1",
            table.table_name()
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match current {
            Some(status) => UpdateOutcome::Terminal(status),
            None => UpdateOutcome::Missing,
        })
    }

    async fn insert_payment_record(&self, record: &PaymentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_reference, payment_reference, payment_method, payment_status,
                amount, currency, customer_name, customer_phone, customer_email, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_reference, payment_reference) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.order_reference)
        .bind(&record.payment_reference)
        .bind(&record.payment_method)
        .bind(&record.payment_status)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(record.customer_name.clone())
        .bind(record.customer_phone.clone())
        .bind(record.customer_email.clone())
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn order_state(&self, table: OrderTable, reference: &str) -> Result<Option<OrderState>> {
        let row = sqlx::query(&format!(
            "SELECT order_reference, status, payment_status, payment_amount, payment_currency, updated_at FROM {} WHERE order_reference = $1 LIMIT 1",
            table.table_name()
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| OrderState {
            table,
            order_reference: r.get("order_reference"),
            status: r.get("status"),
            payment_status: r.get("payment_status"),
            payment_amount: r.get("payment_amount"),
            payment_currency: r.get("payment_currency"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn payment_records(&self, reference: &str) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_reference, payment_reference, payment_method, payment_status,
                   amount, currency, customer_name, customer_phone, customer_email, created_at
            FROM payments
            WHERE order_reference = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PaymentRecord {
                id: r.get("id"),
                order_reference: r.get("order_reference"),
                payment_reference: r.get("payment_reference"),
                payment_method: r.get("payment_method"),
                payment_status: r.get("payment_status"),
                amount: r.get("amount"),
                currency: r.get("currency"),
                customer_name: r.get("customer_name"),
                customer_phone: r.get("customer_phone"),
                customer_email: r.get("customer_email"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
