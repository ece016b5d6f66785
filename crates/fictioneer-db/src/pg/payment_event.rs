//! PostgreSQL payment event repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repo::{PaymentEventRepository, ProcessedPaymentEvent};

/// PostgreSQL payment event repository
#[derive(Clone)]
pub struct PgPaymentEventRepository {
    pool: PgPool,
}

impl PgPaymentEventRepository {
    /// Create a new payment event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentEventRepository for PgPaymentEventRepository {
    async fn mark_processed(&self, event: ProcessedPaymentEvent) -> DbResult<bool> {
        // Insert-if-absent on the event id primary key. A duplicate delivery
        // affects zero rows, which the caller treats as "already applied".
        let result = sqlx::query(
            r#"
            INSERT INTO processed_payment_events (event_id, user_id, kind, credits_granted)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&event.event_id)
        .bind(event.user_id)
        .bind(&event.kind)
        .bind(event.credits_granted)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_processed(&self, event_id: &str) -> DbResult<bool> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT event_id FROM processed_payment_events WHERE event_id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some())
    }

    async fn record_failure(&self, event_id: &str, detail: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_failures (id, event_id, detail)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
