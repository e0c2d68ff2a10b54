//! Append-only audit records.

use crate::domain::{AuditEvent, Timestamp};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{Repository, Store, StoreError};

fn audit_event_from_row(row: &SqliteRow) -> Result<AuditEvent, StoreError> {
    let payload: String = row.try_get("payload")?;
    Ok(AuditEvent {
        id: row.try_get("id")?,
        kind: row.try_get("kind")?,
        fund: row.try_get("fund")?,
        account: row.try_get("account")?,
        contract: row.try_get("contract")?,
        transaction: row.try_get("transaction_id")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
        payload: serde_json::from_str(&payload).map_err(|_| StoreError::Decode {
            column: "protocol_events.payload",
            value: payload.clone(),
        })?,
    })
}

impl Store {
    /// Record an event. Returns false if its id was already recorded, which
    /// means the event has been applied before.
    pub async fn insert_event(&mut self, event: &AuditEvent) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO protocol_events
                (id, kind, fund, account, contract, transaction_id, timestamp, payload, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&event.id)
        .bind(&event.kind)
        .bind(event.fund.as_deref())
        .bind(event.account.as_deref())
        .bind(&event.contract)
        .bind(&event.transaction)
        .bind(event.timestamp.as_i64())
        .bind(event.payload.to_string())
        .bind(Utc::now().timestamp())
        .execute(self.conn())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Repository {
    pub async fn get_event(&self, id: &str) -> Result<Option<AuditEvent>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, fund, account, contract, transaction_id, timestamp, payload
            FROM protocol_events
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(audit_event_from_row).transpose()
    }

    pub async fn count_events(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM protocol_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
