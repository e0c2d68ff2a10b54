//! Indexer resume position.

use crate::domain::EventCursor;
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

use super::{Repository, Store, StoreError};

async fn fetch_cursor(conn: &mut SqliteConnection) -> Result<Option<EventCursor>, StoreError> {
    let row = sqlx::query("SELECT block_number, log_index FROM indexer_cursor WHERE id = 1")
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let block_number: i64 = row.try_get("block_number")?;
            let log_index: i64 = row.try_get("log_index")?;
            Ok(Some(EventCursor::new(block_number as u64, log_index as u64)))
        }
        None => Ok(None),
    }
}

impl Store {
    /// Advance the cursor past `event_id`, in the same transaction as its effects.
    pub async fn store_cursor(
        &mut self,
        cursor: EventCursor,
        event_id: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO indexer_cursor (id, block_number, log_index, event_id, updated_at)
            VALUES (1, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                block_number = excluded.block_number,
                log_index = excluded.log_index,
                event_id = excluded.event_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(cursor.block_number as i64)
        .bind(cursor.log_index as i64)
        .bind(event_id)
        .bind(Utc::now().timestamp())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    pub async fn load_cursor(&mut self) -> Result<Option<EventCursor>, StoreError> {
        fetch_cursor(self.conn()).await
    }
}

impl Repository {
    pub async fn get_cursor(&self) -> Result<Option<EventCursor>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_cursor(&mut conn).await
    }
}
