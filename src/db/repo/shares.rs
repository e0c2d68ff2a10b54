//! Shares requests and request executors.

use crate::domain::ids::{shares_request_executor_id, shares_request_id};
use crate::domain::{Address, SharesRequest, SharesRequestExecutor, Timestamp};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_decimal, Repository, Store, StoreError};

fn shares_request_from_row(row: &SqliteRow) -> Result<SharesRequest, StoreError> {
    let investment_amount: String = row.try_get("investment_amount")?;
    let min_shares_quantity: String = row.try_get("min_shares_quantity")?;
    Ok(SharesRequest {
        id: row.try_get("id")?,
        fund: row.try_get("fund")?,
        account: row.try_get("account")?,
        shares_requestor: row.try_get("shares_requestor")?,
        investment_amount: decode_decimal(&investment_amount, "shares_requests.investment_amount")?,
        min_shares_quantity: decode_decimal(
            &min_shares_quantity,
            "shares_requests.min_shares_quantity",
        )?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

fn executor_from_row(row: &SqliteRow) -> Result<SharesRequestExecutor, StoreError> {
    Ok(SharesRequestExecutor {
        id: row.try_get("id")?,
        shares_requestor: row.try_get("shares_requestor")?,
        account: row.try_get("account")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

impl Store {
    /// Store a pending request. A newer request by the same account replaces it.
    pub async fn save_shares_request(
        &mut self,
        request: &SharesRequest,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO shares_requests (
                id, fund, account, shares_requestor,
                investment_amount, min_shares_quantity, timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                shares_requestor = excluded.shares_requestor,
                investment_amount = excluded.investment_amount,
                min_shares_quantity = excluded.min_shares_quantity,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&request.id)
        .bind(&request.fund)
        .bind(&request.account)
        .bind(&request.shares_requestor)
        .bind(request.investment_amount.to_canonical_string())
        .bind(request.min_shares_quantity.to_canonical_string())
        .bind(request.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    pub async fn load_shares_request(
        &mut self,
        fund: &str,
        account: &Address,
    ) -> Result<Option<SharesRequest>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, fund, account, shares_requestor,
                investment_amount, min_shares_quantity, timestamp
            FROM shares_requests
            WHERE id = ?
            "#,
        )
        .bind(shares_request_id(fund, account))
        .fetch_optional(self.conn())
        .await?;
        row.as_ref().map(shares_request_from_row).transpose()
    }

    /// Remove the pending request of `account`. Returns whether one existed.
    pub async fn delete_shares_request(
        &mut self,
        fund: &str,
        account: &Address,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM shares_requests WHERE id = ?")
            .bind(shares_request_id(fund, account))
            .execute(self.conn())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn load_shares_request_executor(
        &mut self,
        requestor: &str,
        account: &Address,
    ) -> Result<Option<SharesRequestExecutor>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, shares_requestor, account, timestamp
            FROM shares_request_executors
            WHERE id = ?
            "#,
        )
        .bind(shares_request_executor_id(requestor, account))
        .fetch_optional(self.conn())
        .await?;
        row.as_ref().map(executor_from_row).transpose()
    }

    /// Resolve the executor, inserting it at `timestamp` if absent. An
    /// existing executor keeps its original timestamp.
    pub async fn ensure_shares_request_executor(
        &mut self,
        requestor: &str,
        account: &Address,
        timestamp: Timestamp,
    ) -> Result<SharesRequestExecutor, StoreError> {
        if let Some(existing) = self.load_shares_request_executor(requestor, account).await? {
            return Ok(existing);
        }

        let executor = SharesRequestExecutor {
            id: shares_request_executor_id(requestor, account),
            shares_requestor: requestor.to_string(),
            account: account.to_string(),
            timestamp,
        };
        sqlx::query(
            r#"
            INSERT INTO shares_request_executors (id, shares_requestor, account, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&executor.id)
        .bind(&executor.shares_requestor)
        .bind(&executor.account)
        .bind(executor.timestamp.as_i64())
        .execute(self.conn())
        .await?;

        Ok(executor)
    }

    pub async fn delete_shares_request_executor(
        &mut self,
        requestor: &str,
        account: &Address,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM shares_request_executors WHERE id = ?")
            .bind(shares_request_executor_id(requestor, account))
            .execute(self.conn())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Repository {
    /// Pending requests of a fund, oldest first.
    pub async fn list_shares_requests(&self, fund: &str) -> Result<Vec<SharesRequest>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, fund, account, shares_requestor,
                investment_amount, min_shares_quantity, timestamp
            FROM shares_requests
            WHERE fund = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(fund)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(shares_request_from_row).collect()
    }

    pub async fn list_shares_request_executors(
        &self,
        requestor: &str,
    ) -> Result<Vec<SharesRequestExecutor>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, shares_requestor, account, timestamp
            FROM shares_request_executors
            WHERE shares_requestor = ?
            ORDER BY account
            "#,
        )
        .bind(requestor)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(executor_from_row).collect()
    }
}
