//! Repository layer for database operations.
//!
//! `Repository` owns the pool and serves read queries. Writes go through a
//! `Store`, one SQLite transaction per handled event, so an event's mutations
//! become visible together or not at all.
//!
//! Accessor methods are organized across submodules by domain:
//! - `registry.rs` - funds, fees, policies, adapters and other referenced entities
//! - `payouts.rs` - fee payouts, individual payouts, fund and fee state
//! - `settings.rs` - fee settings and address-list settings
//! - `shares.rs` - shares requests, requestors and executors
//! - `events.rs` - immutable audit records
//! - `cursor.rs` - indexer resume position
//!
//! Every entity type follows the same contract: `ensure_*` loads or creates
//! with defaults and returns the stored row, `use_*` loads or fails with
//! [`StoreError::Missing`], `create_*` inserts a row known to be absent, and
//! `save_*` upserts.

mod cursor;
mod events;
mod payouts;
mod registry;
mod settings;
mod shares;

use crate::domain::Decimal;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use sqlx::Transaction as SqlxTransaction;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {key} not found")]
    Missing { entity: &'static str, key: String },
    #[error("corrupt {column} value: {value}")]
    Decode { column: &'static str, value: String },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn missing(entity: &'static str, key: &str) -> Self {
        StoreError::Missing {
            entity,
            key: key.to_string(),
        }
    }
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Open a write unit for one event.
    pub async fn begin(&self) -> Result<Store, sqlx::Error> {
        Ok(Store {
            tx: self.pool.begin().await?,
        })
    }

    /// Cheap liveness probe used by the readiness endpoint.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<Sqlite>, StoreError> {
        Ok(self.pool.acquire().await?)
    }
}

/// Transactional accessor scope for one event.
///
/// Dropping a `Store` without [`Store::commit`] rolls every write back.
pub struct Store {
    tx: SqlxTransaction<'static, Sqlite>,
}

impl Store {
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

// =========================================================================
// Column codecs
// =========================================================================

fn encode_list(list: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(list).map_err(|e| StoreError::Decode {
        column: "list",
        value: e.to_string(),
    })
}

fn decode_list(raw: &str, column: &'static str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(raw).map_err(|_| StoreError::Decode {
        column,
        value: raw.to_string(),
    })
}

fn decode_decimal(raw: &str, column: &'static str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(|_| StoreError::Decode {
        column,
        value: raw.to_string(),
    })
}

fn decode_parsed<T: FromStr>(raw: &str, column: &'static str) -> Result<T, StoreError> {
    raw.parse::<T>().map_err(|_| StoreError::Decode {
        column,
        value: raw.to_string(),
    })
}
