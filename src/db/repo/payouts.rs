//! Fee payout, individual payout, fund state and fee state accessors.

use crate::domain::ids::{fee_payout_id, fee_state_id, fund_state_id};
use crate::domain::{
    union_dedup, Decimal, FeePayout, FeeState, Fund, FundState, IndividualPayout, PayoutKind,
    Timestamp,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{
    decode_decimal, decode_list, decode_parsed, encode_list, Repository, Store, StoreError,
};

fn fee_payout_from_row(row: &SqliteRow) -> Result<FeePayout, StoreError> {
    let shares: String = row.try_get("shares")?;
    let individual_payouts: String = row.try_get("individual_payouts")?;
    let events: String = row.try_get("events")?;
    Ok(FeePayout {
        id: row.try_get("id")?,
        fund: row.try_get("fund")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
        shares: decode_decimal(&shares, "fee_payouts.shares")?,
        individual_payouts: decode_list(&individual_payouts, "fee_payouts.individual_payouts")?,
        events: decode_list(&events, "fee_payouts.events")?,
    })
}

fn individual_payout_from_row(row: &SqliteRow) -> Result<IndividualPayout, StoreError> {
    let kind: String = row.try_get("kind")?;
    let shares: String = row.try_get("shares")?;
    Ok(IndividualPayout {
        id: row.try_get("id")?,
        kind: decode_parsed(&kind, "individual_payouts.kind")?,
        fund: row.try_get("fund")?,
        fee: row.try_get("fee")?,
        fee_payout: row.try_get("fee_payout")?,
        shares: decode_decimal(&shares, "individual_payouts.shares")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
        event: row.try_get("event")?,
    })
}

fn fund_state_from_row(row: &SqliteRow) -> Result<FundState, StoreError> {
    let events: String = row.try_get("events")?;
    Ok(FundState {
        id: row.try_get("id")?,
        fund: row.try_get("fund")?,
        fee_payout: row.try_get("fee_payout")?,
        events: decode_list(&events, "fund_states.events")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

fn fee_state_from_row(row: &SqliteRow) -> Result<FeeState, StoreError> {
    let events: String = row.try_get("events")?;
    let last_settled: Option<i64> = row.try_get("last_settled")?;
    Ok(FeeState {
        id: row.try_get("id")?,
        fund: row.try_get("fund")?,
        fee: row.try_get("fee")?,
        last_settled: last_settled.map(Timestamp::new),
        events: decode_list(&events, "fee_states.events")?,
    })
}

async fn fetch_fee_payout(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<FeePayout>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, fund, timestamp, shares, individual_payouts, events
        FROM fee_payouts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(fee_payout_from_row).transpose()
}

async fn fetch_individual_payouts(
    conn: &mut SqliteConnection,
    fee_payout: &str,
) -> Result<Vec<IndividualPayout>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, kind, fund, fee, fee_payout, shares, timestamp, event
        FROM individual_payouts
        WHERE fee_payout = ?
        ORDER BY timestamp ASC, rowid ASC
        "#,
    )
    .bind(fee_payout)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(individual_payout_from_row).collect()
}

async fn fetch_fund_state(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<FundState>, StoreError> {
    let row = sqlx::query(
        "SELECT id, fund, fee_payout, events, timestamp FROM fund_states WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(fund_state_from_row).transpose()
}

impl Store {
    // =========================================================================
    // Fee payouts
    // =========================================================================

    pub async fn load_fee_payout(&mut self, id: &str) -> Result<Option<FeePayout>, StoreError> {
        fetch_fee_payout(self.conn(), id).await
    }

    pub async fn use_fee_payout(&mut self, id: &str) -> Result<FeePayout, StoreError> {
        self.load_fee_payout(id)
            .await?
            .ok_or_else(|| StoreError::missing("FeePayout", id))
    }

    /// Insert a new payout row for (fund, timestamp) with zero shares.
    ///
    /// The caller has established that no payout exists for that key; an
    /// existing row makes the insert fail.
    pub async fn create_fee_payout(
        &mut self,
        individual_payouts: Vec<String>,
        fund: &Fund,
        timestamp: Timestamp,
        cause: Option<&str>,
    ) -> Result<FeePayout, StoreError> {
        let payout = FeePayout {
            id: fee_payout_id(&fund.id, timestamp),
            fund: fund.id.clone(),
            timestamp,
            shares: Decimal::zero(),
            individual_payouts,
            events: cause.map(|c| vec![c.to_string()]).unwrap_or_default(),
        };

        sqlx::query(
            r#"
            INSERT INTO fee_payouts (id, fund, timestamp, shares, individual_payouts, events)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payout.id)
        .bind(&payout.fund)
        .bind(payout.timestamp.as_i64())
        .bind(payout.shares.to_canonical_string())
        .bind(encode_list(&payout.individual_payouts)?)
        .bind(encode_list(&payout.events)?)
        .execute(self.conn())
        .await?;

        Ok(payout)
    }

    /// Resolve the payout for (fund, timestamp), merging `cause` into its
    /// events when it already exists.
    pub async fn ensure_fee_payout(
        &mut self,
        fund: &Fund,
        timestamp: Timestamp,
        cause: &str,
    ) -> Result<FeePayout, StoreError> {
        let id = fee_payout_id(&fund.id, timestamp);
        match self.load_fee_payout(&id).await? {
            None => self.create_fee_payout(Vec::new(), fund, timestamp, Some(cause)).await,
            Some(mut payout) => {
                payout.events = union_dedup(&payout.events, &[cause]);
                self.save_fee_payout(&payout).await?;
                Ok(payout)
            }
        }
    }

    pub async fn save_fee_payout(&mut self, payout: &FeePayout) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE fee_payouts
            SET shares = ?, individual_payouts = ?, events = ?
            WHERE id = ?
            "#,
        )
        .bind(payout.shares.to_canonical_string())
        .bind(encode_list(&payout.individual_payouts)?)
        .bind(encode_list(&payout.events)?)
        .bind(&payout.id)
        .execute(self.conn())
        .await?;
        Ok(())
    }

    // =========================================================================
    // Individual payouts
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn ensure_individual_payout(
        &mut self,
        id: &str,
        kind: PayoutKind,
        fund: &str,
        fee: &str,
        fee_payout: &str,
        shares: Decimal,
        timestamp: Timestamp,
        event: &str,
    ) -> Result<IndividualPayout, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, fund, fee, fee_payout, shares, timestamp, event
            FROM individual_payouts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.conn())
        .await?;

        if let Some(row) = row {
            return individual_payout_from_row(&row);
        }

        let payout = IndividualPayout {
            id: id.to_string(),
            kind,
            fund: fund.to_string(),
            fee: fee.to_string(),
            fee_payout: fee_payout.to_string(),
            shares,
            timestamp,
            event: event.to_string(),
        };

        sqlx::query(
            r#"
            INSERT INTO individual_payouts
                (id, kind, fund, fee, fee_payout, shares, timestamp, event)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payout.id)
        .bind(payout.kind.as_str())
        .bind(&payout.fund)
        .bind(&payout.fee)
        .bind(&payout.fee_payout)
        .bind(payout.shares.to_canonical_string())
        .bind(payout.timestamp.as_i64())
        .bind(&payout.event)
        .execute(self.conn())
        .await?;

        Ok(payout)
    }

    pub async fn list_individual_payouts(
        &mut self,
        fee_payout: &str,
    ) -> Result<Vec<IndividualPayout>, StoreError> {
        fetch_individual_payouts(self.conn(), fee_payout).await
    }

    // =========================================================================
    // Fund state
    // =========================================================================

    pub async fn ensure_fund_state(
        &mut self,
        fund: &Fund,
        timestamp: Timestamp,
    ) -> Result<FundState, StoreError> {
        let id = fund_state_id(&fund.id);
        if let Some(state) = fetch_fund_state(self.conn(), &id).await? {
            return Ok(state);
        }

        let state = FundState {
            id,
            fund: fund.id.clone(),
            fee_payout: None,
            events: Vec::new(),
            timestamp,
        };
        self.save_fund_state(&state).await?;
        Ok(state)
    }

    pub async fn use_fund_state(&mut self, fund: &str) -> Result<FundState, StoreError> {
        let id = fund_state_id(fund);
        fetch_fund_state(self.conn(), &id)
            .await?
            .ok_or_else(|| StoreError::missing("FundState", &id))
    }

    pub async fn save_fund_state(&mut self, state: &FundState) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fund_states (id, fund, fee_payout, events, timestamp)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                fee_payout = excluded.fee_payout,
                events = excluded.events,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&state.id)
        .bind(&state.fund)
        .bind(state.fee_payout.as_deref())
        .bind(encode_list(&state.events)?)
        .bind(state.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    // =========================================================================
    // Fee state
    // =========================================================================

    pub async fn ensure_fee_state(
        &mut self,
        fund: &str,
        fee: &str,
    ) -> Result<FeeState, StoreError> {
        let id = fee_state_id(fund, fee);
        if let Some(state) = self.load_fee_state(&id).await? {
            return Ok(state);
        }

        let state = FeeState {
            id,
            fund: fund.to_string(),
            fee: fee.to_string(),
            last_settled: None,
            events: Vec::new(),
        };
        self.save_fee_state(&state).await?;
        Ok(state)
    }

    pub async fn use_fee_state(&mut self, id: &str) -> Result<FeeState, StoreError> {
        self.load_fee_state(id)
            .await?
            .ok_or_else(|| StoreError::missing("FeeState", id))
    }

    async fn load_fee_state(&mut self, id: &str) -> Result<Option<FeeState>, StoreError> {
        let row =
            sqlx::query("SELECT id, fund, fee, last_settled, events FROM fee_states WHERE id = ?")
                .bind(id)
                .fetch_optional(self.conn())
                .await?;
        row.as_ref().map(fee_state_from_row).transpose()
    }

    pub async fn save_fee_state(&mut self, state: &FeeState) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fee_states (id, fund, fee, last_settled, events)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                last_settled = excluded.last_settled,
                events = excluded.events
            "#,
        )
        .bind(&state.id)
        .bind(&state.fund)
        .bind(&state.fee)
        .bind(state.last_settled.map(|t| t.as_i64()))
        .bind(encode_list(&state.events)?)
        .execute(self.conn())
        .await?;
        Ok(())
    }
}

impl Repository {
    pub async fn get_fee_payout(&self, id: &str) -> Result<Option<FeePayout>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_fee_payout(&mut conn, id).await
    }

    pub async fn get_individual_payouts(
        &self,
        fee_payout: &str,
    ) -> Result<Vec<IndividualPayout>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_individual_payouts(&mut conn, fee_payout).await
    }

    /// Payouts of a fund, newest first.
    pub async fn list_fee_payouts(&self, fund: &str) -> Result<Vec<FeePayout>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, fund, timestamp, shares, individual_payouts, events
            FROM fee_payouts
            WHERE fund = ?
            ORDER BY timestamp DESC, id ASC
            "#,
        )
        .bind(fund)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(fee_payout_from_row).collect()
    }

    pub async fn get_fund_state(&self, fund: &str) -> Result<Option<FundState>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_fund_state(&mut conn, &fund_state_id(fund)).await
    }
}
