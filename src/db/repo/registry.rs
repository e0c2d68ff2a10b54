//! Accessors for funds and the entities they reference.

use crate::domain::{
    Account, Address, Asset, ComptrollerProxy, Contract, EventMeta, Fee, Fund, IntegrationAdapter,
    Policy, SharesRequestor, Timestamp, Transaction,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{decode_parsed, Repository, Store, StoreError};

fn account_from_row(row: &SqliteRow) -> Result<Account, StoreError> {
    Ok(Account {
        id: row.try_get("id")?,
        manager: row.try_get("manager")?,
        first_seen: Timestamp::new(row.try_get("first_seen")?),
    })
}

fn fund_from_row(row: &SqliteRow) -> Result<Fund, StoreError> {
    Ok(Fund {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        manager: row.try_get("manager")?,
        accessor: row.try_get("accessor")?,
        denomination_asset: row.try_get("denomination_asset")?,
        fee_payout: row.try_get("fee_payout")?,
        inception: Timestamp::new(row.try_get("inception")?),
    })
}

fn fee_from_row(row: &SqliteRow) -> Result<Fee, StoreError> {
    let kind: String = row.try_get("kind")?;
    Ok(Fee {
        id: row.try_get("id")?,
        kind: decode_parsed(&kind, "fees.kind")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

fn policy_from_row(row: &SqliteRow) -> Result<Policy, StoreError> {
    let kind: String = row.try_get("kind")?;
    Ok(Policy {
        id: row.try_get("id")?,
        kind: decode_parsed(&kind, "policies.kind")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

async fn fetch_account(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Account>, StoreError> {
    let row = sqlx::query("SELECT id, manager, first_seen FROM accounts WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(account_from_row).transpose()
}

pub(super) async fn fetch_fund(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Fund>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, name, manager, accessor, denomination_asset, fee_payout, inception
        FROM funds
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(fund_from_row).transpose()
}

impl Store {
    // =========================================================================
    // Accounts and transactions
    // =========================================================================

    pub async fn ensure_account(
        &mut self,
        address: &Address,
        timestamp: Timestamp,
    ) -> Result<Account, StoreError> {
        if let Some(account) = fetch_account(self.conn(), address.as_str()).await? {
            return Ok(account);
        }

        let account = Account {
            id: address.to_string(),
            manager: false,
            first_seen: timestamp,
        };
        self.save_account(&account).await?;
        Ok(account)
    }

    /// Ensure the account and flag it as a fund manager.
    pub async fn ensure_manager(
        &mut self,
        address: &Address,
        timestamp: Timestamp,
    ) -> Result<Account, StoreError> {
        let mut account = self.ensure_account(address, timestamp).await?;
        if !account.manager {
            account.manager = true;
            self.save_account(&account).await?;
        }
        Ok(account)
    }

    pub async fn use_account(&mut self, address: &Address) -> Result<Account, StoreError> {
        fetch_account(self.conn(), address.as_str())
            .await?
            .ok_or_else(|| StoreError::missing("Account", address.as_str()))
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, manager, first_seen)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET manager = excluded.manager
            "#,
        )
        .bind(&account.id)
        .bind(account.manager)
        .bind(account.first_seen.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    pub async fn ensure_transaction(
        &mut self,
        meta: &EventMeta,
    ) -> Result<Transaction, StoreError> {
        let transaction = Transaction {
            id: meta.tx_hash.to_lowercase(),
            block_number: meta.block_number as i64,
            timestamp: meta.timestamp,
            from: meta.from.to_string(),
        };

        sqlx::query(
            r#"
            INSERT INTO transactions (id, block_number, timestamp, from_address)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&transaction.id)
        .bind(transaction.block_number)
        .bind(transaction.timestamp.as_i64())
        .bind(&transaction.from)
        .execute(self.conn())
        .await?;

        Ok(transaction)
    }

    pub async fn ensure_contract(
        &mut self,
        address: &Address,
        name: &str,
        timestamp: Timestamp,
    ) -> Result<Contract, StoreError> {
        let row = sqlx::query("SELECT id, name, timestamp FROM contracts WHERE id = ?")
            .bind(address.as_str())
            .fetch_optional(self.conn())
            .await?;

        if let Some(row) = row {
            return Ok(Contract {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                timestamp: Timestamp::new(row.try_get("timestamp")?),
            });
        }

        let contract = Contract {
            id: address.to_string(),
            name: name.to_string(),
            timestamp,
        };
        sqlx::query("INSERT INTO contracts (id, name, timestamp) VALUES (?, ?, ?)")
            .bind(&contract.id)
            .bind(&contract.name)
            .bind(contract.timestamp.as_i64())
            .execute(self.conn())
            .await?;
        Ok(contract)
    }

    // =========================================================================
    // Assets
    // =========================================================================

    pub async fn load_asset(&mut self, address: &Address) -> Result<Option<Asset>, StoreError> {
        let row = sqlx::query("SELECT id, decimals FROM assets WHERE id = ?")
            .bind(address.as_str())
            .fetch_optional(self.conn())
            .await?;

        row.map(|row| -> Result<Asset, StoreError> {
            let decimals: i64 = row.try_get("decimals")?;
            Ok(Asset {
                id: row.try_get("id")?,
                decimals: u32::try_from(decimals).map_err(|_| StoreError::Decode {
                    column: "assets.decimals",
                    value: decimals.to_string(),
                })?,
            })
        })
        .transpose()
    }

    pub async fn ensure_asset(
        &mut self,
        address: &Address,
        decimals: u32,
    ) -> Result<Asset, StoreError> {
        if let Some(asset) = self.load_asset(address).await? {
            return Ok(asset);
        }

        let asset = Asset {
            id: address.to_string(),
            decimals,
        };
        sqlx::query("INSERT INTO assets (id, decimals) VALUES (?, ?)")
            .bind(&asset.id)
            .bind(i64::from(asset.decimals))
            .execute(self.conn())
            .await?;
        Ok(asset)
    }

    // =========================================================================
    // Funds and comptroller proxies
    // =========================================================================

    pub async fn load_fund(&mut self, id: &str) -> Result<Option<Fund>, StoreError> {
        fetch_fund(self.conn(), id).await
    }

    /// Load the fund or create a bare one fronted by `accessor`.
    ///
    /// Configuration events can precede the deployment event, so whichever
    /// handler observes the fund first creates it.
    pub async fn ensure_fund(
        &mut self,
        id: &str,
        accessor: &Address,
        timestamp: Timestamp,
    ) -> Result<Fund, StoreError> {
        if let Some(fund) = self.load_fund(id).await? {
            return Ok(fund);
        }

        let fund = Fund {
            id: id.to_string(),
            name: None,
            manager: None,
            accessor: accessor.to_string(),
            denomination_asset: None,
            fee_payout: None,
            inception: timestamp,
        };
        self.save_fund(&fund).await?;
        Ok(fund)
    }

    pub async fn use_fund(&mut self, id: &str) -> Result<Fund, StoreError> {
        self.load_fund(id)
            .await?
            .ok_or_else(|| StoreError::missing("Fund", id))
    }

    pub async fn save_fund(&mut self, fund: &Fund) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO funds
                (id, name, manager, accessor, denomination_asset, fee_payout, inception)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                manager = excluded.manager,
                accessor = excluded.accessor,
                denomination_asset = excluded.denomination_asset,
                fee_payout = excluded.fee_payout
            "#,
        )
        .bind(&fund.id)
        .bind(fund.name.as_deref())
        .bind(fund.manager.as_deref())
        .bind(&fund.accessor)
        .bind(fund.denomination_asset.as_deref())
        .bind(fund.fee_payout.as_deref())
        .bind(fund.inception.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    pub async fn load_comptroller_proxy(
        &mut self,
        address: &Address,
    ) -> Result<Option<ComptrollerProxy>, StoreError> {
        let row = sqlx::query(
            "SELECT id, fund, denomination_asset, timestamp FROM comptroller_proxies WHERE id = ?",
        )
        .bind(address.as_str())
        .fetch_optional(self.conn())
        .await?;

        row.map(|row| -> Result<ComptrollerProxy, StoreError> {
            Ok(ComptrollerProxy {
                id: row.try_get("id")?,
                fund: row.try_get("fund")?,
                denomination_asset: row.try_get("denomination_asset")?,
                timestamp: Timestamp::new(row.try_get("timestamp")?),
            })
        })
        .transpose()
    }

    pub async fn ensure_comptroller_proxy(
        &mut self,
        address: &Address,
        fund: &str,
        denomination_asset: &Address,
        timestamp: Timestamp,
    ) -> Result<ComptrollerProxy, StoreError> {
        if let Some(proxy) = self.load_comptroller_proxy(address).await? {
            return Ok(proxy);
        }

        let proxy = ComptrollerProxy {
            id: address.to_string(),
            fund: fund.to_string(),
            denomination_asset: denomination_asset.to_string(),
            timestamp,
        };
        sqlx::query(
            r#"
            INSERT INTO comptroller_proxies (id, fund, denomination_asset, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&proxy.id)
        .bind(&proxy.fund)
        .bind(&proxy.denomination_asset)
        .bind(proxy.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(proxy)
    }

    // =========================================================================
    // Fees, policies and adapters
    // =========================================================================

    /// Register a fee contract. Re-registration replaces its kind.
    pub async fn save_fee(&mut self, fee: &Fee) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fees (id, kind, timestamp) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET kind = excluded.kind
            "#,
        )
        .bind(&fee.id)
        .bind(fee.kind.as_str())
        .bind(fee.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    pub async fn use_fee(&mut self, address: &Address) -> Result<Fee, StoreError> {
        let row = sqlx::query("SELECT id, kind, timestamp FROM fees WHERE id = ?")
            .bind(address.as_str())
            .fetch_optional(self.conn())
            .await?;
        match row {
            Some(row) => fee_from_row(&row),
            None => Err(StoreError::missing("Fee", address.as_str())),
        }
    }

    pub async fn save_policy(&mut self, policy: &Policy) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO policies (id, kind, timestamp) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET kind = excluded.kind
            "#,
        )
        .bind(&policy.id)
        .bind(policy.kind.as_str())
        .bind(policy.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    pub async fn use_policy(&mut self, address: &Address) -> Result<Policy, StoreError> {
        let row = sqlx::query("SELECT id, kind, timestamp FROM policies WHERE id = ?")
            .bind(address.as_str())
            .fetch_optional(self.conn())
            .await?;
        match row {
            Some(row) => policy_from_row(&row),
            None => Err(StoreError::missing("Policy", address.as_str())),
        }
    }

    pub async fn save_integration_adapter(
        &mut self,
        adapter: &IntegrationAdapter,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO integration_adapters (id, identifier, timestamp) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET identifier = excluded.identifier
            "#,
        )
        .bind(&adapter.id)
        .bind(&adapter.identifier)
        .bind(adapter.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    /// Resolve each address to its registered adapter, if any, in input order.
    pub async fn load_integration_adapters(
        &mut self,
        addresses: &[Address],
    ) -> Result<Vec<IntegrationAdapter>, StoreError> {
        let mut adapters = Vec::new();
        for address in addresses {
            let row = sqlx::query(
                "SELECT id, identifier, timestamp FROM integration_adapters WHERE id = ?",
            )
            .bind(address.as_str())
            .fetch_optional(self.conn())
            .await?;

            if let Some(row) = row {
                adapters.push(IntegrationAdapter {
                    id: row.try_get("id")?,
                    identifier: row.try_get("identifier")?,
                    timestamp: Timestamp::new(row.try_get("timestamp")?),
                });
            }
        }
        Ok(adapters)
    }

    pub async fn ensure_shares_requestor(
        &mut self,
        address: &Address,
        fund: &str,
    ) -> Result<SharesRequestor, StoreError> {
        sqlx::query(
            "INSERT INTO shares_requestors (id, fund) VALUES (?, ?) ON CONFLICT(id) DO NOTHING",
        )
        .bind(address.as_str())
        .bind(fund)
        .execute(self.conn())
        .await?;

        let row = sqlx::query("SELECT id, fund FROM shares_requestors WHERE id = ?")
            .bind(address.as_str())
            .fetch_one(self.conn())
            .await?;
        Ok(SharesRequestor {
            id: row.try_get("id")?,
            fund: row.try_get("fund")?,
        })
    }
}

impl Repository {
    pub async fn get_fund(&self, id: &str) -> Result<Option<Fund>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_fund(&mut conn, id).await
    }
}
