//! Fee settings and address-list settings.

use crate::domain::ids::{address_list_setting_id, fee_setting_id};
use crate::domain::{AddressListSetting, Decimal, FeeSetting, Policy, Timestamp};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{
    decode_decimal, decode_list, decode_parsed, encode_list, Repository, Store, StoreError,
};

fn fee_setting_from_row(row: &SqliteRow) -> Result<FeeSetting, StoreError> {
    let rate: String = row.try_get("rate")?;
    let events: String = row.try_get("events")?;
    Ok(FeeSetting {
        id: row.try_get("id")?,
        fund: row.try_get("fund")?,
        fee: row.try_get("fee")?,
        rate: decode_decimal(&rate, "fee_settings.rate")?,
        events: decode_list(&events, "fee_settings.events")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

fn address_list_setting_from_row(row: &SqliteRow) -> Result<AddressListSetting, StoreError> {
    let kind: String = row.try_get("kind")?;
    let listed: String = row.try_get("listed")?;
    let adapters: String = row.try_get("adapters")?;
    let events: String = row.try_get("events")?;
    Ok(AddressListSetting {
        id: row.try_get("id")?,
        fund: row.try_get("fund")?,
        policy: row.try_get("policy")?,
        kind: decode_parsed(&kind, "address_list_settings.kind")?,
        listed: decode_list(&listed, "address_list_settings.listed")?,
        adapters: decode_list(&adapters, "address_list_settings.adapters")?,
        events: decode_list(&events, "address_list_settings.events")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

async fn fetch_fee_setting(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<FeeSetting>, StoreError> {
    let row = sqlx::query(
        "SELECT id, fund, fee, rate, events, timestamp FROM fee_settings WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(fee_setting_from_row).transpose()
}

async fn fetch_address_list_setting(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<AddressListSetting>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, fund, policy, kind, listed, adapters, events, timestamp
        FROM address_list_settings
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(address_list_setting_from_row).transpose()
}

impl Store {
    /// Load the setting of `fee` in `fund`, or a fresh one with zero rate.
    pub async fn ensure_fee_setting(
        &mut self,
        fund: &str,
        fee: &str,
        timestamp: Timestamp,
    ) -> Result<FeeSetting, StoreError> {
        let id = fee_setting_id(fund, fee);
        if let Some(setting) = fetch_fee_setting(self.conn(), &id).await? {
            return Ok(setting);
        }

        Ok(FeeSetting {
            id,
            fund: fund.to_string(),
            fee: fee.to_string(),
            rate: Decimal::zero(),
            events: Vec::new(),
            timestamp,
        })
    }

    pub async fn save_fee_setting(&mut self, setting: &FeeSetting) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fee_settings (id, fund, fee, rate, events, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                rate = excluded.rate,
                events = excluded.events,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&setting.id)
        .bind(&setting.fund)
        .bind(&setting.fee)
        .bind(setting.rate.to_canonical_string())
        .bind(encode_list(&setting.events)?)
        .bind(setting.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }

    /// Load the list kept by `policy` for `fund`, or an empty one.
    ///
    /// A fresh setting is not persisted until [`Store::save_address_list_setting`].
    pub async fn ensure_address_list_setting(
        &mut self,
        fund: &str,
        policy: &Policy,
        timestamp: Timestamp,
    ) -> Result<AddressListSetting, StoreError> {
        let id = address_list_setting_id(fund, &policy.id);
        if let Some(setting) = fetch_address_list_setting(self.conn(), &id).await? {
            return Ok(setting);
        }

        Ok(AddressListSetting {
            id,
            fund: fund.to_string(),
            policy: policy.id.clone(),
            kind: policy.kind,
            listed: Vec::new(),
            adapters: Vec::new(),
            events: Vec::new(),
            timestamp,
        })
    }

    pub async fn use_address_list_setting(
        &mut self,
        fund: &str,
        policy: &str,
    ) -> Result<AddressListSetting, StoreError> {
        let id = address_list_setting_id(fund, policy);
        fetch_address_list_setting(self.conn(), &id)
            .await?
            .ok_or_else(|| StoreError::missing("AddressListSetting", &id))
    }

    pub async fn save_address_list_setting(
        &mut self,
        setting: &AddressListSetting,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO address_list_settings
                (id, fund, policy, kind, listed, adapters, events, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                listed = excluded.listed,
                adapters = excluded.adapters,
                events = excluded.events,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&setting.id)
        .bind(&setting.fund)
        .bind(&setting.policy)
        .bind(setting.kind.as_str())
        .bind(encode_list(&setting.listed)?)
        .bind(encode_list(&setting.adapters)?)
        .bind(encode_list(&setting.events)?)
        .bind(setting.timestamp.as_i64())
        .execute(self.conn())
        .await?;
        Ok(())
    }
}

impl Repository {
    pub async fn list_fee_settings(&self, fund: &str) -> Result<Vec<FeeSetting>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, fund, fee, rate, events, timestamp
            FROM fee_settings
            WHERE fund = ?
            ORDER BY fee
            "#,
        )
        .bind(fund)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(fee_setting_from_row).collect()
    }

    pub async fn list_address_list_settings(
        &self,
        fund: &str,
    ) -> Result<Vec<AddressListSetting>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, fund, policy, kind, listed, adapters, events, timestamp
            FROM address_list_settings
            WHERE fund = ?
            ORDER BY policy
            "#,
        )
        .bind(fund)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(address_list_setting_from_row).collect()
    }

    pub async fn get_address_list_setting(
        &self,
        fund: &str,
        policy: &str,
    ) -> Result<Option<AddressListSetting>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_address_list_setting(&mut conn, &address_list_setting_id(fund, policy)).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_db;
    use super::*;
    use crate::domain::PolicyKind;
    use std::str::FromStr;

    fn policy() -> Policy {
        Policy {
            id: "0x00000000000000000000000000000000000000aa".to_string(),
            kind: PolicyKind::AdapterBlacklist,
            timestamp: Timestamp::new(1),
        }
    }

    #[tokio::test]
    async fn test_ensure_fee_setting_defaults_without_persisting() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();

        let setting = store
            .ensure_fee_setting("f", "fee", Timestamp::new(7))
            .await
            .unwrap();
        assert!(setting.rate.is_zero());
        assert_eq!(setting.id, "f/fee");
        store.commit().await.unwrap();

        assert!(repo.list_fee_settings("f").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fee_setting_save_and_reload() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();

        let mut setting = store
            .ensure_fee_setting("f", "fee", Timestamp::new(7))
            .await
            .unwrap();
        setting.rate = Decimal::from_str("0.02").unwrap();
        setting.events = vec!["0xaa/0".to_string()];
        store.save_fee_setting(&setting).await.unwrap();

        let reloaded = store
            .ensure_fee_setting("f", "fee", Timestamp::new(99))
            .await
            .unwrap();
        assert_eq!(reloaded, setting);
        store.commit().await.unwrap();

        assert_eq!(repo.list_fee_settings("f").await.unwrap(), vec![setting]);
    }

    #[tokio::test]
    async fn test_address_list_setting_lifecycle() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();
        let policy = policy();

        assert!(matches!(
            store.use_address_list_setting("f", &policy.id).await,
            Err(StoreError::Missing { entity: "AddressListSetting", .. })
        ));

        let mut setting = store
            .ensure_address_list_setting("f", &policy, Timestamp::new(3))
            .await
            .unwrap();
        assert_eq!(setting.kind, PolicyKind::AdapterBlacklist);
        setting.listed = vec!["a".to_string(), "b".to_string()];
        store.save_address_list_setting(&setting).await.unwrap();

        let used = store.use_address_list_setting("f", &policy.id).await.unwrap();
        assert_eq!(used.listed, setting.listed);
        store.commit().await.unwrap();

        let fetched = repo
            .get_address_list_setting("f", &policy.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, setting);
        assert_eq!(repo.list_address_list_settings("f").await.unwrap().len(), 1);
    }
}
