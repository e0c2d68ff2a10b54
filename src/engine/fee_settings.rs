//! Rate settings shared by every fee kind.

use super::EngineError;
use crate::db::Store;
use crate::domain::{union_dedup, Decimal, FeeSetting, Fee, Timestamp};

/// Store the rate a fund configured for `fee`.
///
/// The stored timestamp never moves backwards.
pub async fn apply_fee_rate(
    store: &mut Store,
    fund: &str,
    fee: &Fee,
    rate: Decimal,
    event_id: &str,
    timestamp: Timestamp,
) -> Result<FeeSetting, EngineError> {
    let mut setting = store.ensure_fee_setting(fund, &fee.id, timestamp).await?;
    setting.rate = rate;
    setting.events = union_dedup(&setting.events, &[event_id]);
    setting.timestamp = setting.timestamp.max(timestamp);
    store.save_fee_setting(&setting).await?;
    Ok(setting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_db;
    use crate::domain::FeeKind;
    use std::str::FromStr;

    fn fee() -> Fee {
        Fee {
            id: "0x00000000000000000000000000000000000000f1".to_string(),
            kind: FeeKind::Management,
            timestamp: Timestamp::new(0),
        }
    }

    #[tokio::test]
    async fn test_apply_fee_rate_overwrites_rate_and_merges_events() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();

        let rate = Decimal::from_str("0.01").unwrap();
        apply_fee_rate(&mut store, "f", &fee(), rate, "e1", Timestamp::new(10))
            .await
            .unwrap();
        let setting = apply_fee_rate(
            &mut store,
            "f",
            &fee(),
            Decimal::from_str("0.02").unwrap(),
            "e2",
            Timestamp::new(5),
        )
        .await
        .unwrap();

        assert_eq!(setting.rate, Decimal::from_str("0.02").unwrap());
        assert_eq!(setting.events, vec!["e1".to_string(), "e2".to_string()]);
        assert_eq!(setting.timestamp, Timestamp::new(10));
    }
}
