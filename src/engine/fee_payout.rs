//! Fee settlement rollup into FeePayout, FundState and FeeState.
//!
//! Every settlement at the same block timestamp lands in one FeePayout per
//! fund. The payout's `shares` is kept equal to the sum of its individual
//! payouts, its `events` record every settlement that touched it, and the
//! fund plus its State always point at the newest payout.

use super::EngineError;
use crate::db::Store;
use crate::domain::ids::{fee_state_id, individual_payout_id};
use crate::domain::{
    union_dedup, Decimal, EventMeta, Fee, FeeKind, FeePayout, Fund, PayoutKind,
};
use tracing::debug;

/// Roll one settlement of `fee` into the fund's payout for the event's timestamp.
///
/// `cause` is the id of the audit record of the settlement.
pub async fn track_fee_state(
    store: &mut Store,
    fund: &mut Fund,
    fee: &Fee,
    shares: Decimal,
    meta: &EventMeta,
    cause: &str,
) -> Result<FeePayout, EngineError> {
    let mut payout = store.ensure_fee_payout(fund, meta.timestamp, cause).await?;
    payout.shares += shares.clone();

    let contribution = match fee.kind {
        FeeKind::Management => Some(PayoutKind::Management),
        FeeKind::Performance => Some(PayoutKind::Performance),
        // Entrance fees settle into the fund's share supply directly and
        // carry no individual payout.
        FeeKind::EntranceRateBurn | FeeKind::EntranceRateDirect => None,
    };

    if let Some(kind) = contribution {
        let id = individual_payout_id(&fund.id, &fee.id, cause);
        let individual = store
            .ensure_individual_payout(
                &id,
                kind,
                &fund.id,
                &fee.id,
                &payout.id,
                shares,
                meta.timestamp,
                cause,
            )
            .await?;
        payout.individual_payouts = union_dedup(&payout.individual_payouts, &[individual.id]);
    }

    store.save_fee_payout(&payout).await?;

    let mut state = store.ensure_fund_state(fund, meta.timestamp).await?;
    state.events = union_dedup(&state.events, &payout.events);
    state.fee_payout = Some(payout.id.clone());
    state.timestamp = state.timestamp.max(meta.timestamp);
    store.save_fund_state(&state).await?;

    fund.fee_payout = Some(payout.id.clone());
    store.save_fund(fund).await?;

    let mut fee_state = store.ensure_fee_state(&fund.id, &fee.id).await?;
    fee_state.events = union_dedup(&fee_state.events, &[cause]);
    store.save_fee_state(&fee_state).await?;

    debug!(
        fund = %fund.id,
        fee = %fee.id,
        payout = %payout.id,
        shares = %payout.shares,
        "Tracked fee settlement"
    );
    Ok(payout)
}

/// Record the settlement time on the fee's state. The state must already
/// exist, which [`track_fee_state`] guarantees.
pub async fn mark_settled(
    store: &mut Store,
    fund: &Fund,
    fee: &Fee,
    meta: &EventMeta,
) -> Result<(), EngineError> {
    let mut state = store.use_fee_state(&fee_state_id(&fund.id, &fee.id)).await?;
    state.last_settled = Some(meta.timestamp);
    store.save_fee_state(&state).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_db;
    use crate::domain::{Address, Timestamp};
    use std::str::FromStr;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn meta(log_index: u64, ts: i64) -> EventMeta {
        EventMeta {
            tx_hash: "0xaa".to_string(),
            log_index,
            block_number: 7,
            timestamp: Timestamp::new(ts),
            address: addr(50),
            from: addr(60),
        }
    }

    fn fee(n: u8, kind: FeeKind) -> Fee {
        Fee {
            id: addr(n).to_string(),
            kind,
            timestamp: Timestamp::new(0),
        }
    }

    #[tokio::test]
    async fn test_two_settlements_same_timestamp_aggregate() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();
        let mut fund = store
            .ensure_fund(addr(1).as_str(), &addr(2), Timestamp::new(1))
            .await
            .unwrap();
        let management = fee(10, FeeKind::Management);
        let performance = fee(11, FeeKind::Performance);

        let m1 = meta(1, 100);
        track_fee_state(&mut store, &mut fund, &management, dec("10"), &m1, &m1.event_id())
            .await
            .unwrap();
        let m2 = meta(2, 100);
        let payout =
            track_fee_state(&mut store, &mut fund, &performance, dec("5"), &m2, &m2.event_id())
                .await
                .unwrap();

        assert_eq!(payout.shares, dec("15"));
        assert_eq!(payout.individual_payouts.len(), 2);
        assert_eq!(payout.events, vec!["0xaa/1".to_string(), "0xaa/2".to_string()]);
        assert_eq!(fund.fee_payout.as_deref(), Some(payout.id.as_str()));

        let stored_fund = store.use_fund(&fund.id).await.unwrap();
        assert_eq!(stored_fund.fee_payout, Some(payout.id.clone()));

        let state = store.use_fund_state(&fund.id).await.unwrap();
        assert_eq!(state.fee_payout, Some(payout.id.clone()));
        assert_eq!(state.events, payout.events);

        let individuals = store.list_individual_payouts(&payout.id).await.unwrap();
        let total: Decimal = individuals.iter().map(|p| p.shares.clone()).sum();
        assert_eq!(total, payout.shares);
        let kinds: Vec<_> = individuals.iter().map(|p| p.kind).collect();
        assert!(kinds.contains(&PayoutKind::Management));
        assert!(kinds.contains(&PayoutKind::Performance));
    }

    #[tokio::test]
    async fn test_new_timestamp_starts_new_payout() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();
        let mut fund = store
            .ensure_fund(addr(1).as_str(), &addr(2), Timestamp::new(1))
            .await
            .unwrap();
        let management = fee(10, FeeKind::Management);

        let m1 = meta(1, 100);
        let first = track_fee_state(&mut store, &mut fund, &management, dec("1"), &m1, "c1")
            .await
            .unwrap();
        let m2 = meta(2, 200);
        let second = track_fee_state(&mut store, &mut fund, &management, dec("2"), &m2, "c2")
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.shares, dec("2"));
        assert_eq!(fund.fee_payout, Some(second.id.clone()));

        let state = store.use_fund_state(&fund.id).await.unwrap();
        assert_eq!(state.events, vec!["c1".to_string(), "c2".to_string()]);
        assert_eq!(state.timestamp, Timestamp::new(200));
    }

    #[tokio::test]
    async fn test_entrance_fee_adds_no_individual_payout() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();
        let mut fund = store
            .ensure_fund(addr(1).as_str(), &addr(2), Timestamp::new(1))
            .await
            .unwrap();
        let entrance = fee(12, FeeKind::EntranceRateBurn);

        let m = meta(3, 300);
        let payout = track_fee_state(&mut store, &mut fund, &entrance, Decimal::zero(), &m, "c3")
            .await
            .unwrap();
        mark_settled(&mut store, &fund, &entrance, &m).await.unwrap();

        assert!(payout.individual_payouts.is_empty());
        assert!(payout.shares.is_zero());
        assert_eq!(payout.events, vec!["c3".to_string()]);

        let state = store
            .use_fee_state(&fee_state_id(&fund.id, &entrance.id))
            .await
            .unwrap();
        assert_eq!(state.last_settled, Some(Timestamp::new(300)));
        assert_eq!(state.events, vec!["c3".to_string()]);
    }

    #[tokio::test]
    async fn test_mark_settled_requires_fee_state() {
        let (repo, _temp) = setup_test_db().await;
        let mut store = repo.begin().await.unwrap();
        let fund = store
            .ensure_fund(addr(1).as_str(), &addr(2), Timestamp::new(1))
            .await
            .unwrap();

        let err = mark_settled(&mut store, &fund, &fee(10, FeeKind::Management), &meta(1, 1))
            .await
            .unwrap_err();
        assert!(err.is_integrity_violation());
    }
}
