//! Fee contract events: rate settings and settlements.
//!
//! All four fee contracts emit the same two events. The emitting contract
//! must be a registered fee of the matching kind.

use super::{Audit, HandlerContext, Outcome};
use crate::db::Store;
use crate::domain::{
    Decimal, EventMeta, Fee, FeeKind, FeeSettingsAdded, FeeSettled, DEFAULT_DECIMALS,
};
use crate::engine::{
    apply_fee_rate, mark_settled, resolve_vault, scale_units, track_fee_state, EngineError,
};
use serde_json::json;
use tracing::info;

fn audit_kind(kind: FeeKind, settled: bool) -> &'static str {
    match (kind, settled) {
        (FeeKind::Management, false) => "ManagementFee.FundSettingsAdded",
        (FeeKind::Management, true) => "ManagementFee.Settled",
        (FeeKind::Performance, false) => "PerformanceFee.FundSettingsAdded",
        (FeeKind::Performance, true) => "PerformanceFee.Settled",
        (FeeKind::EntranceRateBurn, false) => "EntranceRateBurnFee.FundSettingsAdded",
        (FeeKind::EntranceRateBurn, true) => "EntranceRateBurnFee.Settled",
        (FeeKind::EntranceRateDirect, false) => "EntranceRateDirectFee.FundSettingsAdded",
        (FeeKind::EntranceRateDirect, true) => "EntranceRateDirectFee.Settled",
    }
}

async fn use_fee_of_kind(
    store: &mut Store,
    meta: &EventMeta,
    expected: FeeKind,
) -> Result<Fee, EngineError> {
    let fee = store.use_fee(&meta.address).await?;
    if fee.kind != expected {
        return Err(EngineError::invalid(
            &meta.event_id(),
            format!("fee {} is {}, event is for {}", fee.id, fee.kind, expected),
        ));
    }
    Ok(fee)
}

pub async fn settings_added(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    kind: FeeKind,
    params: &FeeSettingsAdded,
) -> Result<Outcome, EngineError> {
    let event_id = meta.event_id();
    let fee = use_fee_of_kind(store, meta, kind).await?;
    let rate = scale_units(&params.rate, DEFAULT_DECIMALS, &event_id)?;
    // The fund may not be deployed yet. The setting is keyed by vault only.
    let vault = resolve_vault(store, ctx.reader, &params.comptroller_proxy, meta).await?;
    let account = store.ensure_account(&meta.from, meta.timestamp).await?;

    let payload = json!({
        "comptrollerProxy": params.comptroller_proxy,
        "rate": rate,
    });
    if !Audit::new(meta, audit_kind(kind, false), payload)
        .fund(&vault)
        .account(&account.id)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    let setting =
        apply_fee_rate(store, vault.as_str(), &fee, rate, &event_id, meta.timestamp).await?;
    info!(fund = %vault, fee = %fee.id, rate = %setting.rate, "Fee settings added");
    Ok(Outcome::Applied)
}

pub async fn settled(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    kind: FeeKind,
    params: &FeeSettled,
) -> Result<Outcome, EngineError> {
    let event_id = meta.event_id();
    let fee = use_fee_of_kind(store, meta, kind).await?;
    let shares = scale_units(&params.shares_quantity, DEFAULT_DECIMALS, &event_id)?;
    let vault = resolve_vault(store, ctx.reader, &params.comptroller_proxy, meta).await?;
    let mut fund = store.use_fund(vault.as_str()).await?;
    let account = store.ensure_account(&meta.from, meta.timestamp).await?;

    let payload = json!({
        "comptrollerProxy": params.comptroller_proxy,
        "sharesQuantity": shares,
        "payer": params.payer,
    });
    if !Audit::new(meta, audit_kind(kind, true), payload)
        .fund(&fund.id)
        .account(&account.id)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    // Entrance fees are paid at share issuance and do not add to a payout.
    let tracked = match fee.kind {
        FeeKind::Management | FeeKind::Performance => shares.clone(),
        FeeKind::EntranceRateBurn | FeeKind::EntranceRateDirect => Decimal::zero(),
    };
    let payout = track_fee_state(store, &mut fund, &fee, tracked, meta, &event_id).await?;
    mark_settled(store, &fund, &fee, meta).await?;

    info!(
        fund = %fund.id,
        fee = %fee.id,
        shares = %shares,
        payout = %payout.id,
        "Fee settled"
    );
    Ok(Outcome::Applied)
}
