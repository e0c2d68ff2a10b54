//! Adapter blacklist and whitelist policy events.

use super::{payload, Audit, HandlerContext, Outcome};
use crate::db::Store;
use crate::domain::{AddressListChange, EventMeta, Policy, PolicyKind};
use crate::engine::{add_to_list, remove_from_list, resolve_vault, EngineError};
use tracing::info;

fn audit_kind(kind: PolicyKind, added: bool) -> &'static str {
    match (kind, added) {
        (PolicyKind::AdapterBlacklist, true) => "AdapterBlacklist.AddressesAdded",
        (PolicyKind::AdapterBlacklist, false) => "AdapterBlacklist.AddressesRemoved",
        (PolicyKind::AdapterWhitelist, true) => "AdapterWhitelist.AddressesAdded",
        (PolicyKind::AdapterWhitelist, false) => "AdapterWhitelist.AddressesRemoved",
    }
}

fn contract_name(kind: PolicyKind) -> &'static str {
    match kind {
        PolicyKind::AdapterBlacklist => "AdapterBlacklist",
        PolicyKind::AdapterWhitelist => "AdapterWhitelist",
    }
}

async fn use_policy_of_kind(
    store: &mut Store,
    meta: &EventMeta,
    expected: PolicyKind,
) -> Result<Policy, EngineError> {
    let policy = store.use_policy(&meta.address).await?;
    if policy.kind != expected {
        return Err(EngineError::invalid(
            &meta.event_id(),
            format!("policy {} is {}, event is for {}", policy.id, policy.kind, expected),
        ));
    }
    Ok(policy)
}

pub async fn addresses_added(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    kind: PolicyKind,
    params: &AddressListChange,
) -> Result<Outcome, EngineError> {
    let vault = resolve_vault(store, ctx.reader, &params.comptroller_proxy, meta).await?;
    let policy = use_policy_of_kind(store, meta, kind).await?;
    // Lists are usually configured during deployment, before the fund exists.
    let fund = store
        .ensure_fund(vault.as_str(), &params.comptroller_proxy, meta.timestamp)
        .await?;
    let manager = store.ensure_manager(&meta.from, meta.timestamp).await?;

    if !Audit::new(meta, audit_kind(kind, true), payload(meta, params)?)
        .fund(&fund.id)
        .account(&manager.id)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }
    store
        .ensure_contract(&meta.address, contract_name(kind), meta.timestamp)
        .await?;

    let setting = add_to_list(
        store,
        &fund.id,
        &policy,
        &params.items,
        &meta.event_id(),
        meta.timestamp,
    )
    .await?;

    info!(fund = %fund.id, policy = %policy.id, listed = setting.listed.len(), "Addresses added");
    Ok(Outcome::Applied)
}

pub async fn addresses_removed(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    kind: PolicyKind,
    params: &AddressListChange,
) -> Result<Outcome, EngineError> {
    let vault = resolve_vault(store, ctx.reader, &params.comptroller_proxy, meta).await?;
    let fund = store.use_fund(vault.as_str()).await?;
    let policy = use_policy_of_kind(store, meta, kind).await?;
    let manager = store.use_account(&meta.from).await?;

    if !Audit::new(meta, audit_kind(kind, false), payload(meta, params)?)
        .fund(&fund.id)
        .account(&manager.id)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    let setting = remove_from_list(
        store,
        &fund.id,
        &policy,
        &params.items,
        &meta.event_id(),
        meta.timestamp,
    )
    .await?;

    info!(fund = %fund.id, policy = %policy.id, listed = setting.listed.len(), "Addresses removed");
    Ok(Outcome::Applied)
}
