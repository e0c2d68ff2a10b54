//! Fund deployment.

use super::{payload, Audit, HandlerContext, Outcome};
use crate::db::Store;
use crate::domain::{EventMeta, NewFundCreated};
use crate::engine::{resolve_asset, EngineError};
use tracing::info;

pub async fn new_fund_created(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    params: &NewFundCreated,
) -> Result<Outcome, EngineError> {
    let vault = &params.vault_proxy;
    let recorded = Audit::new(meta, "FundDeployer.NewFundCreated", payload(meta, params)?)
        .fund(vault)
        .account(&params.fund_owner)
        .record(store)
        .await?;
    if !recorded {
        return Ok(Outcome::Duplicate);
    }

    store
        .ensure_contract(&meta.address, "FundDeployer", meta.timestamp)
        .await?;
    store.ensure_account(&params.creator, meta.timestamp).await?;
    let manager = store.ensure_manager(&params.fund_owner, meta.timestamp).await?;
    let asset = resolve_asset(store, ctx.reader, &params.denomination_asset, meta).await?;

    // Configuration events of the same transaction may have created the
    // fund already; deployment fills in the rest.
    let mut fund = store
        .ensure_fund(vault.as_str(), &params.comptroller_proxy, meta.timestamp)
        .await?;
    fund.name = Some(params.fund_name.clone());
    fund.manager = Some(manager.id);
    fund.accessor = params.comptroller_proxy.to_string();
    fund.denomination_asset = Some(asset.id);
    store.save_fund(&fund).await?;

    store
        .ensure_comptroller_proxy(
            &params.comptroller_proxy,
            &fund.id,
            &params.denomination_asset,
            meta.timestamp,
        )
        .await?;

    info!(fund = %fund.id, name = %params.fund_name, "Fund created");
    Ok(Outcome::Applied)
}
