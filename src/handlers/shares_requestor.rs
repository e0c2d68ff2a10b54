//! Shares requestor events.
//!
//! A shares requestor is deployed per fund, so its events name no fund.
//! The vault comes from the deployment's contract context.

use super::{payload, Audit, HandlerContext, Outcome};
use crate::db::Store;
use crate::domain::{
    EventMeta, Fund, RequestExecutorChange, SharesRequestTerms, SharesRequestor,
    DEFAULT_DECIMALS,
};
use crate::engine::{
    add_executor, close_request, open_request, remove_executor, resolve_asset,
    resolve_comptroller, scale_units, EngineError, RequestClosure, RequestTerms,
};
use crate::engine::registry::parse_stored;
use serde_json::json;
use tracing::info;

async fn requestor_fund(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
) -> Result<(Fund, SharesRequestor), EngineError> {
    let vault = ctx.vault_of(&meta.address)?;
    let fund = store.use_fund(vault.as_str()).await?;
    let requestor = store.ensure_shares_requestor(&meta.address, &fund.id).await?;
    Ok((fund, requestor))
}

/// Scale the raw request terms: the investment in the fund's denomination
/// asset, the share quantity in share decimals.
async fn scaled_terms(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    fund: &Fund,
    params: &SharesRequestTerms,
) -> Result<RequestTerms, EngineError> {
    let event_id = meta.event_id();
    let comptroller = resolve_comptroller(store, ctx.reader, fund, meta).await?;
    let denomination = parse_stored(
        &comptroller.denomination_asset,
        "comptroller_proxies.denomination_asset",
    )?;
    let asset = resolve_asset(store, ctx.reader, &denomination, meta).await?;

    Ok(RequestTerms {
        investment_amount: scale_units(&params.investment_amount, asset.decimals, &event_id)?,
        min_shares_quantity: scale_units(&params.min_shares_quantity, DEFAULT_DECIMALS, &event_id)?,
    })
}

fn terms_payload(
    requestor: &SharesRequestor,
    params: &SharesRequestTerms,
    terms: &RequestTerms,
) -> serde_json::Value {
    json!({
        "sharesRequestor": requestor.id,
        "requestOwner": params.request_owner,
        "investmentAmount": terms.investment_amount,
        "minSharesQuantity": terms.min_shares_quantity,
    })
}

pub async fn request_created(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    params: &SharesRequestTerms,
) -> Result<Outcome, EngineError> {
    let (fund, requestor) = requestor_fund(store, ctx, meta).await?;
    let terms = scaled_terms(store, ctx, meta, &fund, params).await?;
    let account = store
        .ensure_account(&params.request_owner, meta.timestamp)
        .await?;

    if !Audit::new(
        meta,
        "SharesRequestor.RequestCreated",
        terms_payload(&requestor, params, &terms),
    )
    .fund(&fund.id)
    .account(&account.id)
    .record(store)
    .await?
    {
        return Ok(Outcome::Duplicate);
    }

    let request = open_request(
        store,
        &fund,
        &requestor,
        &params.request_owner,
        terms,
        meta.timestamp,
    )
    .await?;

    info!(fund = %fund.id, request = %request.id, "Shares request created");
    Ok(Outcome::Applied)
}

/// Cancel or execute. Each records its own audit type.
pub async fn request_closed(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    params: &SharesRequestTerms,
    closure: RequestClosure,
) -> Result<Outcome, EngineError> {
    let kind = match closure {
        RequestClosure::Canceled => "SharesRequestor.RequestCanceled",
        RequestClosure::Executed => "SharesRequestor.RequestExecuted",
    };

    let (fund, requestor) = requestor_fund(store, ctx, meta).await?;
    let terms = scaled_terms(store, ctx, meta, &fund, params).await?;
    let account = store
        .ensure_account(&params.request_owner, meta.timestamp)
        .await?;

    if !Audit::new(meta, kind, terms_payload(&requestor, params, &terms))
        .fund(&fund.id)
        .account(&account.id)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    close_request(store, &fund, &params.request_owner, closure).await?;

    info!(
        fund = %fund.id,
        account = %account.id,
        closure = closure.as_str(),
        "Shares request closed"
    );
    Ok(Outcome::Applied)
}

pub async fn executor_added(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    params: &RequestExecutorChange,
) -> Result<Outcome, EngineError> {
    let (fund, requestor) = requestor_fund(store, ctx, meta).await?;
    let executor = store.ensure_account(&params.account, meta.timestamp).await?;

    if !Audit::new(meta, "SharesRequestor.RequestExecutorAdded", payload(meta, params)?)
        .fund(&fund.id)
        .account(&executor.id)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    add_executor(store, &requestor, &params.account, meta.timestamp).await?;
    info!(requestor = %requestor.id, executor = %executor.id, "Request executor added");
    Ok(Outcome::Applied)
}

pub async fn executor_removed(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    meta: &EventMeta,
    params: &RequestExecutorChange,
) -> Result<Outcome, EngineError> {
    let (fund, requestor) = requestor_fund(store, ctx, meta).await?;
    let executor = store.ensure_account(&params.account, meta.timestamp).await?;

    if !Audit::new(meta, "SharesRequestor.RequestExecutorRemoved", payload(meta, params)?)
        .fund(&fund.id)
        .account(&executor.id)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    remove_executor(store, &requestor, &params.account).await?;
    info!(requestor = %requestor.id, executor = %executor.id, "Request executor removed");
    Ok(Outcome::Applied)
}
