//! Resolution of funds, comptrollers and assets, preferring what the store
//! already knows over contract reads.

use super::EngineError;
use crate::datasource::ContractReader;
use crate::db::{Store, StoreError};
use crate::domain::{Address, Asset, ComptrollerProxy, EventMeta, Fund};
use tracing::debug;

/// Vault behind a comptroller proxy.
pub async fn resolve_vault(
    store: &mut Store,
    reader: &dyn ContractReader,
    comptroller: &Address,
    meta: &EventMeta,
) -> Result<Address, EngineError> {
    if let Some(proxy) = store.load_comptroller_proxy(comptroller).await? {
        return parse_stored(&proxy.fund, "comptroller_proxies.fund");
    }
    let vault = reader.vault_proxy(comptroller, meta.block_number).await?;
    debug!(comptroller = %comptroller, vault = %vault, "Resolved vault through contract read");
    Ok(vault)
}

/// Load the fund's current comptroller proxy, reading its denomination
/// asset from chain the first time it is seen.
pub async fn resolve_comptroller(
    store: &mut Store,
    reader: &dyn ContractReader,
    fund: &Fund,
    meta: &EventMeta,
) -> Result<ComptrollerProxy, EngineError> {
    let accessor = parse_stored(&fund.accessor, "funds.accessor")?;
    if let Some(proxy) = store.load_comptroller_proxy(&accessor).await? {
        return Ok(proxy);
    }

    let denomination = reader
        .denomination_asset(&accessor, meta.block_number)
        .await?;
    Ok(store
        .ensure_comptroller_proxy(&accessor, &fund.id, &denomination, meta.timestamp)
        .await?)
}

/// Asset with its decimals, cached after the first contract read.
pub async fn resolve_asset(
    store: &mut Store,
    reader: &dyn ContractReader,
    asset: &Address,
    meta: &EventMeta,
) -> Result<Asset, EngineError> {
    if let Some(known) = store.load_asset(asset).await? {
        return Ok(known);
    }
    let decimals = reader.decimals(asset, meta.block_number).await?;
    Ok(store.ensure_asset(asset, decimals).await?)
}

pub(crate) fn parse_stored(raw: &str, column: &'static str) -> Result<Address, EngineError> {
    Address::parse(raw).map_err(|_| {
        EngineError::Store(StoreError::Decode {
            column,
            value: raw.to_string(),
        })
    })
}
