//! Membership lists kept by adapter blacklist and whitelist policies.
//!
//! Adds union the raw addresses into `listed` and the ones that resolve to a
//! registered integration adapter into `adapters`. Removes take the set
//! difference on both. Every event id joins the audit trail either way.

use super::EngineError;
use crate::db::Store;
use crate::domain::{difference, union_dedup, Address, AddressListSetting, Policy, Timestamp};
use tracing::debug;

pub async fn add_to_list(
    store: &mut Store,
    fund: &str,
    policy: &Policy,
    items: &[Address],
    event_id: &str,
    timestamp: Timestamp,
) -> Result<AddressListSetting, EngineError> {
    let listed: Vec<&str> = items.iter().map(Address::as_str).collect();
    let adapters: Vec<String> = store
        .load_integration_adapters(items)
        .await?
        .into_iter()
        .map(|adapter| adapter.id)
        .collect();

    let mut setting = store
        .ensure_address_list_setting(fund, policy, timestamp)
        .await?;
    setting.listed = union_dedup(&setting.listed, &listed);
    setting.adapters = union_dedup(&setting.adapters, &adapters);
    setting.events = union_dedup(&setting.events, &[event_id]);
    setting.timestamp = setting.timestamp.max(timestamp);
    store.save_address_list_setting(&setting).await?;

    debug!(fund, policy = %policy.id, listed = setting.listed.len(), "Addresses added");
    Ok(setting)
}

/// Remove addresses from an existing list. A list that was never created is
/// an integrity violation.
pub async fn remove_from_list(
    store: &mut Store,
    fund: &str,
    policy: &Policy,
    items: &[Address],
    event_id: &str,
    timestamp: Timestamp,
) -> Result<AddressListSetting, EngineError> {
    let listed: Vec<&str> = items.iter().map(Address::as_str).collect();
    let adapters: Vec<String> = store
        .load_integration_adapters(items)
        .await?
        .into_iter()
        .map(|adapter| adapter.id)
        .collect();

    let mut setting = store.use_address_list_setting(fund, &policy.id).await?;
    setting.listed = difference(&setting.listed, &listed);
    setting.adapters = difference(&setting.adapters, &adapters);
    setting.events = union_dedup(&setting.events, &[event_id]);
    setting.timestamp = setting.timestamp.max(timestamp);
    store.save_address_list_setting(&setting).await?;

    debug!(fund, policy = %policy.id, listed = setting.listed.len(), "Addresses removed");
    Ok(setting)
}
