//! Fee, policy and adapter registration.
//!
//! Identifiers are parsed into closed kinds here. An identifier outside the
//! known set rejects the event instead of registering an entity no mutator
//! can dispatch on.

use super::{payload, Audit, Outcome};
use crate::db::Store;
use crate::domain::{
    AdapterRegistered, EventMeta, Fee, FeeKind, FeeRegistered, IntegrationAdapter, Policy,
    PolicyKind, PolicyRegistered,
};
use crate::engine::EngineError;
use tracing::info;

pub async fn fee_registered(
    store: &mut Store,
    meta: &EventMeta,
    params: &FeeRegistered,
) -> Result<Outcome, EngineError> {
    let kind: FeeKind = params
        .identifier
        .parse()
        .map_err(|e| EngineError::invalid(&meta.event_id(), e))?;

    if !Audit::new(meta, "FeeManager.FeeRegistered", payload(meta, params)?)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    store
        .ensure_contract(&meta.address, "FeeManager", meta.timestamp)
        .await?;
    store
        .save_fee(&Fee {
            id: params.fee.to_string(),
            kind,
            timestamp: meta.timestamp,
        })
        .await?;

    info!(fee = %params.fee, kind = %kind, "Fee registered");
    Ok(Outcome::Applied)
}

pub async fn policy_registered(
    store: &mut Store,
    meta: &EventMeta,
    params: &PolicyRegistered,
) -> Result<Outcome, EngineError> {
    let kind: PolicyKind = params
        .identifier
        .parse()
        .map_err(|e| EngineError::invalid(&meta.event_id(), e))?;

    if !Audit::new(meta, "PolicyManager.PolicyRegistered", payload(meta, params)?)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    store
        .ensure_contract(&meta.address, "PolicyManager", meta.timestamp)
        .await?;
    store
        .save_policy(&Policy {
            id: params.policy.to_string(),
            kind,
            timestamp: meta.timestamp,
        })
        .await?;

    info!(policy = %params.policy, kind = %kind, "Policy registered");
    Ok(Outcome::Applied)
}

pub async fn adapter_registered(
    store: &mut Store,
    meta: &EventMeta,
    params: &AdapterRegistered,
) -> Result<Outcome, EngineError> {
    if params.identifier.trim().is_empty() {
        return Err(EngineError::invalid(&meta.event_id(), "empty adapter identifier"));
    }

    if !Audit::new(meta, "IntegrationManager.AdapterRegistered", payload(meta, params)?)
        .record(store)
        .await?
    {
        return Ok(Outcome::Duplicate);
    }

    store
        .ensure_contract(&meta.address, "IntegrationManager", meta.timestamp)
        .await?;
    store
        .save_integration_adapter(&IntegrationAdapter {
            id: params.adapter.to_string(),
            identifier: params.identifier.clone(),
            timestamp: meta.timestamp,
        })
        .await?;

    info!(adapter = %params.adapter, identifier = %params.identifier, "Adapter registered");
    Ok(Outcome::Applied)
}
