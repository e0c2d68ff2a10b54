//! Event handlers, one per subscribed event signature.
//!
//! A handler resolves what the event refers to, records the immutable audit
//! record, and hands off to the domain mutators. The audit insert doubles as
//! the replay guard: if the record exists the event was applied already and
//! the handler stops before touching any entity.

use crate::datasource::ContractReader;
use crate::db::Store;
use crate::domain::{Address, AuditEvent, EventMeta, LogEvent, ProtocolEvent};
use crate::engine::EngineError;
use serde_json::Value;
use tracing::debug;

pub mod address_lists;
pub mod context;
pub mod fees;
pub mod fund_deployer;
pub mod registry;
pub mod shares_requestor;

pub use context::{ContextError, ContractContext, ContractContexts};

/// Collaborators every handler may consult. Read-only.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub reader: &'a dyn ContractReader,
    pub contexts: &'a ContractContexts,
}

impl<'a> HandlerContext<'a> {
    pub fn new(reader: &'a dyn ContractReader, contexts: &'a ContractContexts) -> Self {
        Self { reader, contexts }
    }

    /// Vault of a per-fund contract, from the deployment's context.
    pub(crate) fn vault_of(&self, contract: &Address) -> Result<&'a Address, EngineError> {
        self.contexts
            .get(contract)
            .map(|context| &context.vault_proxy)
            .ok_or_else(|| EngineError::MissingContext {
                contract: contract.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The audit record already existed; nothing was written.
    Duplicate,
}

/// Apply one event inside `store`.
pub async fn apply_event(
    store: &mut Store,
    ctx: HandlerContext<'_>,
    event: &LogEvent,
) -> Result<Outcome, EngineError> {
    use crate::domain::{FeeKind, PolicyKind};
    use crate::engine::RequestClosure;

    let meta = &event.meta;
    match &event.event {
        ProtocolEvent::NewFundCreated(p) => {
            fund_deployer::new_fund_created(store, ctx, meta, p).await
        }
        ProtocolEvent::FeeRegistered(p) => registry::fee_registered(store, meta, p).await,
        ProtocolEvent::PolicyRegistered(p) => registry::policy_registered(store, meta, p).await,
        ProtocolEvent::AdapterRegistered(p) => registry::adapter_registered(store, meta, p).await,

        ProtocolEvent::ManagementFeeSettingsAdded(p) => {
            fees::settings_added(store, ctx, meta, FeeKind::Management, p).await
        }
        ProtocolEvent::PerformanceFeeSettingsAdded(p) => {
            fees::settings_added(store, ctx, meta, FeeKind::Performance, p).await
        }
        ProtocolEvent::EntranceRateBurnFeeSettingsAdded(p) => {
            fees::settings_added(store, ctx, meta, FeeKind::EntranceRateBurn, p).await
        }
        ProtocolEvent::EntranceRateDirectFeeSettingsAdded(p) => {
            fees::settings_added(store, ctx, meta, FeeKind::EntranceRateDirect, p).await
        }
        ProtocolEvent::ManagementFeeSettled(p) => {
            fees::settled(store, ctx, meta, FeeKind::Management, p).await
        }
        ProtocolEvent::PerformanceFeeSettled(p) => {
            fees::settled(store, ctx, meta, FeeKind::Performance, p).await
        }
        ProtocolEvent::EntranceRateBurnFeeSettled(p) => {
            fees::settled(store, ctx, meta, FeeKind::EntranceRateBurn, p).await
        }
        ProtocolEvent::EntranceRateDirectFeeSettled(p) => {
            fees::settled(store, ctx, meta, FeeKind::EntranceRateDirect, p).await
        }

        ProtocolEvent::AdapterBlacklistAddressesAdded(p) => {
            address_lists::addresses_added(store, ctx, meta, PolicyKind::AdapterBlacklist, p).await
        }
        ProtocolEvent::AdapterBlacklistAddressesRemoved(p) => {
            address_lists::addresses_removed(store, ctx, meta, PolicyKind::AdapterBlacklist, p)
                .await
        }
        ProtocolEvent::AdapterWhitelistAddressesAdded(p) => {
            address_lists::addresses_added(store, ctx, meta, PolicyKind::AdapterWhitelist, p).await
        }
        ProtocolEvent::AdapterWhitelistAddressesRemoved(p) => {
            address_lists::addresses_removed(store, ctx, meta, PolicyKind::AdapterWhitelist, p)
                .await
        }

        ProtocolEvent::RequestCreated(p) => {
            shares_requestor::request_created(store, ctx, meta, p).await
        }
        ProtocolEvent::RequestCanceled(p) => {
            shares_requestor::request_closed(store, ctx, meta, p, RequestClosure::Canceled).await
        }
        ProtocolEvent::RequestExecuted(p) => {
            shares_requestor::request_closed(store, ctx, meta, p, RequestClosure::Executed).await
        }
        ProtocolEvent::RequestExecutorAdded(p) => {
            shares_requestor::executor_added(store, ctx, meta, p).await
        }
        ProtocolEvent::RequestExecutorRemoved(p) => {
            shares_requestor::executor_removed(store, ctx, meta, p).await
        }
    }
}

/// Builder for the audit record of the event being handled.
pub(crate) struct Audit<'m> {
    meta: &'m EventMeta,
    kind: &'static str,
    fund: Option<String>,
    account: Option<String>,
    payload: Value,
}

impl<'m> Audit<'m> {
    pub(crate) fn new(meta: &'m EventMeta, kind: &'static str, payload: Value) -> Self {
        Self {
            meta,
            kind,
            fund: None,
            account: None,
            payload,
        }
    }

    pub(crate) fn fund(mut self, fund: impl ToString) -> Self {
        self.fund = Some(fund.to_string());
        self
    }

    pub(crate) fn account(mut self, account: impl ToString) -> Self {
        self.account = Some(account.to_string());
        self
    }

    /// Write the record together with its transaction. Returns false when
    /// the event was recorded before.
    pub(crate) async fn record(self, store: &mut Store) -> Result<bool, EngineError> {
        let transaction = store.ensure_transaction(self.meta).await?;
        let audit = AuditEvent {
            id: self.meta.event_id(),
            kind: self.kind.to_string(),
            fund: self.fund,
            account: self.account,
            contract: self.meta.address.to_string(),
            transaction: transaction.id,
            timestamp: self.meta.timestamp,
            payload: self.payload,
        };

        let inserted = store.insert_event(&audit).await?;
        if !inserted {
            debug!(event_id = %audit.id, kind = self.kind, "Event already applied");
        }
        Ok(inserted)
    }
}

/// Serialize event parameters for the audit payload.
pub(crate) fn payload<T: serde::Serialize>(
    meta: &EventMeta,
    params: &T,
) -> Result<Value, EngineError> {
    serde_json::to_value(params).map_err(|e| EngineError::invalid(&meta.event_id(), e))
}
