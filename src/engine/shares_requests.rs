//! Shares request lifecycle and request-executor authorization.
//!
//! A (fund, account) pair is either absent or pending. Creating moves it to
//! pending, cancel and execute move it back to absent.

use super::EngineError;
use crate::db::Store;
use crate::domain::ids::shares_request_id;
use crate::domain::{
    Address, Decimal, Fund, SharesRequest, SharesRequestExecutor, SharesRequestor, Timestamp,
};
use tracing::{debug, warn};

/// Investment terms of a request, already scaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTerms {
    pub investment_amount: Decimal,
    pub min_shares_quantity: Decimal,
}

/// How a pending request left the pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClosure {
    Canceled,
    Executed,
}

impl RequestClosure {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClosure::Canceled => "canceled",
            RequestClosure::Executed => "executed",
        }
    }
}

pub async fn open_request(
    store: &mut Store,
    fund: &Fund,
    requestor: &SharesRequestor,
    account: &Address,
    terms: RequestTerms,
    timestamp: Timestamp,
) -> Result<SharesRequest, EngineError> {
    let request = SharesRequest {
        id: shares_request_id(&fund.id, account),
        fund: fund.id.clone(),
        account: account.to_string(),
        shares_requestor: requestor.id.clone(),
        investment_amount: terms.investment_amount,
        min_shares_quantity: terms.min_shares_quantity,
        timestamp,
    };
    store.save_shares_request(&request).await?;
    debug!(request = %request.id, "Shares request pending");
    Ok(request)
}

/// Drop the pending request of `account`. Returns whether one was pending.
///
/// A close without a pending request is tolerated: the requestor may have
/// been active before indexing started.
pub async fn close_request(
    store: &mut Store,
    fund: &Fund,
    account: &Address,
    closure: RequestClosure,
) -> Result<bool, EngineError> {
    let removed = store.delete_shares_request(&fund.id, account).await?;
    if removed {
        debug!(
            fund = %fund.id,
            account = %account,
            closure = closure.as_str(),
            "Shares request closed"
        );
    } else {
        warn!(
            fund = %fund.id,
            account = %account,
            closure = closure.as_str(),
            "No pending shares request to close"
        );
    }
    Ok(removed)
}

pub async fn add_executor(
    store: &mut Store,
    requestor: &SharesRequestor,
    account: &Address,
    timestamp: Timestamp,
) -> Result<SharesRequestExecutor, EngineError> {
    Ok(store
        .ensure_shares_request_executor(&requestor.id, account, timestamp)
        .await?)
}

pub async fn remove_executor(
    store: &mut Store,
    requestor: &SharesRequestor,
    account: &Address,
) -> Result<bool, EngineError> {
    let removed = store
        .delete_shares_request_executor(&requestor.id, account)
        .await?;
    if !removed {
        debug!(requestor = %requestor.id, account = %account, "Executor was not authorized");
    }
    Ok(removed)
}
