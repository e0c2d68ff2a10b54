//! Persisted entity records.
//!
//! References between entities are stored as the referenced entity's key.

use super::{Decimal, FeeKind, PayoutKind, PolicyKind, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub manager: bool,
    pub first_seen: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub block_number: i64,
    pub timestamp: Timestamp,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub name: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub decimals: u32,
}

/// Root aggregate for one vault. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    pub id: String,
    pub name: Option<String>,
    pub manager: Option<String>,
    /// Comptroller proxy currently fronting the vault.
    pub accessor: String,
    pub denomination_asset: Option<String>,
    /// Most recent FeePayout.
    pub fee_payout: Option<String>,
    pub inception: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComptrollerProxy {
    pub id: String,
    pub fund: String,
    pub denomination_asset: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub id: String,
    pub kind: FeeKind,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub kind: PolicyKind,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationAdapter {
    pub id: String,
    pub identifier: String,
    pub timestamp: Timestamp,
}

/// Aggregated payout for one (fund, timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePayout {
    pub id: String,
    pub fund: String,
    pub timestamp: Timestamp,
    /// Sum of the referenced individual payouts' shares.
    pub shares: Decimal,
    pub individual_payouts: Vec<String>,
    pub events: Vec<String>,
}

/// One fee's contribution to a FeePayout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualPayout {
    pub id: String,
    pub kind: PayoutKind,
    pub fund: String,
    pub fee: String,
    pub fee_payout: String,
    pub shares: Decimal,
    pub timestamp: Timestamp,
    pub event: String,
}

/// Latest-known fee snapshot of a fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundState {
    pub id: String,
    pub fund: String,
    pub fee_payout: Option<String>,
    pub events: Vec<String>,
    pub timestamp: Timestamp,
}

/// Settlement state of one fee within one fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeState {
    pub id: String,
    pub fund: String,
    pub fee: String,
    pub last_settled: Option<Timestamp>,
    pub events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSetting {
    pub id: String,
    pub fund: String,
    pub fee: String,
    pub rate: Decimal,
    pub events: Vec<String>,
    pub timestamp: Timestamp,
}

/// Membership list kept by an address-list policy for one fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressListSetting {
    pub id: String,
    pub fund: String,
    pub policy: String,
    pub kind: PolicyKind,
    pub listed: Vec<String>,
    pub adapters: Vec<String>,
    pub events: Vec<String>,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesRequestor {
    pub id: String,
    pub fund: String,
}

/// Pending share purchase request of one account in one fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesRequest {
    pub id: String,
    pub fund: String,
    pub account: String,
    pub shares_requestor: String,
    pub investment_amount: Decimal,
    pub min_shares_quantity: Decimal,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesRequestExecutor {
    pub id: String,
    pub shares_requestor: String,
    pub account: String,
    pub timestamp: Timestamp,
}

/// Immutable audit record of one handled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    /// Qualified event name, e.g. `SharesRequestor.RequestExecuted`.
    pub kind: String,
    pub fund: Option<String>,
    pub account: Option<String>,
    pub contract: String,
    pub transaction: String,
    pub timestamp: Timestamp,
    pub payload: serde_json::Value,
}
