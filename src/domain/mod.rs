//! Domain types and identity layer for the fund protocol indexer.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: Address, Timestamp, EventMeta
//! - Deterministic entity keys and set-like list merges
//! - Entity records and decoded protocol events

pub mod decimal;
pub mod entities;
pub mod events;
pub mod ids;
pub mod kinds;
pub mod merge;
pub mod ordering;
pub mod primitives;

pub use decimal::{Decimal, UnitsError, DEFAULT_DECIMALS};
pub use entities::{
    Account, AddressListSetting, Asset, AuditEvent, ComptrollerProxy, Contract, Fee, FeePayout,
    FeeSetting, FeeState, Fund, FundState, IndividualPayout, IntegrationAdapter, Policy,
    SharesRequest, SharesRequestExecutor, SharesRequestor, Transaction,
};
pub use events::{
    AdapterRegistered, AddressListChange, FeeRegistered, FeeSettingsAdded, FeeSettled, LogEvent,
    NewFundCreated, PolicyRegistered, ProtocolEvent, RequestExecutorChange, SharesRequestTerms,
};
pub use kinds::{FeeKind, PayoutKind, PolicyKind, UnknownKind};
pub use merge::{difference, union_dedup};
pub use ordering::{sort_events_deterministic, EventCursor};
pub use primitives::{Address, AddressParseError, EventMeta, Timestamp};
