//! Domain mutators: per-feature rules that sequence entity accessors for one event.
//!
//! Every function here runs inside the caller's [`Store`](crate::db::Store)
//! and never commits it.

use crate::datasource::ContractError;
use crate::db::StoreError;
use crate::domain::{Decimal, UnitsError};
use thiserror::Error;

pub mod address_lists;
pub mod fee_payout;
pub mod fee_settings;
pub mod registry;
pub mod shares_requests;

pub use address_lists::{add_to_list, remove_from_list};
pub use fee_payout::{mark_settled, track_fee_state};
pub use fee_settings::apply_fee_rate;
pub use registry::{resolve_asset, resolve_comptroller, resolve_vault};
pub use shares_requests::{
    add_executor, close_request, open_request, remove_executor, RequestClosure, RequestTerms,
};

#[derive(Debug, Error)]
pub enum EngineError {
    /// An entity that must already exist is missing. Processing cannot
    /// continue on top of this state.
    #[error("integrity violation: {entity} {key} not found")]
    Integrity { entity: &'static str, key: String },
    /// The event itself is unusable (bad quantity, unknown identifier).
    #[error("invalid event {event_id}: {reason}")]
    InvalidEvent { event_id: String, reason: String },
    #[error("no context configured for contract {contract}")]
    MissingContext { contract: String },
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Store(StoreError),
}

impl EngineError {
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, EngineError::Integrity { .. })
    }

    pub fn is_invalid_event(&self) -> bool {
        matches!(self, EngineError::InvalidEvent { .. })
    }

    pub(crate) fn invalid(event_id: &str, reason: impl ToString) -> Self {
        EngineError::InvalidEvent {
            event_id: event_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { entity, key } => EngineError::Integrity { entity, key },
            other => EngineError::Store(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Store(StoreError::Db(err))
    }
}

/// Scale a raw on-chain quantity, rejecting the event if it cannot be represented.
pub fn scale_units(raw: &str, decimals: u32, event_id: &str) -> Result<Decimal, EngineError> {
    Decimal::from_units(raw, decimals).map_err(|e: UnitsError| EngineError::invalid(event_id, e))
}
