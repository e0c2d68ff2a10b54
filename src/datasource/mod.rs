//! External collaborators: the event-delivery source and the contract-binding reader.

use crate::domain::{Address, EventCursor, LogEvent};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod jsonl;
pub mod mock;
pub mod rpc;

pub use jsonl::JsonlEventSource;
pub use mock::{MockContractReader, MockEventSource};
pub use rpc::RpcContractReader;

/// Source of decoded protocol events.
///
/// Implementations must return events in chain order, strictly after `after`,
/// and at most `limit` of them.
#[async_trait]
pub trait EventSource: Send + Sync + fmt::Debug {
    async fn fetch_events(
        &self,
        after: Option<EventCursor>,
        limit: usize,
    ) -> Result<Vec<LogEvent>, EventSourceError>;
}

/// Read calls against deployed contracts, pinned to the block of the event
/// that triggered them.
#[async_trait]
pub trait ContractReader: Send + Sync + fmt::Debug {
    /// Vault a comptroller proxy fronts.
    async fn vault_proxy(&self, comptroller: &Address, block: u64)
        -> Result<Address, ContractError>;

    /// Denomination asset of the fund behind a comptroller proxy.
    async fn denomination_asset(
        &self,
        comptroller: &Address,
        block: u64,
    ) -> Result<Address, ContractError>;

    /// ERC-20 decimals of an asset.
    async fn decimals(&self, asset: &Address, block: u64) -> Result<u32, ContractError>;
}

#[derive(Debug, Error)]
pub enum EventSourceError {
    #[error("failed to read events: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed event on line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[derive(Debug, Clone, Error)]
pub enum ContractError {
    /// Connection timeout, DNS failure and similar.
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("rate limited")]
    RateLimited,
    /// The node answered with a JSON-RPC error object (e.g. execution reverted).
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("cannot decode {call} result: {message}")]
    Decode { call: &'static str, message: String },
    #[error("{call} unavailable for {contract}")]
    Unavailable { contract: String, call: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_display() {
        let err = ContractError::Network("connection timeout".to_string());
        assert_eq!(err.to_string(), "network error: connection timeout");

        let err = ContractError::Http {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = ContractError::Rpc {
            code: 3,
            message: "execution reverted".to_string(),
        };
        assert_eq!(err.to_string(), "RPC error 3: execution reverted");

        let err = ContractError::Unavailable {
            contract: "0xabc".to_string(),
            call: "getVaultProxy",
        };
        assert_eq!(err.to_string(), "getVaultProxy unavailable for 0xabc");
    }

    #[test]
    fn test_event_source_error_display() {
        let err = EventSourceError::Parse {
            line: 4,
            message: "missing field `meta`".to_string(),
        };
        assert_eq!(err.to_string(), "malformed event on line 4: missing field `meta`");
    }
}
