//! In-memory collaborators for tests.

use super::{ContractError, ContractReader, EventSource, EventSourceError};
use crate::domain::{sort_events_deterministic, Address, EventCursor, LogEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Event source serving a fixed set of events in chain order.
///
/// Events can be appended with [`MockEventSource::push`] to simulate new blocks.
#[derive(Debug, Default)]
pub struct MockEventSource {
    events: Mutex<Vec<LogEvent>>,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(self, event: LogEvent) -> Self {
        self.push(event);
        self
    }

    pub fn with_events(self, events: Vec<LogEvent>) -> Self {
        for event in events {
            self.push(event);
        }
        self
    }

    pub fn push(&self, event: LogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
            sort_events_deterministic(&mut events);
        }
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(
        &self,
        after: Option<EventCursor>,
        limit: usize,
    ) -> Result<Vec<LogEvent>, EventSourceError> {
        let events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(events
            .iter()
            .filter(|e| after.map_or(true, |c| EventCursor::from_event(e) > c))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Contract reader answering from fixed tables. Unknown contracts are
/// [`ContractError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct MockContractReader {
    vault_proxies: HashMap<Address, Address>,
    denomination_assets: HashMap<Address, Address>,
    decimals: HashMap<Address, u32>,
}

impl MockContractReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a comptroller proxy fronting `vault` in `denomination_asset`.
    pub fn with_comptroller(
        mut self,
        comptroller: Address,
        vault: Address,
        denomination_asset: Address,
    ) -> Self {
        self.vault_proxies.insert(comptroller.clone(), vault);
        self.denomination_assets
            .insert(comptroller, denomination_asset);
        self
    }

    pub fn with_decimals(mut self, asset: Address, decimals: u32) -> Self {
        self.decimals.insert(asset, decimals);
        self
    }
}

#[async_trait]
impl ContractReader for MockContractReader {
    async fn vault_proxy(
        &self,
        comptroller: &Address,
        _block: u64,
    ) -> Result<Address, ContractError> {
        self.vault_proxies
            .get(comptroller)
            .cloned()
            .ok_or_else(|| ContractError::Unavailable {
                contract: comptroller.to_string(),
                call: "getVaultProxy",
            })
    }

    async fn denomination_asset(
        &self,
        comptroller: &Address,
        _block: u64,
    ) -> Result<Address, ContractError> {
        self.denomination_assets
            .get(comptroller)
            .cloned()
            .ok_or_else(|| ContractError::Unavailable {
                contract: comptroller.to_string(),
                call: "getDenominationAsset",
            })
    }

    async fn decimals(&self, asset: &Address, _block: u64) -> Result<u32, ContractError> {
        self.decimals
            .get(asset)
            .copied()
            .ok_or_else(|| ContractError::Unavailable {
                contract: asset.to_string(),
                call: "decimals",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventMeta, ProtocolEvent, RequestExecutorChange, Timestamp};

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn event(block: u64, log_index: u64) -> LogEvent {
        LogEvent {
            meta: EventMeta {
                tx_hash: format!("0x{:x}", block),
                log_index,
                block_number: block,
                timestamp: Timestamp::new(block as i64),
                address: addr(1),
                from: addr(2),
            },
            event: ProtocolEvent::RequestExecutorAdded(RequestExecutorChange { account: addr(3) }),
        }
    }

    #[tokio::test]
    async fn test_mock_event_source_orders_and_pages() {
        let source = MockEventSource::new()
            .with_event(event(3, 0))
            .with_event(event(1, 0));
        source.push(event(2, 5));

        let all = source.fetch_events(None, 10).await.unwrap();
        let blocks: Vec<_> = all.iter().map(|e| e.meta.block_number).collect();
        assert_eq!(blocks, vec![1, 2, 3]);

        let after = source
            .fetch_events(Some(EventCursor::new(2, 5)), 10)
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].meta.block_number, 3);
    }

    #[tokio::test]
    async fn test_mock_contract_reader() {
        let reader = MockContractReader::new()
            .with_comptroller(addr(1), addr(2), addr(3))
            .with_decimals(addr(3), 6);

        assert_eq!(reader.vault_proxy(&addr(1), 0).await.unwrap(), addr(2));
        assert_eq!(reader.denomination_asset(&addr(1), 0).await.unwrap(), addr(3));
        assert_eq!(reader.decimals(&addr(3), 0).await.unwrap(), 6);
        assert!(matches!(
            reader.vault_proxy(&addr(9), 0).await,
            Err(ContractError::Unavailable { call: "getVaultProxy", .. })
        ));
    }
}
