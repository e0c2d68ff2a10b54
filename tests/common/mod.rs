//! Fixtures shared by the integration tests: a throwaway database and a
//! small deployed fund.

#![allow(dead_code)]

use fundgraph::db::init_db;
use fundgraph::domain::{
    AdapterRegistered, AddressListChange, FeeRegistered, FeeSettled, FeeSettingsAdded,
    NewFundCreated, PolicyRegistered, RequestExecutorChange, SharesRequestTerms,
};
use fundgraph::handlers::ContractContext;
use fundgraph::{
    Address, ContractContexts, EventMeta, Indexer, LogEvent, MockContractReader, MockEventSource,
    ProtocolEvent, Repository, Timestamp,
};
use std::sync::Arc;
use tempfile::TempDir;

pub const T0: i64 = 1_600_000_000;

pub fn addr(byte: u8) -> Address {
    Address::parse(&format!("0x{}", format!("{:02x}", byte).repeat(20))).unwrap()
}

pub fn deployer() -> Address {
    addr(0x01)
}
pub fn comptroller() -> Address {
    addr(0x0c)
}
pub fn vault() -> Address {
    addr(0x0f)
}
pub fn owner() -> Address {
    addr(0x0a)
}
pub fn denomination() -> Address {
    addr(0xd0)
}
pub fn management_fee() -> Address {
    addr(0xf1)
}
pub fn performance_fee() -> Address {
    addr(0xf2)
}
pub fn entrance_fee() -> Address {
    addr(0xf3)
}
pub fn blacklist() -> Address {
    addr(0xb1)
}
pub fn requestor() -> Address {
    addr(0x5e)
}

pub async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}

/// Reader knowing the deployed fund and its 6-decimal denomination asset.
pub fn reader() -> MockContractReader {
    MockContractReader::new()
        .with_comptroller(comptroller(), vault(), denomination())
        .with_decimals(denomination(), 6)
}

pub fn contexts() -> ContractContexts {
    ContractContexts::new().with_context(
        requestor(),
        ContractContext {
            vault_proxy: vault(),
        },
    )
}

pub fn indexer(source: Arc<MockEventSource>, repo: Arc<Repository>) -> Indexer {
    Indexer::new(source, Arc::new(reader()), Arc::new(contexts()), repo)
}

pub fn meta(block_number: u64, log_index: u64, contract: Address, from: Address) -> EventMeta {
    EventMeta {
        tx_hash: format!("0x{:064x}", block_number),
        log_index,
        block_number,
        timestamp: Timestamp::new(T0 + block_number as i64),
        address: contract,
        from,
    }
}

pub fn event(meta: EventMeta, event: ProtocolEvent) -> LogEvent {
    LogEvent { meta, event }
}

/// Registrations and the fund deployment, blocks 1 to 2.
pub fn deployment() -> Vec<LogEvent> {
    vec![
        event(
            meta(1, 0, deployer(), owner()),
            ProtocolEvent::FeeRegistered(FeeRegistered {
                fee: management_fee(),
                identifier: "MANAGEMENT".to_string(),
            }),
        ),
        event(
            meta(1, 1, deployer(), owner()),
            ProtocolEvent::FeeRegistered(FeeRegistered {
                fee: performance_fee(),
                identifier: "PERFORMANCE".to_string(),
            }),
        ),
        event(
            meta(1, 2, deployer(), owner()),
            ProtocolEvent::FeeRegistered(FeeRegistered {
                fee: entrance_fee(),
                identifier: "ENTRANCE_RATE_BURN".to_string(),
            }),
        ),
        event(
            meta(1, 3, deployer(), owner()),
            ProtocolEvent::PolicyRegistered(PolicyRegistered {
                policy: blacklist(),
                identifier: "ADAPTER_BLACKLIST".to_string(),
            }),
        ),
        event(
            meta(1, 4, deployer(), owner()),
            ProtocolEvent::AdapterRegistered(AdapterRegistered {
                adapter: addr(0xa1),
                identifier: "UNISWAP_V2".to_string(),
            }),
        ),
        event(
            meta(2, 0, deployer(), owner()),
            ProtocolEvent::NewFundCreated(NewFundCreated {
                creator: owner(),
                vault_proxy: vault(),
                comptroller_proxy: comptroller(),
                fund_owner: owner(),
                fund_name: "Alpha Fund".to_string(),
                denomination_asset: denomination(),
            }),
        ),
    ]
}

pub fn fee_settled(
    block_number: u64,
    log_index: u64,
    fee: Address,
    event: fn(FeeSettled) -> ProtocolEvent,
    shares: &str,
) -> LogEvent {
    LogEvent {
        meta: meta(block_number, log_index, fee, owner()),
        event: event(FeeSettled {
            comptroller_proxy: comptroller(),
            shares_quantity: shares.to_string(),
            payer: Some(owner()),
        }),
    }
}

pub fn fee_settings(block_number: u64, fee: Address, rate: &str) -> LogEvent {
    event(
        meta(block_number, 0, fee, owner()),
        ProtocolEvent::ManagementFeeSettingsAdded(FeeSettingsAdded {
            comptroller_proxy: comptroller(),
            rate: rate.to_string(),
        }),
    )
}

pub fn blacklist_change(block_number: u64, added: bool, items: Vec<Address>) -> LogEvent {
    let change = AddressListChange {
        comptroller_proxy: comptroller(),
        items,
    };
    let protocol_event = if added {
        ProtocolEvent::AdapterBlacklistAddressesAdded(change)
    } else {
        ProtocolEvent::AdapterBlacklistAddressesRemoved(change)
    };
    event(meta(block_number, 0, blacklist(), owner()), protocol_event)
}

pub fn shares_request(
    block_number: u64,
    request_owner: Address,
    make: fn(SharesRequestTerms) -> ProtocolEvent,
) -> LogEvent {
    event(
        meta(block_number, 0, requestor(), request_owner.clone()),
        make(SharesRequestTerms {
            request_owner,
            investment_amount: "250000000".to_string(),
            min_shares_quantity: "2000000000000000000".to_string(),
        }),
    )
}

pub fn executor_change(
    block_number: u64,
    account: Address,
    make: fn(RequestExecutorChange) -> ProtocolEvent,
) -> LogEvent {
    event(
        meta(block_number, 0, requestor(), owner()),
        make(RequestExecutorChange { account }),
    )
}
