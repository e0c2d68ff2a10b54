pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod orchestration;

pub use config::{Config, IntegrityPolicy};
pub use datasource::{
    ContractError, ContractReader, EventSource, EventSourceError, JsonlEventSource,
    MockContractReader, MockEventSource, RpcContractReader,
};
pub use db::{init_db, Repository, Store, StoreError};
pub use domain::{Address, Decimal, EventCursor, EventMeta, LogEvent, ProtocolEvent, Timestamp};
pub use engine::EngineError;
pub use error::AppError;
pub use handlers::{apply_event, ContractContexts, HandlerContext, Outcome};
pub use orchestration::{BatchReport, Indexer, IndexerError};
