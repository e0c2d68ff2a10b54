pub mod indexer;

pub use indexer::{BatchReport, Indexer, IndexerError};
