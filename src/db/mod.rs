//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Entity accessors, grouped into one transactional `Store` per event

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{Repository, Store, StoreError};
