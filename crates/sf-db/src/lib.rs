//! sf-db - Persistence layer for schemaflow
//!
//! This crate provides the `MigrationStore` trait the migration engine runs
//! against, plus a DuckDB-backed implementation and an in-memory one.

pub mod duckdb;
pub mod error;
pub mod memory;
pub mod traits;

pub use duckdb::{DuckDbStore, StoreOptions};
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use traits::MigrationStore;
