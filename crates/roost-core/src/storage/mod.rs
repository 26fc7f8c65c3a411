//! Storage layer
//!
//! Handles the structured SQLite store and the one-shot legacy blob import.
//!
//! ## Architecture
//!
//! - **SQLite**: Source of truth, one table per record collection
//! - **Watch channels**: Each collection republishes after a write commits
//!
//! The v1 single-blob JSON store is imported (and removed) on first startup
//! after an upgrade.

pub mod database;
pub mod error;
pub mod legacy;
pub mod schema;

pub use database::{Database, Writer};
pub use error::{StorageError, StorageResult};
pub use legacy::migrate_legacy_blob;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
