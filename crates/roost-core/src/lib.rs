//! Roost Core Library
//!
//! This crate provides the core functionality for Roost, an offline-first
//! data capture tool for small poultry farms.
//!
//! # Architecture
//!
//! - **SQLite**: Source of truth for data, one table per collection
//! - **Watch channels**: Every collection publishes on change; a combinator
//!   task reassembles the full snapshot for observers
//! - **Pending queue**: Each captured log is also queued for a later
//!   (simulated) sync with the backend
//!
//! All reads are served from published snapshots; writes go through the
//! repository and commit in single transactions.
//!
//! # Quick Start
//!
//! ```text
//! let repo = Repository::open().await?;
//!
//! // Capture a feed log
//! let snapshot = repo.snapshot();
//! repo.add_feed(flock_id, "2025-03-01", 18.5, "Starter", 14200.0, None)
//!     .await?;
//!
//! // Watch for changes
//! let mut rx = repo.observe_snapshot();
//! rx.changed().await?;
//! ```
//!
//! # Modules
//!
//! - `repository`: Unified state repository (main entry point)
//! - `models`: Data structures for flocks, logs, and the snapshot
//! - `storage`: SQLite persistence and the legacy blob migration
//! - `merge`: Id-presence snapshot merge used by import
//! - `seed`: Demo dataset for first start
//! - `config`: Application configuration

pub mod config;
pub mod merge;
pub mod models;
pub mod repository;
pub mod seed;
pub mod storage;
pub mod util;

pub use config::Config;
pub use merge::merge_snapshots;
pub use models::{
    EggLog, EnvLog, FeedLog, Flock, Logs, Meta, MortalityLog, PendingItem, Snapshot, TreatmentLog,
    User, DEFAULT_FARM_NAME,
};
pub use repository::Repository;
pub use storage::{Database, StorageError};
