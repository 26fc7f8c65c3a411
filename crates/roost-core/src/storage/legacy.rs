//! One-shot import of the v1 single-blob store
//!
//! Early versions persisted the whole state as one JSON document
//! (`state.json` in the data dir). On startup the blob, if present, is read
//! into the structured store and removed so the migration runs exactly once.
//!
//! A blob that cannot be read or parsed is treated as absent: startup
//! continues on the structured store and the file is left where it is for
//! manual inspection.

use std::fs;

use tracing::{info, warn};

use crate::config::Config;
use crate::models::Snapshot;
use crate::storage::database::Database;
use crate::storage::error::{StorageError, StorageResult};

/// Import the legacy blob into `db`, if one exists
///
/// Returns `true` when a blob was found, parsed, and installed. The file is
/// only deleted after the replacement transaction commits.
pub fn migrate_legacy_blob(db: &mut Database, config: &Config) -> StorageResult<bool> {
    let path = config.legacy_blob_path();
    if !path.exists() {
        return Ok(false);
    }

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Unreadable legacy store at {:?}, ignoring: {}", path, e);
            return Ok(false);
        }
    };

    let snapshot: Snapshot = match serde_json::from_str(&contents) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Malformed legacy store at {:?}, ignoring: {}", path, e);
            return Ok(false);
        }
    };

    db.with_transaction(|w| w.replace_all(&snapshot))?;

    fs::remove_file(&path).map_err(|source| StorageError::DeleteBlob {
        path: path.clone(),
        source,
    })?;

    info!("Migrated legacy store from {:?}", path);
    Ok(true)
}
