//! SQLite schema for the structured store
//!
//! One table per record collection plus a single-row metadata table. Data
//! columns hold the model fields as-is; dates and timestamps stay TEXT so
//! values round-trip imports unchanged.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Single-row farm metadata (farm name, selection, last sync)
        CREATE TABLE IF NOT EXISTS app_meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            farm_name TEXT NOT NULL,
            selected_flock_id TEXT,
            last_sync_at TEXT
        );

        -- People working on the farm
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            contact TEXT
        );

        -- Bird groups
        CREATE TABLE IF NOT EXISTS flocks (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            start_date TEXT NOT NULL,
            initial_count INTEGER NOT NULL,
            notes TEXT
        );

        -- Daily logs, one table per kind
        CREATE TABLE IF NOT EXISTS feed_logs (
            id TEXT PRIMARY KEY,
            flock_id TEXT NOT NULL,
            date TEXT NOT NULL,
            feed_kg REAL NOT NULL,
            feed_type TEXT NOT NULL,
            cost REAL NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS mortality_logs (
            id TEXT PRIMARY KEY,
            flock_id TEXT NOT NULL,
            date TEXT NOT NULL,
            count INTEGER NOT NULL,
            cause TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS egg_logs (
            id TEXT PRIMARY KEY,
            flock_id TEXT NOT NULL,
            date TEXT NOT NULL,
            collected INTEGER NOT NULL,
            cracked INTEGER NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS treatment_logs (
            id TEXT PRIMARY KEY,
            flock_id TEXT NOT NULL,
            date TEXT NOT NULL,
            treatment TEXT NOT NULL,
            dosage TEXT NOT NULL,
            administered_by TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS env_logs (
            id TEXT PRIMARY KEY,
            flock_id TEXT NOT NULL,
            date TEXT NOT NULL,
            temperature_c REAL NOT NULL,
            humidity_percent REAL NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        -- Queued, not-yet-synced mutations
        CREATE TABLE IF NOT EXISTS pending_items (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        -- Indexes for common query patterns

        -- Per-flock filtering (dashboard aggregation)
        CREATE INDEX IF NOT EXISTS idx_feed_logs_flock_id ON feed_logs(flock_id);
        CREATE INDEX IF NOT EXISTS idx_mortality_logs_flock_id ON mortality_logs(flock_id);
        CREATE INDEX IF NOT EXISTS idx_egg_logs_flock_id ON egg_logs(flock_id);
        CREATE INDEX IF NOT EXISTS idx_treatment_logs_flock_id ON treatment_logs(flock_id);
        CREATE INDEX IF NOT EXISTS idx_env_logs_flock_id ON env_logs(flock_id);

        -- Date ordering and windowed queries
        CREATE INDEX IF NOT EXISTS idx_feed_logs_date ON feed_logs(date);
        CREATE INDEX IF NOT EXISTS idx_mortality_logs_date ON mortality_logs(date);
        CREATE INDEX IF NOT EXISTS idx_egg_logs_date ON egg_logs(date);
        CREATE INDEX IF NOT EXISTS idx_treatment_logs_date ON treatment_logs(date);
        CREATE INDEX IF NOT EXISTS idx_env_logs_date ON env_logs(date);

        -- Queue drains oldest-first
        CREATE INDEX IF NOT EXISTS idx_pending_items_created_at ON pending_items(created_at);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    // Check if schema_info table exists
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}
