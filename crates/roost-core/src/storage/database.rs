//! Structured SQLite store
//!
//! Holds all farm records as rows and pushes every collection through a
//! `tokio::sync::watch` channel so readers can observe changes without
//! polling. The database is the single source of truth; channel values are
//! immutable clones of query results.
//!
//! ## Architecture
//!
//! - All writes go through [`Database::with_transaction`]: the closure gets a
//!   [`Writer`], every statement lands in one SQL transaction, and only the
//!   collections the writer touched are re-queried and republished after
//!   commit.
//! - Channel publication uses `send_replace`, so writes succeed whether or
//!   not anyone is currently subscribed.
//!
//! ## Tables
//!
//! - `app_meta` - single-row farm metadata
//! - `users`, `flocks` - reference records
//! - `feed_logs`, `mortality_logs`, `egg_logs`, `treatment_logs`, `env_logs`
//! - `pending_items` - queued, not-yet-synced mutations

use rusqlite::{params, Connection, Transaction};
use tokio::sync::watch;

use crate::config::Config;
use crate::models::{
    EggLog, EnvLog, FeedLog, Flock, Logs, Meta, MortalityLog, PendingItem, Snapshot, TreatmentLog,
    User,
};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init};

/// Which collections a transaction wrote, for selective channel refresh
#[derive(Debug, Default, Clone, Copy)]
struct Touched {
    users: bool,
    flocks: bool,
    feed: bool,
    mortality: bool,
    eggs: bool,
    treatments: bool,
    environment: bool,
    pending: bool,
    meta: bool,
}

impl Touched {
    fn all() -> Self {
        Self {
            users: true,
            flocks: true,
            feed: true,
            mortality: true,
            eggs: true,
            treatments: true,
            environment: true,
            pending: true,
            meta: true,
        }
    }
}

/// Send halves of the per-collection watch channels
struct Channels {
    users: watch::Sender<Vec<User>>,
    flocks: watch::Sender<Vec<Flock>>,
    feed: watch::Sender<Vec<FeedLog>>,
    mortality: watch::Sender<Vec<MortalityLog>>,
    eggs: watch::Sender<Vec<EggLog>>,
    treatments: watch::Sender<Vec<TreatmentLog>>,
    environment: watch::Sender<Vec<EnvLog>>,
    pending: watch::Sender<Vec<PendingItem>>,
    meta: watch::Sender<Meta>,
}

/// The structured store
pub struct Database {
    conn: Connection,
    channels: Channels,
}

impl Database {
    /// Open or create the SQLite database at the configured path
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.sqlite_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        // Seed every channel with current contents so subscribers start
        // from a consistent view.
        let channels = Channels {
            users: watch::channel(query_users(&conn)?).0,
            flocks: watch::channel(query_flocks(&conn)?).0,
            feed: watch::channel(query_feed_logs(&conn)?).0,
            mortality: watch::channel(query_mortality_logs(&conn)?).0,
            eggs: watch::channel(query_egg_logs(&conn)?).0,
            treatments: watch::channel(query_treatment_logs(&conn)?).0,
            environment: watch::channel(query_env_logs(&conn)?).0,
            pending: watch::channel(query_pending_items(&conn)?).0,
            meta: watch::channel(query_meta(&conn)?.unwrap_or_default()).0,
        };

        Ok(Self { conn, channels })
    }

    // ==================== Observation ====================

    pub fn observe_users(&self) -> watch::Receiver<Vec<User>> {
        self.channels.users.subscribe()
    }

    pub fn observe_flocks(&self) -> watch::Receiver<Vec<Flock>> {
        self.channels.flocks.subscribe()
    }

    pub fn observe_feed_logs(&self) -> watch::Receiver<Vec<FeedLog>> {
        self.channels.feed.subscribe()
    }

    pub fn observe_mortality_logs(&self) -> watch::Receiver<Vec<MortalityLog>> {
        self.channels.mortality.subscribe()
    }

    pub fn observe_egg_logs(&self) -> watch::Receiver<Vec<EggLog>> {
        self.channels.eggs.subscribe()
    }

    pub fn observe_treatment_logs(&self) -> watch::Receiver<Vec<TreatmentLog>> {
        self.channels.treatments.subscribe()
    }

    pub fn observe_env_logs(&self) -> watch::Receiver<Vec<EnvLog>> {
        self.channels.environment.subscribe()
    }

    pub fn observe_pending_items(&self) -> watch::Receiver<Vec<PendingItem>> {
        self.channels.pending.subscribe()
    }

    pub fn observe_meta(&self) -> watch::Receiver<Meta> {
        self.channels.meta.subscribe()
    }

    // ==================== Query Methods ====================

    /// Get the metadata row, if one has been written yet
    pub fn get_meta(&self) -> StorageResult<Option<Meta>> {
        query_meta(&self.conn)
    }

    pub fn count_users(&self) -> StorageResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn count_flocks(&self) -> StorageResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM flocks", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Assemble the full state from the store in one pass
    ///
    /// Collections come back in their query order: users by name, flocks by
    /// start date (newest first), logs by date (newest first), pending items
    /// oldest first.
    pub fn load_snapshot(&self) -> StorageResult<Snapshot> {
        let meta = query_meta(&self.conn)?.unwrap_or_default();
        Ok(Snapshot {
            farm_name: meta.farm_name,
            users: query_users(&self.conn)?,
            flocks: query_flocks(&self.conn)?,
            logs: Logs {
                feed: query_feed_logs(&self.conn)?,
                mortality: query_mortality_logs(&self.conn)?,
                eggs: query_egg_logs(&self.conn)?,
                treatments: query_treatment_logs(&self.conn)?,
                environment: query_env_logs(&self.conn)?,
            },
            pending_queue: query_pending_items(&self.conn)?,
            selected_flock_id: meta.selected_flock_id,
            last_sync_at: meta.last_sync_at,
        })
    }

    // ==================== Mutation ====================

    /// Run `f` inside one SQL transaction
    ///
    /// On success the transaction commits and the channels for every touched
    /// collection are re-queried and republished. On error the transaction
    /// rolls back and no channel fires.
    pub fn with_transaction<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Writer<'_>) -> StorageResult<T>,
    {
        let tx = self.conn.transaction()?;
        let mut writer = Writer {
            tx: &tx,
            touched: Touched::default(),
        };

        let value = f(&mut writer)?;
        let touched = writer.touched;
        drop(writer);
        tx.commit()?;

        self.refresh(touched)?;
        Ok(value)
    }

    /// Re-query touched collections and publish the fresh values
    fn refresh(&self, touched: Touched) -> StorageResult<()> {
        if touched.users {
            self.channels.users.send_replace(query_users(&self.conn)?);
        }
        if touched.flocks {
            self.channels
                .flocks
                .send_replace(query_flocks(&self.conn)?);
        }
        if touched.feed {
            self.channels
                .feed
                .send_replace(query_feed_logs(&self.conn)?);
        }
        if touched.mortality {
            self.channels
                .mortality
                .send_replace(query_mortality_logs(&self.conn)?);
        }
        if touched.eggs {
            self.channels
                .eggs
                .send_replace(query_egg_logs(&self.conn)?);
        }
        if touched.treatments {
            self.channels
                .treatments
                .send_replace(query_treatment_logs(&self.conn)?);
        }
        if touched.environment {
            self.channels
                .environment
                .send_replace(query_env_logs(&self.conn)?);
        }
        if touched.pending {
            self.channels
                .pending
                .send_replace(query_pending_items(&self.conn)?);
        }
        if touched.meta {
            self.channels
                .meta
                .send_replace(query_meta(&self.conn)?.unwrap_or_default());
        }
        Ok(())
    }
}

/// Write handle passed to [`Database::with_transaction`] closures
///
/// Upserts replace whole rows by id. Each method records its collection so
/// the corresponding channel refreshes after commit.
pub struct Writer<'a> {
    tx: &'a Transaction<'a>,
    touched: Touched,
}

impl Writer<'_> {
    pub fn upsert_users(&mut self, users: &[User]) -> StorageResult<()> {
        for user in users {
            insert_user(self.tx, user)?;
        }
        self.touched.users = true;
        Ok(())
    }

    pub fn upsert_flocks(&mut self, flocks: &[Flock]) -> StorageResult<()> {
        for flock in flocks {
            insert_flock(self.tx, flock)?;
        }
        self.touched.flocks = true;
        Ok(())
    }

    pub fn upsert_feed_logs(&mut self, logs: &[FeedLog]) -> StorageResult<()> {
        for log in logs {
            insert_feed_log(self.tx, log)?;
        }
        self.touched.feed = true;
        Ok(())
    }

    pub fn upsert_mortality_logs(&mut self, logs: &[MortalityLog]) -> StorageResult<()> {
        for log in logs {
            insert_mortality_log(self.tx, log)?;
        }
        self.touched.mortality = true;
        Ok(())
    }

    pub fn upsert_egg_logs(&mut self, logs: &[EggLog]) -> StorageResult<()> {
        for log in logs {
            insert_egg_log(self.tx, log)?;
        }
        self.touched.eggs = true;
        Ok(())
    }

    pub fn upsert_treatment_logs(&mut self, logs: &[TreatmentLog]) -> StorageResult<()> {
        for log in logs {
            insert_treatment_log(self.tx, log)?;
        }
        self.touched.treatments = true;
        Ok(())
    }

    pub fn upsert_env_logs(&mut self, logs: &[EnvLog]) -> StorageResult<()> {
        for log in logs {
            insert_env_log(self.tx, log)?;
        }
        self.touched.environment = true;
        Ok(())
    }

    pub fn upsert_pending_items(&mut self, items: &[PendingItem]) -> StorageResult<()> {
        for item in items {
            insert_pending_item(self.tx, item)?;
        }
        self.touched.pending = true;
        Ok(())
    }

    /// Replace the metadata row
    pub fn upsert_meta(&mut self, meta: &Meta) -> StorageResult<()> {
        self.tx.execute(
            "INSERT OR REPLACE INTO app_meta (id, farm_name, selected_flock_id, last_sync_at) \
             VALUES (1, ?, ?, ?)",
            params![meta.farm_name, meta.selected_flock_id, meta.last_sync_at],
        )?;
        self.touched.meta = true;
        Ok(())
    }

    /// Read the metadata row inside the transaction, defaults if absent
    pub fn meta(&self) -> StorageResult<Meta> {
        Ok(query_meta(self.tx)?.unwrap_or_default())
    }

    /// Empty the pending queue
    pub fn clear_pending_items(&mut self) -> StorageResult<()> {
        self.tx.execute("DELETE FROM pending_items", [])?;
        self.touched.pending = true;
        Ok(())
    }

    /// Replace the entire store contents with `snapshot`
    pub fn replace_all(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        clear_all_data(self.tx)?;
        self.upsert_users(&snapshot.users)?;
        self.upsert_flocks(&snapshot.flocks)?;
        self.upsert_feed_logs(&snapshot.logs.feed)?;
        self.upsert_mortality_logs(&snapshot.logs.mortality)?;
        self.upsert_egg_logs(&snapshot.logs.eggs)?;
        self.upsert_treatment_logs(&snapshot.logs.treatments)?;
        self.upsert_env_logs(&snapshot.logs.environment)?;
        self.upsert_pending_items(&snapshot.pending_queue)?;
        self.upsert_meta(&snapshot.meta())?;
        Ok(())
    }
}

// ==================== Query helpers ====================

fn query_users(conn: &Connection) -> StorageResult<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, name, role, contact FROM users ORDER BY name")?;
    let users = stmt
        .query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
                role: row.get(2)?,
                contact: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

fn query_flocks(conn: &Connection) -> StorageResult<Vec<Flock>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, start_date, initial_count, notes FROM flocks \
         ORDER BY start_date DESC",
    )?;
    let flocks = stmt
        .query_map([], |row| {
            Ok(Flock {
                id: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                start_date: row.get(3)?,
                initial_count: row.get(4)?,
                notes: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(flocks)
}

fn query_feed_logs(conn: &Connection) -> StorageResult<Vec<FeedLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, flock_id, date, feed_kg, feed_type, cost, notes, created_at, updated_at \
         FROM feed_logs ORDER BY date DESC",
    )?;
    let logs = stmt
        .query_map([], |row| {
            Ok(FeedLog {
                id: row.get(0)?,
                flock_id: row.get(1)?,
                date: row.get(2)?,
                feed_kg: row.get(3)?,
                feed_type: row.get(4)?,
                cost: row.get(5)?,
                notes: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(logs)
}

fn query_mortality_logs(conn: &Connection) -> StorageResult<Vec<MortalityLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, flock_id, date, count, cause, notes, created_at \
         FROM mortality_logs ORDER BY date DESC",
    )?;
    let logs = stmt
        .query_map([], |row| {
            Ok(MortalityLog {
                id: row.get(0)?,
                flock_id: row.get(1)?,
                date: row.get(2)?,
                count: row.get(3)?,
                cause: row.get(4)?,
                notes: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(logs)
}

fn query_egg_logs(conn: &Connection) -> StorageResult<Vec<EggLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, flock_id, date, collected, cracked, notes, created_at \
         FROM egg_logs ORDER BY date DESC",
    )?;
    let logs = stmt
        .query_map([], |row| {
            Ok(EggLog {
                id: row.get(0)?,
                flock_id: row.get(1)?,
                date: row.get(2)?,
                collected: row.get(3)?,
                cracked: row.get(4)?,
                notes: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(logs)
}

fn query_treatment_logs(conn: &Connection) -> StorageResult<Vec<TreatmentLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, flock_id, date, treatment, dosage, administered_by, notes, created_at \
         FROM treatment_logs ORDER BY date DESC",
    )?;
    let logs = stmt
        .query_map([], |row| {
            Ok(TreatmentLog {
                id: row.get(0)?,
                flock_id: row.get(1)?,
                date: row.get(2)?,
                treatment: row.get(3)?,
                dosage: row.get(4)?,
                administered_by: row.get(5)?,
                notes: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(logs)
}

fn query_env_logs(conn: &Connection) -> StorageResult<Vec<EnvLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, flock_id, date, temperature_c, humidity_percent, notes, created_at \
         FROM env_logs ORDER BY date DESC",
    )?;
    let logs = stmt
        .query_map([], |row| {
            Ok(EnvLog {
                id: row.get(0)?,
                flock_id: row.get(1)?,
                date: row.get(2)?,
                temperature_c: row.get(3)?,
                humidity_percent: row.get(4)?,
                notes: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(logs)
}

fn query_pending_items(conn: &Connection) -> StorageResult<Vec<PendingItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, payload_json, created_at FROM pending_items ORDER BY created_at ASC",
    )?;
    let items = stmt
        .query_map([], |row| {
            Ok(PendingItem {
                id: row.get(0)?,
                kind: row.get(1)?,
                payload_json: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

fn query_meta(conn: &Connection) -> StorageResult<Option<Meta>> {
    let mut stmt = conn
        .prepare("SELECT farm_name, selected_flock_id, last_sync_at FROM app_meta WHERE id = 1")?;
    let result = stmt.query_row([], |row| {
        Ok(Meta {
            farm_name: row.get(0)?,
            selected_flock_id: row.get(1)?,
            last_sync_at: row.get(2)?,
        })
    });

    match result {
        Ok(meta) => Ok(Some(meta)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ==================== Insert helpers ====================

fn insert_user(conn: &Connection, user: &User) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO users (id, name, role, contact) VALUES (?, ?, ?, ?)",
        params![user.id, user.name, user.role, user.contact],
    )?;
    Ok(())
}

fn insert_flock(conn: &Connection, flock: &Flock) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO flocks (id, name, type, start_date, initial_count, notes) \
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            flock.id,
            flock.name,
            flock.kind,
            flock.start_date,
            flock.initial_count,
            flock.notes,
        ],
    )?;
    Ok(())
}

fn insert_feed_log(conn: &Connection, log: &FeedLog) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO feed_logs \
         (id, flock_id, date, feed_kg, feed_type, cost, notes, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            log.id,
            log.flock_id,
            log.date,
            log.feed_kg,
            log.feed_type,
            log.cost,
            log.notes,
            log.created_at,
            log.updated_at,
        ],
    )?;
    Ok(())
}

fn insert_mortality_log(conn: &Connection, log: &MortalityLog) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO mortality_logs \
         (id, flock_id, date, count, cause, notes, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            log.id,
            log.flock_id,
            log.date,
            log.count,
            log.cause,
            log.notes,
            log.created_at,
        ],
    )?;
    Ok(())
}

fn insert_egg_log(conn: &Connection, log: &EggLog) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO egg_logs \
         (id, flock_id, date, collected, cracked, notes, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            log.id,
            log.flock_id,
            log.date,
            log.collected,
            log.cracked,
            log.notes,
            log.created_at,
        ],
    )?;
    Ok(())
}

fn insert_treatment_log(conn: &Connection, log: &TreatmentLog) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO treatment_logs \
         (id, flock_id, date, treatment, dosage, administered_by, notes, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            log.id,
            log.flock_id,
            log.date,
            log.treatment,
            log.dosage,
            log.administered_by,
            log.notes,
            log.created_at,
        ],
    )?;
    Ok(())
}

fn insert_env_log(conn: &Connection, log: &EnvLog) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO env_logs \
         (id, flock_id, date, temperature_c, humidity_percent, notes, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            log.id,
            log.flock_id,
            log.date,
            log.temperature_c,
            log.humidity_percent,
            log.notes,
            log.created_at,
        ],
    )?;
    Ok(())
}

fn insert_pending_item(conn: &Connection, item: &PendingItem) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO pending_items (id, kind, payload_json, created_at) \
         VALUES (?, ?, ?, ?)",
        params![item.id, item.kind, item.payload_json, item.created_at],
    )?;
    Ok(())
}

/// Clear all data from tables (preserving schema)
fn clear_all_data(conn: &Connection) -> StorageResult<()> {
    conn.execute("DELETE FROM users", [])?;
    conn.execute("DELETE FROM flocks", [])?;
    conn.execute("DELETE FROM feed_logs", [])?;
    conn.execute("DELETE FROM mortality_logs", [])?;
    conn.execute("DELETE FROM egg_logs", [])?;
    conn.execute("DELETE FROM treatment_logs", [])?;
    conn.execute("DELETE FROM env_logs", [])?;
    conn.execute("DELETE FROM pending_items", [])?;
    conn.execute("DELETE FROM app_meta", [])?;
    Ok(())
}
