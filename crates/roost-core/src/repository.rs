//! Application state repository
//!
//! The `Repository` is the single mutation and read surface for farm data.
//! It coordinates:
//! - the structured SQLite store (source of truth)
//! - the one-shot legacy blob migration
//! - the snapshot merge used by import
//!
//! ## Startup
//!
//! Opening the repository runs, in order: open the database, import the v1
//! blob if one is present, install the demo dataset when the store is empty
//! and seeding is enabled, make sure the metadata row exists, then spawn the
//! snapshot combinator.
//!
//! ## Concurrency
//!
//! The database sits behind an async mutex, so writes serialize and each
//! mutation runs its reads and writes inside one SQL transaction. Readers
//! never take that lock: a spawned task listens to every collection channel,
//! reassembles the immutable aggregate [`Snapshot`], and publishes it on a
//! watch channel of its own.
//!
//! ## Mutation protocol
//!
//! Every capture appends the log entry and enqueues a [`PendingItem`]
//! carrying the entry's JSON in the same transaction. A (simulated) sync
//! clears the queue and stamps the sync time.

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::merge::merge_snapshots;
use crate::models::{
    kind, EggLog, EnvLog, FeedLog, Flock, Logs, Meta, MortalityLog, PendingItem, Snapshot,
    TreatmentLog, User,
};
use crate::seed;
use crate::storage::{migrate_legacy_blob, Database};
use crate::util::now_iso;

/// Unified state repository for Roost
pub struct Repository {
    /// The structured store; all mutations lock this
    db: Arc<Mutex<Database>>,
    /// Receiver for the combined snapshot channel
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl Repository {
    /// Open the repository using the default configuration
    pub async fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config).await
    }

    /// Open the repository with a specific configuration
    ///
    /// First-start work (legacy migration, demo seeding, metadata defaults)
    /// happens here, before any observer can subscribe.
    pub async fn open_with_config(config: Config) -> Result<Self> {
        let mut db = Database::open(&config).context("Failed to open database")?;

        let migrated =
            migrate_legacy_blob(&mut db, &config).context("Failed to migrate legacy store")?;

        if !migrated {
            let empty = db.count_flocks().context("Failed to inspect store")? == 0
                && db.count_users().context("Failed to inspect store")? == 0;
            if empty && config.seed_demo_data {
                let seeded = seed::demo_snapshot();
                db.with_transaction(|w| w.replace_all(&seeded))
                    .context("Failed to install demo dataset")?;
                info!("Installed demo dataset");
            }
        }

        // A metadata row always exists after startup; reads would fall back
        // to defaults anyway, but writes want a row to update.
        if db.get_meta().context("Failed to read metadata")?.is_none() {
            db.with_transaction(|w| w.upsert_meta(&Meta::default()))
                .context("Failed to initialize metadata")?;
        }

        let snapshot_rx = spawn_snapshot_task(&db);

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            snapshot_rx,
        })
    }

    // ==================== Observation ====================

    /// Subscribe to the combined snapshot channel
    ///
    /// The receiver always holds a complete consistent snapshot; a fresh
    /// subscriber can read the current value immediately.
    pub fn observe_snapshot(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// The most recently published snapshot
    ///
    /// A write that just committed may not be visible here until the
    /// combinator republishes; use [`Repository::observe_snapshot`] to wait
    /// for it.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    // ==================== Capture ====================

    /// Record a feed log and queue it for upload
    pub async fn add_feed(
        &self,
        flock_id: impl Into<String>,
        date: impl Into<String>,
        feed_kg: f64,
        feed_type: impl Into<String>,
        cost: f64,
        notes: Option<String>,
    ) -> Result<FeedLog> {
        let log = FeedLog::new(flock_id, date, feed_kg, feed_type, cost, notes);
        let pending = pending_for(kind::FEED, &log, &log.created_at)?;

        let mut db = self.db.lock().await;
        db.with_transaction(|w| {
            w.upsert_feed_logs(std::slice::from_ref(&log))?;
            w.upsert_pending_items(std::slice::from_ref(&pending))
        })
        .context("Failed to record feed log")?;

        debug!("Recorded feed log for flock {}", log.flock_id);
        Ok(log)
    }

    /// Record a mortality event and queue it for upload
    pub async fn add_mortality(
        &self,
        flock_id: impl Into<String>,
        date: impl Into<String>,
        count: i64,
        cause: impl Into<String>,
        notes: Option<String>,
    ) -> Result<MortalityLog> {
        let log = MortalityLog::new(flock_id, date, count, cause, notes);
        let pending = pending_for(kind::MORTALITY, &log, &log.created_at)?;

        let mut db = self.db.lock().await;
        db.with_transaction(|w| {
            w.upsert_mortality_logs(std::slice::from_ref(&log))?;
            w.upsert_pending_items(std::slice::from_ref(&pending))
        })
        .context("Failed to record mortality log")?;

        debug!("Recorded mortality log for flock {}", log.flock_id);
        Ok(log)
    }

    /// Record an egg collection and queue it for upload
    pub async fn add_eggs(
        &self,
        flock_id: impl Into<String>,
        date: impl Into<String>,
        collected: i64,
        cracked: i64,
        notes: Option<String>,
    ) -> Result<EggLog> {
        let log = EggLog::new(flock_id, date, collected, cracked, notes);
        let pending = pending_for(kind::EGGS, &log, &log.created_at)?;

        let mut db = self.db.lock().await;
        db.with_transaction(|w| {
            w.upsert_egg_logs(std::slice::from_ref(&log))?;
            w.upsert_pending_items(std::slice::from_ref(&pending))
        })
        .context("Failed to record egg log")?;

        debug!("Recorded egg log for flock {}", log.flock_id);
        Ok(log)
    }

    /// Record a treatment and queue it for upload
    pub async fn add_treatment(
        &self,
        flock_id: impl Into<String>,
        date: impl Into<String>,
        treatment: impl Into<String>,
        dosage: impl Into<String>,
        administered_by: impl Into<String>,
        notes: Option<String>,
    ) -> Result<TreatmentLog> {
        let log = TreatmentLog::new(flock_id, date, treatment, dosage, administered_by, notes);
        let pending = pending_for(kind::TREATMENT, &log, &log.created_at)?;

        let mut db = self.db.lock().await;
        db.with_transaction(|w| {
            w.upsert_treatment_logs(std::slice::from_ref(&log))?;
            w.upsert_pending_items(std::slice::from_ref(&pending))
        })
        .context("Failed to record treatment log")?;

        debug!("Recorded treatment log for flock {}", log.flock_id);
        Ok(log)
    }

    /// Record an environment reading and queue it for upload
    pub async fn add_env(
        &self,
        flock_id: impl Into<String>,
        date: impl Into<String>,
        temperature_c: f64,
        humidity_percent: f64,
        notes: Option<String>,
    ) -> Result<EnvLog> {
        let log = EnvLog::new(flock_id, date, temperature_c, humidity_percent, notes);
        let pending = pending_for(kind::ENVIRONMENT, &log, &log.created_at)?;

        let mut db = self.db.lock().await;
        db.with_transaction(|w| {
            w.upsert_env_logs(std::slice::from_ref(&log))?;
            w.upsert_pending_items(std::slice::from_ref(&pending))
        })
        .context("Failed to record environment log")?;

        debug!("Recorded environment log for flock {}", log.flock_id);
        Ok(log)
    }

    // ==================== Selection and sync ====================

    /// Set the flock that captures default to
    ///
    /// The id is stored as given; it is legal for it to point at no flock,
    /// and readers fall back when it does.
    pub async fn set_selected_flock(&self, flock_id: impl Into<String>) -> Result<()> {
        let flock_id = flock_id.into();
        let mut db = self.db.lock().await;
        db.with_transaction(|w| {
            let mut meta = w.meta()?;
            meta.selected_flock_id = Some(flock_id);
            w.upsert_meta(&meta)
        })
        .context("Failed to select flock")?;
        Ok(())
    }

    /// Pretend the backend accepted everything: clear the pending queue and
    /// stamp the sync time
    ///
    /// The stamp is written even when the queue is already empty.
    pub async fn simulate_sync(&self) -> Result<()> {
        let mut db = self.db.lock().await;
        db.with_transaction(|w| {
            w.clear_pending_items()?;
            let mut meta = w.meta()?;
            meta.last_sync_at = Some(now_iso());
            w.upsert_meta(&meta)
        })
        .context("Failed to sync pending queue")?;

        info!("Pending queue cleared, sync time stamped");
        Ok(())
    }

    // ==================== Export / import ====================

    /// Write the current state to `sink` as pretty-printed JSON
    ///
    /// Reads the store directly (not the snapshot channel), so a write that
    /// just committed is always included. Returns false on any
    /// serialization or I/O failure; the store is never affected.
    pub async fn export_to_sink(&self, sink: &mut dyn Write) -> bool {
        let db = self.db.lock().await;
        match export_snapshot(&db, sink) {
            Ok(()) => {
                debug!("Exported snapshot");
                true
            }
            Err(e) => {
                warn!("Export failed: {:#}", e);
                false
            }
        }
    }

    /// Read a snapshot document from `source` and merge it into the store
    ///
    /// Returns false without touching the store when the source is
    /// unreadable or not a valid snapshot document, and when installing the
    /// merged state fails (the transaction rolls back).
    pub async fn import_from_source(&self, source: &mut dyn Read) -> bool {
        let mut contents = String::new();
        if let Err(e) = source.read_to_string(&mut contents) {
            warn!("Import failed: unreadable source: {}", e);
            return false;
        }

        let incoming: Snapshot = match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Import failed: malformed snapshot: {}", e);
                return false;
            }
        };

        let mut db = self.db.lock().await;
        let current = match db.load_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Import failed: could not read current state: {}", e);
                return false;
            }
        };

        let merged = merge_snapshots(current, incoming);
        match db.with_transaction(|w| w.replace_all(&merged)) {
            Ok(()) => {
                info!(
                    "Imported snapshot: {} flocks, {} log entries",
                    merged.flocks.len(),
                    merged.logs.len()
                );
                true
            }
            Err(e) => {
                warn!("Import failed: could not install merged state: {}", e);
                false
            }
        }
    }
}

/// Build the pending queue entry for a freshly captured log
fn pending_for<T: Serialize>(kind: &str, entry: &T, created_at: &str) -> Result<PendingItem> {
    let payload = serde_json::to_string(entry).context("Failed to serialize log payload")?;
    Ok(PendingItem::new(kind, payload, created_at))
}

fn export_snapshot(db: &Database, sink: &mut dyn Write) -> Result<()> {
    let snapshot = db.load_snapshot().context("Failed to read state")?;
    let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
    sink.write_all(json.as_bytes())
        .context("Failed to write snapshot")?;
    sink.flush().context("Failed to flush snapshot")?;
    Ok(())
}

/// Spawn the task that combines the per-collection channels into one
/// snapshot channel
///
/// The task wakes whenever any collection publishes, reads every channel's
/// latest value, and publishes the reassembled snapshot. It exits when the
/// database is dropped or the last snapshot observer goes away.
fn spawn_snapshot_task(db: &Database) -> watch::Receiver<Snapshot> {
    let mut users_rx = db.observe_users();
    let mut flocks_rx = db.observe_flocks();
    let mut feed_rx = db.observe_feed_logs();
    let mut mortality_rx = db.observe_mortality_logs();
    let mut eggs_rx = db.observe_egg_logs();
    let mut treatments_rx = db.observe_treatment_logs();
    let mut environment_rx = db.observe_env_logs();
    let mut pending_rx = db.observe_pending_items();
    let mut meta_rx = db.observe_meta();

    let initial = assemble_snapshot(
        meta_rx.borrow().clone(),
        users_rx.borrow().clone(),
        flocks_rx.borrow().clone(),
        feed_rx.borrow().clone(),
        mortality_rx.borrow().clone(),
        eggs_rx.borrow().clone(),
        treatments_rx.borrow().clone(),
        environment_rx.borrow().clone(),
        pending_rx.borrow().clone(),
    );
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        loop {
            let changed = tokio::select! {
                r = users_rx.changed() => r,
                r = flocks_rx.changed() => r,
                r = feed_rx.changed() => r,
                r = mortality_rx.changed() => r,
                r = eggs_rx.changed() => r,
                r = treatments_rx.changed() => r,
                r = environment_rx.changed() => r,
                r = pending_rx.changed() => r,
                r = meta_rx.changed() => r,
            };
            if changed.is_err() {
                // Database dropped; nothing further will be published
                break;
            }

            // borrow_and_update marks every channel seen, so one commit
            // touching several collections wakes the loop only as often as
            // values remain unseen.
            let snapshot = assemble_snapshot(
                meta_rx.borrow_and_update().clone(),
                users_rx.borrow_and_update().clone(),
                flocks_rx.borrow_and_update().clone(),
                feed_rx.borrow_and_update().clone(),
                mortality_rx.borrow_and_update().clone(),
                eggs_rx.borrow_and_update().clone(),
                treatments_rx.borrow_and_update().clone(),
                environment_rx.borrow_and_update().clone(),
                pending_rx.borrow_and_update().clone(),
            );

            if tx.send(snapshot).is_err() {
                // No observers left
                break;
            }
        }
    });

    rx
}

#[allow(clippy::too_many_arguments)]
fn assemble_snapshot(
    meta: Meta,
    users: Vec<User>,
    flocks: Vec<Flock>,
    feed: Vec<FeedLog>,
    mortality: Vec<MortalityLog>,
    eggs: Vec<EggLog>,
    treatments: Vec<TreatmentLog>,
    environment: Vec<EnvLog>,
    pending_queue: Vec<PendingItem>,
) -> Snapshot {
    Snapshot {
        farm_name: meta.farm_name,
        users,
        flocks,
        logs: Logs {
            feed,
            mortality,
            eggs,
            treatments,
            environment,
        },
        pending_queue,
        selected_flock_id: meta.selected_flock_id,
        last_sync_at: meta.last_sync_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_FARM_NAME;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    fn test_config(temp_dir: &TempDir, seed_demo_data: bool) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            seed_demo_data,
        }
    }

    async fn open_repo(temp_dir: &TempDir, seed_demo_data: bool) -> Repository {
        Repository::open_with_config(test_config(temp_dir, seed_demo_data))
            .await
            .unwrap()
    }

    /// Read the store directly, bypassing the snapshot channel
    async fn store_snapshot(repo: &Repository) -> Snapshot {
        repo.db.lock().await.load_snapshot().unwrap()
    }

    /// Wait until the published snapshot satisfies `predicate`
    async fn wait_for<F>(rx: &mut watch::Receiver<Snapshot>, predicate: F) -> Snapshot
    where
        F: Fn(&Snapshot) -> bool,
    {
        timeout(Duration::from_secs(5), async {
            loop {
                {
                    let snapshot = rx.borrow_and_update();
                    if predicate(&snapshot) {
                        return snapshot.clone();
                    }
                }
                rx.changed().await.expect("snapshot channel closed");
            }
        })
        .await
        .expect("snapshot condition not reached in time")
    }

    #[tokio::test]
    async fn test_first_start_seeds_demo_data() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, true).await;

        let snapshot = repo.snapshot();
        assert_eq!(snapshot.farm_name, DEFAULT_FARM_NAME);
        assert_eq!(snapshot.flocks.len(), 1);
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.logs.feed.len(), 10);
        assert!(snapshot.pending_queue.is_empty());
        assert_eq!(
            snapshot.selected_flock_id.as_deref(),
            Some(snapshot.flocks[0].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_first_start_without_seeding_creates_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        let snapshot = repo.snapshot();
        assert!(snapshot.flocks.is_empty());
        assert!(snapshot.users.is_empty());
        assert_eq!(snapshot.farm_name, DEFAULT_FARM_NAME);

        // Metadata row is written with defaults
        let meta = repo.db.lock().await.get_meta().unwrap();
        assert_eq!(meta, Some(Meta::default()));
    }

    #[tokio::test]
    async fn test_reopen_does_not_reseed() {
        let temp_dir = TempDir::new().unwrap();

        let first_flock_id = {
            let repo = open_repo(&temp_dir, true).await;
            repo.snapshot().flocks[0].id.clone()
        };

        let repo = open_repo(&temp_dir, true).await;
        let snapshot = repo.snapshot();
        assert_eq!(snapshot.flocks.len(), 1);
        assert_eq!(snapshot.flocks[0].id, first_flock_id);
    }

    #[tokio::test]
    async fn test_legacy_blob_wins_over_seeding() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, true);

        let json = r#"{
            "farmName": "Migrated Farm",
            "flocks": [{
                "id": "f9",
                "name": "Old flock",
                "type": "layers",
                "startDate": "2024-12-01",
                "initialCount": 40
            }]
        }"#;
        std::fs::write(config.legacy_blob_path(), json).unwrap();

        let repo = Repository::open_with_config(config.clone()).await.unwrap();

        let snapshot = repo.snapshot();
        assert_eq!(snapshot.farm_name, "Migrated Farm");
        assert_eq!(snapshot.flocks.len(), 1);
        assert_eq!(snapshot.flocks[0].id, "f9");
        assert!(!config.legacy_blob_path().exists());
    }

    #[tokio::test]
    async fn test_existing_data_suppresses_seeding_and_gets_meta() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, true);

        {
            let mut db = Database::open(&config).unwrap();
            db.with_transaction(|w| {
                w.upsert_flocks(&[Flock {
                    id: "f1".to_string(),
                    name: "Existing".to_string(),
                    kind: "broilers".to_string(),
                    start_date: "2025-01-01".to_string(),
                    initial_count: 120,
                    notes: None,
                }])
            })
            .unwrap();
        }

        let repo = Repository::open_with_config(config).await.unwrap();
        let snapshot = repo.snapshot();

        assert_eq!(snapshot.flocks.len(), 1);
        assert_eq!(snapshot.flocks[0].id, "f1");
        assert_eq!(snapshot.farm_name, DEFAULT_FARM_NAME);
    }

    #[tokio::test]
    async fn test_capture_appends_log_and_queues_payload() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        let log = repo
            .add_feed(
                "f1",
                "2025-03-01",
                18.5,
                "Starter",
                14200.0,
                Some("morning round".to_string()),
            )
            .await
            .unwrap();

        let snapshot = store_snapshot(&repo).await;
        assert_eq!(snapshot.logs.feed.len(), 1);
        assert_eq!(snapshot.logs.feed[0], log);

        assert_eq!(snapshot.pending_queue.len(), 1);
        let item = &snapshot.pending_queue[0];
        assert_eq!(item.kind, kind::FEED);
        assert_eq!(item.created_at, log.created_at);

        // The payload replays to an identical entry
        let replayed: FeedLog = serde_json::from_str(&item.payload_json).unwrap();
        assert_eq!(replayed, log);
    }

    #[tokio::test]
    async fn test_every_capture_kind_enqueues() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        repo.add_feed("f1", "2025-03-01", 18.0, "Starter", 14000.0, None)
            .await
            .unwrap();
        repo.add_mortality("f1", "2025-03-01", 1, "Weakness", None)
            .await
            .unwrap();
        repo.add_eggs("f1", "2025-03-01", 80, 3, None)
            .await
            .unwrap();
        repo.add_treatment("f1", "2025-03-01", "Multi-vitamin", "10 ml", "Vet", None)
            .await
            .unwrap();
        repo.add_env("f1", "2025-03-01", 31.0, 60.0, None)
            .await
            .unwrap();

        let snapshot = store_snapshot(&repo).await;
        assert_eq!(snapshot.logs.len(), 5);
        assert_eq!(snapshot.pending_queue.len(), 5);

        let kinds: std::collections::HashSet<&str> = snapshot
            .pending_queue
            .iter()
            .map(|i| i.kind.as_str())
            .collect();
        let expected: std::collections::HashSet<&str> = [
            kind::FEED,
            kind::MORTALITY,
            kind::EGGS,
            kind::TREATMENT,
            kind::ENVIRONMENT,
        ]
        .into_iter()
        .collect();
        assert_eq!(kinds, expected);
    }

    #[tokio::test]
    async fn test_sync_clears_queue_and_stamps_time() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        repo.add_mortality("f1", "2025-03-01", 2, "Heat stress", None)
            .await
            .unwrap();
        repo.add_eggs("f1", "2025-03-02", 75, 1, None)
            .await
            .unwrap();
        repo.add_feed("f1", "2025-03-02", 19.0, "Starter", 14400.0, None)
            .await
            .unwrap();
        assert_eq!(store_snapshot(&repo).await.pending_queue.len(), 3);

        let before = now_iso();
        repo.simulate_sync().await.unwrap();

        let snapshot = store_snapshot(&repo).await;
        assert!(snapshot.pending_queue.is_empty());
        // Captured logs survive the sync
        assert_eq!(snapshot.logs.mortality.len(), 1);
        assert_eq!(snapshot.logs.eggs.len(), 1);
        assert_eq!(snapshot.logs.feed.len(), 1);

        let stamp = snapshot.last_sync_at.unwrap();
        assert!(stamp.as_str() >= before.as_str());

        // Syncing an empty queue still stamps the time
        repo.simulate_sync().await.unwrap();
        let second = store_snapshot(&repo).await.last_sync_at.unwrap();
        assert!(second >= stamp);
    }

    #[tokio::test]
    async fn test_set_selected_flock_is_unchecked() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        repo.set_selected_flock("ghost-flock").await.unwrap();

        let snapshot = store_snapshot(&repo).await;
        assert_eq!(snapshot.selected_flock_id.as_deref(), Some("ghost-flock"));
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let temp_a = TempDir::new().unwrap();
        let repo_a = open_repo(&temp_a, true).await;

        let mut buf: Vec<u8> = Vec::new();
        assert!(repo_a.export_to_sink(&mut buf).await);

        let temp_b = TempDir::new().unwrap();
        let repo_b = open_repo(&temp_b, false).await;
        assert!(repo_b.import_from_source(&mut buf.as_slice()).await);

        let a = store_snapshot(&repo_a).await;
        let b = store_snapshot(&repo_b).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_import_merges_by_id_presence() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        let first = r#"{
            "flocks": [{
                "id": "a", "name": "Original A", "type": "broilers",
                "startDate": "2025-01-01", "initialCount": 100
            }],
            "logs": {"feed": [{
                "id": "f1", "flockId": "a", "date": "2025-01-02",
                "feedKg": 1.0, "feedType": "Starter", "cost": 0.0,
                "createdAt": "2025-01-02T08:00:00.000Z"
            }]}
        }"#;
        assert!(repo.import_from_source(&mut first.as_bytes()).await);

        let second = r#"{
            "flocks": [
                {"id": "a", "name": "Changed A", "type": "broilers",
                 "startDate": "2025-01-01", "initialCount": 999},
                {"id": "b", "name": "Flock B", "type": "layers",
                 "startDate": "2025-02-01", "initialCount": 60}
            ],
            "logs": {"feed": [
                {"id": "f1", "flockId": "a", "date": "2025-01-02",
                 "feedKg": 999.0, "feedType": "Starter", "cost": 0.0,
                 "createdAt": "2025-01-02T08:00:00.000Z"},
                {"id": "f2", "flockId": "b", "date": "2025-02-02",
                 "feedKg": 2.0, "feedType": "Layer mash", "cost": 0.0,
                 "createdAt": "2025-02-02T08:00:00.000Z"}
            ]}
        }"#;
        assert!(repo.import_from_source(&mut second.as_bytes()).await);

        let snapshot = store_snapshot(&repo).await;

        assert_eq!(snapshot.flocks.len(), 2);
        let a = snapshot.flocks.iter().find(|f| f.id == "a").unwrap();
        assert_eq!(a.name, "Original A");
        assert_eq!(a.initial_count, 100);
        assert!(snapshot.flocks.iter().any(|f| f.id == "b"));

        assert_eq!(snapshot.logs.feed.len(), 2);
        let f1 = snapshot.logs.feed.iter().find(|l| l.id == "f1").unwrap();
        assert_eq!(f1.feed_kg, 1.0);
        assert!(snapshot.logs.feed.iter().any(|l| l.id == "f2"));
    }

    #[tokio::test]
    async fn test_import_malformed_returns_false_and_preserves_state() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, true).await;
        let before = store_snapshot(&repo).await;

        assert!(!repo.import_from_source(&mut "{ not json".as_bytes()).await);

        assert_eq!(store_snapshot(&repo).await, before);
    }

    #[tokio::test]
    async fn test_import_never_replaces_farm_name() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        let doc = r#"{"farmName": "Somebody Else's Farm"}"#;
        assert!(repo.import_from_source(&mut doc.as_bytes()).await);

        assert_eq!(store_snapshot(&repo).await.farm_name, DEFAULT_FARM_NAME);
    }

    #[tokio::test]
    async fn test_observe_snapshot_publishes_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;
        let mut rx = repo.observe_snapshot();

        repo.add_env("f1", "2025-03-01", 31.0, 60.0, None)
            .await
            .unwrap();

        let snapshot = wait_for(&mut rx, |s| {
            s.logs.environment.len() == 1 && s.pending_queue.len() == 1
        })
        .await;
        assert_eq!(snapshot.logs.environment[0].temperature_c, 31.0);
        assert_eq!(snapshot.pending_queue[0].kind, kind::ENVIRONMENT);
    }

    #[tokio::test]
    async fn test_export_includes_just_committed_write() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;

        repo.add_treatment("f1", "2025-03-01", "Coccidiostat", "15 ml", "Vet", None)
            .await
            .unwrap();

        // No waiting on the snapshot channel: export reads the store
        let mut buf: Vec<u8> = Vec::new();
        assert!(repo.export_to_sink(&mut buf).await);

        let exported: Snapshot = serde_json::from_slice(&buf).unwrap();
        assert_eq!(exported.logs.treatments.len(), 1);
        assert_eq!(exported.pending_queue.len(), 1);
    }
}
