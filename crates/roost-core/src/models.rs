//! Data models for Roost
//!
//! Defines the farm records: User, Flock, the five daily log kinds, the
//! pending upload queue, and the aggregate Snapshot that doubles as the JSON
//! export/import wire format.
//!
//! Ids are plain strings so records imported from another device keep their
//! ids byte-for-byte. Dates are ISO `YYYY-MM-DD` strings and timestamps are
//! RFC 3339 strings; neither is validated on the way in.

use serde::{Deserialize, Serialize};

use crate::util::{now_iso, uid};

/// Farm name used until the operator sets one
pub const DEFAULT_FARM_NAME: &str = "Poultry Demo Farm";

fn default_farm_name() -> String {
    DEFAULT_FARM_NAME.to_string()
}

/// `PendingItem::kind` tags for the five log kinds
///
/// Stored as plain strings so queue entries with unrecognized kinds survive
/// import/export round trips.
pub mod kind {
    pub const FEED: &str = "feed";
    pub const MORTALITY: &str = "mortality";
    pub const EGGS: &str = "eggs";
    pub const TREATMENT: &str = "treatment";
    pub const ENVIRONMENT: &str = "environment";
}

/// A person working on the farm
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form role label (manager, vet, ...)
    pub role: String,
    /// Optional phone or other contact detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// A group of birds raised together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flock {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Flock type ("broilers", "layers", ...); serialized as `type`
    #[serde(rename = "type")]
    pub kind: String,
    /// Date the flock was started, ISO `YYYY-MM-DD`
    pub start_date: String,
    /// Bird count at start
    pub initial_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Flock {
    /// Egg capture and egg aggregation only apply to laying flocks
    pub fn is_layers(&self) -> bool {
        self.kind.eq_ignore_ascii_case("layers")
    }
}

/// A feed delivery or consumption record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedLog {
    pub id: String,
    pub flock_id: String,
    /// Date of the feeding, ISO `YYYY-MM-DD`
    pub date: String,
    /// Quantity in kilograms
    pub feed_kg: f64,
    /// Feed type label ("Starter", "Grower", ...)
    pub feed_type: String,
    /// Cost in the operator's currency
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the record was captured, RFC 3339
    pub created_at: String,
    /// Reserved for future edit support; never written today
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FeedLog {
    pub fn new(
        flock_id: impl Into<String>,
        date: impl Into<String>,
        feed_kg: f64,
        feed_type: impl Into<String>,
        cost: f64,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uid(),
            flock_id: flock_id.into(),
            date: date.into(),
            feed_kg,
            feed_type: feed_type.into(),
            cost,
            notes,
            created_at: now_iso(),
            updated_at: None,
        }
    }
}

/// A mortality event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MortalityLog {
    pub id: String,
    pub flock_id: String,
    pub date: String,
    /// Number of birds lost
    pub count: i64,
    /// Suspected cause, free text
    pub cause: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

impl MortalityLog {
    pub fn new(
        flock_id: impl Into<String>,
        date: impl Into<String>,
        count: i64,
        cause: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uid(),
            flock_id: flock_id.into(),
            date: date.into(),
            count,
            cause: cause.into(),
            notes,
            created_at: now_iso(),
        }
    }
}

/// An egg collection record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EggLog {
    pub id: String,
    pub flock_id: String,
    pub date: String,
    /// Eggs collected
    pub collected: i64,
    /// Of those, how many were cracked
    pub cracked: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

impl EggLog {
    pub fn new(
        flock_id: impl Into<String>,
        date: impl Into<String>,
        collected: i64,
        cracked: i64,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uid(),
            flock_id: flock_id.into(),
            date: date.into(),
            collected,
            cracked,
            notes,
            created_at: now_iso(),
        }
    }
}

/// A medication or vaccination record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentLog {
    pub id: String,
    pub flock_id: String,
    pub date: String,
    /// What was administered
    pub treatment: String,
    /// Dosage, free text ("10 ml", "2 g per liter")
    pub dosage: String,
    /// Who administered it
    pub administered_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

impl TreatmentLog {
    pub fn new(
        flock_id: impl Into<String>,
        date: impl Into<String>,
        treatment: impl Into<String>,
        dosage: impl Into<String>,
        administered_by: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uid(),
            flock_id: flock_id.into(),
            date: date.into(),
            treatment: treatment.into(),
            dosage: dosage.into(),
            administered_by: administered_by.into(),
            notes,
            created_at: now_iso(),
        }
    }
}

/// A housing environment reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvLog {
    pub id: String,
    pub flock_id: String,
    pub date: String,
    /// Temperature in degrees Celsius
    pub temperature_c: f64,
    /// Relative humidity, percent
    pub humidity_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

impl EnvLog {
    pub fn new(
        flock_id: impl Into<String>,
        date: impl Into<String>,
        temperature_c: f64,
        humidity_percent: f64,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uid(),
            flock_id: flock_id.into(),
            date: date.into(),
            temperature_c,
            humidity_percent,
            notes,
            created_at: now_iso(),
        }
    }
}

/// A queued, not-yet-synced mutation
///
/// Every capture enqueues one of these alongside the log row. The payload is
/// the serialized log entry itself, so a future backend can replay it without
/// consulting the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingItem {
    pub id: String,
    /// One of the [`kind`] constants for locally captured entries
    pub kind: String,
    /// JSON serialization of the log entry this item carries
    pub payload_json: String,
    /// Same instant as the log entry's `created_at`
    pub created_at: String,
}

impl PendingItem {
    pub fn new(
        kind: impl Into<String>,
        payload_json: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: uid(),
            kind: kind.into(),
            payload_json: payload_json.into(),
            created_at: created_at.into(),
        }
    }
}

/// The five log collections, grouped as they appear on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Logs {
    #[serde(default)]
    pub feed: Vec<FeedLog>,
    #[serde(default)]
    pub mortality: Vec<MortalityLog>,
    #[serde(default)]
    pub eggs: Vec<EggLog>,
    #[serde(default)]
    pub treatments: Vec<TreatmentLog>,
    #[serde(default)]
    pub environment: Vec<EnvLog>,
}

impl Logs {
    /// Total number of log entries across all five kinds
    pub fn len(&self) -> usize {
        self.feed.len()
            + self.mortality.len()
            + self.eggs.len()
            + self.treatments.len()
            + self.environment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The complete application state, and the JSON export/import format
///
/// Every field carries a serde default so a partial document (down to `{}`)
/// imports cleanly; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_farm_name")]
    pub farm_name: String,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub flocks: Vec<Flock>,
    #[serde(default)]
    pub logs: Logs,
    #[serde(default)]
    pub pending_queue: Vec<PendingItem>,
    /// Id of the flock captures default to; may point at no flock
    #[serde(default)]
    pub selected_flock_id: Option<String>,
    /// When the pending queue was last flushed, RFC 3339
    #[serde(default)]
    pub last_sync_at: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            farm_name: default_farm_name(),
            users: Vec::new(),
            flocks: Vec::new(),
            logs: Logs::default(),
            pending_queue: Vec::new(),
            selected_flock_id: None,
            last_sync_at: None,
        }
    }
}

impl Snapshot {
    /// The scalar fields, as stored in the single metadata row
    pub fn meta(&self) -> Meta {
        Meta {
            farm_name: self.farm_name.clone(),
            selected_flock_id: self.selected_flock_id.clone(),
            last_sync_at: self.last_sync_at.clone(),
        }
    }
}

/// The single metadata row backing the snapshot's scalar fields
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub farm_name: String,
    pub selected_flock_id: Option<String>,
    pub last_sync_at: Option<String>,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            farm_name: default_farm_name(),
            selected_flock_id: None,
            last_sync_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_log_new() {
        let log = FeedLog::new("flock-1", "2025-03-01", 18.5, "Starter", 14200.0, None);
        assert_eq!(log.flock_id, "flock-1");
        assert_eq!(log.date, "2025-03-01");
        assert_eq!(log.feed_kg, 18.5);
        assert_eq!(log.feed_type, "Starter");
        assert!(log.notes.is_none());
        assert!(log.updated_at.is_none());
        assert!(!log.id.is_empty());
        assert!(!log.created_at.is_empty());
    }

    #[test]
    fn test_pending_item_shares_timestamp() {
        let log = MortalityLog::new("flock-1", "2025-03-01", 2, "Heat stress", None);
        let payload = serde_json::to_string(&log).unwrap();
        let item = PendingItem::new(kind::MORTALITY, payload, log.created_at.clone());
        assert_eq!(item.kind, "mortality");
        assert_eq!(item.created_at, log.created_at);
        assert_ne!(item.id, log.id);
    }

    #[test]
    fn test_camel_case_wire_fields() {
        let log = FeedLog::new("f1", "2025-03-01", 20.0, "Grower", 0.0, None);
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"flockId\""));
        assert!(json.contains("\"feedKg\""));
        assert!(json.contains("\"feedType\""));
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("flock_id"));
    }

    #[test]
    fn test_flock_type_field_name() {
        let flock = Flock {
            id: "f1".to_string(),
            name: "Flock A".to_string(),
            kind: "broilers".to_string(),
            start_date: "2025-02-15".to_string(),
            initial_count: 200,
            notes: None,
        };
        let json = serde_json::to_string(&flock).unwrap();
        assert!(json.contains("\"type\":\"broilers\""));
        assert!(json.contains("\"startDate\""));
        assert!(json.contains("\"initialCount\""));

        let parsed: Flock = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, flock);
    }

    #[test]
    fn test_flock_is_layers_case_insensitive() {
        let mut flock = Flock {
            id: "f1".to_string(),
            name: "Hens".to_string(),
            kind: "Layers".to_string(),
            start_date: "2025-01-01".to_string(),
            initial_count: 50,
            notes: None,
        };
        assert!(flock.is_layers());
        flock.kind = "LAYERS".to_string();
        assert!(flock.is_layers());
        flock.kind = "broilers".to_string();
        assert!(!flock.is_layers());
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.farm_name, DEFAULT_FARM_NAME);
        assert!(snapshot.users.is_empty());
        assert!(snapshot.flocks.is_empty());
        assert!(snapshot.logs.is_empty());
        assert!(snapshot.pending_queue.is_empty());
        assert!(snapshot.selected_flock_id.is_none());
        assert!(snapshot.last_sync_at.is_none());
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn test_snapshot_ignores_unknown_fields() {
        let json = r#"{
            "farmName": "Hilltop",
            "schemaVersion": 9,
            "users": [{"id": "u1", "name": "Ada", "role": "manager", "badge": "blue"}]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.farm_name, "Hilltop");
        assert_eq!(snapshot.users.len(), 1);
        assert!(snapshot.users[0].contact.is_none());
    }

    #[test]
    fn test_snapshot_serialization_round_trip() {
        let mut snapshot = Snapshot::default();
        snapshot.users.push(User {
            id: "u1".to_string(),
            name: "Demo Manager".to_string(),
            role: "manager".to_string(),
            contact: Some("0800-000-0000".to_string()),
        });
        snapshot
            .logs
            .feed
            .push(FeedLog::new("f1", "2025-03-01", 18.0, "Starter", 14000.0, None));
        snapshot.selected_flock_id = Some("f1".to_string());

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_snapshot_meta() {
        let snapshot = Snapshot {
            selected_flock_id: Some("f1".to_string()),
            last_sync_at: Some("2025-03-01T10:00:00.000Z".to_string()),
            ..Snapshot::default()
        };
        let meta = snapshot.meta();
        assert_eq!(meta.farm_name, DEFAULT_FARM_NAME);
        assert_eq!(meta.selected_flock_id.as_deref(), Some("f1"));
        assert_eq!(
            meta.last_sync_at.as_deref(),
            Some("2025-03-01T10:00:00.000Z")
        );
    }

    #[test]
    fn test_logs_len() {
        let mut logs = Logs::default();
        assert!(logs.is_empty());
        logs.feed
            .push(FeedLog::new("f1", "2025-03-01", 1.0, "Starter", 0.0, None));
        logs.eggs.push(EggLog::new("f1", "2025-03-01", 80, 2, None));
        assert_eq!(logs.len(), 2);
        assert!(!logs.is_empty());
    }
}
