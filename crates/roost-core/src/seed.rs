//! Built-in demo dataset
//!
//! Dev builds install this on first start so the dashboard has something to
//! show: a broiler flock two weeks in, with feed, mortality, environment,
//! and treatment history spread over the last ten days. Dates are relative
//! to today, ids are fresh on every build.

use chrono::{Duration, Local, NaiveDate};

use crate::models::{
    EnvLog, FeedLog, Flock, Logs, MortalityLog, Snapshot, TreatmentLog, User, DEFAULT_FARM_NAME,
};
use crate::util::{now_iso, uid};

/// Build the demo dataset relative to today's date
pub fn demo_snapshot() -> Snapshot {
    build(Local::now().date_naive())
}

fn build(today: NaiveDate) -> Snapshot {
    let flock_id = uid();
    let start_date = today - Duration::days(14);
    let flock = Flock {
        id: flock_id.clone(),
        name: "Flock A".to_string(),
        kind: "broilers".to_string(),
        start_date: start_date.to_string(),
        initial_count: 200,
        notes: Some("Starter batch".to_string()),
    };

    let feed = (0..10)
        .map(|i| FeedLog {
            id: uid(),
            flock_id: flock_id.clone(),
            date: (today - Duration::days(9 - i)).to_string(),
            feed_kg: 18.0 + 0.5 * i as f64,
            feed_type: "Starter".to_string(),
            cost: 14000.0 + 200.0 * i as f64,
            notes: None,
            created_at: now_iso(),
            updated_at: None,
        })
        .collect();

    let mortality = [0, 3, 6, 9]
        .iter()
        .map(|&offset| MortalityLog {
            id: uid(),
            flock_id: flock_id.clone(),
            date: (today - Duration::days(9 - offset)).to_string(),
            count: 1,
            cause: "Weakness".to_string(),
            notes: None,
            created_at: now_iso(),
        })
        .collect();

    let environment = (0..10)
        .step_by(2)
        .map(|i: i64| EnvLog {
            id: uid(),
            flock_id: flock_id.clone(),
            date: (today - Duration::days(9 - i)).to_string(),
            temperature_c: 29.0 + ((i / 2) % 3) as f64,
            humidity_percent: 65.0 + (i / 2) as f64,
            notes: None,
            created_at: now_iso(),
        })
        .collect();

    let treatments = vec![
        TreatmentLog {
            id: uid(),
            flock_id: flock_id.clone(),
            date: (today - Duration::days(8)).to_string(),
            treatment: "Multi-vitamin".to_string(),
            dosage: "10 ml".to_string(),
            administered_by: "Farm Vet".to_string(),
            notes: None,
            created_at: now_iso(),
        },
        TreatmentLog {
            id: uid(),
            flock_id: flock_id.clone(),
            date: (today - Duration::days(2)).to_string(),
            treatment: "Coccidiostat".to_string(),
            dosage: "15 ml".to_string(),
            administered_by: "Farm Vet".to_string(),
            notes: None,
            created_at: now_iso(),
        },
    ];

    let user = User {
        id: uid(),
        name: "Demo Manager".to_string(),
        role: "manager".to_string(),
        contact: Some("0800-000-0000".to_string()),
    };

    Snapshot {
        farm_name: DEFAULT_FARM_NAME.to_string(),
        users: vec![user],
        flocks: vec![flock],
        logs: Logs {
            feed,
            mortality,
            eggs: Vec::new(),
            treatments,
            environment,
        },
        pending_queue: Vec::new(),
        selected_flock_id: Some(flock_id),
        last_sync_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_demo_snapshot_shape() {
        let snapshot = build(fixed_today());

        assert_eq!(snapshot.farm_name, DEFAULT_FARM_NAME);
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.flocks.len(), 1);
        assert_eq!(snapshot.logs.feed.len(), 10);
        assert_eq!(snapshot.logs.mortality.len(), 4);
        assert_eq!(snapshot.logs.environment.len(), 5);
        assert_eq!(snapshot.logs.treatments.len(), 2);
        assert!(snapshot.logs.eggs.is_empty());
        assert!(snapshot.pending_queue.is_empty());
        assert!(snapshot.last_sync_at.is_none());
    }

    #[test]
    fn test_selected_flock_points_at_seeded_flock() {
        let snapshot = build(fixed_today());
        assert_eq!(
            snapshot.selected_flock_id.as_deref(),
            Some(snapshot.flocks[0].id.as_str())
        );
    }

    #[test]
    fn test_all_logs_reference_the_flock() {
        let snapshot = build(fixed_today());
        let flock_id = &snapshot.flocks[0].id;

        assert!(snapshot.logs.feed.iter().all(|l| &l.flock_id == flock_id));
        assert!(snapshot
            .logs
            .mortality
            .iter()
            .all(|l| &l.flock_id == flock_id));
        assert!(snapshot
            .logs
            .environment
            .iter()
            .all(|l| &l.flock_id == flock_id));
        assert!(snapshot
            .logs
            .treatments
            .iter()
            .all(|l| &l.flock_id == flock_id));
    }

    #[test]
    fn test_dates_cover_the_last_ten_days() {
        let today = fixed_today();
        let snapshot = build(today);

        assert_eq!(snapshot.flocks[0].start_date, "2025-02-24");
        assert_eq!(snapshot.logs.feed[0].date, "2025-03-01");
        assert_eq!(snapshot.logs.feed[9].date, "2025-03-10");

        // Feed quantities and costs ramp up over the ten days
        assert_eq!(snapshot.logs.feed[0].feed_kg, 18.0);
        assert_eq!(snapshot.logs.feed[9].feed_kg, 22.5);
        assert_eq!(snapshot.logs.feed[0].cost, 14000.0);
        assert_eq!(snapshot.logs.feed[9].cost, 15800.0);
    }

    #[test]
    fn test_ids_are_unique() {
        let snapshot = build(fixed_today());

        let mut ids = HashSet::new();
        ids.insert(snapshot.flocks[0].id.clone());
        ids.insert(snapshot.users[0].id.clone());
        for log in &snapshot.logs.feed {
            ids.insert(log.id.clone());
        }
        for log in &snapshot.logs.mortality {
            ids.insert(log.id.clone());
        }
        for log in &snapshot.logs.environment {
            ids.insert(log.id.clone());
        }
        for log in &snapshot.logs.treatments {
            ids.insert(log.id.clone());
        }

        assert_eq!(ids.len(), 1 + 1 + 10 + 4 + 5 + 2);
    }
}
