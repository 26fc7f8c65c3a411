//! Dashboard command handler
//!
//! Derives per-flock figures from the snapshot: live bird count and
//! 7-day feed and egg totals.

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};

use roost_core::util::parse_date;
use roost_core::{Flock, Repository, Snapshot};

use crate::commands::flock::resolve_flock;
use crate::output::{Output, OutputFormat};

/// Figures derived for one flock
pub(crate) struct FlockStats {
    /// Initial count minus recorded deaths, clamped at zero
    pub live_birds: i64,
    /// Feed recorded in the 7-day window, in kilograms
    pub feed_kg_last_7: f64,
    /// Eggs collected in the window; None for non-layer flocks
    pub eggs_last_7: Option<i64>,
}

/// Show the dashboard for a flock
pub fn show(repo: &Repository, flock: Option<String>, output: &Output) -> Result<()> {
    let snapshot = repo.snapshot();
    let flock = resolve_flock(&snapshot, flock.as_deref())?;
    let stats = flock_stats(&snapshot, flock, Local::now().date_naive());

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "flockId": flock.id,
                    "name": flock.name,
                    "type": flock.kind,
                    "liveBirds": stats.live_birds,
                    "feedKgLast7": stats.feed_kg_last_7,
                    "eggsLast7": stats.eggs_last_7,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.live_birds);
        }
        OutputFormat::Human => {
            println!("Flock: {} ({})", flock.name, flock.kind);
            println!("Started: {} with {} birds", flock.start_date, flock.initial_count);
            println!();
            println!("Live birds:  {}", stats.live_birds);
            println!("Feed (7d):   {} kg", stats.feed_kg_last_7);
            if let Some(eggs) = stats.eggs_last_7 {
                println!("Eggs (7d):   {}", eggs);
            }
        }
    }

    Ok(())
}

/// Compute dashboard figures for `flock` as of `today`
///
/// The window opens six days before today and has no upper bound, so
/// rows dated ahead of today still count. Unparseable log dates fall
/// outside any window.
pub(crate) fn flock_stats(snapshot: &Snapshot, flock: &Flock, today: NaiveDate) -> FlockStats {
    let deaths: i64 = snapshot
        .logs
        .mortality
        .iter()
        .filter(|l| l.flock_id == flock.id)
        .map(|l| l.count)
        .sum();
    let live_birds = (flock.initial_count - deaths).max(0);

    let cutoff = today - Duration::days(6);
    let in_window = |date: &str| parse_date(date).map(|d| d >= cutoff).unwrap_or(false);

    let feed_kg_last_7 = snapshot
        .logs
        .feed
        .iter()
        .filter(|l| l.flock_id == flock.id && in_window(&l.date))
        .map(|l| l.feed_kg)
        .sum();

    let eggs_last_7 = flock.is_layers().then(|| {
        snapshot
            .logs
            .eggs
            .iter()
            .filter(|l| l.flock_id == flock.id && in_window(&l.date))
            .map(|l| l.collected)
            .sum()
    });

    FlockStats {
        live_birds,
        feed_kg_last_7,
        eggs_last_7,
    }
}
