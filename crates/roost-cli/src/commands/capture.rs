//! Capture command handlers
//!
//! Each capture resolves its target flock, appends the log through the
//! repository, and reports the recorded entry.

use anyhow::{bail, Result};

use roost_core::util::parse_date;
use roost_core::Repository;

use crate::commands::flock::resolve_flock;
use crate::output::Output;

/// Record a feed log
#[allow(clippy::too_many_arguments)]
pub async fn feed(
    repo: &Repository,
    flock: Option<String>,
    date: String,
    kg: f64,
    feed_type: String,
    cost: f64,
    notes: Option<String>,
    output: &Output,
) -> Result<()> {
    let date = valid_date(date)?;
    let flock_id = target_flock(repo, flock.as_deref())?;

    let log = repo
        .add_feed(flock_id, date, kg, feed_type, cost, notes)
        .await?;

    output.print_recorded(
        &log.id,
        &log,
        &format!(
            "Recorded {} kg of {} for {}",
            log.feed_kg, log.feed_type, log.date
        ),
    );
    Ok(())
}

/// Record a mortality event
pub async fn mortality(
    repo: &Repository,
    flock: Option<String>,
    date: String,
    count: i64,
    cause: String,
    notes: Option<String>,
    output: &Output,
) -> Result<()> {
    let date = valid_date(date)?;
    let count = valid_count(count)?;
    let flock_id = target_flock(repo, flock.as_deref())?;

    let log = repo
        .add_mortality(flock_id, date, count, cause, notes)
        .await?;

    output.print_recorded(
        &log.id,
        &log,
        &format!("Recorded {} death(s) for {}", log.count, log.date),
    );
    Ok(())
}

/// Record an egg collection
pub async fn eggs(
    repo: &Repository,
    flock: Option<String>,
    date: String,
    collected: i64,
    cracked: i64,
    notes: Option<String>,
    output: &Output,
) -> Result<()> {
    let date = valid_date(date)?;
    let flock_id = target_flock(repo, flock.as_deref())?;

    let log = repo
        .add_eggs(flock_id, date, collected, cracked, notes)
        .await?;

    output.print_recorded(
        &log.id,
        &log,
        &format!(
            "Recorded {} egg(s), {} cracked, for {}",
            log.collected, log.cracked, log.date
        ),
    );
    Ok(())
}

/// Record a treatment
#[allow(clippy::too_many_arguments)]
pub async fn treatment(
    repo: &Repository,
    flock: Option<String>,
    date: String,
    treatment: String,
    dosage: String,
    administered_by: String,
    notes: Option<String>,
    output: &Output,
) -> Result<()> {
    let date = valid_date(date)?;
    let flock_id = target_flock(repo, flock.as_deref())?;

    let log = repo
        .add_treatment(flock_id, date, treatment, dosage, administered_by, notes)
        .await?;

    output.print_recorded(
        &log.id,
        &log,
        &format!("Recorded {} ({}) for {}", log.treatment, log.dosage, log.date),
    );
    Ok(())
}

/// Record an environment reading
pub async fn env(
    repo: &Repository,
    flock: Option<String>,
    date: String,
    temp: f64,
    humidity: f64,
    notes: Option<String>,
    output: &Output,
) -> Result<()> {
    let date = valid_date(date)?;
    let flock_id = target_flock(repo, flock.as_deref())?;

    let log = repo.add_env(flock_id, date, temp, humidity, notes).await?;

    output.print_recorded(
        &log.id,
        &log,
        &format!(
            "Recorded {} °C / {}% humidity for {}",
            log.temperature_c, log.humidity_percent, log.date
        ),
    );
    Ok(())
}

fn target_flock(repo: &Repository, requested: Option<&str>) -> Result<String> {
    let snapshot = repo.snapshot();
    Ok(resolve_flock(&snapshot, requested)?.id.clone())
}

fn valid_date(date: String) -> Result<String> {
    if parse_date(&date).is_none() {
        bail!("Invalid date: {} (expected YYYY-MM-DD)", date);
    }
    Ok(date)
}

fn valid_count(count: i64) -> Result<i64> {
    if count < 0 {
        bail!("Invalid count: {} (expected zero or more)", count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use roost_core::Config;
    use tempfile::TempDir;

    #[test]
    fn test_valid_date_accepts_iso_dates() {
        assert_eq!(valid_date("2025-03-01".to_string()).unwrap(), "2025-03-01");
    }

    #[test]
    fn test_valid_date_rejects_other_formats() {
        assert!(valid_date("03/01/2025".to_string()).is_err());
        assert!(valid_date("yesterday".to_string()).is_err());
        assert!(valid_date("2025-13-40".to_string()).is_err());
    }

    #[test]
    fn test_valid_count_accepts_zero_and_positive() {
        assert_eq!(valid_count(0).unwrap(), 0);
        assert_eq!(valid_count(12).unwrap(), 12);
    }

    #[test]
    fn test_valid_count_rejects_negative() {
        let err = valid_count(-5).unwrap_err();
        assert!(err.to_string().contains("Invalid count"));
    }

    async fn open_repo(temp_dir: &TempDir) -> Repository {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            seed_demo_data: true,
        };
        Repository::open_with_config(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_negative_mortality_count_is_not_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir).await;
        let output = Output::new(OutputFormat::Quiet);

        let mut before: Vec<u8> = Vec::new();
        assert!(repo.export_to_sink(&mut before).await);

        let result = mortality(
            &repo,
            None,
            "2025-03-01".to_string(),
            -5,
            "Hawk".to_string(),
            None,
            &output,
        )
        .await;
        assert!(result.unwrap_err().to_string().contains("Invalid count"));

        // Neither a mortality log nor a pending item was written
        let mut after: Vec<u8> = Vec::new();
        assert!(repo.export_to_sink(&mut after).await);
        assert_eq!(after, before);
    }
}
