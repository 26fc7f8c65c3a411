//! Flock command handlers

use anyhow::{bail, Result};

use roost_core::{Flock, Repository, Snapshot};

use crate::output::Output;

/// List all flocks
pub fn list(repo: &Repository, output: &Output) -> Result<()> {
    let snapshot = repo.snapshot();
    output.print_flocks(&snapshot.flocks, snapshot.selected_flock_id.as_deref());
    Ok(())
}

/// Select the flock captures default to
pub async fn select(repo: &Repository, flock_id: String, output: &Output) -> Result<()> {
    let snapshot = repo.snapshot();
    if !snapshot.flocks.iter().any(|f| f.id == flock_id) {
        bail!("Flock not found: {}", flock_id);
    }

    repo.set_selected_flock(flock_id.clone()).await?;

    output.success(&format!("Selected flock: {}", flock_id));
    Ok(())
}

/// Resolve the flock a command operates on
///
/// An explicitly requested id must exist. Otherwise the selected flock is
/// used when it still exists, then the first flock, and with no flocks at
/// all this is an error.
pub(crate) fn resolve_flock<'a>(
    snapshot: &'a Snapshot,
    requested: Option<&str>,
) -> Result<&'a Flock> {
    if let Some(id) = requested {
        return snapshot
            .flocks
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| anyhow::anyhow!("Flock not found: {}", id));
    }

    if let Some(selected) = snapshot.selected_flock_id.as_deref() {
        if let Some(flock) = snapshot.flocks.iter().find(|f| f.id == selected) {
            return Ok(flock);
        }
    }

    snapshot
        .flocks
        .first()
        .ok_or_else(|| anyhow::anyhow!("No flocks recorded yet"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use roost_core::Config;
    use tempfile::TempDir;

    fn flock(id: &str, name: &str) -> Flock {
        Flock {
            id: id.to_string(),
            name: name.to_string(),
            kind: "broilers".to_string(),
            start_date: "2025-01-01".to_string(),
            initial_count: 100,
            notes: None,
        }
    }

    fn snapshot_with(flocks: Vec<Flock>, selected: Option<&str>) -> Snapshot {
        Snapshot {
            flocks,
            selected_flock_id: selected.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_explicit_id() {
        let snapshot = snapshot_with(vec![flock("a", "A"), flock("b", "B")], Some("a"));
        let resolved = resolve_flock(&snapshot, Some("b")).unwrap();
        assert_eq!(resolved.id, "b");
    }

    #[test]
    fn test_resolve_explicit_id_must_exist() {
        let snapshot = snapshot_with(vec![flock("a", "A")], Some("a"));
        let err = resolve_flock(&snapshot, Some("ghost")).unwrap_err();
        assert!(err.to_string().contains("Flock not found"));
    }

    #[test]
    fn test_resolve_prefers_selected() {
        let snapshot = snapshot_with(vec![flock("a", "A"), flock("b", "B")], Some("b"));
        let resolved = resolve_flock(&snapshot, None).unwrap();
        assert_eq!(resolved.id, "b");
    }

    #[test]
    fn test_resolve_falls_back_when_selection_is_stale() {
        let snapshot = snapshot_with(vec![flock("a", "A")], Some("gone"));
        let resolved = resolve_flock(&snapshot, None).unwrap();
        assert_eq!(resolved.id, "a");
    }

    #[test]
    fn test_resolve_with_no_flocks_errors() {
        let snapshot = snapshot_with(vec![], None);
        let err = resolve_flock(&snapshot, None).unwrap_err();
        assert!(err.to_string().contains("No flocks recorded"));
    }

    async fn open_repo(temp_dir: &TempDir, seed_demo_data: bool) -> Repository {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            seed_demo_data,
        };
        Repository::open_with_config(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_select_rejects_unknown_flock() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, false).await;
        let output = Output::new(OutputFormat::Quiet);

        let err = select(&repo, "ghost".to_string(), &output)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Flock not found"));
    }

    #[tokio::test]
    async fn test_select_stores_an_existing_flock() {
        let temp_dir = TempDir::new().unwrap();
        let repo = open_repo(&temp_dir, true).await;
        let output = Output::new(OutputFormat::Quiet);

        let id = repo.snapshot().flocks[0].id.clone();
        select(&repo, id.clone(), &output).await.unwrap();

        // Export reads the store directly, so the new selection is visible
        let mut buf: Vec<u8> = Vec::new();
        assert!(repo.export_to_sink(&mut buf).await);
        let exported: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(exported["selectedFlockId"], serde_json::json!(id));
    }
}
