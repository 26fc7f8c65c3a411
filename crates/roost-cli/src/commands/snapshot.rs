//! Snapshot export and import command handlers

use std::fs::File;

use anyhow::{bail, Context, Result};

use roost_core::Repository;

use crate::output::Output;

/// Write the full state to a JSON file, or to stdout with "-"
pub async fn export(repo: &Repository, path: String, output: &Output) -> Result<()> {
    let ok = if path == "-" {
        let mut stdout = std::io::stdout().lock();
        repo.export_to_sink(&mut stdout).await
    } else {
        let mut file =
            File::create(&path).with_context(|| format!("Failed to create {}", path))?;
        repo.export_to_sink(&mut file).await
    };

    if !ok {
        bail!("Export failed");
    }
    if path != "-" {
        output.success(&format!("Exported snapshot to {}", path));
    }
    Ok(())
}

/// Merge a snapshot file into the store, or read from stdin with "-"
pub async fn import(repo: &Repository, path: String, output: &Output) -> Result<()> {
    let ok = if path == "-" {
        let mut stdin = std::io::stdin().lock();
        repo.import_from_source(&mut stdin).await
    } else {
        let mut file = File::open(&path).with_context(|| format!("Failed to open {}", path))?;
        repo.import_from_source(&mut file).await
    };

    if !ok {
        bail!("Import failed: not a valid snapshot document");
    }
    output.success(&format!(
        "Imported snapshot from {}",
        if path == "-" { "stdin" } else { path.as_str() }
    ));
    Ok(())
}
