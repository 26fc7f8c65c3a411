//! Sync command handler

use anyhow::Result;

use roost_core::Repository;

use crate::output::Output;

/// Clear the pending queue as if the backend accepted every item
pub async fn sync(repo: &Repository, output: &Output) -> Result<()> {
    let pending = repo.snapshot().pending_queue.len();

    repo.simulate_sync().await?;

    if pending == 0 {
        output.success("Nothing to upload; sync time stamped");
    } else {
        output.success(&format!("Synced {} pending item(s)", pending));
    }
    Ok(())
}
