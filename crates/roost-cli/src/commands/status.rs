//! Status command handler

use anyhow::Result;

use roost_core::{Config, Repository};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(repo: &Repository, config: &Config, output: &Output) -> Result<()> {
    let snapshot = repo.snapshot();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "farmName": snapshot.farm_name,
                    "selectedFlockId": snapshot.selected_flock_id,
                    "lastSyncAt": snapshot.last_sync_at,
                    "pendingItems": snapshot.pending_queue.len(),
                    "counts": {
                        "flocks": snapshot.flocks.len(),
                        "users": snapshot.users.len(),
                        "feed": snapshot.logs.feed.len(),
                        "mortality": snapshot.logs.mortality.len(),
                        "eggs": snapshot.logs.eggs.len(),
                        "treatments": snapshot.logs.treatments.len(),
                        "environment": snapshot.logs.environment.len()
                    },
                    "storage": {
                        "location": config.data_dir.display().to_string()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", snapshot.pending_queue.len());
        }
        OutputFormat::Human => {
            println!("Roost Status");
            println!("============");
            println!();
            println!("Farm: {}", snapshot.farm_name);
            println!();
            println!("Contents:");
            println!("  Flocks: {}", snapshot.flocks.len());
            println!("  Users:  {}", snapshot.users.len());
            println!(
                "  Logs:   {} (feed {}, mortality {}, eggs {}, treatments {}, environment {})",
                snapshot.logs.len(),
                snapshot.logs.feed.len(),
                snapshot.logs.mortality.len(),
                snapshot.logs.eggs.len(),
                snapshot.logs.treatments.len(),
                snapshot.logs.environment.len()
            );
            println!();
            println!("Sync:");
            println!("  Pending:   {} item(s)", snapshot.pending_queue.len());
            println!(
                "  Last sync: {}",
                snapshot.last_sync_at.as_deref().unwrap_or("never")
            );
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
        }
    }

    Ok(())
}
