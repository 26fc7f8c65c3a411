//! Roost CLI
//!
//! Command-line interface for Roost - offline-first poultry farm data
//! capture.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use roost_core::{Config, Repository};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "roost")]
#[command(about = "Roost - offline-first poultry farm data capture")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show farm status (counts, pending queue, last sync)
    Status,
    /// Show live birds and trailing 7-day figures for a flock
    Dashboard {
        /// Flock ID (defaults to the selected flock)
        #[arg(long)]
        flock: Option<String>,
    },
    /// List all flocks
    #[command(alias = "ls")]
    Flocks,
    /// Select the flock captures default to
    Select {
        /// Flock ID
        flock_id: String,
    },
    /// Record a feed log
    Feed {
        /// Amount fed, in kilograms
        #[arg(long)]
        kg: f64,
        /// Feed type (e.g. Starter, Layer mash)
        #[arg(long = "type", value_name = "TYPE")]
        feed_type: String,
        /// Feed cost
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        /// Log date (YYYY-MM-DD, defaults to today)
        #[arg(long, default_value_t = roost_core::util::today())]
        date: String,
        /// Flock ID (defaults to the selected flock)
        #[arg(long)]
        flock: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record a mortality event
    Mortality {
        /// Number of deaths
        count: i64,
        /// Cause of death
        cause: String,
        /// Log date (YYYY-MM-DD, defaults to today)
        #[arg(long, default_value_t = roost_core::util::today())]
        date: String,
        /// Flock ID (defaults to the selected flock)
        #[arg(long)]
        flock: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record an egg collection
    Eggs {
        /// Eggs collected
        collected: i64,
        /// Of which cracked
        #[arg(long, default_value_t = 0)]
        cracked: i64,
        /// Log date (YYYY-MM-DD, defaults to today)
        #[arg(long, default_value_t = roost_core::util::today())]
        date: String,
        /// Flock ID (defaults to the selected flock)
        #[arg(long)]
        flock: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record a treatment
    Treatment {
        /// Treatment name
        treatment: String,
        /// Dosage (e.g. "10 ml")
        #[arg(long)]
        dosage: String,
        /// Who administered it
        #[arg(long)]
        by: String,
        /// Log date (YYYY-MM-DD, defaults to today)
        #[arg(long, default_value_t = roost_core::util::today())]
        date: String,
        /// Flock ID (defaults to the selected flock)
        #[arg(long)]
        flock: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record an environment reading
    Env {
        /// Temperature in degrees Celsius
        #[arg(long)]
        temp: f64,
        /// Relative humidity percentage
        #[arg(long)]
        humidity: f64,
        /// Log date (YYYY-MM-DD, defaults to today)
        #[arg(long, default_value_t = roost_core::util::today())]
        date: String,
        /// Flock ID (defaults to the selected flock)
        #[arg(long)]
        flock: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Clear the pending queue (simulated upload)
    Sync,
    /// Export the full state as pretty-printed JSON
    Export {
        /// Destination file, or "-" for stdout
        path: String,
    },
    /// Merge a snapshot file into the store
    Import {
        /// Source file, or "-" for stdin
        path: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, seed_demo_data)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    init_logging();

    // Config commands don't need the repository
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;
    let repo = Repository::open_with_config(config.clone()).await?;
    debug!("Repository open at {}", config.data_dir.display());

    match cli.command {
        Commands::Status => commands::status::show(&repo, &config, &output),
        Commands::Dashboard { flock } => commands::dashboard::show(&repo, flock, &output),
        Commands::Flocks => commands::flock::list(&repo, &output),
        Commands::Select { flock_id } => commands::flock::select(&repo, flock_id, &output).await,
        Commands::Feed {
            kg,
            feed_type,
            cost,
            date,
            flock,
            notes,
        } => commands::capture::feed(&repo, flock, date, kg, feed_type, cost, notes, &output).await,
        Commands::Mortality {
            count,
            cause,
            date,
            flock,
            notes,
        } => commands::capture::mortality(&repo, flock, date, count, cause, notes, &output).await,
        Commands::Eggs {
            collected,
            cracked,
            date,
            flock,
            notes,
        } => commands::capture::eggs(&repo, flock, date, collected, cracked, notes, &output).await,
        Commands::Treatment {
            treatment,
            dosage,
            by,
            date,
            flock,
            notes,
        } => {
            commands::capture::treatment(&repo, flock, date, treatment, dosage, by, notes, &output)
                .await
        }
        Commands::Env {
            temp,
            humidity,
            date,
            flock,
            notes,
        } => commands::capture::env(&repo, flock, date, temp, humidity, notes, &output).await,
        Commands::Sync => commands::sync::sync(&repo, &output).await,
        Commands::Export { path } => commands::snapshot::export(&repo, path, &output).await,
        Commands::Import { path } => commands::snapshot::import(&repo, path, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Initialize logging when ROOST_LOG is set
///
/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_logging() {
    let Ok(log_level) = std::env::var("ROOST_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!("roost_core={},roost_cli={}", log_level, log_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
