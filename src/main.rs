//! # Review Harness CLI (`rvw`)
//!
//! The `rvw` binary is the primary interface for Review Harness. It provides
//! commands for inspecting the document catalog, listing candidate
//! comparison pairs, checking data source health, and starting the review
//! panel server.
//!
//! ## Usage
//!
//! ```bash
//! rvw --config ./config/rvw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rvw catalog` | Print the expanded document catalog |
//! | `rvw pairs <batch>` | Print candidate comparison pairs for a batch |
//! | `rvw sources` | List data sources and their health |
//! | `rvw serve` | Start the review panel HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use review_harness::config::{self, Config};
use review_harness::models::DocType;
use review_harness::session::ReviewSession;
use review_harness::{catalog, server, sources};

/// Review Harness — a review panel backend for paired document versions
/// with an auditable decision trail.
#[derive(Parser)]
#[command(
    name = "rvw",
    about = "Review Harness — a review panel for paired document versions",
    version,
    long_about = "Review Harness loads a catalog of batches whose CI and PL documents are \
    versioned in lockstep, offers side-by-side comparison pairs, records reviewer decisions \
    into an append-only audit trail, and exports that trail as CSV to object storage."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rvw.toml`. Catalog, storage, viewer, and server
    /// settings are read from this file; a missing file falls back to the
    /// built-in minimal configuration.
    #[arg(long, global = true, default_value = "./config/rvw.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the expanded document catalog.
    ///
    /// Each uploaded batch version expands into two records (CI and PL)
    /// sharing the row's portal status and reason.
    Catalog,

    /// Print the candidate comparison pairs for a batch.
    ///
    /// Pairs are every adjacent version pair plus, when more than two
    /// versions exist, one trailing first-vs-last pair.
    Pairs {
        /// Batch identifier (e.g. `B001`).
        batch: String,

        /// Document type: `CI` or `PL`.
        #[arg(long, default_value = "CI")]
        doc_type: String,
    },

    /// List data sources and their health.
    Sources,

    /// Start the review panel HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// panel JSON API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::warn!(path = %cli.config.display(), "config file missing; using minimal defaults");
        Config::minimal()
    };

    match cli.command {
        Commands::Catalog => run_catalog(&cfg)?,
        Commands::Pairs { batch, doc_type } => run_pairs(&cfg, &batch, &doc_type)?,
        Commands::Sources => sources::list_sources(&cfg)?,
        Commands::Serve => server::run_server(&cfg).await?,
    }

    Ok(())
}

fn run_catalog(cfg: &Config) -> anyhow::Result<()> {
    let records = catalog::load_catalog(cfg)?;

    println!(
        "{:<10} {:<6} {:<9} {:<28} {:<12} REASON",
        "BATCH", "TYPE", "VERSION", "KEY", "STATUS"
    );
    for record in &records {
        println!(
            "{:<10} {:<6} {:<9} {:<28} {:<12} {}",
            record.batch,
            record.doc_type,
            record.version,
            record.storage_key,
            record.portal_status,
            record.reason
        );
    }
    println!("{} records", records.len());

    Ok(())
}

fn run_pairs(cfg: &Config, batch: &str, doc_type: &str) -> anyhow::Result<()> {
    let doc_type = DocType::from_str(doc_type)?;
    let records = catalog::load_catalog(cfg)?;

    let mut session = ReviewSession::new(records);
    session.select_batch(batch)?;
    session.select_doc_type(doc_type);

    let pairs = session.comparison_pairs();
    if pairs.is_empty() {
        println!(
            "Not enough versions available for comparison. At least 2 versions are required."
        );
        return Ok(());
    }

    for (a, b) in pairs {
        println!("Ver {} vs {}", a, b);
    }

    Ok(())
}
