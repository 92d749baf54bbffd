//! PPI Ingest - interaction load tool

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use ppi_common::logging::{init_logging, LogConfig, LogLevel};
use ppi_ingest::catalog::InMemoryGeneCatalog;
use ppi_ingest::config::StringDbConfig;
use ppi_ingest::orchestrator::StringLoadOrchestrator;
use ppi_ingest::sink::MemoryAssociationSink;

#[derive(Parser, Debug)]
#[command(name = "ppi-ingest")]
#[command(author, version, about = "Protein-protein interaction load tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Load STRING interaction links for the given taxa
    Links {
        /// Path to protein.links.detailed.txt (optionally gzipped)
        #[arg(short, long)]
        links_file: PathBuf,

        /// Path to the peptide-to-gene mapping TSV (optionally gzipped)
        #[arg(short, long)]
        mapping_file: Option<PathBuf>,

        /// Taxon ids to load, comma separated (e.g. 9606,10090)
        #[arg(short, long, value_delimiter = ',', required = true)]
        taxa: Vec<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    log_config.log_file_prefix = "ppi-ingest".to_string();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }

    init_logging(&log_config)?;

    match cli.command {
        Command::Links {
            links_file,
            mapping_file,
            taxa,
        } => {
            let config = StringDbConfig::from_env()?;

            // Without a database feature build this runs against in-memory
            // collaborators, which makes it a dry-run validator for inputs.
            let catalog = Arc::new(InMemoryGeneCatalog::new());
            let sink = Arc::new(MemoryAssociationSink::new());

            let orchestrator = StringLoadOrchestrator::new(config, catalog, sink);
            let report = orchestrator
                .load(&links_file, mapping_file.as_ref(), &taxa)
                .await?;

            info!(
                taxa = report.batches.len(),
                persisted = report.total_persisted(),
                dropped = report.total_dropped(),
                "Load finished"
            );
        },
    }

    Ok(())
}
