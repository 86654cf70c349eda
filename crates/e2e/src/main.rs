//! foreman-qa - run checks against a Foreman-compatible server

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foreman_qa_common::{logging, SuiteConfig};
use foreman_qa_e2e::output::{render_record, OutputFormat};
use foreman_qa_e2e::{E2eError, Harness};
use foreman_qa_records::entities::Medium;
use foreman_qa_records::Entity;
use tracing::info;

/// Foreman QA - acceptance checks for the management API
#[derive(Parser)]
#[command(name = "foreman-qa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Suite configuration file
    #[arg(long, env = "FOREMAN_QA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Use the in-memory server instead of the configured one
    #[arg(long, global = true)]
    offline: bool,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server answers /api/status
    Status,

    /// Create a medium with its dependencies, read it back and delete it
    Smoke,

    /// Show version information
    Version,
}

fn harness(cli: &Cli) -> anyhow::Result<Harness> {
    if cli.offline {
        return Ok(Harness::offline());
    }
    let path = cli
        .config
        .clone()
        .unwrap_or_else(foreman_qa_common::default_config_path);
    let config = SuiteConfig::load(&path)?.apply_env()?;
    Ok(Harness::live(config)?)
}

fn smoke(harness: &Harness, format: OutputFormat) -> anyhow::Result<()> {
    let api = harness.api();

    let medium = api.materialize(Medium::build()?)?;
    let id = medium
        .id()
        .ok_or_else(|| E2eError::Smoke("created medium has no id".to_string()))?;
    info!("Created medium {}", id);

    let read = api.read_entity::<Medium>(id)?;
    if read.str("name") != medium.str("name") {
        return Err(E2eError::Smoke(format!(
            "medium {} read back as {:?}, expected {:?}",
            id,
            read.str("name"),
            medium.str("name")
        ))
        .into());
    }
    println!("{}", render_record(&read, format));

    api.delete(&medium)?;
    println!("✅ Smoke check passed");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        Commands::Status => {
            let harness = harness(&cli)?;
            match harness.status() {
                Ok(body) => println!("✅ Server is up at {}: {}", harness.config().server.url, body),
                Err(e) => {
                    println!("❌ {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Smoke => smoke(&harness(&cli)?, cli.format)?,
        Commands::Version => {
            println!("foreman-qa v{}", foreman_qa_common::VERSION);
        }
    }

    Ok(())
}
