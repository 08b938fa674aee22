use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use quire_runtime::Runtime;
use quire_runtime::config::QuireConfig;

/// Quire data-access runtime.
#[derive(Parser, Debug)]
#[command(name = "quire", about = "Cache-aside CRUD orchestration with audit logging")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "quire.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every configured backend and print the selection.
    Check,
    /// Create entity tables for the given collections and the audit table, then exit.
    Migrate {
        /// Collection to migrate. May be repeated.
        #[arg(long = "collection", required = true)]
        collections: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = QuireConfig::load(&cli.config)?;
    quire_runtime::telemetry::init(&config.telemetry)?;

    if !cli.config.exists() {
        info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    match cli.command {
        Commands::Check => run_check(config).await,
        Commands::Migrate { collections } => run_migrate(config, &collections).await,
    }
}

async fn run_check(config: QuireConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cache = config.cache.backend();
    let audit = config.audit.backend.clone();
    let runtime = Runtime::new(config).await?;

    println!("cache:  {cache}");
    println!("store:  {}", runtime.stores().backend());
    println!("audit:  {audit}");
    println!(
        "ttl:    {}s",
        runtime.config().cache.ttl_seconds.clamp(1, 86_400)
    );

    runtime.shutdown();
    Ok(())
}

async fn run_migrate(
    config: QuireConfig,
    collections: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    // Building the runtime creates the audit table.
    info!(backend = %config.audit.backend, "running audit migrations...");
    let runtime = Runtime::new(config).await?;

    for collection in collections {
        info!(%collection, backend = runtime.stores().backend(), "running entity migrations...");
        runtime.stores().open(collection).await?;
    }

    info!("all migrations complete");
    runtime.shutdown();
    Ok(())
}
