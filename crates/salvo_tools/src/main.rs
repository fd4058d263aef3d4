//! Salvo - Development Tools

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salvo_core::catalog::Catalog;
use salvo_tools::{inspect, validate, verify};

#[derive(Parser)]
#[command(name = "salvo-tools")]
#[command(about = "Development tools for Salvo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the catalog and every scenario in an asset directory
    Validate {
        /// Path to asset directory
        #[arg(default_value = "assets")]
        path: PathBuf,
    },
    /// Print what a snapshot file holds
    Inspect {
        /// Snapshot file (.ron or binary)
        snapshot: PathBuf,
        /// Also check the snapshot against this catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Play back a replay and compare its final state hash
    VerifyReplay {
        /// Replay file
        replay: PathBuf,
        /// Catalog the game was played with
        #[arg(long, default_value = "assets/data/catalog.ron")]
        catalog: PathBuf,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            match validate::validate_data_directory(&path) {
                Ok(report) => {
                    println!(
                        "catalog: {} units, {} weapons",
                        report.units, report.weapons
                    );
                    for (file, result) in &report.scenarios {
                        match result {
                            Ok(summary) => println!("ok    {summary}"),
                            Err(e) => println!("FAIL  {}: {e}", file.display()),
                        }
                    }
                    if report.is_ok() {
                        tracing::info!("Validation passed");
                        ExitCode::SUCCESS
                    } else {
                        tracing::error!("Validation failed");
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Inspect { snapshot, catalog } => {
            let catalog = match catalog.map(|path| Catalog::load(&path)).transpose() {
                Ok(catalog) => catalog,
                Err(e) => {
                    tracing::error!("Cannot load catalog: {e}");
                    return ExitCode::FAILURE;
                }
            };
            match inspect::inspect_snapshot(&snapshot, catalog.as_ref()) {
                Ok(summary) => {
                    print!("{summary}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("Cannot inspect {}: {e}", snapshot.display());
                    ExitCode::FAILURE
                }
            }
        }
        Commands::VerifyReplay { replay, catalog } => {
            let catalog = match Catalog::load(&catalog) {
                Ok(catalog) => Arc::new(catalog),
                Err(e) => {
                    tracing::error!("Cannot load catalog: {e}");
                    return ExitCode::FAILURE;
                }
            };
            match verify::verify_replay(&replay, catalog) {
                Ok(report) => {
                    println!("{report}");
                    if report.matches() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    tracing::error!("Cannot verify {}: {e}", replay.display());
                    ExitCode::FAILURE
                }
            }
        }
    }
}
