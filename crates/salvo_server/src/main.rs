//! Salvo - Dedicated Server

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salvo_server::{server, ServerConfig};

/// Salvo dedicated server.
#[derive(Parser, Debug)]
#[command(name = "salvo-server")]
#[command(about = "Authoritative server for turn-based hex combat")]
#[command(version)]
struct Cli {
    /// Server config file (RON).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long)]
    bind: Option<String>,

    /// Scenario to play.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Unit and weapon catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Password players must present.
    #[arg(short, long)]
    password: Option<String>,

    /// Die seed, replacing the scenario's.
    #[arg(long)]
    seed: Option<u64>,

    /// Resume from a snapshot file instead of the scenario.
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Write the replay here when the game ends.
    #[arg(long)]
    replay: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, salvo_server::ServerError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(scenario) = self.scenario {
            config.scenario = scenario;
        }
        if let Some(catalog) = self.catalog {
            config.catalog = catalog;
        }
        if self.password.is_some() {
            config.password = self.password;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.resume.is_some() {
            config.resume = self.resume;
        }
        if self.replay.is_some() {
            config.replay_path = self.replay;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Salvo Dedicated Server");

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(bind = %config.bind, scenario = %config.scenario.display(), "configured");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(server::run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}
