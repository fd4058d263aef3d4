//! Server configuration.
//!
//! Loaded from RON, then overridden field by field from the command line.
//! One `ServerConfig` serves one game.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 7777;

/// Dedicated server settings.
///
/// # Example RON
///
/// ```ron
/// ServerConfig(
///     bind: "0.0.0.0:7777",
///     scenario: "assets/scenarios/duel.ron",
///     grace_period_secs: 30,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,
    /// Password every joining player must present.
    pub password: Option<String>,
    /// Unit and weapon catalog. The built-in catalog is used when the file
    /// is missing.
    pub catalog: PathBuf,
    /// Scenario describing board, players and starting units.
    pub scenario: PathBuf,
    /// Override for the scenario's die seed.
    pub seed: Option<u64>,
    /// Resume from this snapshot instead of starting the scenario.
    pub resume: Option<PathBuf>,
    /// How long a disconnected player's turns wait before being auto-passed.
    pub grace_period_secs: u64,
    /// How long a connected player may hold a turn.
    pub turn_timeout_secs: Option<u64>,
    /// Start with whoever has joined once the lobby has been open this long.
    pub lobby_timeout_secs: Option<u64>,
    /// Watchdog period.
    pub watchdog_interval_ms: u64,
    /// Where to write the replay when the game ends.
    pub replay_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: format!("0.0.0.0:{DEFAULT_PORT}"),
            password: None,
            catalog: PathBuf::from("assets/data/catalog.ron"),
            scenario: PathBuf::from("assets/scenarios/duel.ron"),
            seed: None,
            resume: None,
            grace_period_secs: 60,
            turn_timeout_secs: Some(300),
            lobby_timeout_secs: None,
            watchdog_interval_ms: 500,
            replay_path: None,
        }
    }
}

impl ServerConfig {
    /// Parse from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ServerError> {
        ron::from_str(text).map_err(|e| ServerError::Config {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a RON file.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let text = fs::read_to_string(path).map_err(|e| ServerError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        ron::from_str(&text).map_err(|e| ServerError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Grace period as a duration.
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    /// Turn timeout as a duration.
    #[must_use]
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_secs.map(Duration::from_secs)
    }

    /// Lobby timeout as a duration.
    #[must_use]
    pub fn lobby_timeout(&self) -> Option<Duration> {
        self.lobby_timeout_secs.map(Duration::from_secs)
    }

    /// Watchdog period, never shorter than 10ms.
    #[must_use]
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms.max(10))
    }
}
