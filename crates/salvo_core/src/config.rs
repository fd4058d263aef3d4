//! Per-game rules configuration.
//!
//! There are no global settings: each [`Game`](crate::game::Game) owns its
//! own `GameConfig`, loaded from RON or built in code.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Rules configuration for one game instance.
///
/// # Example RON
///
/// ```ron
/// GameConfig(
///     seed: 42,
///     max_players: 8,
///     shutdown_heat: 30,
///     max_rounds: Some(20),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the die generator.
    pub seed: u64,
    /// Most players allowed to join.
    pub max_players: usize,
    /// Heat at which a unit shuts down.
    pub shutdown_heat: u32,
    /// Cap on sensor-hit to-hit penalties for ground units.
    pub max_sensor_penalty: i32,
    /// Most intervening woods penalty before line of sight is blocked.
    pub woods_blocking_threshold: i32,
    /// Declare a draw after this many rounds.
    pub max_rounds: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_players: 8,
            shutdown_heat: 30,
            max_sensor_penalty: 2,
            woods_blocking_threshold: 3,
            max_rounds: None,
        }
    }
}

impl GameConfig {
    /// Builder: set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the round limit.
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Parse from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&content)
    }
}
