//! Replay system for recording and playing back games.
//!
//! Replays store the initial game state and the stream of inputs the server
//! accepted during the game. Because every roll comes from the seeded die
//! generator captured in the initial state, replaying the inputs recreates
//! the game exactly.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::ActionRequest;
use crate::catalog::Catalog;
use crate::dice::SeededDice;
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::game::Game;
use crate::phase::Phase;
use crate::player::PlayerId;
use crate::snapshot::Snapshot;

/// One input to the phase machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayInput {
    /// The game left the lobby.
    Start,
    /// An action declaration.
    Submit {
        /// Submitting player.
        player: PlayerId,
        /// What was declared.
        request: ActionRequest,
    },
    /// A player ended their turn.
    EndTurn {
        /// Player.
        player: PlayerId,
    },
    /// The watchdog passed the current turn.
    ForcePass,
    /// A player's session dropped.
    Disconnect {
        /// Player.
        player: PlayerId,
    },
    /// A player came back.
    Reconnect {
        /// Player.
        player: PlayerId,
    },
}

impl ReplayInput {
    /// Feed this input to `game`. Refused inputs change nothing and yield no
    /// events.
    pub fn apply(&self, game: &mut Game<SeededDice>) -> Vec<GameEvent> {
        let result = match self {
            Self::Start => game.start().map_err(|e| e.to_string()),
            Self::Submit { player, request } => game
                .submit(*player, request.clone())
                .map(|accepted| accepted.events)
                .map_err(|e| e.to_string()),
            Self::EndTurn { player } => game.end_turn(*player).map_err(|e| e.to_string()),
            Self::ForcePass => game.force_pass().map_err(|e| e.to_string()),
            Self::Disconnect { player } => {
                game.player_disconnected(*player).map_err(|e| e.to_string())
            }
            Self::Reconnect { player } => {
                game.player_reconnected(*player).map_err(|e| e.to_string())
            }
        };
        result.unwrap_or_else(|reason| {
            debug!(input = ?self, %reason, "replayed input refused");
            Vec::new()
        })
    }
}

/// A single input record for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCommand {
    /// Round when the input was issued.
    pub round: u32,
    /// Phase when the input was issued.
    pub phase: Phase,
    /// The input.
    pub input: ReplayInput,
}

impl ReplayCommand {
    /// Create a new replay command record.
    #[must_use]
    pub const fn new(round: u32, phase: Phase, input: ReplayInput) -> Self {
        Self {
            round,
            phase,
            input,
        }
    }
}

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Random seed used for the game.
    pub seed: u64,
    /// Bincode snapshot of the game before the first input.
    pub initial_state: Vec<u8>,
    /// Inputs in the order they were applied.
    pub commands: Vec<ReplayCommand>,
    /// Round when the recording ended.
    pub final_round: u32,
    /// Final state hash for verification.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording from the current state of `game`.
    pub fn new(scenario_id: impl Into<String>, game: &Game<SeededDice>) -> Result<Self> {
        let state_bytes = game.snapshot().to_bytes()?;
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed: game.dice().seed(),
            initial_state: state_bytes,
            commands: Vec::new(),
            final_round: 0,
            final_hash: 0,
        })
    }

    /// Record an input, tagged with where `game` stood when it arrived.
    pub fn record(&mut self, game: &Game<SeededDice>, input: ReplayInput) {
        let state = game.state();
        self.commands
            .push(ReplayCommand::new(state.round(), state.phase(), input));
    }

    /// Finalize the replay with end-game state.
    pub fn finalize(&mut self, game: &Game<SeededDice>) {
        self.final_round = game.state().round();
        self.final_hash = game.state_hash();
    }

    /// Save the replay to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }

        Ok(replay)
    }

    /// Rebuild the game as it was when recording began.
    pub fn restore_initial_state(&self, catalog: Arc<Catalog>) -> Result<Game<SeededDice>> {
        let snapshot = Snapshot::<SeededDice>::from_bytes(&self.initial_state)?;
        Game::from_snapshot(snapshot, catalog)
    }

    /// Inputs issued during `round`.
    #[must_use]
    pub fn commands_in_round(&self, round: u32) -> Vec<&ReplayCommand> {
        self.commands
            .iter()
            .filter(|cmd| cmd.round == round)
            .collect()
    }

    /// Rounds covered by the recording.
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.final_round
    }

    /// Get the total number of commands in the replay.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    catalog: Arc<Catalog>,
    game: Game<SeededDice>,
    command_index: usize,
}

impl ReplayPlayer {
    /// Create a new replay player from a replay.
    pub fn new(replay: Replay, catalog: Arc<Catalog>) -> Result<Self> {
        let game = replay.restore_initial_state(Arc::clone(&catalog))?;
        Ok(Self {
            replay,
            catalog,
            game,
            command_index: 0,
        })
    }

    /// Apply the next input. Returns whether more inputs remain.
    pub fn advance(&mut self) -> bool {
        if let Some(cmd) = self.replay.commands.get(self.command_index) {
            cmd.input.apply(&mut self.game);
            self.command_index += 1;
        }
        !self.is_finished()
    }

    /// Rewind and replay up to (not including) input `target`.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        self.game = self.replay.restore_initial_state(Arc::clone(&self.catalog))?;
        self.command_index = 0;
        while self.command_index < target.min(self.replay.commands.len()) {
            self.advance();
        }
        Ok(())
    }

    /// Index of the next input to apply.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.command_index
    }

    /// The game as replayed so far.
    #[must_use]
    pub const fn game(&self) -> &Game<SeededDice> {
        &self.game
    }

    /// Get the replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Check if the replay has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.command_index >= self.replay.commands.len()
    }

    /// Verify the replay produces the expected final hash.
    pub fn verify(&mut self) -> Result<bool> {
        self.seek(self.replay.commands.len())?;
        let actual_hash = self.game.state_hash();
        debug!(
            expected = self.replay.final_hash,
            actual = actual_hash,
            "replay verified"
        );
        Ok(actual_hash == self.replay.final_hash)
    }

    /// Get progress as a percentage (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.commands.is_empty() {
            100.0
        } else {
            (self.command_index as f64 / self.replay.commands.len() as f64) * 100.0
        }
    }
}
