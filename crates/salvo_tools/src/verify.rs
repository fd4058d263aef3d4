//! Replay verifier.
//!
//! Plays a replay file back from its initial snapshot and compares the
//! final state hash with the one recorded when the game ended.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use salvo_core::catalog::Catalog;
use salvo_core::error::Result;
use salvo_core::replay::{Replay, ReplayPlayer};

/// Result of replaying a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Scenario the replay was recorded from.
    pub scenario_id: String,
    /// Die seed.
    pub seed: u64,
    /// Inputs played back.
    pub commands: usize,
    /// Round recorded at the end.
    pub final_round: u32,
    /// Hash recorded at the end.
    pub expected_hash: u64,
    /// Hash the playback reached.
    pub actual_hash: u64,
}

impl ReplayReport {
    /// Whether playback reproduced the recorded game.
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.expected_hash == self.actual_hash
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} inputs, seed {}, round {}, expected {:016x}, got {:016x} ({})",
            self.scenario_id,
            self.commands,
            self.seed,
            self.final_round,
            self.expected_hash,
            self.actual_hash,
            if self.matches() { "ok" } else { "MISMATCH" }
        )
    }
}

/// Play back the replay at `path`.
pub fn verify_replay(path: &Path, catalog: Arc<Catalog>) -> Result<ReplayReport> {
    let replay = Replay::load(path)?;
    let mut report = ReplayReport {
        scenario_id: replay.scenario_id.clone(),
        seed: replay.seed,
        commands: replay.command_count(),
        final_round: replay.final_round,
        expected_hash: replay.final_hash,
        actual_hash: 0,
    };
    let mut player = ReplayPlayer::new(replay, catalog)?;
    player.verify()?;
    report.actual_hash = player.game().state_hash();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_core::replay::ReplayInput;
    use salvo_test_utils::fixtures::{self, autopilot};

    fn recorded(rounds: u32) -> Replay {
        let mut game = fixtures::duel();
        let mut replay = Replay::new("duel", &game).unwrap();
        while game.state().round() <= rounds && !game.is_over() {
            let Some(input) = autopilot(&game) else { break };
            replay.record(&game, input.clone());
            if input.apply(&mut game).is_empty() {
                replay.record(&game, ReplayInput::ForcePass);
                ReplayInput::ForcePass.apply(&mut game);
            }
        }
        replay.finalize(&game);
        replay
    }

    #[test]
    fn test_good_replay_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.replay");
        recorded(2).save(&path).unwrap();

        let report = verify_replay(&path, fixtures::standard_catalog()).unwrap();
        assert!(report.matches(), "{report}");
        assert_eq!(report.scenario_id, "duel");
        assert!(report.commands > 0);
    }

    #[test]
    fn test_tampered_replay_mismatches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.replay");
        let mut replay = recorded(2);
        replay.commands.truncate(replay.commands.len() / 2);
        replay.save(&path).unwrap();

        let report = verify_replay(&path, fixtures::standard_catalog()).unwrap();
        assert!(!report.matches());
        assert!(report.to_string().contains("MISMATCH"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(verify_replay(&dir.path().join("nope.replay"), fixtures::standard_catalog()).is_err());
    }
}
