//! Lossless save and load of a running game.
//!
//! A [`Snapshot`] carries the full [`GameState`] and the die generator, so a
//! loaded game continues with exactly the rolls the original would have
//! made. Two encodings:
//! - bincode for compact saves and replays,
//! - RON for human-readable saves.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{GameError, Result};
use crate::state::GameState;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full game state plus die generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<D> {
    /// Format version.
    pub version: u32,
    /// Authoritative state.
    pub state: GameState,
    /// Die generator, mid-sequence.
    pub dice: D,
    /// Halt reason, if the game was halted.
    pub halted: Option<String>,
}

impl<D> Snapshot<D> {
    /// Hash of the contained state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    /// Full validation against `catalog`: version, state invariants and
    /// every unit and mounted item known to the catalog.
    pub fn check(&self, catalog: &Catalog) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GameError::Snapshot(format!(
                "version mismatch: expected {SNAPSHOT_VERSION}, got {}",
                self.version
            )));
        }
        self.state.validate()?;
        for entity in self.state.entities().values() {
            if catalog.unit(entity.unit_type()).is_none() {
                return Err(GameError::StateCorruption(format!(
                    "{} has unknown unit type '{}'",
                    entity.id(),
                    entity.unit_type()
                )));
            }
            if let Some(mount) = entity
                .mounts()
                .iter()
                .find(|m| catalog.equipment(m.equipment()).is_none())
            {
                return Err(GameError::StateCorruption(format!(
                    "{} mounts unknown equipment '{}'",
                    entity.id(),
                    mount.equipment()
                )));
            }
        }
        Ok(())
    }
}

impl<D: Serialize + DeserializeOwned> Snapshot<D> {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Snapshot(format!("encode failed: {e}")))
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| GameError::Snapshot(format!("decode failed: {e}")))
    }

    /// Encode as pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Snapshot(format!("encode failed: {e}")))
    }

    /// Decode from RON.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::Snapshot(format!("decode failed: {e}")))
    }

    /// Write to `path`: RON if the extension is `.ron`, bincode otherwise.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = if is_ron(path) {
            self.to_ron()?.into_bytes()
        } else {
            self.to_bytes()?
        };
        fs::write(path, &bytes).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    /// Read from `path`, choosing the encoding as [`Snapshot::save`] does.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if is_ron(path) {
            let text = String::from_utf8(bytes)
                .map_err(|e| GameError::Snapshot(format!("not UTF-8: {e}")))?;
            Self::from_ron(&text)
        } else {
            Self::from_bytes(&bytes)
        }
    }
}

fn is_ron(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ron")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DiceRoller, SeededDice};
    use crate::hex::{Facing, Hex};
    use crate::testing;

    fn started() -> crate::game::Game<SeededDice> {
        let catalog = std::sync::Arc::new(testing::catalog());
        let mut game = crate::game::Game::seeded(
            crate::config::GameConfig::default().with_seed(7),
            crate::board::Board::new(12, 12),
            catalog,
        );
        let alice = game.add_player("alice", crate::player::Team(1)).unwrap();
        let bob = game.add_player("bob", crate::player::Team(2)).unwrap();
        game.add_entity(alice, testing::HUNCHBACK, Hex::new(2, 8), Facing::North)
            .unwrap();
        game.add_entity(bob, testing::VEDETTE, Hex::new(2, 2), Facing::South)
            .unwrap();
        game.start().unwrap();
        game
    }

    #[test]
    fn test_bincode_round_trip_keeps_hash_and_dice() {
        let game = started();
        let snapshot = game.snapshot();
        let decoded = Snapshot::<SeededDice>::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.state_hash(), game.state_hash());

        let mut original = snapshot.dice.clone();
        let mut restored = decoded.dice;
        assert_eq!(original.roll_2d6(), restored.roll_2d6());
    }

    #[test]
    fn test_ron_round_trip() {
        let game = started();
        let snapshot = game.snapshot();
        let text = snapshot.to_ron().unwrap();
        let decoded = Snapshot::<SeededDice>::from_ron(&text).unwrap();
        assert_eq!(decoded.state_hash(), snapshot.state_hash());
        assert_eq!(decoded.dice, snapshot.dice);
    }

    #[test]
    fn test_version_and_catalog_checks() {
        let game = started();
        let catalog = testing::catalog();

        let mut wrong_version = game.snapshot();
        wrong_version.version = 99;
        assert!(matches!(
            wrong_version.check(&catalog),
            Err(GameError::Snapshot(_))
        ));

        let mut unknown_gear = game.snapshot();
        if let Some(entity) = unknown_gear.state.entities.values_mut().next() {
            entity.mounts[0].equipment = "Unobtainium Cannon".into();
        }
        assert!(matches!(
            unknown_gear.check(&catalog),
            Err(GameError::StateCorruption(_))
        ));
        assert!(game.snapshot().check(&catalog).is_ok());
    }

    #[test]
    fn test_critical_slot_layout_must_match_unit_kind() {
        let game = started();
        let mut crafted = game.snapshot();
        if let Some(entity) = crafted.state.entities.values_mut().next() {
            let torso = &mut entity.locations[crate::location::mech::CENTER_TORSO];
            torso.slots = vec![None; 14];
            torso.slots[13] = Some(crate::entity::CriticalSlot {
                mount: 0,
                destroyed: false,
            });
        }
        assert!(matches!(
            crafted.check(&testing::catalog()),
            Err(GameError::StateCorruption(_))
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(Snapshot::<SeededDice>::from_bytes(&[1, 2, 3]).is_err());
        assert!(Snapshot::<SeededDice>::from_ron("not ron").is_err());
    }
}
