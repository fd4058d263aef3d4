//! Scenario loading: turn a [`ScenarioData`] file into a lobby [`Game`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::board::{Board, HexTile};
use crate::catalog::Catalog;
use crate::data::ScenarioData;
use crate::dice::{DiceRoller, SeededDice};
use crate::error::{GameError, Result};
use crate::game::{Deployment, Game};
use crate::player::{PlayerId, Team};

/// A validated scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    data: ScenarioData,
}

impl Scenario {
    /// Validate scenario data that does not depend on the catalog.
    pub fn from_data(data: ScenarioData) -> Result<Self> {
        if data.board.width == 0 || data.board.height == 0 {
            return Err(GameError::Scenario(format!(
                "board of '{}' has no hexes",
                data.id
            )));
        }
        if data.players.is_empty() {
            return Err(GameError::Scenario(format!("'{}' has no players", data.id)));
        }
        let mut names = std::collections::BTreeSet::new();
        for player in &data.players {
            if !names.insert(player.name.as_str()) {
                return Err(GameError::Scenario(format!(
                    "player '{}' is listed twice",
                    player.name
                )));
            }
        }
        if let Some(unit) = data.units.iter().find(|u| !names.contains(u.player.as_str())) {
            return Err(GameError::Scenario(format!(
                "unit '{}' belongs to unknown player '{}'",
                unit.unit_type, unit.player
            )));
        }
        let scenario = Self { data };
        scenario.board()?;
        Ok(scenario)
    }

    /// Parse a scenario from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let data: ScenarioData = ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_data(data)
    }

    /// Load a scenario from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let data: ScenarioData = ron::from_str(&content).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let scenario = Self::from_data(data)?;
        info!(
            path = %path.display(),
            id = %scenario.data.id,
            players = scenario.data.players.len(),
            units = scenario.data.units.len(),
            "Loaded scenario"
        );
        Ok(scenario)
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Raw data.
    #[must_use]
    pub const fn data(&self) -> &ScenarioData {
        &self.data
    }

    /// Builder: replace the die seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.data.config.seed = seed;
        self
    }

    /// The board described by the scenario.
    pub fn board(&self) -> Result<Board> {
        let spec = &self.data.board;
        let mut board = Board::new(spec.width, spec.height);
        for tile in &spec.tiles {
            board
                .set_tile(tile.hex, HexTile::new(tile.elevation, tile.terrain))
                .map_err(|_| {
                    GameError::Scenario(format!("tile {} lies off the board", tile.hex))
                })?;
        }
        Ok(board)
    }

    /// Check every unit type against `catalog`.
    pub fn check_units(&self, catalog: &Catalog) -> Result<()> {
        match self
            .data
            .units
            .iter()
            .find(|u| catalog.unit(&u.unit_type).is_none())
        {
            Some(unit) => Err(GameError::Scenario(format!(
                "unknown unit type '{}' for player '{}'",
                unit.unit_type, unit.player
            ))),
            None => Ok(()),
        }
    }

    /// Build a lobby game with every player joined and every unit placed.
    pub fn build_game<D: DiceRoller>(&self, catalog: Arc<Catalog>, dice: D) -> Result<Game<D>> {
        self.check_units(&catalog)?;
        let mut game = Game::new(self.data.config.clone(), self.board()?, catalog, dice);

        let mut ids: BTreeMap<&str, PlayerId> = BTreeMap::new();
        for player in &self.data.players {
            let id = game.add_player(&player.name, Team(player.team))?;
            ids.insert(player.name.as_str(), id);
        }
        for unit in &self.data.units {
            let owner = ids
                .get(unit.player.as_str())
                .copied()
                .ok_or_else(|| GameError::Scenario(format!("unknown player '{}'", unit.player)))?;
            game.deploy(Deployment {
                owner,
                unit_type: unit.unit_type.clone(),
                position: unit.hex,
                facing: unit.facing,
                elevation: unit.elevation,
                crew: unit.crew,
                velocity: unit.velocity,
            })
            .map_err(|e| {
                GameError::Scenario(format!(
                    "cannot place '{}' for '{}' at {}: {e}",
                    unit.unit_type, unit.player, unit.hex
                ))
            })?;
        }
        Ok(game)
    }

    /// Build a lobby game using the scenario's own seed.
    pub fn build_seeded(&self, catalog: Arc<Catalog>) -> Result<Game<SeededDice>> {
        self.build_game(catalog, SeededDice::new(self.data.config.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Terrain;
    use crate::hex::Hex;
    use crate::phase::Phase;
    use crate::testing;

    const SKIRMISH: &str = r#"
ScenarioData(
    id: "skirmish",
    name: "Skirmish",
    config: (seed: 99),
    board: BoardData(
        width: 12,
        height: 12,
        tiles: [
            TileData(hex: (q: 5, r: 5), elevation: 2),
            TileData(hex: (q: 6, r: 5), terrain: HeavyWoods),
            TileData(hex: (q: 7, r: 5), terrain: Water(depth: 2)),
        ],
    ),
    players: [
        PlayerData(name: "alice", team: 1),
        PlayerData(name: "bob", team: 2),
    ],
    units: [
        PlacementData(player: "alice", unit_type: "HBK-4G", hex: (q: 3, r: 10), facing: North),
        PlacementData(player: "bob", unit_type: "Vedette", hex: (q: 3, r: 2), facing: South,
            crew: Some((gunnery: 3, piloting: 4))),
    ],
)
"#;

    #[test]
    fn test_parse_and_build() {
        let scenario = Scenario::from_ron_str(SKIRMISH).unwrap();
        assert_eq!(scenario.id(), "skirmish");
        let board = scenario.board().unwrap();
        assert_eq!(board.elevation(Hex::new(5, 5)), 2);
        assert_eq!(board.terrain(Hex::new(6, 5)), Terrain::HeavyWoods);
        assert_eq!(board.terrain(Hex::new(7, 5)).water_depth(), 2);

        let mut game = scenario
            .build_seeded(std::sync::Arc::new(testing::catalog()))
            .unwrap();
        assert_eq!(game.state().config().seed, 99);
        assert_eq!(game.state().players().len(), 2);
        let tank = game.state().entities().values().nth(1).unwrap();
        assert_eq!(tank.crew().gunnery, 3);
        game.start().unwrap();
        assert_eq!(game.state().phase(), Phase::Movement);
    }

    #[test]
    fn test_rejects_bad_scenarios() {
        let orphan = SKIRMISH.replace(r#"player: "bob""#, r#"player: "carol""#);
        assert!(matches!(
            Scenario::from_ron_str(&orphan),
            Err(GameError::Scenario(_))
        ));

        let off_board = SKIRMISH.replace("(q: 7, r: 5)", "(q: 70, r: 5)");
        assert!(Scenario::from_ron_str(&off_board).is_err());

        let unknown = SKIRMISH.replace("Vedette", "Atlas");
        let scenario = Scenario::from_ron_str(&unknown).unwrap();
        assert!(scenario.check_units(&testing::catalog()).is_err());

        assert!(matches!(
            Scenario::from_ron_str("ScenarioData("),
            Err(GameError::DataParseError { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skirmish.ron");
        std::fs::write(&path, SKIRMISH).unwrap();
        let scenario = Scenario::load(&path).unwrap().with_seed(5);
        assert_eq!(scenario.data().config.seed, 5);
        assert!(Scenario::load(&dir.path().join("missing.ron")).is_err());
    }
}
