//! Catalog, scenario and game fixtures.
//!
//! The shipped asset files are compiled in so tests do not depend on the
//! working directory, and so every test run also checks that the assets
//! still parse.

use std::sync::Arc;

use salvo_core::action::ActionRequest;
use salvo_core::board::Terrain;
use salvo_core::catalog::Catalog;
use salvo_core::config::GameConfig;
use salvo_core::data::{BoardData, PlacementData, PlayerData, ScenarioData, TileData};
use salvo_core::dice::{DiceRoller, ScriptedDice, SeededDice};
use salvo_core::entity::Entity;
use salvo_core::game::Game;
use salvo_core::hex::{Facing, Hex};
use salvo_core::movement::{MoveMode, MovePath, MoveStep};
use salvo_core::phase::Phase;
use salvo_core::player::PlayerId;
use salvo_core::replay::ReplayInput;
use salvo_core::scenario::Scenario;

/// The standard unit catalog shipped in `assets/data`.
pub const STANDARD_CATALOG: &str = include_str!("../../../assets/data/catalog.ron");

/// Two mechs on open ground.
pub const DUEL: &str = include_str!("../../../assets/scenarios/duel.ron");

/// Combined arms on a wooded ridge.
pub const RIDGE_LINE: &str = include_str!("../../../assets/scenarios/ridge_line.ron");

/// Hunchback, 50 tons, AC/20 and two medium lasers.
pub const HUNCHBACK: &str = "HBK-4G";
/// Wolverine, 55 tons, jump capable.
pub const WOLVERINE: &str = "WVR-6R";
/// Locust, 20 tons, fast.
pub const LOCUST: &str = "LCT-1V";
/// Medium tank.
pub const VEDETTE: &str = "Vedette";
/// Inner Sphere powered armor squad.
pub const IS_BATTLE_ARMOR: &str = "IS Standard BA";
/// Clan powered armor squad.
pub const ELEMENTAL: &str = "Elemental";
/// Conventional infantry.
pub const FOOT_PLATOON: &str = "Foot Platoon";
/// Aerospace fighter.
pub const FIGHTER: &str = "SL-15";
/// DropShip.
pub const DROPSHIP: &str = "Union";

/// Shorthand for [`Hex::new`].
#[must_use]
pub const fn hex(q: i32, r: i32) -> Hex {
    Hex::new(q, r)
}

/// Parse the standard catalog.
///
/// # Panics
///
/// Panics if the shipped catalog no longer parses or validates.
#[must_use]
pub fn standard_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_ron_str(STANDARD_CATALOG).expect("standard catalog is valid"))
}

/// Parse one of the shipped scenarios.
///
/// # Panics
///
/// Panics if the scenario does not parse.
#[must_use]
pub fn scenario(text: &str) -> Scenario {
    Scenario::from_ron_str(text).expect("shipped scenario is valid")
}

/// The duel scenario as a lobby game with its own seed.
#[must_use]
pub fn duel() -> Game<SeededDice> {
    duel_with_seed(scenario(DUEL).data().config.seed)
}

/// The duel scenario with a different seed.
///
/// # Panics
///
/// Panics if the scenario cannot be built against the standard catalog.
#[must_use]
pub fn duel_with_seed(seed: u64) -> Game<SeededDice> {
    scenario(DUEL)
        .with_seed(seed)
        .build_seeded(standard_catalog())
        .expect("duel builds")
}

/// The ridge line scenario as a lobby game.
///
/// # Panics
///
/// Panics if the scenario cannot be built against the standard catalog.
#[must_use]
pub fn ridge_line() -> Game<SeededDice> {
    scenario(RIDGE_LINE)
        .build_seeded(standard_catalog())
        .expect("ridge line builds")
}

/// Builder for small ad-hoc games.
///
/// Players get ids in the order they are added, starting at 1.
///
/// # Example
///
/// ```ignore
/// let game = GameBuilder::new(10, 10)
///     .player("alice", 1)
///     .player("bob", 2)
///     .unit("alice", HUNCHBACK, hex(4, 8), Facing::North)
///     .unit("bob", LOCUST, hex(4, 2), Facing::South)
///     .build_seeded(7);
/// ```
#[derive(Debug, Clone)]
pub struct GameBuilder {
    data: ScenarioData,
    catalog: Arc<Catalog>,
}

impl GameBuilder {
    /// Clear board of the given size, standard catalog, no players.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: ScenarioData {
                id: "fixture".to_string(),
                name: "Fixture".to_string(),
                config: GameConfig::default(),
                board: BoardData {
                    width,
                    height,
                    tiles: Vec::new(),
                },
                players: Vec::new(),
                units: Vec::new(),
            },
            catalog: standard_catalog(),
        }
    }

    /// Use another catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the rules configuration.
    #[must_use]
    pub fn config(mut self, config: GameConfig) -> Self {
        self.data.config = config;
        self
    }

    /// Set one hex.
    #[must_use]
    pub fn tile(mut self, hex: Hex, elevation: i32, terrain: Terrain) -> Self {
        self.data.board.tiles.push(TileData {
            hex,
            elevation,
            terrain,
        });
        self
    }

    /// Add a player.
    #[must_use]
    pub fn player(mut self, name: &str, team: u32) -> Self {
        self.data.players.push(PlayerData {
            name: name.to_string(),
            team,
        });
        self
    }

    /// Add a unit for the named player.
    #[must_use]
    pub fn unit(mut self, player: &str, unit_type: &str, hex: Hex, facing: Facing) -> Self {
        self.data.units.push(PlacementData {
            player: player.to_string(),
            unit_type: unit_type.to_string(),
            hex,
            facing,
            elevation: 0,
            crew: None,
            velocity: 0,
        });
        self
    }

    /// The scenario this builder describes.
    ///
    /// # Panics
    ///
    /// Panics if the description is invalid.
    #[must_use]
    pub fn scenario(&self) -> Scenario {
        Scenario::from_data(self.data.clone()).expect("fixture scenario is valid")
    }

    /// Build a lobby game with `dice`.
    ///
    /// # Panics
    ///
    /// Panics if a unit cannot be placed.
    #[must_use]
    pub fn build<D: DiceRoller>(self, dice: D) -> Game<D> {
        self.scenario()
            .build_game(Arc::clone(&self.catalog), dice)
            .expect("fixture game builds")
    }

    /// Build a lobby game with seeded dice.
    #[must_use]
    pub fn build_seeded(mut self, seed: u64) -> Game<SeededDice> {
        self.data.config.seed = seed;
        self.build(SeededDice::new(seed))
    }

    /// Build a lobby game with scripted 2d6 totals.
    #[must_use]
    pub fn build_scripted(self, totals: impl IntoIterator<Item = u8>) -> Game<ScriptedDice> {
        self.build(ScriptedDice::from_2d6_totals(totals))
    }
}

fn next_actor<D: DiceRoller>(game: &Game<D>, player: PlayerId) -> Option<&Entity> {
    game.state()
        .entities_of(player)
        .find(|e| e.can_act() && !e.is_done())
}

fn nearest_enemy<'a, D: DiceRoller>(game: &'a Game<D>, entity: &Entity) -> Option<&'a Entity> {
    let state = game.state();
    state
        .entities()
        .values()
        .filter(|e| !e.is_destroyed() && !state.are_allies(e.owner(), entity.owner()))
        .min_by_key(|e| (entity.position().distance(e.position()), e.id()))
}

/// A simple deterministic player for both sides.
///
/// Units walk one hex forward in the movement phase and fire their first
/// usable weapon at the nearest enemy in the weapon phase. Every other
/// turn is ended. Returns `None` once the game is over or halted.
///
/// The input may be refused (a blocked hex, a target out of range); drive
/// games with [`play`], which passes the turn in that case.
#[must_use]
pub fn autopilot<D: DiceRoller>(game: &Game<D>) -> Option<ReplayInput> {
    if game.is_over() || game.is_halted() {
        return None;
    }
    let state = game.state();
    if state.phase() == Phase::Lobby {
        return Some(ReplayInput::Start);
    }
    let turn = state.current_turn()?;
    let player = turn.player;
    if turn.entity.is_some() {
        return Some(ReplayInput::EndTurn { player });
    }
    let Some(actor) = next_actor(game, player) else {
        return Some(ReplayInput::EndTurn { player });
    };

    let request = match state.phase() {
        Phase::Movement => {
            let steps = if actor.is_prone() {
                vec![MoveStep::GetUp]
            } else {
                vec![MoveStep::Forward]
            };
            Some(ActionRequest::movement(
                actor.id(),
                MovePath::new(MoveMode::Walk, steps),
            ))
        }
        Phase::WeaponAttack => {
            let weapon = actor.mounts().iter().position(|m| {
                m.is_weapon() && !m.is_destroyed() && !m.fired_this_round() && m.has_ammo()
            });
            match (weapon, nearest_enemy(game, actor)) {
                (Some(weapon), Some(target)) => {
                    Some(ActionRequest::weapon(actor.id(), weapon, target.id()))
                }
                _ => None,
            }
        }
        _ => None,
    };
    Some(match request {
        Some(request) => ReplayInput::Submit { player, request },
        None => ReplayInput::EndTurn { player },
    })
}

/// Drive `game` with `policy` for at most `max_inputs` inputs.
///
/// A refused input is followed by a forced pass so the game always makes
/// progress. Returns every input fed to the game, refused ones included,
/// so the list can be replayed verbatim.
pub fn play<F>(game: &mut Game<SeededDice>, max_inputs: usize, policy: F) -> Vec<ReplayInput>
where
    F: Fn(&Game<SeededDice>) -> Option<ReplayInput>,
{
    let mut inputs = Vec::new();
    while inputs.len() < max_inputs {
        let Some(input) = policy(game) else {
            break;
        };
        let events = input.apply(game);
        inputs.push(input);
        if events.is_empty() && !game.is_over() && !game.is_halted() {
            ReplayInput::ForcePass.apply(game);
            inputs.push(ReplayInput::ForcePass);
        }
    }
    tracing::debug!(
        inputs = inputs.len(),
        round = game.state().round(),
        phase = %game.state().phase(),
        "autoplay stopped"
    );
    inputs
}

/// Play `game` with the [`autopilot`] until `round` is reached or the game
/// ends.
pub fn play_until_round(game: &mut Game<SeededDice>, round: u32) -> Vec<ReplayInput> {
    let mut inputs = Vec::new();
    while game.state().round() < round && !game.is_over() && !game.is_halted() {
        let chunk = play(game, 1, autopilot);
        if chunk.is_empty() {
            break;
        }
        inputs.extend(chunk);
    }
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assets_parse() {
        let catalog = standard_catalog();
        for id in [
            HUNCHBACK,
            WOLVERINE,
            LOCUST,
            VEDETTE,
            IS_BATTLE_ARMOR,
            ELEMENTAL,
            FOOT_PLATOON,
            FIGHTER,
            DROPSHIP,
        ] {
            assert!(catalog.unit(id).is_some(), "{id} missing");
        }
        assert!(catalog.weapon("ISAC5").is_some());

        let ridge = ridge_line();
        assert_eq!(ridge.state().entities().len(), 6);
        let duel = duel();
        assert_eq!(duel.state().players().len(), 2);
    }

    #[test]
    fn test_builder_assigns_ids_in_order() {
        let game = GameBuilder::new(8, 8)
            .player("alice", 1)
            .player("bob", 2)
            .unit("bob", LOCUST, hex(3, 1), Facing::South)
            .tile(hex(4, 4), 1, Terrain::Rough)
            .build_seeded(3);
        let bob = game.state().player_by_name("bob").unwrap();
        assert_eq!(bob.id.0, 2);
        assert_eq!(game.state().entities().values().next().unwrap().owner(), bob.id);
        assert_eq!(game.state().board().terrain(hex(4, 4)), Terrain::Rough);
        assert_eq!(game.state().config().seed, 3);
    }

    #[test]
    fn test_autopilot_finishes_rounds() {
        let mut game = duel();
        let inputs = play_until_round(&mut game, 3);
        assert_eq!(inputs[0], ReplayInput::Start);
        assert!(game.state().round() >= 3 || game.is_over());
        assert!(!game.is_halted());
    }
}
