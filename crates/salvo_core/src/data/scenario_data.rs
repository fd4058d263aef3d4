//! Scenario data structures: board, players and starting units.

use serde::{Deserialize, Serialize};

use crate::board::Terrain;
use crate::config::GameConfig;
use crate::hex::{Facing, Hex};

use super::unit_data::Crew;

/// A complete scenario file.
///
/// # Example RON
///
/// ```ron
/// ScenarioData(
///     id: "ridge_line",
///     name: "Ridge Line",
///     board: BoardData(
///         width: 16,
///         height: 16,
///         tiles: [
///             TileData(hex: (q: 7, r: 7), elevation: 2, terrain: Clear),
///             TileData(hex: (q: 8, r: 7), terrain: HeavyWoods),
///         ],
///     ),
///     players: [
///         PlayerData(name: "Davion", team: 1),
///         PlayerData(name: "Kurita", team: 2),
///     ],
///     units: [
///         PlacementData(player: "Davion", unit_type: "HBK-4G", hex: (q: 4, r: 12), facing: North),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioData {
    /// Identifier, recorded in replays.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Rules configuration; defaults when omitted.
    #[serde(default)]
    pub config: GameConfig,

    /// The map.
    pub board: BoardData,

    /// Participants.
    pub players: Vec<PlayerData>,

    /// Starting units.
    #[serde(default)]
    pub units: Vec<PlacementData>,
}

/// Map dimensions and the hexes that differ from flat clear ground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardData {
    /// Width in hexes.
    pub width: u32,

    /// Height in hexes.
    pub height: u32,

    /// Non-default hexes.
    #[serde(default)]
    pub tiles: Vec<TileData>,
}

/// One non-default hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileData {
    /// Location.
    pub hex: Hex,

    /// Ground level.
    #[serde(default)]
    pub elevation: i32,

    /// Cover.
    #[serde(default)]
    pub terrain: Terrain,
}

/// A participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    /// Display name; clients join by it.
    pub name: String,

    /// Team number.
    pub team: u32,
}

/// A starting unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementData {
    /// Owning player's name.
    pub player: String,

    /// Catalog unit type.
    pub unit_type: String,

    /// Starting hex.
    pub hex: Hex,

    /// Starting facing.
    pub facing: Facing,

    /// Levels above the hex floor (altitude for aerospace).
    #[serde(default)]
    pub elevation: i32,

    /// Crew override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew: Option<Crew>,

    /// Starting velocity for aerospace units.
    #[serde(default)]
    pub velocity: u32,
}
