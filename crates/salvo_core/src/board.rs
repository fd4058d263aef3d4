//! The battlefield: a rhombus of hexes with elevation and terrain.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::hex::Hex;

/// Terrain covering a hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Clear,
    /// Light woods.
    LightWoods,
    /// Heavy woods.
    HeavyWoods,
    /// Rubble, rocks, broken ground.
    Rough,
    /// Water of the given depth in levels.
    Water {
        /// Depth in levels, at least 1.
        depth: u8,
    },
    /// Nothing may enter.
    Impassable,
}

impl Terrain {
    /// MP to enter a hex of this terrain, before elevation changes.
    /// Returns `None` for impassable terrain.
    #[must_use]
    pub const fn movement_cost(self) -> Option<u32> {
        match self {
            Self::Clear => Some(1),
            Self::LightWoods | Self::Rough => Some(2),
            Self::HeavyWoods => Some(3),
            Self::Water { depth: 0 | 1 } => Some(2),
            Self::Water { .. } => Some(4),
            Self::Impassable => None,
        }
    }

    /// To-hit penalty for a target standing in (or firing through) this
    /// terrain.
    #[must_use]
    pub const fn woods_modifier(self) -> i32 {
        match self {
            Self::LightWoods => 1,
            Self::HeavyWoods => 2,
            _ => 0,
        }
    }

    /// Water depth, zero for dry hexes.
    #[must_use]
    pub const fn water_depth(self) -> u8 {
        match self {
            Self::Water { depth } => depth,
            _ => 0,
        }
    }

    /// Returns true if this hex holds water.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Self::Water { .. })
    }
}

/// One hex of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HexTile {
    /// Ground level of the hex.
    pub elevation: i32,
    /// What covers the hex.
    pub terrain: Terrain,
}

impl HexTile {
    /// Create a tile.
    #[must_use]
    pub const fn new(elevation: i32, terrain: Terrain) -> Self {
        Self { elevation, terrain }
    }
}

/// Rectangular (in axial space) hex board.
///
/// A hex is on the board when `0 <= q < width` and `0 <= r < height`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    width: u32,
    height: u32,
    /// Tiles in row-major order.
    tiles: Vec<HexTile>,
}

impl Board {
    /// Create a flat board of clear hexes.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "Board width must be positive");
        assert!(height > 0, "Board height must be positive");
        Self {
            width,
            height,
            tiles: vec![HexTile::default(); (width as usize) * (height as usize)],
        }
    }

    /// Board width in hexes.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Board height in hexes.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, hex: Hex) -> Option<usize> {
        let q = u32::try_from(hex.q).ok()?;
        let r = u32::try_from(hex.r).ok()?;
        if q < self.width && r < self.height {
            Some(r as usize * self.width as usize + q as usize)
        } else {
            None
        }
    }

    /// Whether the hex lies on the board.
    #[must_use]
    pub fn contains(&self, hex: Hex) -> bool {
        self.index(hex).is_some()
    }

    /// Tile at `hex`, or `None` off the board.
    #[must_use]
    pub fn tile(&self, hex: Hex) -> Option<&HexTile> {
        self.index(hex).map(|i| &self.tiles[i])
    }

    /// Replace the tile at `hex`.
    pub fn set_tile(&mut self, hex: Hex, tile: HexTile) -> Result<()> {
        let index = self
            .index(hex)
            .ok_or_else(|| GameError::InvalidState(format!("hex {hex} is off the board")))?;
        self.tiles[index] = tile;
        Ok(())
    }

    /// Builder form of [`Board::set_tile`].
    pub fn with_tile(mut self, hex: Hex, tile: HexTile) -> Result<Self> {
        self.set_tile(hex, tile)?;
        Ok(self)
    }

    /// Ground elevation at `hex`, zero off the board.
    #[must_use]
    pub fn elevation(&self, hex: Hex) -> i32 {
        self.tile(hex).map_or(0, |t| t.elevation)
    }

    /// Terrain at `hex`, `Impassable` off the board.
    #[must_use]
    pub fn terrain(&self, hex: Hex) -> Terrain {
        self.tile(hex).map_or(Terrain::Impassable, |t| t.terrain)
    }

    /// Iterate over every on-board hex with its tile.
    pub fn iter(&self) -> impl Iterator<Item = (Hex, &HexTile)> + '_ {
        let width = self.width as usize;
        let coord = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (Hex::new(coord(i % width), coord(i / width)), tile))
    }
}
