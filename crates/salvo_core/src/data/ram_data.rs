//! Ram modifier table for aerospace collisions.

use serde::{Deserialize, Serialize};

use crate::unit_kind::AeroClass;

/// To-hit modifier per aerospace class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassModifiers {
    /// Space stations.
    pub space_station: i32,
    /// WarShips.
    pub warship: i32,
    /// JumpShips.
    pub jumpship: i32,
    /// DropShips.
    pub dropship: i32,
    /// Fighters.
    pub fighter: i32,
}

impl ClassModifiers {
    /// Modifier for one class.
    #[must_use]
    pub const fn get(&self, class: AeroClass) -> i32 {
        match class {
            AeroClass::SpaceStation => self.space_station,
            AeroClass::Warship => self.warship,
            AeroClass::Jumpship => self.jumpship,
            AeroClass::Dropship => self.dropship,
            AeroClass::Fighter => self.fighter,
        }
    }
}

/// Ram to-hit modifiers by the class of the rammed unit and of the rammer.
///
/// # Example RON
///
/// ```ron
/// RamModifiers(
///     target: ClassModifiers(space_station: -1, warship: 1, jumpship: 0, dropship: 2, fighter: 4),
///     attacker: ClassModifiers(space_station: 0, warship: 1, jumpship: 0, dropship: -1, fighter: -2),
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamModifiers {
    /// Applied for the class of the rammed unit.
    pub target: ClassModifiers,
    /// Applied for the class of the ramming unit.
    pub attacker: ClassModifiers,
}

impl Default for RamModifiers {
    fn default() -> Self {
        Self {
            target: ClassModifiers {
                space_station: -1,
                warship: 1,
                jumpship: 0,
                dropship: 2,
                fighter: 4,
            },
            attacker: ClassModifiers {
                space_station: 0,
                warship: 1,
                jumpship: 0,
                dropship: -1,
                fighter: -2,
            },
        }
    }
}
