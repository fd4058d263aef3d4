//! Unit classification.
//!
//! Every unit has exactly one [`UnitKind`]. Rules that differ between kinds
//! never dispatch through a trait hierarchy; they ask the kind for its
//! [`Capabilities`] (fast flag queries) or match on the kind directly.
//!
//! ```
//! use salvo_core::unit_kind::{Capabilities, UnitKind};
//!
//! let caps = UnitKind::Mech.capabilities();
//! assert!(caps.contains(Capabilities::GROUND | Capabilities::PHYSICAL));
//! assert!(!caps.intersects(Capabilities::AEROSPACE));
//! ```

use serde::{Deserialize, Serialize};

/// Kind of unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// BattleMech.
    Mech,
    /// Ground combat vehicle.
    Tank,
    /// Conventional infantry platoon.
    Infantry,
    /// Powered-armor squad.
    BattleArmor,
    /// Aerospace fighter.
    Fighter,
    /// DropShip.
    Dropship,
    /// JumpShip.
    Jumpship,
    /// WarShip.
    Warship,
    /// Space station.
    SpaceStation,
}

impl UnitKind {
    /// Capability flags for this kind.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Mech => Capabilities::GROUND
                .union(Capabilities::PHYSICAL)
                .union(Capabilities::CHARGE)
                .union(Capabilities::TRACKS_HEAT)
                .union(Capabilities::ENTERS_WATER)
                .union(Capabilities::CAN_PRONE),
            Self::Tank => Capabilities::GROUND.union(Capabilities::CHARGE),
            Self::Infantry => Capabilities::GROUND
                .union(Capabilities::TROOPERS)
                .union(Capabilities::STACKS),
            Self::BattleArmor => Capabilities::GROUND
                .union(Capabilities::TROOPERS)
                .union(Capabilities::STACKS)
                .union(Capabilities::SQUAD),
            Self::Fighter => Capabilities::AEROSPACE
                .union(Capabilities::RAM)
                .union(Capabilities::TRACKS_HEAT),
            Self::Dropship | Self::Jumpship | Self::Warship | Self::SpaceStation => {
                Capabilities::AEROSPACE.union(Capabilities::RAM)
            }
        }
    }

    /// Whether this kind flies in space.
    #[must_use]
    pub const fn is_aerospace(self) -> bool {
        self.capabilities().contains(Capabilities::AEROSPACE)
    }

    /// Whether this kind fights on the ground.
    #[must_use]
    pub const fn is_ground(self) -> bool {
        self.capabilities().contains(Capabilities::GROUND)
    }

    /// Whether this kind is made of individual troopers.
    #[must_use]
    pub const fn is_infantry(self) -> bool {
        self.capabilities().contains(Capabilities::TROOPERS)
    }

    /// Aerospace class used by ram modifiers, `None` for ground units.
    #[must_use]
    pub const fn aero_class(self) -> Option<AeroClass> {
        match self {
            Self::Fighter => Some(AeroClass::Fighter),
            Self::Dropship => Some(AeroClass::Dropship),
            Self::Jumpship => Some(AeroClass::Jumpship),
            Self::Warship => Some(AeroClass::Warship),
            Self::SpaceStation => Some(AeroClass::SpaceStation),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mech => "Mech",
            Self::Tank => "Tank",
            Self::Infantry => "Infantry",
            Self::BattleArmor => "Battle Armor",
            Self::Fighter => "Fighter",
            Self::Dropship => "DropShip",
            Self::Jumpship => "JumpShip",
            Self::Warship => "WarShip",
            Self::SpaceStation => "Space Station",
        };
        f.write_str(name)
    }
}

/// Size class of aerospace units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AeroClass {
    /// Station.
    SpaceStation,
    /// WarShip.
    Warship,
    /// JumpShip.
    Jumpship,
    /// DropShip.
    Dropship,
    /// Fighter.
    Fighter,
}

/// Bitflags for fast unit capability queries.
///
/// Derived from the [`UnitKind`]; never stored separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(u32);

impl Capabilities {
    // ========================================
    // Domain
    // ========================================

    /// Fights on the ground board.
    pub const GROUND: Self = Self(1 << 0);
    /// Flies in space.
    pub const AEROSPACE: Self = Self(1 << 1);

    // ========================================
    // Structure
    // ========================================

    /// Made of individual troopers; each trooper is one location.
    pub const TROOPERS: Self = Self(1 << 2);
    /// Powered-armor squad with a squad-wide equipment location.
    pub const SQUAD: Self = Self(1 << 3);
    /// Builds heat from movement and weapons fire.
    pub const TRACKS_HEAT: Self = Self(1 << 4);

    // ========================================
    // Attacks
    // ========================================

    /// May punch and kick.
    pub const PHYSICAL: Self = Self(1 << 5);
    /// May charge.
    pub const CHARGE: Self = Self(1 << 6);
    /// May ram.
    pub const RAM: Self = Self(1 << 7);

    // ========================================
    // Movement
    // ========================================

    /// May enter water hexes.
    pub const ENTERS_WATER: Self = Self(1 << 8);
    /// May share a hex with friendly units.
    pub const STACKS: Self = Self(1 << 9);
    /// May drop prone and stand up.
    pub const CAN_PRONE: Self = Self(1 << 10);

    /// No flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Union of flags.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Create from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_bit_ops() {
        let caps = Capabilities::GROUND | Capabilities::CHARGE;
        assert!(caps.contains(Capabilities::GROUND));
        assert!(caps.intersects(Capabilities::CHARGE | Capabilities::RAM));
        assert!(!caps.contains(Capabilities::CHARGE | Capabilities::RAM));
        assert_eq!(Capabilities::from_bits(caps.bits()), caps);
        assert_eq!(Capabilities::empty().bits(), 0);
    }

    #[test]
    fn test_kind_domains() {
        assert!(UnitKind::Mech.is_ground());
        assert!(UnitKind::BattleArmor.is_infantry());
        assert!(!UnitKind::Tank.is_infantry());
        for kind in [
            UnitKind::Fighter,
            UnitKind::Dropship,
            UnitKind::Jumpship,
            UnitKind::Warship,
            UnitKind::SpaceStation,
        ] {
            assert!(kind.is_aerospace());
            assert!(kind.capabilities().contains(Capabilities::RAM));
            assert!(kind.aero_class().is_some());
        }
        assert_eq!(UnitKind::Mech.aero_class(), None);
    }

    #[test]
    fn test_only_mechs_punch() {
        assert!(UnitKind::Mech.capabilities().contains(Capabilities::PHYSICAL));
        assert!(!UnitKind::Tank.capabilities().contains(Capabilities::PHYSICAL));
        assert!(UnitKind::Tank.capabilities().contains(Capabilities::CHARGE));
        assert!(!UnitKind::Infantry.capabilities().contains(Capabilities::CHARGE));
    }
}
