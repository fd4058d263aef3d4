//! Location layouts, hit tables and the damage transfer table.
//!
//! A unit's locations are plain indices whose meaning depends on its
//! [`UnitKind`]. The constants in the per-kind modules name them.

use serde::{Deserialize, Serialize};

use crate::unit_kind::UnitKind;

/// Mech location indices.
pub mod mech {
    /// Head.
    pub const HEAD: usize = 0;
    /// Center torso.
    pub const CENTER_TORSO: usize = 1;
    /// Right torso.
    pub const RIGHT_TORSO: usize = 2;
    /// Left torso.
    pub const LEFT_TORSO: usize = 3;
    /// Right arm.
    pub const RIGHT_ARM: usize = 4;
    /// Left arm.
    pub const LEFT_ARM: usize = 5;
    /// Right leg.
    pub const RIGHT_LEG: usize = 6;
    /// Left leg.
    pub const LEFT_LEG: usize = 7;
    /// Number of locations.
    pub const COUNT: usize = 8;
}

/// Vehicle location indices.
pub mod tank {
    /// Front.
    pub const FRONT: usize = 0;
    /// Right side.
    pub const RIGHT: usize = 1;
    /// Left side.
    pub const LEFT: usize = 2;
    /// Rear.
    pub const REAR: usize = 3;
    /// Turret; a turret with no structure means the vehicle has none.
    pub const TURRET: usize = 4;
    /// Number of locations.
    pub const COUNT: usize = 5;
}

/// Aerospace location indices.
pub mod aero {
    /// Nose.
    pub const NOSE: usize = 0;
    /// Left wing.
    pub const LEFT_WING: usize = 1;
    /// Right wing.
    pub const RIGHT_WING: usize = 2;
    /// Aft.
    pub const AFT: usize = 3;
    /// Number of locations.
    pub const COUNT: usize = 4;
}

/// Powered-armor location indices. Trooper `n` (1-based) is location `n`.
pub mod battle_armor {
    /// Squad-wide location holding shared equipment. Never hit.
    pub const SQUAD: usize = 0;
    /// Troopers in an inner-sphere squad.
    pub const IS_TROOPERS: usize = 4;
    /// Troopers in a clan point.
    pub const CLAN_TROOPERS: usize = 5;
}

/// Side of a unit an attack strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Front arc.
    Front,
    /// Left side.
    Left,
    /// Right side.
    Right,
    /// Rear arc.
    Rear,
}

/// Result of a hit-location roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitLocation {
    /// Location struck.
    pub location: usize,
    /// Damage strikes rear armor.
    pub rear: bool,
    /// The roll allows a critical hit even if armor holds.
    pub through_armor_critical: bool,
}

impl HitLocation {
    /// Plain hit on the front armor of `location`.
    #[must_use]
    pub const fn new(location: usize) -> Self {
        Self {
            location,
            rear: false,
            through_armor_critical: false,
        }
    }
}

/// Number of locations a unit of this kind has.
#[must_use]
pub const fn location_count(kind: UnitKind, clan: bool) -> usize {
    match kind {
        UnitKind::Mech => mech::COUNT,
        UnitKind::Tank => tank::COUNT,
        UnitKind::Infantry => 1,
        UnitKind::BattleArmor => {
            1 + if clan {
                battle_armor::CLAN_TROOPERS
            } else {
                battle_armor::IS_TROOPERS
            }
        }
        UnitKind::Fighter
        | UnitKind::Dropship
        | UnitKind::Jumpship
        | UnitKind::Warship
        | UnitKind::SpaceStation => aero::COUNT,
    }
}

/// Critical slots in a location.
#[must_use]
pub const fn slot_count(kind: UnitKind, location: usize) -> usize {
    match kind {
        UnitKind::Mech => match location {
            mech::HEAD | mech::RIGHT_LEG | mech::LEFT_LEG => 6,
            _ => 12,
        },
        UnitKind::BattleArmor => {
            if location == battle_armor::SQUAD {
                7
            } else {
                1
            }
        }
        UnitKind::Infantry => 0,
        UnitKind::Tank
        | UnitKind::Fighter
        | UnitKind::Dropship
        | UnitKind::Jumpship
        | UnitKind::Warship
        | UnitKind::SpaceStation => 6,
    }
}

/// Whether structure hits in a location can cause critical hits at all.
#[must_use]
pub const fn location_takes_criticals(kind: UnitKind, location: usize) -> bool {
    match kind {
        UnitKind::BattleArmor => location != battle_armor::SQUAD,
        UnitKind::Infantry => false,
        _ => true,
    }
}

/// Short display name of a location.
#[must_use]
pub fn location_name(kind: UnitKind, location: usize) -> String {
    let fixed = match kind {
        UnitKind::Mech => ["HD", "CT", "RT", "LT", "RA", "LA", "RL", "LL"]
            .get(location)
            .copied(),
        UnitKind::Tank => ["Front", "Right", "Left", "Rear", "Turret"]
            .get(location)
            .copied(),
        UnitKind::Infantry => (location == 0).then_some("Platoon"),
        UnitKind::BattleArmor => (location == battle_armor::SQUAD).then_some("Squad"),
        _ => ["Nose", "Left Wing", "Right Wing", "Aft"]
            .get(location)
            .copied(),
    };
    match fixed {
        Some(name) => name.to_string(),
        None if kind == UnitKind::BattleArmor => format!("Trooper {location}"),
        None => format!("Location {location}"),
    }
}

/// Where damage exceeding a destroyed location's structure goes.
///
/// Only mechs transfer; every other kind discards the excess.
#[must_use]
pub const fn transfer_location(kind: UnitKind, location: usize) -> Option<usize> {
    match kind {
        UnitKind::Mech => match location {
            mech::RIGHT_ARM | mech::RIGHT_LEG => Some(mech::RIGHT_TORSO),
            mech::LEFT_ARM | mech::LEFT_LEG => Some(mech::LEFT_TORSO),
            mech::RIGHT_TORSO | mech::LEFT_TORSO => Some(mech::CENTER_TORSO),
            _ => None,
        },
        _ => None,
    }
}

/// Mech hit table, 2d6 by side.
#[must_use]
pub const fn mech_hit_location(side: Side, roll: u8) -> HitLocation {
    use mech::{
        CENTER_TORSO as CT, HEAD as HD, LEFT_ARM as LA, LEFT_LEG as LL, LEFT_TORSO as LT,
        RIGHT_ARM as RA, RIGHT_LEG as RL, RIGHT_TORSO as RT,
    };
    let location = match side {
        Side::Front | Side::Rear => match roll {
            2 | 7 => CT,
            3 | 4 => RA,
            5 => RL,
            6 => RT,
            8 => LT,
            9 => LL,
            10 | 11 => LA,
            _ => HD,
        },
        Side::Left => match roll {
            2 | 7 => LT,
            3 | 6 => LL,
            4 | 5 => LA,
            8 => CT,
            9 => RT,
            10 => RA,
            11 => RL,
            _ => HD,
        },
        Side::Right => match roll {
            2 | 7 => RT,
            3 | 6 => RL,
            4 | 5 => RA,
            8 => CT,
            9 => LT,
            10 => LA,
            11 => LL,
            _ => HD,
        },
    };
    HitLocation {
        location,
        rear: matches!(side, Side::Rear)
            && matches!(location, mech::CENTER_TORSO | mech::LEFT_TORSO | mech::RIGHT_TORSO),
        through_armor_critical: roll == 2,
    }
}

/// Ground vehicle hit table, 2d6 by side.
///
/// `has_turret` false redirects turret results to the struck side.
#[must_use]
pub const fn tank_hit_location(side: Side, roll: u8, has_turret: bool) -> HitLocation {
    let facing_location = match side {
        Side::Front => tank::FRONT,
        Side::Rear => tank::REAR,
        Side::Left => tank::LEFT,
        Side::Right => tank::RIGHT,
    };
    let location = match roll {
        5 => match side {
            Side::Front => tank::RIGHT,
            Side::Rear => tank::LEFT,
            Side::Left => tank::FRONT,
            Side::Right => tank::REAR,
        },
        9 => match side {
            Side::Front => tank::LEFT,
            Side::Rear => tank::RIGHT,
            Side::Left => tank::REAR,
            Side::Right => tank::FRONT,
        },
        10..=12 if has_turret => tank::TURRET,
        _ => facing_location,
    };
    HitLocation {
        location,
        rear: false,
        through_armor_critical: roll == 2 || roll == 12,
    }
}

/// Aerospace hit table, 2d6 by side.
#[must_use]
pub const fn aero_hit_location(side: Side, roll: u8) -> HitLocation {
    let (primary, low, high) = match side {
        Side::Front => (aero::NOSE, aero::RIGHT_WING, aero::LEFT_WING),
        Side::Rear => (aero::AFT, aero::RIGHT_WING, aero::LEFT_WING),
        Side::Left => (aero::LEFT_WING, aero::NOSE, aero::AFT),
        Side::Right => (aero::RIGHT_WING, aero::NOSE, aero::AFT),
    };
    let location = match roll {
        3 | 4 => low,
        10 | 11 => high,
        _ => primary,
    };
    HitLocation {
        location,
        rear: false,
        through_armor_critical: roll == 2 || roll == 12,
    }
}

/// Mech punch table, 1d6 by side.
#[must_use]
pub const fn mech_punch_location(side: Side, roll: u8) -> HitLocation {
    use mech::{
        CENTER_TORSO as CT, HEAD as HD, LEFT_ARM as LA, LEFT_TORSO as LT, RIGHT_ARM as RA,
        RIGHT_TORSO as RT,
    };
    let location = match side {
        Side::Left => match roll {
            1 | 2 => LT,
            3 => CT,
            4 | 5 => LA,
            _ => HD,
        },
        Side::Right => match roll {
            1 | 2 => RT,
            3 => CT,
            4 | 5 => RA,
            _ => HD,
        },
        Side::Front | Side::Rear => match roll {
            1 => LA,
            2 => LT,
            3 => CT,
            4 => RT,
            5 => RA,
            _ => HD,
        },
    };
    HitLocation {
        location,
        rear: matches!(side, Side::Rear) && matches!(location, CT | LT | RT),
        through_armor_critical: false,
    }
}

/// Mech kick table, 1d6 by side.
#[must_use]
pub const fn mech_kick_location(side: Side, roll: u8) -> HitLocation {
    let location = match side {
        Side::Left => mech::LEFT_LEG,
        Side::Right => mech::RIGHT_LEG,
        Side::Front | Side::Rear => {
            if roll <= 3 {
                mech::RIGHT_LEG
            } else {
                mech::LEFT_LEG
            }
        }
    };
    HitLocation::new(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_counts() {
        assert_eq!(location_count(UnitKind::Mech, false), 8);
        assert_eq!(location_count(UnitKind::Tank, false), 5);
        assert_eq!(location_count(UnitKind::BattleArmor, false), 5);
        assert_eq!(location_count(UnitKind::BattleArmor, true), 6);
        assert_eq!(location_count(UnitKind::Infantry, false), 1);
        assert_eq!(location_count(UnitKind::Dropship, false), 4);
    }

    #[test]
    fn test_battle_armor_slot_layout() {
        let slots: Vec<usize> = (0..location_count(UnitKind::BattleArmor, true))
            .map(|loc| slot_count(UnitKind::BattleArmor, loc))
            .collect();
        assert_eq!(slots, vec![7, 1, 1, 1, 1, 1]);
        assert!(!location_takes_criticals(UnitKind::BattleArmor, battle_armor::SQUAD));
        assert!(location_takes_criticals(UnitKind::BattleArmor, 1));
    }

    #[test]
    fn test_mech_transfer_chain() {
        assert_eq!(
            transfer_location(UnitKind::Mech, mech::LEFT_ARM),
            Some(mech::LEFT_TORSO)
        );
        assert_eq!(
            transfer_location(UnitKind::Mech, mech::RIGHT_LEG),
            Some(mech::RIGHT_TORSO)
        );
        assert_eq!(
            transfer_location(UnitKind::Mech, mech::LEFT_TORSO),
            Some(mech::CENTER_TORSO)
        );
        assert_eq!(transfer_location(UnitKind::Mech, mech::CENTER_TORSO), None);
        assert_eq!(transfer_location(UnitKind::Mech, mech::HEAD), None);
        assert_eq!(transfer_location(UnitKind::Tank, tank::FRONT), None);
        assert_eq!(transfer_location(UnitKind::BattleArmor, 2), None);
    }

    #[test]
    fn test_mech_front_table_extremes() {
        let two = mech_hit_location(Side::Front, 2);
        assert_eq!(two.location, mech::CENTER_TORSO);
        assert!(two.through_armor_critical);
        assert_eq!(mech_hit_location(Side::Front, 12).location, mech::HEAD);
        assert_eq!(mech_hit_location(Side::Front, 7).location, mech::CENTER_TORSO);
    }

    #[test]
    fn test_mech_rear_hits_use_rear_armor_on_torsos() {
        assert!(mech_hit_location(Side::Rear, 7).rear);
        assert!(!mech_hit_location(Side::Rear, 10).rear);
        assert!(!mech_hit_location(Side::Front, 7).rear);
    }

    #[test]
    fn test_tank_without_turret() {
        assert_eq!(tank_hit_location(Side::Front, 11, true).location, tank::TURRET);
        assert_eq!(tank_hit_location(Side::Front, 11, false).location, tank::FRONT);
        assert_eq!(tank_hit_location(Side::Left, 5, true).location, tank::FRONT);
    }

    #[test]
    fn test_aero_table() {
        assert_eq!(aero_hit_location(Side::Front, 7).location, aero::NOSE);
        assert_eq!(aero_hit_location(Side::Rear, 7).location, aero::AFT);
        assert_eq!(aero_hit_location(Side::Left, 3).location, aero::NOSE);
    }

    #[test]
    fn test_punch_and_kick_tables() {
        assert_eq!(mech_punch_location(Side::Front, 6).location, mech::HEAD);
        assert_eq!(mech_punch_location(Side::Left, 4).location, mech::LEFT_ARM);
        assert!(mech_punch_location(Side::Rear, 3).rear);
        assert_eq!(mech_kick_location(Side::Front, 2).location, mech::RIGHT_LEG);
        assert_eq!(mech_kick_location(Side::Front, 5).location, mech::LEFT_LEG);
        assert_eq!(mech_kick_location(Side::Left, 1).location, mech::LEFT_LEG);
    }

    #[test]
    fn test_location_names() {
        assert_eq!(location_name(UnitKind::Mech, mech::CENTER_TORSO), "CT");
        assert_eq!(location_name(UnitKind::BattleArmor, 0), "Squad");
        assert_eq!(location_name(UnitKind::BattleArmor, 3), "Trooper 3");
    }
}
