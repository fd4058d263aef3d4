//! Fixtures shared by the unit tests of this crate.

use std::sync::Arc;

use crate::board::Board;
use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::data::{Crew, LocationDefinition, MountDefinition, UnitDefinition};
use crate::dice::ScriptedDice;
use crate::entity::{Entity, EntityId};
use crate::game::Game;
use crate::hex::{Facing, Hex};
use crate::player::{PlayerId, Team};
use crate::unit_kind::UnitKind;

pub const HUNCHBACK: &str = "HBK-4G";
pub const LOCUST: &str = "LCT-1V";
pub const IS_BATTLE_ARMOR: &str = "IS Standard BA";
pub const CLAN_BATTLE_ARMOR: &str = "Elemental";
pub const UNDINE: &str = "Undine";
pub const VEDETTE: &str = "Vedette";
pub const FOOT_PLATOON: &str = "Foot Platoon";
pub const FIGHTER: &str = "SL-15";
pub const DROPSHIP: &str = "Union";

fn unit(
    id: &str,
    kind: UnitKind,
    tonnage: u32,
    walk_mp: u32,
    locations: Vec<LocationDefinition>,
    equipment: Vec<MountDefinition>,
) -> UnitDefinition {
    UnitDefinition {
        id: id.to_string(),
        name: id.to_string(),
        kind,
        tonnage,
        clan: false,
        amphibious: false,
        walk_mp,
        jump_mp: 0,
        heat_sinks: 0,
        crew: Crew::default(),
        locations,
        equipment,
    }
}

fn mech_locations() -> Vec<LocationDefinition> {
    vec![
        LocationDefinition::new(9, 3),
        LocationDefinition::new(26, 16).with_rear(5),
        LocationDefinition::new(20, 12).with_rear(4),
        LocationDefinition::new(20, 12).with_rear(4),
        LocationDefinition::new(16, 8),
        LocationDefinition::new(16, 8),
        LocationDefinition::new(20, 12),
        LocationDefinition::new(20, 12),
    ]
}

/// Catalog with one unit of every kind.
#[allow(clippy::too_many_lines)]
pub fn catalog() -> Catalog {
    let troopers = |n: usize| {
        let mut locs = vec![LocationDefinition::new(0, 0)];
        locs.extend(std::iter::repeat(LocationDefinition::new(4, 1)).take(n));
        locs
    };
    let units = vec![
        UnitDefinition {
            heat_sinks: 13,
            ..unit(
                HUNCHBACK,
                UnitKind::Mech,
                50,
                4,
                mech_locations(),
                vec![
                    MountDefinition::new("ISAC20", 2),
                    MountDefinition::new("ISMediumLaser", 5),
                    MountDefinition::new("ISMediumLaser", 4),
                    MountDefinition::new("ArmActuator", 4),
                    MountDefinition::new("ArmActuator", 5),
                    MountDefinition::new("LegActuator", 6),
                    MountDefinition::new("LegActuator", 7),
                    MountDefinition::new("Engine", 1),
                    MountDefinition::new("Gyro", 1),
                    MountDefinition::new("Cockpit", 0),
                    MountDefinition::new("Sensors", 0),
                ],
            )
        },
        UnitDefinition {
            heat_sinks: 10,
            ..unit(
                LOCUST,
                UnitKind::Mech,
                20,
                8,
                vec![
                    LocationDefinition::new(6, 3),
                    LocationDefinition::new(8, 6).with_rear(2),
                    LocationDefinition::new(6, 5).with_rear(2),
                    LocationDefinition::new(6, 5).with_rear(2),
                    LocationDefinition::new(2, 3),
                    LocationDefinition::new(2, 3),
                    LocationDefinition::new(4, 4),
                    LocationDefinition::new(4, 4),
                ],
                vec![MountDefinition::new("ISMediumLaser", 1)],
            )
        },
        UnitDefinition {
            jump_mp: 3,
            ..unit(
                IS_BATTLE_ARMOR,
                UnitKind::BattleArmor,
                4,
                1,
                troopers(4),
                vec![
                    MountDefinition::new("BA-SRM2 (one shot)", 0),
                    MountDefinition::new("BASmallLaser", 0),
                ],
            )
        },
        UnitDefinition {
            clan: true,
            jump_mp: 3,
            ..unit(
                CLAN_BATTLE_ARMOR,
                UnitKind::BattleArmor,
                5,
                1,
                troopers(5),
                vec![MountDefinition::new("BASmallLaser", 0)],
            )
        },
        UnitDefinition {
            clan: true,
            amphibious: true,
            ..unit(
                UNDINE,
                UnitKind::BattleArmor,
                5,
                1,
                troopers(5),
                vec![MountDefinition::new("BASmallLaser", 0)],
            )
        },
        unit(
            VEDETTE,
            UnitKind::Tank,
            50,
            5,
            vec![
                LocationDefinition::new(14, 5),
                LocationDefinition::new(10, 5),
                LocationDefinition::new(10, 5),
                LocationDefinition::new(8, 5),
                LocationDefinition::new(10, 5),
            ],
            vec![MountDefinition::new("ISMediumLaser", 4)],
        ),
        unit(
            FOOT_PLATOON,
            UnitKind::Infantry,
            3,
            1,
            vec![LocationDefinition::new(0, 28)],
            Vec::new(),
        ),
        UnitDefinition {
            heat_sinks: 10,
            ..unit(
                FIGHTER,
                UnitKind::Fighter,
                80,
                5,
                vec![LocationDefinition::new(20, 8); 4],
                vec![MountDefinition::new("ISLargeLaser", 0)],
            )
        },
        unit(
            DROPSHIP,
            UnitKind::Dropship,
            3_600,
            3,
            vec![LocationDefinition::new(100, 30); 4],
            Vec::new(),
        ),
    ];

    let mut catalog = Catalog::builtin();
    for unit in units {
        catalog.insert_unit(unit).expect("fixture unit is valid");
    }
    catalog
}

/// An entity of `unit_type` owned by player `owner`, facing north.
pub fn entity(unit_type: &str, owner: u32, hex: Hex) -> Entity {
    entity_with_id(unit_type, 1, owner, hex)
}

/// An entity with an explicit id.
pub fn entity_with_id(unit_type: &str, id: u32, owner: u32, hex: Hex) -> Entity {
    let catalog = catalog();
    let def = catalog.unit(unit_type).expect("fixture unit exists");
    Entity::from_definition(
        EntityId(id),
        PlayerId(owner),
        def,
        &catalog,
        hex,
        Facing::North,
    )
    .expect("fixture entity builds")
}

/// A lobby game on a clear 16x16 board with two players on opposing teams.
pub fn lobby(dice: ScriptedDice) -> (Game<ScriptedDice>, PlayerId, PlayerId) {
    let mut game = Game::new(
        GameConfig::default(),
        Board::new(16, 16),
        Arc::new(catalog()),
        dice,
    );
    let alice = game.add_player("alice", Team(1)).expect("player");
    let bob = game.add_player("bob", Team(2)).expect("player");
    (game, alice, bob)
}
