//! The entity model: one unit on the board.
//!
//! Entities are created from catalog definitions at setup and mutated only by
//! the phase machine and the resolution rules. Everything else reads them
//! through derived queries; status such as "destroyed" or "immobile" is
//! computed from structure and flags, never stored.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, EquipmentRef};
use crate::data::{Crew, MiscKind, MountDefinition, UnitDefinition};
use crate::error::{GameError, Result};
use crate::hex::{Facing, Hex};
use crate::location::{battle_armor, location_takes_criticals, mech, slot_count, tank};
use crate::movement::MovementRecord;
use crate::player::PlayerId;
use crate::unit_kind::{Capabilities, UnitKind};

/// Unique entity identifier within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One critical slot, referencing the mount that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriticalSlot {
    /// Index into [`Entity::mounts`].
    pub mount: usize,
    /// Slot already hit.
    pub destroyed: bool,
}

/// Armor, structure and slots of one location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationState {
    pub(crate) armor: u32,
    pub(crate) rear_armor: u32,
    pub(crate) internal: u32,
    pub(crate) original_armor: u32,
    pub(crate) original_rear_armor: u32,
    pub(crate) original_internal: u32,
    pub(crate) slots: Vec<Option<CriticalSlot>>,
}

impl LocationState {
    /// Remaining front armor.
    #[must_use]
    pub const fn armor(&self) -> u32 {
        self.armor
    }

    /// Remaining rear armor.
    #[must_use]
    pub const fn rear_armor(&self) -> u32 {
        self.rear_armor
    }

    /// Remaining internal structure.
    #[must_use]
    pub const fn internal(&self) -> u32 {
        self.internal
    }

    /// Starting internal structure.
    #[must_use]
    pub const fn original_internal(&self) -> u32 {
        self.original_internal
    }

    /// Starting front armor.
    #[must_use]
    pub const fn original_armor(&self) -> u32 {
        self.original_armor
    }

    /// Whether the location was part of the unit at all.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.original_internal > 0
    }

    /// Whether the location existed and its structure is gone.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.original_internal > 0 && self.internal == 0
    }

    /// Critical slots.
    #[must_use]
    pub fn slots(&self) -> &[Option<CriticalSlot>] {
        &self.slots
    }

    /// Indices of slots a critical hit can still land on.
    #[must_use]
    pub fn hittable_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Some(s) if !s.destroyed))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Rules category of a mounted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MountCategory {
    /// A weapon.
    Weapon,
    /// Non-weapon equipment of the given kind.
    Misc(MiscKind),
}

/// One installed item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mounted {
    pub(crate) equipment: String,
    pub(crate) category: MountCategory,
    pub(crate) location: usize,
    pub(crate) shots_left: Option<u32>,
    pub(crate) destroyed: bool,
    pub(crate) fired_this_round: bool,
    pub(crate) one_shot: bool,
    pub(crate) spent: bool,
    pub(crate) disposable: bool,
}

impl Mounted {
    /// Fresh, undamaged mount of `item` as placed by `mount_def`.
    fn from_catalog(item: EquipmentRef<'_>, mount_def: &MountDefinition) -> Self {
        match item {
            EquipmentRef::Weapon(weapon) => Self {
                equipment: weapon.id.clone(),
                category: MountCategory::Weapon,
                location: mount_def.location,
                shots_left: if weapon.one_shot {
                    Some(1)
                } else {
                    weapon.ammo_per_ton.map(|per_ton| mount_def.shots.unwrap_or(per_ton))
                },
                destroyed: false,
                fired_this_round: false,
                one_shot: weapon.one_shot,
                spent: false,
                disposable: weapon.disposable,
            },
            EquipmentRef::Misc(misc) => Self {
                equipment: misc.id.clone(),
                category: MountCategory::Misc(misc.kind),
                location: mount_def.location,
                shots_left: None,
                destroyed: false,
                fired_this_round: false,
                one_shot: false,
                spent: false,
                disposable: false,
            },
        }
    }

    /// Canonical equipment identifier.
    #[must_use]
    pub fn equipment(&self) -> &str {
        &self.equipment
    }

    /// Rules category.
    #[must_use]
    pub const fn category(&self) -> MountCategory {
        self.category
    }

    /// Location index.
    #[must_use]
    pub const fn location(&self) -> usize {
        self.location
    }

    /// Remaining shots, `None` for items without ammunition.
    #[must_use]
    pub const fn shots_left(&self) -> Option<u32> {
        self.shots_left
    }

    /// Knocked out by a critical hit or location loss.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Already declared to fire this round.
    #[must_use]
    pub const fn fired_this_round(&self) -> bool {
        self.fired_this_round
    }

    /// One-shot weapon that has fired.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.spent
    }

    /// Whether this mount is a weapon.
    #[must_use]
    pub const fn is_weapon(&self) -> bool {
        matches!(self.category, MountCategory::Weapon)
    }

    /// Whether the item has anything left to fire.
    #[must_use]
    pub const fn has_ammo(&self) -> bool {
        !self.spent && !matches!(self.shots_left, Some(0))
    }
}

/// A unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) owner: PlayerId,
    pub(crate) unit_type: String,
    pub(crate) name: String,
    pub(crate) kind: UnitKind,
    pub(crate) clan: bool,
    pub(crate) amphibious: bool,
    pub(crate) tonnage: u32,

    pub(crate) position: Hex,
    pub(crate) facing: Facing,
    pub(crate) elevation: i32,

    pub(crate) locations: Vec<LocationState>,
    pub(crate) mounts: Vec<Mounted>,

    pub(crate) crew: Crew,
    pub(crate) base_walk_mp: u32,
    pub(crate) base_jump_mp: u32,
    pub(crate) heat_sinks: u32,

    pub(crate) movement: MovementRecord,
    pub(crate) heat: u32,
    pub(crate) heat_buildup: u32,
    pub(crate) velocity: u32,
    pub(crate) sensor_hits: u32,
    pub(crate) avionics_hits: u32,
    pub(crate) engine_hits: u32,

    pub(crate) transport: Option<EntityId>,
    pub(crate) prone: bool,
    pub(crate) shutdown: bool,
    pub(crate) ramming: bool,
    pub(crate) done: bool,
    pub(crate) shooting_strength: u32,
}

impl Entity {
    /// Build an entity from its catalog definition.
    ///
    /// Mounted items fill the first free critical slots of their location in
    /// definition order.
    pub fn from_definition(
        id: EntityId,
        owner: PlayerId,
        definition: &UnitDefinition,
        catalog: &Catalog,
        position: Hex,
        facing: Facing,
    ) -> Result<Self> {
        let kind = definition.kind;
        let mut locations: Vec<LocationState> = definition
            .locations
            .iter()
            .enumerate()
            .map(|(index, loc)| LocationState {
                armor: loc.armor,
                rear_armor: loc.rear_armor,
                internal: loc.internal,
                original_armor: loc.armor,
                original_rear_armor: loc.rear_armor,
                original_internal: loc.internal,
                slots: vec![None; slot_count(kind, index)],
            })
            .collect();

        let mut mounts = Vec::with_capacity(definition.equipment.len());
        for mount_def in &definition.equipment {
            let item = catalog.equipment(&mount_def.equipment).ok_or_else(|| {
                GameError::Catalog(format!(
                    "unit '{}' mounts unknown equipment '{}'",
                    definition.id, mount_def.equipment
                ))
            })?;
            let mount_index = mounts.len();
            let location = locations.get_mut(mount_def.location).ok_or_else(|| {
                GameError::Catalog(format!(
                    "unit '{}' mounts '{}' in missing location {}",
                    definition.id, mount_def.equipment, mount_def.location
                ))
            })?;

            let needed = item.criticals_on(kind) as usize;
            let mut placed = 0;
            for slot in location.slots.iter_mut().filter(|s| s.is_none()) {
                if placed == needed {
                    break;
                }
                *slot = Some(CriticalSlot {
                    mount: mount_index,
                    destroyed: false,
                });
                placed += 1;
            }
            if placed < needed {
                return Err(GameError::LocationFull {
                    unit: definition.id.clone(),
                    location: mount_def.location,
                    equipment: mount_def.equipment.clone(),
                });
            }

            mounts.push(Mounted::from_catalog(item, mount_def));
        }

        let mut entity = Self {
            id,
            owner,
            unit_type: definition.id.clone(),
            name: definition.name.clone(),
            kind,
            clan: definition.clan,
            amphibious: definition.amphibious,
            tonnage: definition.tonnage,
            position,
            facing,
            elevation: 0,
            locations,
            mounts,
            crew: definition.crew,
            base_walk_mp: definition.walk_mp,
            base_jump_mp: definition.jump_mp,
            heat_sinks: definition.heat_sinks,
            movement: MovementRecord::stationary(position),
            heat: 0,
            heat_buildup: 0,
            velocity: 0,
            sensor_hits: 0,
            avionics_hits: 0,
            engine_hits: 0,
            transport: None,
            prone: false,
            shutdown: false,
            ramming: false,
            done: false,
            shooting_strength: 0,
        };
        entity.shooting_strength = entity.troopers_alive().max(1);
        Ok(entity)
    }

    /// Builder: set altitude/elevation above the hex floor.
    #[must_use]
    pub fn with_elevation(mut self, elevation: i32) -> Self {
        self.elevation = elevation;
        self
    }

    /// Builder: replace the crew.
    #[must_use]
    pub fn with_crew(mut self, crew: Crew) -> Self {
        self.crew = crew;
        self
    }

    // ------------------------------------------------------------------
    // Plain accessors
    // ------------------------------------------------------------------

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Catalog unit type.
    #[must_use]
    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Capability flags of the kind.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    /// Clan technology base.
    #[must_use]
    pub const fn is_clan(&self) -> bool {
        self.clan
    }

    /// Mass in tons.
    #[must_use]
    pub const fn tonnage(&self) -> u32 {
        self.tonnage
    }

    /// Current hex.
    #[must_use]
    pub const fn position(&self) -> Hex {
        self.position
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Levels above the hex floor (altitude for aerospace).
    #[must_use]
    pub const fn elevation(&self) -> i32 {
        self.elevation
    }

    /// All locations.
    #[must_use]
    pub fn locations(&self) -> &[LocationState] {
        &self.locations
    }

    /// One location.
    #[must_use]
    pub fn location(&self, index: usize) -> Option<&LocationState> {
        self.locations.get(index)
    }

    /// All mounted items.
    #[must_use]
    pub fn mounts(&self) -> &[Mounted] {
        &self.mounts
    }

    /// One mounted item.
    #[must_use]
    pub fn mount(&self, index: usize) -> Option<&Mounted> {
        self.mounts.get(index)
    }

    /// Crew skills.
    #[must_use]
    pub const fn crew(&self) -> Crew {
        self.crew
    }

    /// This round's movement.
    #[must_use]
    pub const fn movement(&self) -> &MovementRecord {
        &self.movement
    }

    /// Current heat.
    #[must_use]
    pub const fn heat(&self) -> u32 {
        self.heat
    }

    /// Heat generated this round, applied in the End phase.
    #[must_use]
    pub const fn heat_buildup(&self) -> u32 {
        self.heat_buildup
    }

    /// Aerospace velocity.
    #[must_use]
    pub const fn velocity(&self) -> u32 {
        self.velocity
    }

    /// Sensor critical hits.
    #[must_use]
    pub const fn sensor_hits(&self) -> u32 {
        self.sensor_hits
    }

    /// Avionics critical hits.
    #[must_use]
    pub const fn avionics_hits(&self) -> u32 {
        self.avionics_hits
    }

    /// Engine critical hits.
    #[must_use]
    pub const fn engine_hits(&self) -> u32 {
        self.engine_hits
    }

    /// Carrier, if this unit is a passenger.
    #[must_use]
    pub const fn transport(&self) -> Option<EntityId> {
        self.transport
    }

    /// Lying on the ground.
    #[must_use]
    pub const fn is_prone(&self) -> bool {
        self.prone
    }

    /// Shut down from heat.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Declared a ram this round.
    #[must_use]
    pub const fn is_ramming(&self) -> bool {
        self.ramming
    }

    /// Finished acting in the current phase.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    // ------------------------------------------------------------------
    // Derived status
    // ------------------------------------------------------------------

    /// Whether the unit is out of the game.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        match self.kind {
            UnitKind::Mech => [mech::HEAD, mech::CENTER_TORSO]
                .iter()
                .any(|&loc| self.locations.get(loc).map_or(true, |l| l.internal == 0)),
            UnitKind::BattleArmor | UnitKind::Infantry => self.troopers_alive() == 0,
            _ => self.locations.iter().any(LocationState::is_destroyed),
        }
    }

    /// Living troopers for infantry kinds, zero otherwise.
    #[must_use]
    pub fn troopers_alive(&self) -> u32 {
        match self.kind {
            UnitKind::BattleArmor => self
                .locations
                .iter()
                .skip(1)
                .filter(|l| l.internal > 0)
                .count()
                .try_into()
                .unwrap_or(u32::MAX),
            UnitKind::Infantry => self.locations.first().map_or(0, |l| l.internal),
            _ => 0,
        }
    }

    /// Troopers able to fire this phase (fixed at phase start). One for
    /// non-infantry kinds.
    #[must_use]
    pub const fn shooting_strength(&self) -> u32 {
        self.shooting_strength
    }

    /// Whether the unit can be given orders at all.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.is_destroyed() && self.transport.is_none()
    }

    /// Sum of remaining internal structure.
    #[must_use]
    pub fn total_internal(&self) -> u32 {
        self.locations.iter().map(|l| l.internal).sum()
    }

    /// Inner-sphere powered armor still carrying disposable packs.
    #[must_use]
    pub fn is_burdened(&self) -> bool {
        self.kind == UnitKind::BattleArmor
            && !self.clan
            && self
                .mounts
                .iter()
                .any(|m| m.disposable && !m.destroyed && m.has_ammo())
    }

    /// Walking MP (safe thrust for aerospace) after damage and heat.
    #[must_use]
    pub fn walk_mp(&self) -> u32 {
        if self.shutdown || self.is_destroyed() {
            return 0;
        }
        let mut mp = self.base_walk_mp;
        if self.kind == UnitKind::Mech {
            let legs_gone = [mech::LEFT_LEG, mech::RIGHT_LEG]
                .iter()
                .filter(|&&leg| self.locations.get(leg).map_or(false, LocationState::is_destroyed))
                .count();
            mp = match legs_gone {
                0 => mp,
                1 => mp.min(1),
                _ => 0,
            };
            mp = mp.saturating_sub(self.heat / 5);
        }
        mp
    }

    /// Running MP: walking MP times one and a half, rounded up.
    #[must_use]
    pub fn run_mp(&self) -> u32 {
        let walk = self.walk_mp();
        walk + walk.div_ceil(2)
    }

    /// Jumping MP; zero while burdened or shut down.
    #[must_use]
    pub fn jump_mp(&self) -> u32 {
        if self.shutdown || self.is_burdened() || self.is_destroyed() {
            return 0;
        }
        let lost_jets = self.destroyed_misc(MiscKind::JumpJet);
        self.base_jump_mp.saturating_sub(lost_jets)
    }

    /// Unable to move at all this round.
    #[must_use]
    pub fn is_immobile(&self) -> bool {
        self.is_destroyed() || self.shutdown || (self.walk_mp() == 0 && self.jump_mp() == 0)
    }

    /// Heat sinks still working.
    #[must_use]
    pub fn working_heat_sinks(&self) -> u32 {
        let lost = self.destroyed_misc(MiscKind::HeatSink);
        self.heat_sinks.saturating_sub(lost)
    }

    /// To-hit penalty from current heat.
    #[must_use]
    pub fn heat_to_hit_modifier(&self) -> i32 {
        if !self.capabilities().contains(Capabilities::TRACKS_HEAT) {
            return 0;
        }
        match self.heat {
            24.. => 4,
            17..=23 => 3,
            13..=16 => 2,
            8..=12 => 1,
            _ => 0,
        }
    }

    /// Locations an attack can land on.
    #[must_use]
    pub fn hittable_locations(&self) -> Vec<usize> {
        self.locations
            .iter()
            .enumerate()
            .filter(|(index, loc)| {
                loc.exists()
                    && !loc.is_destroyed()
                    && !(self.kind == UnitKind::BattleArmor && *index == battle_armor::SQUAD)
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether a critical hit in `location` can find anything to break.
    #[must_use]
    pub fn has_hittable_criticals(&self, location: usize) -> bool {
        location_takes_criticals(self.kind, location)
            && self
                .locations
                .get(location)
                .is_some_and(|l| !l.hittable_slots().is_empty())
    }

    /// Whether a vehicle has a turret location.
    #[must_use]
    pub fn has_turret(&self) -> bool {
        self.kind == UnitKind::Tank
            && self
                .locations
                .get(tank::TURRET)
                .is_some_and(LocationState::exists)
    }

    /// Height above the hex floor for line of sight, in levels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        let body = match self.kind {
            UnitKind::Mech if !self.prone => 1,
            _ => 0,
        };
        self.elevation + body
    }

    /// Destroyed arm actuators in an arm.
    #[must_use]
    pub fn actuator_hits(&self, location: usize) -> usize {
        self.mounts
            .iter()
            .filter(|m| {
                m.location == location
                    && m.destroyed
                    && matches!(
                        m.category,
                        MountCategory::Misc(MiscKind::ArmActuator | MiscKind::LegActuator)
                    )
            })
            .count()
    }

    fn destroyed_misc(&self, kind: MiscKind) -> u32 {
        let count = self
            .mounts
            .iter()
            .filter(|m| m.destroyed && m.category == MountCategory::Misc(kind))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Refresh per-phase derived values at the start of a phase.
    pub(crate) fn begin_phase(&mut self) {
        self.done = false;
        self.shooting_strength = if self.kind.is_infantry() {
            self.troopers_alive()
        } else {
            1
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_from_definition_allocates_slots() {
        let catalog = testing::catalog();
        let def = catalog.unit(testing::HUNCHBACK).expect("fixture");
        let entity = Entity::from_definition(
            EntityId(1),
            PlayerId(1),
            def,
            &catalog,
            Hex::new(0, 0),
            Facing::North,
        )
        .expect("builds");

        let rt = entity.location(mech::RIGHT_TORSO).expect("rt");
        let filled = rt.slots().iter().filter(|s| s.is_some()).count();
        assert_eq!(filled, 10, "AC/20 fills ten slots");
        assert_eq!(entity.mounts()[0].shots_left(), Some(5));
        assert!(!entity.is_destroyed());
        assert_eq!(entity.total_internal(), def.total_internal());
    }

    #[test]
    fn test_mech_destroyed_by_center_torso() {
        let mut entity = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        entity.locations[mech::LEFT_ARM].internal = 0;
        assert!(!entity.is_destroyed());
        entity.locations[mech::CENTER_TORSO].internal = 0;
        assert!(entity.is_destroyed());
        assert!(!entity.can_act());
        assert_eq!(entity.walk_mp(), 0);
    }

    #[test]
    fn test_run_mp_rounds_up() {
        let entity = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        assert_eq!(entity.walk_mp(), 4);
        assert_eq!(entity.run_mp(), 6);
        let locust = testing::entity(testing::LOCUST, 1, Hex::new(0, 0));
        assert_eq!(locust.walk_mp(), 8);
        assert_eq!(locust.run_mp(), 12);
    }

    #[test]
    fn test_heat_reduces_mp_and_accuracy() {
        let mut entity = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        entity.heat = 13;
        assert_eq!(entity.heat_to_hit_modifier(), 2);
        assert_eq!(entity.walk_mp(), 2);
        entity.heat = 7;
        assert_eq!(entity.heat_to_hit_modifier(), 0);
    }

    #[test]
    fn test_inner_sphere_battle_armor_is_burdened_until_packs_spent() {
        let mut squad = testing::entity(testing::IS_BATTLE_ARMOR, 1, Hex::new(0, 0));
        assert!(squad.is_burdened());
        assert_eq!(squad.jump_mp(), 0);
        for mount in &mut squad.mounts {
            if mount.disposable {
                mount.spent = true;
            }
        }
        assert!(!squad.is_burdened());
        assert_eq!(squad.jump_mp(), 3);
    }

    #[test]
    fn test_clan_battle_armor_is_never_burdened() {
        let point = testing::entity(testing::CLAN_BATTLE_ARMOR, 1, Hex::new(0, 0));
        assert!(!point.is_burdened());
        assert_eq!(point.jump_mp(), 3);
        assert_eq!(point.troopers_alive(), 5);
        assert_eq!(point.shooting_strength(), 5);
    }

    #[test]
    fn test_battle_armor_squad_location_is_never_hit() {
        let squad = testing::entity(testing::IS_BATTLE_ARMOR, 1, Hex::new(0, 0));
        assert_eq!(squad.hittable_locations(), vec![1, 2, 3, 4]);
        assert!(!squad.has_hittable_criticals(battle_armor::SQUAD));
    }

    #[test]
    fn test_battle_armor_destroyed_when_all_troopers_dead() {
        let mut squad = testing::entity(testing::IS_BATTLE_ARMOR, 1, Hex::new(0, 0));
        for trooper in 1..=3 {
            squad.locations[trooper].internal = 0;
        }
        assert!(!squad.is_destroyed());
        assert_eq!(squad.hittable_locations(), vec![4]);
        squad.locations[4].internal = 0;
        assert!(squad.is_destroyed());
    }
}
