//! Hit location, damage application and critical hits.
//!
//! Damage strips armor first, then internal structure. Structure that runs
//! out passes the remainder inward along the transfer table; with nowhere to
//! go the excess is lost. Any structure damage earns a critical roll.

use tracing::debug;

use crate::data::MiscKind;
use crate::dice::DiceRoller;
use crate::entity::{Entity, MountCategory};
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::location::{
    aero_hit_location, location_takes_criticals, mech_hit_location, tank_hit_location,
    transfer_location, HitLocation, Side,
};
use crate::rules::cluster;
use crate::unit_kind::UnitKind;

/// Re-rolls allowed before a slot or trooper pick is treated as corrupt.
const MAX_REROLLS: usize = 1000;

/// Roll where an attack from `side` lands on `target`.
///
/// # Errors
///
/// [`GameError::StateCorruption`] if no die result can name a living
/// trooper of a battle armor squad.
pub fn roll_hit_location<D: DiceRoller + ?Sized>(
    target: &Entity,
    side: Side,
    dice: &mut D,
) -> Result<HitLocation> {
    Ok(match target.kind() {
        UnitKind::Mech => mech_hit_location(side, dice.roll_2d6()),
        UnitKind::Tank => tank_hit_location(side, dice.roll_2d6(), target.has_turret()),
        UnitKind::BattleArmor => HitLocation::new(trooper_location(target, dice)?),
        UnitKind::Infantry => HitLocation::new(0),
        _ => aero_hit_location(side, dice.roll_2d6()),
    })
}

/// Pick a living trooper with 1d6, re-rolling dead or missing ones.
fn trooper_location<D: DiceRoller + ?Sized>(target: &Entity, dice: &mut D) -> Result<usize> {
    let alive = target.hittable_locations();
    if alive.is_empty() {
        return Ok(1);
    }
    if !alive.iter().any(|loc| (1..=6).contains(loc)) {
        return Err(GameError::StateCorruption(format!(
            "{} has no trooper a d6 can reach",
            target.id()
        )));
    }
    for _ in 0..MAX_REROLLS {
        let roll = usize::from(dice.d6());
        if alive.contains(&roll) {
            return Ok(roll);
        }
    }
    Err(GameError::StateCorruption(format!(
        "{} trooper roll never landed",
        target.id()
    )))
}

/// Apply `total` points in groups of `group`, rolling a fresh location for
/// each group.
pub(crate) fn apply_grouped<D: DiceRoller + ?Sized>(
    target: &mut Entity,
    side: Side,
    total: u32,
    group: u32,
    dice: &mut D,
    events: &mut Vec<GameEvent>,
) -> Result<()> {
    for amount in cluster::groups(total, group) {
        if target.is_destroyed() {
            break;
        }
        let hit = roll_hit_location(target, side, dice)?;
        apply_damage(target, hit, amount, dice, events)?;
    }
    Ok(())
}

/// Apply `amount` points at `hit`.
///
/// A location that is already destroyed absorbs nothing; the whole amount
/// moves inward.
///
/// # Errors
///
/// [`GameError::StateCorruption`] if the location does not exist.
pub fn apply_damage<D: DiceRoller + ?Sized>(
    entity: &mut Entity,
    hit: HitLocation,
    amount: u32,
    dice: &mut D,
    events: &mut Vec<GameEvent>,
) -> Result<()> {
    let id = entity.id();
    let kind = entity.kind();
    let was_destroyed = entity.is_destroyed();

    let mut location = hit.location;
    let mut rear = hit.rear;
    let mut crit_chance = hit.through_armor_critical;
    let mut remaining = amount;

    loop {
        let loc = entity.locations.get_mut(location).ok_or_else(|| {
            GameError::StateCorruption(format!("{id} has no location {location}"))
        })?;
        if loc.is_destroyed() {
            let next = transfer_location(kind, location);
            events.push(GameEvent::DamageTransferred {
                entity: id,
                from: location,
                to: next,
                amount: remaining,
            });
            match next {
                Some(inner) => {
                    location = inner;
                    crit_chance = false;
                    rear = rear && location_has_rear(entity, inner);
                    continue;
                }
                None => {
                    debug!(entity = %id, location, lost = remaining, "excess damage discarded");
                    break;
                }
            }
        }
        let armor = if rear { &mut loc.rear_armor } else { &mut loc.armor };
        let armor_damage = remaining.min(*armor);
        *armor -= armor_damage;
        let armor_left = *armor;
        remaining -= armor_damage;

        let internal_damage = remaining.min(loc.internal);
        loc.internal -= internal_damage;
        remaining -= internal_damage;
        let internal_left = loc.internal;
        let breached = internal_damage > 0 && loc.internal == 0 && loc.original_internal > 0;

        if armor_damage > 0 || internal_damage > 0 {
            events.push(GameEvent::DamageApplied {
                entity: id,
                location,
                rear,
                armor_damage,
                internal_damage,
                armor_left,
                internal_left,
            });
        }

        if breached {
            destroy_location(entity, location, events);
        } else if internal_damage > 0 || crit_chance {
            roll_criticals(entity, location, dice, events)?;
        }

        if remaining == 0 {
            break;
        }
        let next = transfer_location(kind, location);
        events.push(GameEvent::DamageTransferred {
            entity: id,
            from: location,
            to: next,
            amount: remaining,
        });
        match next {
            Some(inner) => {
                location = inner;
                crit_chance = false;
                rear = rear && location_has_rear(entity, inner);
            }
            None => {
                debug!(entity = %id, location, lost = remaining, "excess damage discarded");
                break;
            }
        }
    }

    if !was_destroyed && entity.is_destroyed() {
        events.push(GameEvent::EntityDestroyed { entity: id });
    }
    Ok(())
}

fn location_has_rear(entity: &Entity, location: usize) -> bool {
    entity
        .locations
        .get(location)
        .is_some_and(|l| l.original_rear_armor > 0)
}

/// Structure is gone: everything mounted there stops working and no armor
/// is left on either side.
fn destroy_location(entity: &mut Entity, location: usize, events: &mut Vec<GameEvent>) {
    for mount in entity.mounts.iter_mut().filter(|m| m.location == location) {
        mount.destroyed = true;
    }
    if let Some(loc) = entity.locations.get_mut(location) {
        loc.armor = 0;
        loc.rear_armor = 0;
        for slot in loc.slots.iter_mut().flatten() {
            slot.destroyed = true;
        }
    }
    events.push(GameEvent::LocationDestroyed {
        entity: entity.id(),
        location,
    });
}

/// Number of criticals for a 2d6 determination roll.
#[must_use]
pub const fn critical_count(roll: u8) -> u32 {
    match roll {
        8 | 9 => 1,
        10 | 11 => 2,
        12 => 3,
        _ => 0,
    }
}

/// Roll for critical hits in `location` and apply them.
pub(crate) fn roll_criticals<D: DiceRoller + ?Sized>(
    entity: &mut Entity,
    location: usize,
    dice: &mut D,
    events: &mut Vec<GameEvent>,
) -> Result<()> {
    if !location_takes_criticals(entity.kind(), location) {
        return Ok(());
    }
    let count = critical_count(dice.roll_2d6());
    for _ in 0..count {
        critical_hit(entity, location, dice, events)?;
    }
    Ok(())
}

fn critical_hit<D: DiceRoller + ?Sized>(
    entity: &mut Entity,
    location: usize,
    dice: &mut D,
    events: &mut Vec<GameEvent>,
) -> Result<()> {
    let id = entity.id();
    if !entity.has_hittable_criticals(location) {
        events.push(GameEvent::CriticalLost {
            entity: id,
            location,
        });
        return Ok(());
    }
    let slot_count = entity.locations[location].slots.len();
    let hittable = entity.locations[location].hittable_slots();
    let reachable = if slot_count > 6 { 12 } else { 6 };
    if !hittable.iter().any(|&slot| slot < reachable) {
        return Err(GameError::StateCorruption(format!(
            "{id} location {location} has no slot a critical roll can reach"
        )));
    }
    let mut picked = None;
    for _ in 0..MAX_REROLLS {
        let candidate = roll_slot(slot_count, dice);
        if hittable.contains(&candidate) {
            picked = Some(candidate);
            break;
        }
    }
    let Some(slot) = picked else {
        return Err(GameError::StateCorruption(format!(
            "{id} location {location} critical roll never landed"
        )));
    };

    let Some(critical) = entity.locations[location].slots[slot].as_mut() else {
        return Err(GameError::StateCorruption(format!(
            "{id} critical landed on empty slot {slot}"
        )));
    };
    critical.destroyed = true;
    let mount_index = critical.mount;
    let mount = entity.mounts.get_mut(mount_index).ok_or_else(|| {
        GameError::StateCorruption(format!("{id} slot references missing mount {mount_index}"))
    })?;
    mount.destroyed = true;
    let category = mount.category;
    let equipment = mount.equipment.clone();

    match category {
        MountCategory::Misc(MiscKind::Sensors) => entity.sensor_hits += 1,
        MountCategory::Misc(MiscKind::Avionics) => entity.avionics_hits += 1,
        MountCategory::Misc(MiscKind::Engine) => entity.engine_hits += 1,
        _ => {}
    }
    debug!(entity = %id, location, slot, %equipment, "critical hit");
    events.push(GameEvent::CriticalHit {
        entity: id,
        location,
        slot,
        equipment,
    });
    Ok(())
}

/// Pick a slot index by die: one d6 for the half when there are more than
/// six slots, one d6 for the slot. May name a slot past the end; callers
/// re-roll.
fn roll_slot<D: DiceRoller + ?Sized>(slots: usize, dice: &mut D) -> usize {
    if slots <= 1 {
        return 0;
    }
    let half = if slots > 6 && dice.d6() > 3 { 6 } else { 0 };
    half + usize::from(dice.d6()) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::entity::CriticalSlot;
    use crate::hex::Hex;
    use crate::location::{battle_armor, mech};
    use crate::testing;

    #[test]
    fn test_armor_then_structure() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        let mut dice = ScriptedDice::new([]);
        let mut events = Vec::new();
        apply_damage(&mut mech, HitLocation::new(mech::LEFT_ARM), 10, &mut dice, &mut events)
            .unwrap();
        let arm = mech.location(mech::LEFT_ARM).unwrap();
        assert_eq!((arm.armor(), arm.internal()), (6, 8));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_small_location_destroyed_and_entity_with_it() {
        // Infantry has a single location: armor 0, structure 28.
        let mut platoon = testing::entity(testing::FOOT_PLATOON, 1, Hex::new(0, 0));
        let mut events = Vec::new();
        apply_damage(
            &mut platoon,
            HitLocation::new(0),
            40,
            &mut ScriptedDice::new([]),
            &mut events,
        )
        .unwrap();
        assert_eq!(platoon.location(0).unwrap().internal(), 0);
        assert!(platoon.is_destroyed());
        assert!(events.contains(&GameEvent::EntityDestroyed {
            entity: platoon.id()
        }));
        assert!(events.contains(&GameEvent::DamageTransferred {
            entity: platoon.id(),
            from: 0,
            to: None,
            amount: 12,
        }));
    }

    #[test]
    fn test_armor_two_structure_one_takes_five() {
        let mut squad = testing::entity(testing::IS_BATTLE_ARMOR, 1, Hex::new(0, 0));
        let mut events = Vec::new();
        // Trooper: 4 armor / 1 structure. Strip to 2 armor first.
        squad.locations[1].armor = 2;
        apply_damage(&mut squad, HitLocation::new(1), 5, &mut ScriptedDice::new([]), &mut events)
            .unwrap();
        let trooper = squad.location(1).unwrap();
        assert_eq!((trooper.armor(), trooper.internal()), (0, 0));
        assert!(!squad.is_destroyed());
        assert_eq!(squad.troopers_alive(), 3);
    }

    #[test]
    fn test_arm_transfers_to_side_torso() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        let mut events = Vec::new();
        // Arm 16 armor + 8 structure, 6 more spill into the right torso armor.
        apply_damage(
            &mut mech,
            HitLocation::new(mech::RIGHT_ARM),
            30,
            &mut ScriptedDice::new([]),
            &mut events,
        )
        .unwrap();
        assert!(mech.location(mech::RIGHT_ARM).unwrap().is_destroyed());
        assert!(mech.mounts().iter().filter(|m| m.location() == mech::RIGHT_ARM).all(|m| m.is_destroyed()));
        assert_eq!(mech.location(mech::RIGHT_TORSO).unwrap().armor(), 14);
        assert!(events.contains(&GameEvent::LocationDestroyed {
            entity: mech.id(),
            location: mech::RIGHT_ARM
        }));
    }

    #[test]
    fn test_center_torso_excess_is_discarded() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        let mut events = Vec::new();
        apply_damage(
            &mut mech,
            HitLocation::new(mech::CENTER_TORSO),
            100,
            &mut ScriptedDice::new([]),
            &mut events,
        )
        .unwrap();
        let ct = mech.location(mech::CENTER_TORSO).unwrap();
        assert_eq!(ct.internal(), 0);
        assert!(mech.is_destroyed());
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::EntityDestroyed { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_structure_damage_rolls_for_criticals() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        mech.locations[mech::RIGHT_TORSO].armor = 0;
        let mut events = Vec::new();
        // Determination 8: one critical. Upper half (d6 2), slot d6 1: the AC/20.
        let mut dice = ScriptedDice::from_2d6_totals([8]);
        dice.push_d6(2);
        dice.push_d6(1);
        apply_damage(&mut mech, HitLocation::new(mech::RIGHT_TORSO), 1, &mut dice, &mut events)
            .unwrap();
        assert!(mech.mounts()[0].is_destroyed());
        assert!(events.iter().any(|e| matches!(e, GameEvent::CriticalHit { slot: 0, .. })));
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_critical_rerolls_empty_slots() {
        let mut mech = testing::entity(testing::LOCUST, 1, Hex::new(0, 0));
        mech.locations[mech::CENTER_TORSO].armor = 0;
        let mut events = Vec::new();
        // One critical; the last slot of the second half is empty, the re-roll
        // lands on slot 0.
        let mut dice = ScriptedDice::from_2d6_totals([9]);
        for d in [5, 6, 1, 1] {
            dice.push_d6(d);
        }
        apply_damage(&mut mech, HitLocation::new(mech::CENTER_TORSO), 1, &mut dice, &mut events)
            .unwrap();
        assert!(mech.mounts()[0].is_destroyed());
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_critical_lost_without_equipment() {
        let mut tank = testing::entity(testing::VEDETTE, 1, Hex::new(0, 0));
        tank.locations[0].armor = 0;
        let mut events = Vec::new();
        let mut dice = ScriptedDice::from_2d6_totals([12]);
        apply_damage(&mut tank, HitLocation::new(0), 1, &mut dice, &mut events).unwrap();
        let lost = events
            .iter()
            .filter(|e| matches!(e, GameEvent::CriticalLost { .. }))
            .count();
        assert_eq!(lost, 3);
    }

    #[test]
    fn test_battle_armor_location_rerolls_dead_troopers() {
        let mut squad = testing::entity(testing::IS_BATTLE_ARMOR, 1, Hex::new(0, 0));
        squad.locations[2].internal = 0;
        // 6 names no trooper, 2 is dead, 3 is alive.
        let mut dice = ScriptedDice::new([6, 2, 3]);
        let hit = roll_hit_location(&squad, Side::Front, &mut dice).unwrap();
        assert_eq!(hit.location, 3);
        assert_ne!(hit.location, battle_armor::SQUAD);
    }

    #[test]
    fn test_doomed_squad_hit_in_first_trooper() {
        let mut squad = testing::entity(testing::IS_BATTLE_ARMOR, 1, Hex::new(0, 0));
        for trooper in 1..=4 {
            squad.locations[trooper].internal = 0;
        }
        let hit = roll_hit_location(&squad, Side::Front, &mut ScriptedDice::new([])).unwrap();
        assert_eq!(hit.location, 1);
    }

    #[test]
    fn test_destroyed_location_passes_damage_inward() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        let torso = &mut mech.locations[mech::RIGHT_TORSO];
        torso.armor = 0;
        torso.internal = 0;
        let mut events = Vec::new();
        let hit = HitLocation {
            location: mech::RIGHT_TORSO,
            rear: true,
            through_armor_critical: false,
        };
        apply_damage(&mut mech, hit, 3, &mut ScriptedDice::new([]), &mut events).unwrap();
        assert_eq!(mech.location(mech::RIGHT_TORSO).unwrap().rear_armor(), 4);
        assert_eq!(mech.location(mech::CENTER_TORSO).unwrap().rear_armor(), 2);
        assert_eq!(
            events[0],
            GameEvent::DamageTransferred {
                entity: mech.id(),
                from: mech::RIGHT_TORSO,
                to: Some(mech::CENTER_TORSO),
                amount: 3,
            }
        );
    }

    #[test]
    fn test_breached_location_loses_rear_armor() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        mech.locations[mech::LEFT_TORSO].armor = 0;
        let mut events = Vec::new();
        apply_damage(
            &mut mech,
            HitLocation::new(mech::LEFT_TORSO),
            12,
            &mut ScriptedDice::new([]),
            &mut events,
        )
        .unwrap();
        let torso = mech.location(mech::LEFT_TORSO).unwrap();
        assert!(torso.is_destroyed());
        assert_eq!(torso.rear_armor(), 0);
    }

    #[test]
    fn test_unreachable_critical_slot_is_corruption() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        let torso = &mut mech.locations[mech::CENTER_TORSO];
        torso.armor = 0;
        torso.slots = vec![None; 14];
        torso.slots[13] = Some(CriticalSlot {
            mount: 7,
            destroyed: false,
        });
        let mut dice = ScriptedDice::from_2d6_totals([8]);
        let result = apply_damage(
            &mut mech,
            HitLocation::new(mech::CENTER_TORSO),
            1,
            &mut dice,
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(GameError::StateCorruption(_))));
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_trooper_beyond_a_d6_is_corruption() {
        let mut squad = testing::entity(testing::IS_BATTLE_ARMOR, 1, Hex::new(0, 0));
        let spare = squad.locations[1].clone();
        squad.locations.extend([spare.clone(), spare.clone(), spare]);
        // Only the trooper in location 7 is left, out of reach of a d6.
        for trooper in 1..=6 {
            squad.locations[trooper].internal = 0;
        }
        let result = roll_hit_location(&squad, Side::Front, &mut ScriptedDice::new([]));
        assert!(matches!(result, Err(GameError::StateCorruption(_))));
    }

    #[test]
    fn test_grouped_damage_rolls_each_group() {
        let mut mech = testing::entity(testing::HUNCHBACK, 1, Hex::new(0, 0));
        let mut events = Vec::new();
        // 12 points in groups of 5: left arm (11), right arm (3), centre torso (7).
        let mut dice = ScriptedDice::from_2d6_totals([11, 3, 7]);
        apply_grouped(&mut mech, Side::Front, 12, 5, &mut dice, &mut events).unwrap();
        assert_eq!(mech.location(mech::LEFT_ARM).unwrap().armor(), 11);
        assert_eq!(mech.location(mech::RIGHT_ARM).unwrap().armor(), 11);
        assert_eq!(mech.location(mech::CENTER_TORSO).unwrap().armor(), 24);
    }
}
