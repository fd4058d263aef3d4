//! Weapon attacks.

use crate::catalog::Catalog;
use crate::dice::DiceRoller;
use crate::entity::{Entity, EntityId};
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::location::Side;
use crate::movement::MoveMode;
use crate::rules::{cluster, damage, geometry, target_modifiers, Resolver, Stage};
use crate::state::GameState;
use crate::tohit::{ToHit, ToHitSpec};
use crate::unit_kind::UnitKind;

/// To-hit for firing mount `weapon` of `attacker` at `target`.
#[must_use]
pub fn to_hit(
    attacker: &Entity,
    weapon: usize,
    target: &Entity,
    state: &GameState,
    catalog: &Catalog,
    stage: Stage,
) -> ToHit {
    if attacker.id() == target.id() {
        return ToHit::impossible("cannot target itself");
    }
    if attacker.is_destroyed() {
        return ToHit::impossible("attacker is destroyed");
    }
    if target.is_destroyed() {
        return ToHit::impossible("target is destroyed");
    }
    if target.transport().is_some() {
        return ToHit::impossible("target is a passenger");
    }
    if attacker.is_shutdown() {
        return ToHit::impossible("attacker is shut down");
    }
    let Some(mount) = attacker.mount(weapon) else {
        return ToHit::impossible(format!("no mount {weapon}"));
    };
    if !mount.is_weapon() {
        return ToHit::impossible(format!("{} is not a weapon", mount.equipment()));
    }
    if mount.is_destroyed() {
        return ToHit::impossible(format!("{} is destroyed", mount.equipment()));
    }
    let Some(definition) = catalog.weapon(mount.equipment()) else {
        return ToHit::impossible(format!("unknown weapon {}", mount.equipment()));
    };
    if stage == Stage::Declaration && mount.fired_this_round() {
        return ToHit::impossible(format!("{} already fired this round", definition.name));
    }
    if mount.is_spent() {
        return ToHit::impossible(format!("{} has been fired", definition.name));
    }
    if !mount.has_ammo() {
        return ToHit::impossible(format!("{} is out of ammunition", definition.name));
    }

    let distance = attacker.position().distance(target.position());
    if distance > definition.long_range {
        return ToHit::impossible(format!(
            "target is {distance} hexes away, beyond long range {}",
            definition.long_range
        ));
    }
    let los = geometry::line_of_sight(attacker, target, state);
    if let Some(reason) = los.blocked {
        return ToHit::Impossible(reason);
    }

    let side = geometry::hit_side(attacker.position(), target);
    let mut spec = ToHitSpec::new(
        i32::from(attacker.crew().gunnery),
        "gunnery skill",
        side,
    );

    if distance > definition.medium_range {
        spec.add(4, "long range");
    } else if distance > definition.short_range {
        spec.add(2, "medium range");
    }
    if definition.min_range > 0 && distance <= definition.min_range {
        let penalty = i32::try_from(definition.min_range - distance + 1).unwrap_or(i32::MAX);
        spec.add(penalty, "minimum range");
    }

    match attacker.movement().mode {
        Some(MoveMode::Walk) => spec.add(1, "attacker walked"),
        Some(MoveMode::Run) => spec.add(2, "attacker ran"),
        Some(MoveMode::Jump) => spec.add(3, "attacker jumped"),
        None => {}
    }

    target_modifiers(&mut spec, attacker, target);

    if !target.kind().is_aerospace() {
        match state.board().terrain(target.position()).woods_modifier() {
            1 => spec.add(1, "target in light woods"),
            2 => spec.add(2, "target in heavy woods"),
            _ => {}
        }
    }
    spec.add(los.woods, "intervening woods");
    if los.partial_cover {
        spec.add(1, "partial cover");
    }

    spec.add(attacker.heat_to_hit_modifier(), "attacker heat");
    let mut sensors = i32::try_from(attacker.sensor_hits()).unwrap_or(i32::MAX);
    if attacker.kind().is_ground() {
        sensors = sensors.min(state.config().max_sensor_penalty);
    }
    spec.add(sensors, "sensor damage");
    if target.kind() == UnitKind::BattleArmor {
        spec.add(1, "target is battle armor");
    }

    ToHit::from_spec(spec)
}

/// Apply the effects of a resolved weapon attack: ammunition, heat and, on
/// a hit, damage. Returns the damage dealt.
pub(crate) fn apply<D: DiceRoller + ?Sized>(
    ctx: &mut Resolver<'_, D>,
    attacker_id: EntityId,
    weapon: usize,
    target_id: EntityId,
    side: Side,
    hit: bool,
) -> Result<u32> {
    let Resolver {
        state,
        catalog,
        dice,
        events,
    } = ctx;
    let attacker = state
        .entity_mut(attacker_id)
        .ok_or(GameError::EntityNotFound(attacker_id))?;
    let mount = attacker.mounts.get_mut(weapon).ok_or_else(|| {
        GameError::StateCorruption(format!("{attacker_id} lost mount {weapon}"))
    })?;
    let definition = catalog.weapon(&mount.equipment).ok_or_else(|| {
        GameError::StateCorruption(format!("unknown mounted weapon {}", mount.equipment))
    })?;

    // A streak launcher that fails to lock on does not fire.
    if !hit && definition.streak {
        return Ok(0);
    }
    if let Some(shots) = mount.shots_left {
        let Some(left) = shots.checked_sub(1) else {
            return Err(GameError::StateCorruption(format!(
                "{attacker_id} fired {} with no shots left",
                mount.equipment
            )));
        };
        mount.shots_left = Some(left);
        events.push(GameEvent::AmmoUsed {
            entity: attacker_id,
            mount: weapon,
            shots_left: Some(left),
        });
    }
    attacker.heat_buildup += definition.heat;
    if !hit {
        return Ok(0);
    }

    let volleys = if attacker.kind() == UnitKind::BattleArmor {
        cluster::hits(attacker.shooting_strength(), dice.roll_2d6())
    } else {
        1
    };

    let target = state
        .entity_mut(target_id)
        .ok_or(GameError::EntityNotFound(target_id))?;
    let mut dealt = 0;
    for _ in 0..volleys {
        let (total, group) = match definition.kind.cluster_group() {
            Some(group) => {
                let missiles = if definition.streak {
                    definition.rack_size
                } else {
                    cluster::hits(definition.rack_size, dice.roll_2d6())
                };
                (missiles * definition.damage, group)
            }
            None => (definition.damage, definition.damage),
        };
        damage::apply_grouped(target, side, total, group, &mut **dice, events)?;
        dealt += total;
    }
    Ok(dealt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, HexTile, Terrain};
    use crate::config::GameConfig;
    use crate::data::MountDefinition;
    use crate::hex::{Facing, Hex};
    use crate::player::{Player, PlayerId, Team};
    use crate::testing;

    fn duel(attacker_at: Hex, target_at: Hex, board: Board) -> GameState {
        let mut state = GameState::new(GameConfig::default(), board);
        state.insert_player(Player::new(PlayerId(1), "alice", Team(1)));
        state.insert_player(Player::new(PlayerId(2), "bob", Team(2)));
        state.insert_entity(testing::entity_with_id(testing::HUNCHBACK, 1, 1, attacker_at));
        state.insert_entity(testing::entity_with_id(testing::HUNCHBACK, 2, 2, target_at));
        state
    }

    fn eval(state: &GameState, weapon: usize) -> ToHit {
        let catalog = testing::catalog();
        to_hit(
            state.entity(EntityId(1)).unwrap(),
            weapon,
            state.entity(EntityId(2)).unwrap(),
            state,
            &catalog,
            Stage::Declaration,
        )
    }

    #[test]
    fn test_medium_range_stationary() {
        // AC/20 medium band is 4-6 hexes.
        let state = duel(Hex::new(5, 10), Hex::new(5, 5), Board::new(16, 16));
        assert_eq!(eval(&state, 0).value(), Some(6));
    }

    #[test]
    fn test_out_of_range_is_impossible() {
        let state = duel(Hex::new(5, 15), Hex::new(5, 5), Board::new(16, 16));
        assert!(eval(&state, 0).is_impossible());
    }

    #[test]
    fn test_movement_and_terrain_modifiers() {
        let board = Board::new(16, 16)
            .with_tile(Hex::new(5, 5), HexTile::new(0, Terrain::HeavyWoods))
            .unwrap();
        let mut state = duel(Hex::new(5, 8), Hex::new(5, 5), board);
        let attacker = state.entity_mut(EntityId(1)).unwrap();
        attacker.movement.mode = Some(MoveMode::Run);
        let target = state.entity_mut(EntityId(2)).unwrap();
        target.movement.mode = Some(MoveMode::Jump);
        target.movement.hexes = 5;

        // 4 gunnery + 2 ran + 2 moved five + 1 jumped + 2 heavy woods.
        assert_eq!(eval(&state, 0).value(), Some(11));
    }

    #[test]
    fn test_immobile_target_is_automatic_at_short_range() {
        let mut state = duel(Hex::new(5, 7), Hex::new(5, 5), Board::new(16, 16));
        state.entity_mut(EntityId(2)).unwrap().shutdown = true;
        assert!(matches!(eval(&state, 0), ToHit::Automatic(_)));
    }

    #[test]
    fn test_fired_weapon_rejected_only_at_declaration() {
        let mut state = duel(Hex::new(5, 7), Hex::new(5, 5), Board::new(16, 16));
        state.entity_mut(EntityId(1)).unwrap().mounts[0].fired_this_round = true;
        assert!(eval(&state, 0).is_impossible());
        let catalog = testing::catalog();
        let at_resolution = to_hit(
            state.entity(EntityId(1)).unwrap(),
            0,
            state.entity(EntityId(2)).unwrap(),
            &state,
            &catalog,
            Stage::Resolution,
        );
        assert_eq!(at_resolution.value(), Some(4));
    }

    #[test]
    fn test_sensor_damage_is_capped_for_ground_units() {
        let mut state = duel(Hex::new(5, 10), Hex::new(5, 5), Board::new(16, 16));
        state.entity_mut(EntityId(1)).unwrap().sensor_hits = 1;
        assert_eq!(eval(&state, 0).value(), Some(7));
        state.entity_mut(EntityId(1)).unwrap().sensor_hits = u32::MAX;
        assert_eq!(eval(&state, 0).value(), Some(8));
    }

    #[test]
    fn test_non_weapon_mount_is_impossible() {
        let state = duel(Hex::new(5, 7), Hex::new(5, 5), Board::new(16, 16));
        assert!(eval(&state, 3).is_impossible());
        assert!(eval(&state, 99).is_impossible());
    }

    #[test]
    fn test_lrm_minimum_range() {
        let mut catalog = testing::catalog();
        let mut def = catalog.unit(testing::HUNCHBACK).unwrap().clone();
        def.id = "LRM carrier".into();
        def.equipment = vec![MountDefinition::new("ISLRM10", 2)];
        catalog.insert_unit(def.clone()).unwrap();

        let mut state = duel(Hex::new(5, 7), Hex::new(5, 5), Board::new(16, 16));
        let carrier = Entity::from_definition(
            EntityId(1),
            PlayerId(1),
            &def,
            &catalog,
            Hex::new(5, 7),
            Facing::North,
        )
        .unwrap();
        state.insert_entity(carrier);

        let tohit = to_hit(
            state.entity(EntityId(1)).unwrap(),
            0,
            state.entity(EntityId(2)).unwrap(),
            &state,
            &catalog,
            Stage::Declaration,
        );
        // Gunnery 4 plus minimum range 6 - 2 + 1.
        assert_eq!(tohit.value(), Some(9));
    }
}
