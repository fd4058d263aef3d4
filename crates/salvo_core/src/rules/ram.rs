//! Aerospace rams.
//!
//! A ram ends the attacker's movement in the target's hex. The side struck
//! is judged from the hex the attacker entered from, and damage scales with
//! the net closing velocity.

use crate::data::RamModifiers;
use crate::dice::DiceRoller;
use crate::entity::{Entity, EntityId};
use crate::error::{GameError, Result};
use crate::location::Side;
use crate::math::tonnage_damage;
use crate::rules::{damage, geometry, Resolver};
use crate::state::GameState;
use crate::tohit::{ToHit, ToHitSpec};

/// Base target number before skills.
pub const BASE: i32 = 6;

/// Most avionics damage counted against a ram.
pub const MAX_AVIONICS_PENALTY: u32 = 3;

/// Damage groups for rams, in points.
pub const RAM_GROUP: u32 = 10;

/// To-hit for `attacker` ramming `target`, with `attacker` already moved.
#[must_use]
pub fn to_hit(
    attacker: &Entity,
    target: &Entity,
    state: &GameState,
    modifiers: &RamModifiers,
) -> ToHit {
    let (Some(attacker_class), Some(target_class)) =
        (attacker.kind().aero_class(), target.kind().aero_class())
    else {
        return ToHit::impossible(if attacker.kind().is_aerospace() {
            "target is not aerospace"
        } else {
            "attacker is not aerospace"
        });
    };
    if attacker.id() == target.id() {
        return ToHit::impossible("cannot target itself");
    }
    if attacker.is_destroyed() || target.is_destroyed() {
        return ToHit::impossible("a participant is destroyed");
    }
    if target.transport().is_some() {
        return ToHit::impossible("target is a passenger");
    }
    if attacker.position() != target.position() {
        return ToHit::impossible("movement does not end in the target's hex");
    }
    let board = state.board();
    let attacker_level = attacker.elevation() + board.elevation(attacker.position());
    let target_level = target.elevation() + board.elevation(target.position());
    if attacker_level != target_level {
        return ToHit::impossible("target must be at the same elevation level");
    }
    if target.is_ramming() {
        return ToHit::impossible("target is already making a ramming attack");
    }
    if !target.is_done() {
        return ToHit::impossible("target must be done with movement");
    }

    let attacker_piloting = i32::from(attacker.crew().piloting);
    let target_piloting = i32::from(target.crew().piloting);
    let mut spec = ToHitSpec::new(
        BASE + target_piloting - attacker_piloting,
        "base",
        geometry::hit_side(attacker.movement().prior, target),
    );
    spec.add(
        modifiers.target.get(target_class),
        format!("target is a {}", target.kind()),
    );
    spec.add(
        modifiers.attacker.get(attacker_class),
        format!("attacker is a {}", attacker.kind()),
    );
    if target.is_immobile() || target.walk_mp() == 0 {
        spec.add(-2, "target cannot spend thrust");
    }
    if attacker.sensor_hits() > 0 {
        spec.add(1, "sensor damage");
    }
    spec.add(
        i32::try_from(attacker.avionics_hits().min(MAX_AVIONICS_PENALTY)).unwrap_or(i32::MAX),
        "avionics damage",
    );
    ToHit::from_spec(spec)
}

/// Closing velocity of a ram striking `side`.
#[must_use]
pub fn net_velocity(side: Side, attacker_velocity: u32, target_velocity: u32) -> u32 {
    match side {
        Side::Front => attacker_velocity + target_velocity,
        Side::Rear => attacker_velocity.abs_diff(target_velocity).max(1),
        Side::Left | Side::Right => attacker_velocity,
    }
}

/// Damage the rammed unit takes.
#[must_use]
pub fn damage_dealt(attacker_tonnage: u32, net_velocity: u32) -> u32 {
    tonnage_damage(attacker_tonnage, 10, net_velocity)
}

/// Damage the ramming unit takes.
#[must_use]
pub fn damage_taken(target_tonnage: u32, net_velocity: u32) -> u32 {
    tonnage_damage(target_tonnage, 10, net_velocity)
}

/// Apply a successful ram. Returns the damage dealt to the target.
pub(crate) fn apply<D: DiceRoller + ?Sized>(
    ctx: &mut Resolver<'_, D>,
    attacker_id: EntityId,
    target_id: EntityId,
    side: Side,
) -> Result<u32> {
    let Resolver { state, dice, events, .. } = ctx;
    let attacker = state
        .entity(attacker_id)
        .ok_or(GameError::EntityNotFound(attacker_id))?;
    let target = state
        .entity(target_id)
        .ok_or(GameError::EntityNotFound(target_id))?;
    let net = net_velocity(side, attacker.velocity(), target.velocity());
    let dealt = damage_dealt(attacker.tonnage(), net);
    let taken = damage_taken(target.tonnage(), net);

    let target = state
        .entity_mut(target_id)
        .ok_or(GameError::EntityNotFound(target_id))?;
    damage::apply_grouped(target, side, dealt, RAM_GROUP, &mut **dice, events)?;
    let attacker = state
        .entity_mut(attacker_id)
        .ok_or(GameError::EntityNotFound(attacker_id))?;
    damage::apply_grouped(attacker, Side::Front, taken, RAM_GROUP, &mut **dice, events)?;
    Ok(dealt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::GameConfig;
    use crate::data::Crew;
    use crate::hex::Hex;
    use crate::player::{Player, PlayerId, Team};
    use crate::testing;

    fn setup(attacker: &str, target: &str) -> GameState {
        let mut state = GameState::new(GameConfig::default(), Board::new(10, 10));
        state.insert_player(Player::new(PlayerId(1), "alice", Team(1)));
        state.insert_player(Player::new(PlayerId(2), "bob", Team(2)));
        let mut a = testing::entity_with_id(attacker, 1, 1, Hex::new(5, 5));
        a.movement.prior = Hex::new(5, 4);
        let mut t = testing::entity_with_id(target, 2, 2, Hex::new(5, 5));
        t.done = true;
        state.insert_entity(a);
        state.insert_entity(t);
        state
    }

    fn eval(state: &GameState) -> ToHit {
        to_hit(
            state.entity(EntityId(1)).unwrap(),
            state.entity(EntityId(2)).unwrap(),
            state,
            &RamModifiers::default(),
        )
    }

    #[test]
    fn test_fighter_rams_dropship() {
        let state = setup(testing::FIGHTER, testing::DROPSHIP);
        // 6 + 5 - 5, dropship target +2, fighter attacker -2.
        assert_eq!(eval(&state).value(), Some(6));
    }

    #[test]
    fn test_dropship_rams_fighter_with_skills() {
        let mut state = setup(testing::DROPSHIP, testing::FIGHTER);
        state.entity_mut(EntityId(1)).unwrap().crew = Crew {
            gunnery: 4,
            piloting: 3,
        };
        // 6 + 5 - 3, fighter target +4, dropship attacker -1.
        assert_eq!(eval(&state).value(), Some(11));
    }

    #[test]
    fn test_damage_and_sensor_modifiers() {
        let mut state = setup(testing::FIGHTER, testing::DROPSHIP);
        let attacker = state.entity_mut(EntityId(1)).unwrap();
        attacker.sensor_hits = 2;
        attacker.avionics_hits = 5;
        // 6 + 1 sensors + 3 capped avionics.
        assert_eq!(eval(&state).value(), Some(10));
    }

    #[test]
    fn test_immobile_target() {
        let mut state = setup(testing::FIGHTER, testing::DROPSHIP);
        state.entity_mut(EntityId(2)).unwrap().shutdown = true;
        assert_eq!(eval(&state).value(), Some(4));
    }

    #[test]
    fn test_preconditions() {
        let mut state = setup(testing::FIGHTER, testing::DROPSHIP);
        state.entity_mut(EntityId(2)).unwrap().done = false;
        assert!(eval(&state).is_impossible());

        let mut state = setup(testing::FIGHTER, testing::DROPSHIP);
        state.entity_mut(EntityId(2)).unwrap().ramming = true;
        assert!(eval(&state).is_impossible());

        let mut state = setup(testing::FIGHTER, testing::DROPSHIP);
        state.entity_mut(EntityId(2)).unwrap().elevation = 2;
        assert!(eval(&state).is_impossible());

        let mut state = setup(testing::FIGHTER, testing::DROPSHIP);
        state.entity_mut(EntityId(1)).unwrap().position = Hex::new(5, 4);
        assert!(eval(&state).is_impossible());

        let state = setup(testing::HUNCHBACK, testing::DROPSHIP);
        assert!(eval(&state).is_impossible());
    }

    #[test]
    fn test_net_velocity_by_arc() {
        assert_eq!(net_velocity(Side::Front, 5, 3), 8);
        assert_eq!(net_velocity(Side::Rear, 5, 3), 2);
        assert_eq!(net_velocity(Side::Rear, 3, 3), 1);
        assert_eq!(net_velocity(Side::Left, 5, 3), 5);
    }

    #[test]
    fn test_damage_formulas() {
        assert_eq!(damage_dealt(80, 8), 64);
        assert_eq!(damage_taken(3_600, 2), 720);
        assert_eq!(damage_dealt(45, 3), 14);
    }
}
