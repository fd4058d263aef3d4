//! Punches, kicks and charges.

use crate::action::Arm;
use crate::dice::DiceRoller;
use crate::entity::{Entity, EntityId};
use crate::error::{GameError, Result};
use crate::location::{mech, mech_kick_location, mech_punch_location, Side};
use crate::math::tonnage_damage;
use crate::movement::MoveMode;
use crate::rules::{damage, geometry, target_modifiers, Resolver};
use crate::state::GameState;
use crate::tohit::{ToHit, ToHitSpec};
use crate::unit_kind::{Capabilities, UnitKind};

/// Damage groups for charges, in points.
pub const CHARGE_GROUP: u32 = 5;

/// Physical attack kinds resolved here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blow {
    /// Punch with one arm.
    Punch(Arm),
    /// Kick.
    Kick,
    /// Charge at the end of a run.
    Charge,
}

const fn arm_location(arm: Arm) -> usize {
    match arm {
        Arm::Left => mech::LEFT_ARM,
        Arm::Right => mech::RIGHT_ARM,
    }
}

fn common_checks(attacker: &Entity, target: &Entity) -> Option<ToHit> {
    if attacker.id() == target.id() {
        return Some(ToHit::impossible("cannot target itself"));
    }
    if attacker.is_destroyed() {
        return Some(ToHit::impossible("attacker is destroyed"));
    }
    if target.is_destroyed() {
        return Some(ToHit::impossible("target is destroyed"));
    }
    if target.transport().is_some() {
        return Some(ToHit::impossible("target is a passenger"));
    }
    if attacker.is_shutdown() {
        return Some(ToHit::impossible("attacker is shut down"));
    }
    if target.kind().is_aerospace() {
        return Some(ToHit::impossible("cannot strike aerospace units"));
    }
    None
}

fn melee_checks(attacker: &Entity, target: &Entity, state: &GameState) -> Option<ToHit> {
    if attacker.kind() != UnitKind::Mech {
        return Some(ToHit::impossible("only mechs make physical attacks"));
    }
    if attacker.is_prone() {
        return Some(ToHit::impossible("attacker is prone"));
    }
    if !attacker.position().is_adjacent(target.position()) {
        return Some(ToHit::impossible("target is not adjacent"));
    }
    let board = state.board();
    let climb = board.elevation(target.position()) - board.elevation(attacker.position());
    if climb.abs() > 1 {
        return Some(ToHit::impossible("target is out of reach"));
    }
    None
}

/// To-hit for a punch with `arm`.
#[must_use]
pub fn punch_to_hit(attacker: &Entity, arm: Arm, target: &Entity, state: &GameState) -> ToHit {
    if let Some(no) = common_checks(attacker, target).or_else(|| melee_checks(attacker, target, state)) {
        return no;
    }
    let location = arm_location(arm);
    if attacker.location(location).map_or(true, |l| l.is_destroyed()) {
        return ToHit::impossible("arm is destroyed");
    }
    let mut spec = ToHitSpec::new(
        i32::from(attacker.crew().piloting),
        "piloting skill",
        geometry::hit_side(attacker.position(), target),
    );
    if attacker.actuator_hits(location) > 0 {
        spec.add(1, "arm actuator damaged");
    }
    target_modifiers(&mut spec, attacker, target);
    ToHit::from_spec(spec)
}

/// To-hit for a kick.
#[must_use]
pub fn kick_to_hit(attacker: &Entity, target: &Entity, state: &GameState) -> ToHit {
    if let Some(no) = common_checks(attacker, target).or_else(|| melee_checks(attacker, target, state)) {
        return no;
    }
    let legs_intact = [mech::LEFT_LEG, mech::RIGHT_LEG]
        .iter()
        .all(|&leg| attacker.location(leg).is_some_and(|l| !l.is_destroyed()));
    if !legs_intact {
        return ToHit::impossible("a leg is destroyed");
    }
    let mut spec = ToHitSpec::new(
        i32::from(attacker.crew().piloting),
        "piloting skill",
        geometry::hit_side(attacker.position(), target),
    );
    spec.add(-2, "kick");
    target_modifiers(&mut spec, attacker, target);
    ToHit::from_spec(spec)
}

/// To-hit for a charge by `attacker` as it stands after its movement.
#[must_use]
pub fn charge_to_hit(attacker: &Entity, target: &Entity) -> ToHit {
    if let Some(no) = common_checks(attacker, target) {
        return no;
    }
    let kind = attacker.kind();
    if !kind.is_ground() || kind.is_infantry() || !kind.capabilities().contains(Capabilities::CHARGE) {
        return ToHit::impossible(format!("a {kind} cannot charge"));
    }
    if attacker.movement().mode != Some(MoveMode::Run) {
        return ToHit::impossible("must run to charge");
    }
    if attacker.movement().hexes == 0 {
        return ToHit::impossible("did not move");
    }
    if !attacker.position().is_adjacent(target.position()) {
        return ToHit::impossible("path does not end next to the target");
    }
    let mut spec = ToHitSpec::new(
        i32::from(attacker.crew().piloting),
        "piloting skill",
        geometry::hit_side(geometry::attack_origin(attacker, target), target),
    );
    target_modifiers(&mut spec, attacker, target);
    spec.add(
        i32::from(attacker.crew().piloting) - i32::from(target.crew().piloting),
        "piloting skill differential",
    );
    ToHit::from_spec(spec)
}

/// Damage dealt by a punch or kick from a unit of `tonnage`.
#[must_use]
pub fn strike_damage(blow: Blow, tonnage: u32) -> u32 {
    match blow {
        Blow::Punch(_) => tonnage_damage(tonnage, 10, 1),
        Blow::Kick => tonnage_damage(tonnage, 5, 1),
        Blow::Charge => 0,
    }
}

/// Damage a charge deals to the target after moving `hexes`.
#[must_use]
pub fn charge_damage(attacker_tonnage: u32, hexes: u32) -> u32 {
    tonnage_damage(attacker_tonnage, 10, hexes.saturating_sub(1))
}

/// Damage the charging unit takes.
#[must_use]
pub fn charge_damage_taken(target_tonnage: u32) -> u32 {
    tonnage_damage(target_tonnage, 10, 1)
}

/// Apply a successful blow. Returns the damage dealt to the target.
pub(crate) fn apply<D: DiceRoller + ?Sized>(
    ctx: &mut Resolver<'_, D>,
    blow: Blow,
    attacker_id: EntityId,
    target_id: EntityId,
    side: Side,
) -> Result<u32> {
    let Resolver { state, dice, events, .. } = ctx;
    let attacker = state
        .entity(attacker_id)
        .ok_or(GameError::EntityNotFound(attacker_id))?;
    let (tonnage, hexes) = (attacker.tonnage(), attacker.movement().hexes);
    let target = state
        .entity_mut(target_id)
        .ok_or(GameError::EntityNotFound(target_id))?;
    let target_tonnage = target.tonnage();

    match blow {
        Blow::Punch(_) | Blow::Kick => {
            let amount = strike_damage(blow, tonnage);
            let hit = if target.kind() == UnitKind::Mech {
                let roll = dice.d6();
                if matches!(blow, Blow::Kick) {
                    mech_kick_location(side, roll)
                } else {
                    mech_punch_location(side, roll)
                }
            } else {
                damage::roll_hit_location(target, side, &mut **dice)?
            };
            damage::apply_damage(target, hit, amount, &mut **dice, events)?;
            Ok(amount)
        }
        Blow::Charge => {
            let dealt = charge_damage(tonnage, hexes);
            damage::apply_grouped(target, side, dealt, CHARGE_GROUP, &mut **dice, events)?;
            let taken = charge_damage_taken(target_tonnage);
            let attacker = state
                .entity_mut(attacker_id)
                .ok_or(GameError::EntityNotFound(attacker_id))?;
            damage::apply_grouped(attacker, Side::Front, taken, CHARGE_GROUP, &mut **dice, events)?;
            Ok(dealt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::GameConfig;
    use crate::hex::Hex;
    use crate::player::{Player, PlayerId, Team};
    use crate::testing;

    fn pair(attacker: &str, target: &str, target_at: Hex) -> GameState {
        let mut state = GameState::new(GameConfig::default(), Board::new(10, 10));
        state.insert_player(Player::new(PlayerId(1), "alice", Team(1)));
        state.insert_player(Player::new(PlayerId(2), "bob", Team(2)));
        state.insert_entity(testing::entity_with_id(attacker, 1, 1, Hex::new(5, 5)));
        state.insert_entity(testing::entity_with_id(target, 2, 2, target_at));
        state
    }

    fn both(state: &GameState) -> (&Entity, &Entity) {
        (
            state.entity(EntityId(1)).unwrap(),
            state.entity(EntityId(2)).unwrap(),
        )
    }

    #[test]
    fn test_punch_base_and_damage() {
        let state = pair(testing::HUNCHBACK, testing::HUNCHBACK, Hex::new(5, 4));
        let (a, t) = both(&state);
        assert_eq!(punch_to_hit(a, Arm::Left, t, &state).value(), Some(5));
        assert_eq!(strike_damage(Blow::Punch(Arm::Left), 50), 5);
        assert_eq!(strike_damage(Blow::Punch(Arm::Left), 55), 6);
    }

    #[test]
    fn test_punch_needs_arm_and_adjacency() {
        let mut state = pair(testing::HUNCHBACK, testing::HUNCHBACK, Hex::new(5, 4));
        state.entity_mut(EntityId(1)).unwrap().locations[mech::LEFT_ARM].internal = 0;
        let (a, t) = both(&state);
        assert!(punch_to_hit(a, Arm::Left, t, &state).is_impossible());
        assert!(!punch_to_hit(a, Arm::Right, t, &state).is_impossible());

        let far = pair(testing::HUNCHBACK, testing::HUNCHBACK, Hex::new(5, 2));
        let (a, t) = both(&far);
        assert!(punch_to_hit(a, Arm::Right, t, &far).is_impossible());
    }

    #[test]
    fn test_damaged_actuator_penalty() {
        let mut state = pair(testing::HUNCHBACK, testing::HUNCHBACK, Hex::new(5, 4));
        let attacker = state.entity_mut(EntityId(1)).unwrap();
        for mount in attacker.mounts.iter_mut().filter(|m| m.location == mech::RIGHT_ARM) {
            mount.destroyed = true;
        }
        let (a, t) = both(&state);
        assert_eq!(punch_to_hit(a, Arm::Right, t, &state).value(), Some(6));
    }

    #[test]
    fn test_kick() {
        let state = pair(testing::HUNCHBACK, testing::HUNCHBACK, Hex::new(5, 4));
        let (a, t) = both(&state);
        assert_eq!(kick_to_hit(a, t, &state).value(), Some(3));
        assert_eq!(strike_damage(Blow::Kick, 50), 10);
    }

    #[test]
    fn test_only_mechs_punch() {
        let state = pair(testing::VEDETTE, testing::HUNCHBACK, Hex::new(5, 4));
        let (a, t) = both(&state);
        assert!(punch_to_hit(a, Arm::Left, t, &state).is_impossible());
        assert!(kick_to_hit(a, t, &state).is_impossible());
    }

    #[test]
    fn test_charge_requires_running() {
        let mut state = pair(testing::HUNCHBACK, testing::LOCUST, Hex::new(5, 4));
        {
            let (a, t) = both(&state);
            assert!(charge_to_hit(a, t).is_impossible());
        }
        let attacker = state.entity_mut(EntityId(1)).unwrap();
        attacker.movement.mode = Some(MoveMode::Run);
        attacker.movement.hexes = 4;
        let (a, t) = both(&state);
        // Piloting 5, equal pilots, stationary target.
        assert_eq!(charge_to_hit(a, t).value(), Some(5));
    }

    #[test]
    fn test_charge_damage_formulas() {
        assert_eq!(charge_damage(50, 4), 15);
        assert_eq!(charge_damage(55, 4), 17);
        assert_eq!(charge_damage(50, 1), 0);
        assert_eq!(charge_damage_taken(20), 2);
    }

    #[test]
    fn test_infantry_cannot_charge() {
        let mut state = pair(testing::CLAN_BATTLE_ARMOR, testing::LOCUST, Hex::new(5, 4));
        let attacker = state.entity_mut(EntityId(1)).unwrap();
        attacker.movement.mode = Some(MoveMode::Run);
        attacker.movement.hexes = 1;
        let (a, t) = both(&state);
        assert!(charge_to_hit(a, t).is_impossible());
    }
}
