//! Combat resolution rules.
//!
//! [`evaluate`] is pure: it turns an attacker, a target and a declared attack
//! into a [`ToHit`]. [`resolve_action`] is the roll-dependent half: it
//! re-validates a queued action, rolls, and applies the consequences to the
//! state through the die source it is handed.
//!
//! - [`weapon`]: ranged attacks, ammunition and cluster damage
//! - [`physical`]: punches, kicks and charges
//! - [`ram`]: aerospace rams
//! - [`damage`]: hit location, transfer and critical hits
//! - [`geometry`]: hit side and line of sight
//! - [`heat`]: End-phase heat

pub mod cluster;
pub mod damage;
pub mod geometry;
pub mod heat;
pub mod physical;
pub mod ram;
pub mod weapon;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{ActionKind, PendingAction, Target};
use crate::catalog::Catalog;
use crate::dice::DiceRoller;
use crate::entity::Entity;
use crate::error::Result;
use crate::events::GameEvent;
use crate::state::GameState;
use crate::tohit::{ToHit, ToHitSpec};

use physical::Blow;

/// Result of resolving one queued attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The attack could not be made; no die was rolled.
    Impossible {
        /// Why.
        reason: String,
    },
    /// Attacker or target stopped being valid before resolution; no die was
    /// rolled.
    TargetInvalid {
        /// Why.
        reason: String,
    },
    /// Rolled and missed.
    Miss {
        /// 2d6 result.
        roll: u8,
        /// Target number.
        needed: i32,
    },
    /// Hit.
    Hit {
        /// 2d6 result, `None` for automatic hits.
        roll: Option<u8>,
        /// Target number, `None` for automatic hits.
        needed: Option<i32>,
        /// Damage dealt to the target.
        damage: u32,
    },
}

impl Outcome {
    /// Whether the attack connected.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

/// When an attack is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// At submission.
    Declaration,
    /// When the queue is resolved. Weapons declared this round are expected
    /// to be flagged as fired.
    Resolution,
}

/// Mutable context threaded through resolution.
pub(crate) struct Resolver<'a, D: ?Sized> {
    pub(crate) state: &'a mut GameState,
    pub(crate) catalog: &'a Catalog,
    pub(crate) dice: &'a mut D,
    pub(crate) events: &'a mut Vec<GameEvent>,
}

/// Modifiers that depend only on what the target did and how it lies.
pub(crate) fn target_modifiers(spec: &mut ToHitSpec, attacker: &Entity, target: &Entity) {
    let moved = target.movement();
    let hexes = moved.hexes;
    let penalty = match hexes {
        0..=2 => 0,
        3..=4 => 1,
        5..=6 => 2,
        7..=9 => 3,
        10..=17 => 4,
        18..=24 => 5,
        _ => 6,
    };
    spec.add(penalty, format!("target moved {hexes} hexes"));
    if moved.jumped() {
        spec.add(1, "target jumped");
    }
    if target.is_immobile() {
        spec.add(-4, "target immobile");
    }
    if target.is_prone() {
        if attacker.position().is_adjacent(target.position()) {
            spec.add(-2, "target prone and adjacent");
        } else {
            spec.add(1, "target prone");
        }
    }
}

/// To-hit for `kind` by `attacker` against `target`, as checked at
/// declaration.
#[must_use]
pub fn evaluate(
    attacker: &Entity,
    target: &Entity,
    kind: &ActionKind,
    state: &GameState,
    catalog: &Catalog,
) -> ToHit {
    evaluate_at(attacker, target, kind, state, catalog, Stage::Declaration)
}

/// To-hit for `kind` at a given stage.
#[must_use]
pub fn evaluate_at(
    attacker: &Entity,
    target: &Entity,
    kind: &ActionKind,
    state: &GameState,
    catalog: &Catalog,
    stage: Stage,
) -> ToHit {
    match kind {
        ActionKind::Move(_) => ToHit::impossible("movement is not an attack"),
        ActionKind::WeaponAttack { weapon } => {
            weapon::to_hit(attacker, *weapon, target, state, catalog, stage)
        }
        ActionKind::Punch { arm } => physical::punch_to_hit(attacker, *arm, target, state),
        ActionKind::Kick => physical::kick_to_hit(attacker, target, state),
        ActionKind::Charge(_) => physical::charge_to_hit(attacker, target),
        ActionKind::Ram(_) => ram::to_hit(attacker, target, state, catalog.ram_modifiers()),
    }
}

/// Resolve one queued action against the current state.
///
/// Pushes an [`GameEvent::AttackResolved`] followed by every state change
/// the attack caused.
///
/// # Errors
///
/// [`crate::GameError::StateCorruption`] if the state turns out to be
/// inconsistent while applying damage.
pub fn resolve_action<D: DiceRoller + ?Sized>(
    pending: &PendingAction,
    state: &mut GameState,
    catalog: &Catalog,
    dice: &mut D,
    events: &mut Vec<GameEvent>,
) -> Result<Outcome> {
    let action = &pending.action;
    let target_id = action.target.and_then(Target::entity);
    let mut effects = Vec::new();
    let outcome = resolve_inner(pending, state, catalog, dice, &mut effects)?;
    debug!(action = %action.id, actor = %action.actor, ?outcome, "attack resolved");
    events.push(GameEvent::AttackResolved {
        action: action.id,
        attacker: action.actor,
        target: target_id,
        outcome: outcome.clone(),
    });
    events.append(&mut effects);
    Ok(outcome)
}

fn resolve_inner<D: DiceRoller + ?Sized>(
    pending: &PendingAction,
    state: &mut GameState,
    catalog: &Catalog,
    dice: &mut D,
    events: &mut Vec<GameEvent>,
) -> Result<Outcome> {
    let action = &pending.action;
    let invalid = |reason: &str| {
        Ok(Outcome::TargetInvalid {
            reason: reason.to_string(),
        })
    };

    let Some(attacker) = state.entity(action.actor) else {
        return invalid("attacker no longer exists");
    };
    if attacker.is_destroyed() {
        return invalid("attacker was destroyed");
    }
    let Some(target_id) = action.target.and_then(Target::entity) else {
        return invalid("no target unit");
    };
    let Some(target) = state.entity(target_id) else {
        return invalid("target no longer exists");
    };
    if target.is_destroyed() {
        return invalid("target was destroyed");
    }

    let side = geometry::hit_side(geometry::attack_origin(attacker, target), target);
    let (hit, roll, needed) =
        match evaluate_at(attacker, target, &action.kind, state, catalog, Stage::Resolution) {
            ToHit::Impossible(reason) => return Ok(Outcome::Impossible { reason }),
            ToHit::Automatic(_) => (true, None, None),
            ToHit::Roll(spec) => {
                let roll = dice.roll_2d6();
                (spec.is_hit(roll), Some(roll), Some(spec.value()))
            }
        };

    let actor = action.actor;
    let mut ctx = Resolver {
        state,
        catalog,
        dice,
        events,
    };
    let damage = match &action.kind {
        ActionKind::WeaponAttack { weapon } => {
            weapon::apply(&mut ctx, actor, *weapon, target_id, side, hit)?
        }
        _ if !hit => 0,
        ActionKind::Punch { arm } => {
            physical::apply(&mut ctx, Blow::Punch(*arm), actor, target_id, side)?
        }
        ActionKind::Kick => physical::apply(&mut ctx, Blow::Kick, actor, target_id, side)?,
        ActionKind::Charge(_) => physical::apply(&mut ctx, Blow::Charge, actor, target_id, side)?,
        ActionKind::Ram(_) => ram::apply(&mut ctx, actor, target_id, side)?,
        ActionKind::Move(_) => 0,
    };

    Ok(match (hit, roll, needed) {
        (false, Some(roll), Some(needed)) => Outcome::Miss { roll, needed },
        _ => Outcome::Hit {
            roll,
            needed,
            damage,
        },
    })
}
