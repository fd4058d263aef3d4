//! Player-declared actions.
//!
//! An [`ActionRequest`] is what a client sends. Once the phase machine has
//! validated it, it becomes an [`Action`] with an id and is either applied at
//! once (movement) or queued as a [`PendingAction`] until its phase resolves.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::hex::Hex;
use crate::movement::MovePath;
use crate::phase::Phase;

/// Identifier assigned to an accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u64);

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Another unit.
    Entity(EntityId),
    /// A board hex.
    Hex(Hex),
}

impl Target {
    /// The targeted entity, if any.
    #[must_use]
    pub const fn entity(self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(id),
            Self::Hex(_) => None,
        }
    }
}

/// Which arm throws a punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arm {
    /// Left arm.
    Left,
    /// Right arm.
    Right,
}

/// The declared intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move along a path.
    Move(MovePath),
    /// Fire one mounted weapon, by mount index.
    WeaponAttack {
        /// Index into the actor's mounts.
        weapon: usize,
    },
    /// Punch with one arm.
    Punch {
        /// Arm used.
        arm: Arm,
    },
    /// Kick.
    Kick,
    /// Run into an adjacent ground unit.
    Charge(MovePath),
    /// Fly into an aerospace unit's hex.
    Ram(MovePath),
}

impl ActionKind {
    /// Short human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move(_) => "movement",
            Self::WeaponAttack { .. } => "a weapon attack",
            Self::Punch { .. } => "a punch",
            Self::Kick => "a kick",
            Self::Charge(_) => "a charge",
            Self::Ram(_) => "a ram",
        }
    }

    /// Phase in which this kind may be declared.
    #[must_use]
    pub const fn declared_in(&self) -> Phase {
        match self {
            Self::Move(_) | Self::Charge(_) | Self::Ram(_) => Phase::Movement,
            Self::WeaponAttack { .. } => Phase::WeaponAttack,
            Self::Punch { .. } | Self::Kick => Phase::PhysicalAttack,
        }
    }

    /// Phase at whose end the attack resolves; `None` for plain movement.
    #[must_use]
    pub const fn resolves_in(&self) -> Option<Phase> {
        match self {
            Self::Move(_) => None,
            Self::WeaponAttack { .. } => Some(Phase::WeaponAttack),
            Self::Punch { .. } | Self::Kick | Self::Charge(_) | Self::Ram(_) => {
                Some(Phase::PhysicalAttack)
            }
        }
    }

    /// The movement path carried by the action, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&MovePath> {
        match self {
            Self::Move(path) | Self::Charge(path) | Self::Ram(path) => Some(path),
            _ => None,
        }
    }
}

/// An action as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Acting entity.
    pub actor: EntityId,
    /// Target, required for attacks.
    pub target: Option<Target>,
    /// What to do.
    pub kind: ActionKind,
}

impl ActionRequest {
    /// Move `actor` along `path`.
    #[must_use]
    pub fn movement(actor: EntityId, path: MovePath) -> Self {
        Self {
            actor,
            target: None,
            kind: ActionKind::Move(path),
        }
    }

    /// Fire weapon mount `weapon` of `actor` at `target`.
    #[must_use]
    pub fn weapon(actor: EntityId, weapon: usize, target: EntityId) -> Self {
        Self {
            actor,
            target: Some(Target::Entity(target)),
            kind: ActionKind::WeaponAttack { weapon },
        }
    }

    /// Physical attack or charge/ram of `kind` against `target`.
    #[must_use]
    pub fn against(actor: EntityId, target: EntityId, kind: ActionKind) -> Self {
        Self {
            actor,
            target: Some(Target::Entity(target)),
            kind,
        }
    }
}

/// A validated action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Assigned id.
    pub id: ActionId,
    /// Acting entity.
    pub actor: EntityId,
    /// Target.
    pub target: Option<Target>,
    /// What to do.
    pub kind: ActionKind,
    /// Round of declaration.
    pub round: u32,
}

/// A queued attack awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingAction {
    /// The validated action.
    pub action: Action,
    /// Phase at whose end it resolves.
    pub resolves_in: Phase,
    /// Phase in which it was declared.
    pub declared_in: Phase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MoveMode;

    #[test]
    fn test_phase_table() {
        let path = MovePath::new(MoveMode::Run, Vec::new());
        assert_eq!(ActionKind::Move(path.clone()).declared_in(), Phase::Movement);
        assert_eq!(ActionKind::Move(path.clone()).resolves_in(), None);
        assert_eq!(
            ActionKind::Charge(path).resolves_in(),
            Some(Phase::PhysicalAttack)
        );
        assert_eq!(
            ActionKind::WeaponAttack { weapon: 0 }.resolves_in(),
            Some(Phase::WeaponAttack)
        );
        assert_eq!(ActionKind::Kick.declared_in(), Phase::PhysicalAttack);
    }

    #[test]
    fn test_target_entity() {
        assert_eq!(Target::Entity(EntityId(3)).entity(), Some(EntityId(3)));
        assert_eq!(Target::Hex(Hex::new(0, 0)).entity(), None);
    }
}
