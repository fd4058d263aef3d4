//! Movement paths and their compilation against the board.
//!
//! A [`MovePath`] is what a player declares: a mode and a list of steps.
//! [`compile`] walks the steps from the entity's current position and either
//! produces a [`CompiledPath`] (where the unit ends up and what it spent) or
//! the first reason the path is illegal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Terrain;
use crate::entity::Entity;
use crate::hex::{Facing, Hex};
use crate::state::GameState;
use crate::unit_kind::{Capabilities, UnitKind};

/// Largest elevation change a ground unit can make in one step.
pub const MAX_ELEVATION_CHANGE: i32 = 2;

/// MP cost of standing up.
pub const GET_UP_COST: u32 = 2;

/// How a unit moves this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveMode {
    /// Walking MP (safe thrust for aerospace).
    Walk,
    /// Running MP (max thrust for aerospace).
    Run,
    /// Jumping MP.
    Jump,
}

/// One declared step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveStep {
    /// Enter the hex ahead.
    Forward,
    /// Enter the hex behind, keeping facing.
    Backward,
    /// Rotate one hexside counter-clockwise.
    TurnLeft,
    /// Rotate one hexside clockwise.
    TurnRight,
    /// Stand up from prone.
    GetUp,
    /// Drop to the ground.
    GoProne,
}

/// Declared movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovePath {
    /// Movement mode.
    pub mode: MoveMode,
    /// Steps in order.
    pub steps: Vec<MoveStep>,
}

impl MovePath {
    /// Create a path.
    #[must_use]
    pub fn new(mode: MoveMode, steps: impl Into<Vec<MoveStep>>) -> Self {
        Self {
            mode,
            steps: steps.into(),
        }
    }

    /// A path that stays put.
    #[must_use]
    pub fn stand_still() -> Self {
        Self::new(MoveMode::Walk, Vec::new())
    }
}

/// What an entity did with its movement this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Mode used, `None` if the unit spent no MP.
    pub mode: Option<MoveMode>,
    /// Hexes entered.
    pub hexes: u32,
    /// MP spent.
    pub mp_spent: u32,
    /// Where the unit started the round's movement.
    pub from: Hex,
    /// Hex occupied before the last hex entered.
    pub prior: Hex,
}

impl MovementRecord {
    /// Record for a unit that has not moved.
    #[must_use]
    pub const fn stationary(at: Hex) -> Self {
        Self {
            mode: None,
            hexes: 0,
            mp_spent: 0,
            from: at,
            prior: at,
        }
    }

    /// Whether the unit jumped.
    #[must_use]
    pub fn jumped(&self) -> bool {
        self.mode == Some(MoveMode::Jump)
    }
}

/// Why a path is illegal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The unit cannot move.
    #[error("unit is immobile")]
    Immobile,

    /// A step leaves the board.
    #[error("hex {0} is off the board")]
    OffBoard(Hex),

    /// A step enters impassable terrain.
    #[error("hex {0} is impassable")]
    Impassable(Hex),

    /// The unit may not enter this terrain.
    #[error("cannot enter {hex}: {reason}")]
    ProhibitedTerrain {
        /// Hex refused.
        hex: Hex,
        /// Why.
        reason: String,
    },

    /// Too steep.
    #[error("elevation change from {from} to {to} is too steep")]
    ElevationChange {
        /// Level left.
        from: i32,
        /// Level entered.
        to: i32,
    },

    /// Path costs more than the mode allows.
    #[error("path needs {needed} MP but only {available} are available")]
    InsufficientMp {
        /// MP the path costs.
        needed: u32,
        /// MP the mode allows.
        available: u32,
    },

    /// Jumping is not possible.
    #[error("cannot jump: {0}")]
    CannotJump(String),

    /// Hex holds an enemy unit.
    #[error("hex {0} is occupied by an enemy")]
    EnemyOccupied(Hex),

    /// Final hex already holds a friendly unit that cannot be stacked with.
    #[error("hex {0} already holds a friendly unit")]
    Stacking(Hex),

    /// Unit must stand before entering hexes.
    #[error("unit must get up before moving")]
    MustStandFirst,

    /// A step is not allowed here.
    #[error("invalid step: {0}")]
    InvalidStep(String),
}

/// Result of compiling a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPath {
    /// Mode, `None` when nothing was spent.
    pub mode: Option<MoveMode>,
    /// Start hex.
    pub start: Hex,
    /// End hex.
    pub end: Hex,
    /// Hex occupied before entering `end`.
    pub prior: Hex,
    /// Final facing.
    pub facing: Facing,
    /// Hexes entered.
    pub hexes: u32,
    /// MP spent.
    pub mp_spent: u32,
    /// Prone at the end.
    pub prone: bool,
}

impl CompiledPath {
    /// The movement record this path leaves behind.
    #[must_use]
    pub const fn record(&self) -> MovementRecord {
        MovementRecord {
            mode: self.mode,
            hexes: self.hexes,
            mp_spent: self.mp_spent,
            from: self.start,
            prior: self.prior,
        }
    }
}

fn check_can_jump(entity: &Entity) -> Result<(), PathError> {
    if entity.kind().is_aerospace() {
        return Err(PathError::CannotJump("aerospace units fly".into()));
    }
    if entity.is_burdened() {
        return Err(PathError::CannotJump("burdened by disposable packs".into()));
    }
    if entity.jump_mp() == 0 {
        return Err(PathError::CannotJump("no jump MP".into()));
    }
    Ok(())
}

fn available_mp(entity: &Entity, mode: MoveMode) -> u32 {
    match mode {
        MoveMode::Walk => entity.walk_mp(),
        MoveMode::Run => entity.run_mp(),
        MoveMode::Jump => entity.jump_mp(),
    }
}

/// Validate `path` for `entity` and compute where it ends.
pub fn compile(entity: &Entity, path: &MovePath, state: &GameState) -> Result<CompiledPath, PathError> {
    let aerospace = entity.kind().is_aerospace();
    let jumping = path.mode == MoveMode::Jump;

    if jumping {
        check_can_jump(entity)?;
    }
    if !path.steps.is_empty() && entity.is_immobile() {
        return Err(PathError::Immobile);
    }

    let board = state.board();
    let mut pos = entity.position();
    let mut prior = pos;
    let mut facing = entity.facing();
    let mut prone = entity.is_prone();
    let mut mp = 0u32;
    let mut hexes = 0u32;

    for step in &path.steps {
        match step {
            MoveStep::TurnLeft | MoveStep::TurnRight => {
                facing = if *step == MoveStep::TurnLeft {
                    facing.turn_left()
                } else {
                    facing.turn_right()
                };
                if !jumping {
                    mp += 1;
                }
            }
            MoveStep::GoProne => {
                if jumping || !entity.capabilities().contains(Capabilities::CAN_PRONE) {
                    return Err(PathError::InvalidStep("cannot go prone".into()));
                }
                if prone {
                    return Err(PathError::InvalidStep("already prone".into()));
                }
                prone = true;
                mp += 1;
            }
            MoveStep::GetUp => {
                if !prone || jumping {
                    return Err(PathError::InvalidStep("not prone".into()));
                }
                prone = false;
                mp += GET_UP_COST;
            }
            MoveStep::Forward | MoveStep::Backward => {
                if prone {
                    return Err(PathError::MustStandFirst);
                }
                let backward = *step == MoveStep::Backward;
                if backward && path.mode != MoveMode::Walk {
                    return Err(PathError::InvalidStep(
                        "backing up is only possible while walking".into(),
                    ));
                }
                let direction = if backward { facing.opposite() } else { facing };
                let next = pos.neighbor(direction);
                if !board.contains(next) {
                    return Err(PathError::OffBoard(next));
                }

                mp += if aerospace || jumping {
                    1
                } else {
                    check_entry(entity, next, state)?;
                    ground_step_cost(board.elevation(pos), board.elevation(next), board.terrain(next))?
                };
                prior = pos;
                pos = next;
                hexes += 1;
            }
        }
    }

    let available = available_mp(entity, path.mode);
    if mp > available {
        return Err(PathError::InsufficientMp {
            needed: mp,
            available,
        });
    }

    if jumping && hexes > 0 {
        check_entry(entity, pos, state)?;
    }
    if hexes > 0 && !aerospace {
        check_stacking(entity, pos, state)?;
    }

    Ok(CompiledPath {
        mode: (mp > 0 || hexes > 0).then_some(path.mode),
        start: entity.position(),
        end: pos,
        prior,
        facing,
        hexes,
        mp_spent: mp,
        prone,
    })
}

/// MP to step from a hex at `from_level` into a hex at `to_level` with
/// `terrain`.
fn ground_step_cost(from_level: i32, to_level: i32, terrain: Terrain) -> Result<u32, PathError> {
    let change = to_level - from_level;
    if change.abs() > MAX_ELEVATION_CHANGE {
        return Err(PathError::ElevationChange {
            from: from_level,
            to: to_level,
        });
    }
    let base = terrain.movement_cost().unwrap_or(0);
    Ok(base + change.max(0).unsigned_abs())
}

/// Terrain and enemy checks for a ground unit entering `hex`.
fn check_entry(entity: &Entity, hex: Hex, state: &GameState) -> Result<(), PathError> {
    let terrain = state.board().terrain(hex);
    if terrain == Terrain::Impassable {
        return Err(PathError::Impassable(hex));
    }
    if terrain.is_water() {
        let allowed = match entity.kind() {
            UnitKind::BattleArmor => entity.amphibious,
            kind => kind.capabilities().contains(Capabilities::ENTERS_WATER),
        };
        if !allowed {
            return Err(PathError::ProhibitedTerrain {
                hex,
                reason: format!("{} cannot enter water", entity.kind()),
            });
        }
    }
    let enemy_present = state.entities_at(hex).any(|other| {
        other.id() != entity.id()
            && !other.is_destroyed()
            && other.kind().is_ground()
            && !state.are_allies(other.owner(), entity.owner())
    });
    if enemy_present {
        return Err(PathError::EnemyOccupied(hex));
    }
    Ok(())
}

/// A non-infantry unit may not end in a hex holding another friendly
/// non-infantry unit.
fn check_stacking(entity: &Entity, hex: Hex, state: &GameState) -> Result<(), PathError> {
    if entity.capabilities().contains(Capabilities::STACKS) {
        return Ok(());
    }
    let blocked = state.entities_at(hex).any(|other| {
        other.id() != entity.id()
            && !other.is_destroyed()
            && other.kind().is_ground()
            && !other.capabilities().contains(Capabilities::STACKS)
    });
    if blocked {
        return Err(PathError::Stacking(hex));
    }
    Ok(())
}
