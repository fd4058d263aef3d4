//! Error types for the game core.
//!
//! Two families live here:
//! - [`GameError`]: failures of the surrounding machinery (setup, data,
//!   snapshots) and the one unrecoverable kind, [`GameError::StateCorruption`].
//! - [`Rejection`]: declaration-time refusals of a submitted action. These are
//!   normal game traffic, reported back to the submitter with a reason.

use thiserror::Error;

use crate::entity::EntityId;
use crate::movement::PathError;
use crate::phase::Phase;
use crate::player::PlayerId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for game setup, data and persistence failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Unit or weapon catalog problem.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Scenario could not be turned into a game.
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Invalid player reference.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Equipment does not fit into the requested location.
    #[error("Location {location} of '{unit}' is full, cannot mount '{equipment}'")]
    LocationFull {
        /// Unit type being built.
        unit: String,
        /// Location index.
        location: usize,
        /// Equipment that did not fit.
        equipment: String,
    },

    /// Operation not valid in the current game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// An invariant of the authoritative state was violated. The game
    /// instance halts instead of publishing the corrupted state.
    #[error("State corruption detected: {0}")]
    StateCorruption(String),

    /// The game was halted by an earlier corruption.
    #[error("Game halted: {0}")]
    Halted(String),
}

/// Reason a submitted action or turn-control signal was refused.
///
/// Rejections never change game state and never consume a die roll.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The game has ended.
    #[error("the game is over")]
    GameOver,

    /// The game has been halted.
    #[error("the game is halted")]
    Halted,

    /// The player id is unknown.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    /// Another player holds the current turn.
    #[error("it is not your turn")]
    NotYourTurn,

    /// The action kind is not legal in the current phase.
    #[error("{action} is not allowed during the {phase} phase")]
    WrongPhase {
        /// Name of the action kind.
        action: &'static str,
        /// Phase the game is in.
        phase: Phase,
    },

    /// The acting entity does not exist.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The acting entity belongs to someone else.
    #[error("entity {0} does not belong to you")]
    NotOwner(EntityId),

    /// The acting entity cannot act (destroyed, transported, already done).
    #[error("entity {entity} cannot act: {reason}")]
    CannotAct {
        /// Acting entity.
        entity: EntityId,
        /// Why it cannot act.
        reason: String,
    },

    /// The current turn is already committed to a different entity.
    #[error("this turn is committed to entity {0}")]
    TurnBoundToOther(EntityId),

    /// The action needs a target it was not given.
    #[error("missing or invalid target: {0}")]
    BadTarget(String),

    /// The movement path is illegal.
    #[error("illegal movement: {0}")]
    IllegalPath(#[from] PathError),

    /// The attack is impossible as declared.
    #[error("impossible: {0}")]
    Impossible(String),
}
