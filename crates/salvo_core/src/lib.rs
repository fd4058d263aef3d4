//! # Salvo Core
//!
//! Deterministic rules core for a turn-based hex tactical combat server.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No network IO
//! - No system randomness (every die comes from an injected [`dice::DiceRoller`])
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - An authoritative server whose outcomes clients can trust
//! - Snapshots and replays that reproduce a game bit for bit
//! - Scripted-dice tests of every rule
//!
//! ## Crate Structure
//!
//! - [`game`] - Phase state machine, the only mutation entry point
//! - [`state`] - Authoritative game state
//! - [`rules`] - To-hit evaluation and attack resolution
//! - [`entity`] / [`location`] - Units, their locations and equipment
//! - [`action`] / [`movement`] - Declared intents and movement paths
//! - [`catalog`] / [`data`] - Static unit and weapon definitions
//! - [`snapshot`] / [`replay`] - Persistence and playback

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod board;
pub mod catalog;
pub mod config;
pub mod data;
pub mod dice;
pub mod entity;
pub mod error;
pub mod events;
pub mod game;
pub mod hex;
pub mod initiative;
pub mod location;
pub mod math;
pub mod movement;
pub mod phase;
pub mod player;
pub mod replay;
pub mod rules;
pub mod scenario;
pub mod snapshot;
pub mod state;
pub mod tohit;
pub mod unit_kind;
pub mod view;

#[cfg(test)]
mod testing;

pub use error::{GameError, Rejection, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{ActionId, ActionKind, ActionRequest, Arm, Target};
    pub use crate::board::{Board, HexTile, Terrain};
    pub use crate::catalog::Catalog;
    pub use crate::config::GameConfig;
    pub use crate::dice::{DiceRoller, ScriptedDice, SeededDice};
    pub use crate::entity::{Entity, EntityId};
    pub use crate::error::{GameError, Rejection, Result};
    pub use crate::events::GameEvent;
    pub use crate::game::{Accepted, Deployment, Game};
    pub use crate::hex::{Facing, Hex};
    pub use crate::math::Fixed;
    pub use crate::movement::{MoveMode, MovePath, MoveStep};
    pub use crate::phase::Phase;
    pub use crate::player::{ConnectionStatus, PlayerId, Team};
    pub use crate::replay::{Replay, ReplayInput, ReplayPlayer};
    pub use crate::rules::Outcome;
    pub use crate::scenario::Scenario;
    pub use crate::snapshot::Snapshot;
    pub use crate::state::{GameResult, GameState};
    pub use crate::tohit::ToHit;
    pub use crate::unit_kind::UnitKind;
    pub use crate::view::GameView;
}
