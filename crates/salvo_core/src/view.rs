//! Read-only projection of the game state for clients and tools.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::entity::{Entity, EntityId};
use crate::hex::{Facing, Hex};
use crate::phase::Phase;
use crate::player::{ConnectionStatus, Player, PlayerId, Team};
use crate::state::{GameResult, GameState};
use crate::unit_kind::UnitKind;

/// A player as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Session state.
    pub status: ConnectionStatus,
    /// Initiative this round.
    pub initiative: Option<u8>,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            team: player.team,
            status: player.status,
            initiative: player.initiative,
        }
    }
}

/// Remaining protection of one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationView {
    /// Front armor.
    pub armor: u32,
    /// Rear armor.
    pub rear_armor: u32,
    /// Internal structure.
    pub internal: u32,
}

/// One mounted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountView {
    /// Mount index, as used in weapon attack declarations.
    pub index: usize,
    /// Equipment id.
    pub equipment: String,
    /// Location index.
    pub location: usize,
    /// Weapon or equipment.
    pub weapon: bool,
    /// Remaining shots.
    pub shots_left: Option<u32>,
    /// Knocked out.
    pub destroyed: bool,
    /// Declared to fire this round.
    pub fired: bool,
    /// One-shot already used.
    pub spent: bool,
}

/// A unit as clients see it, derived status included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    /// Identifier.
    pub id: EntityId,
    /// Owner.
    pub owner: PlayerId,
    /// Catalog type.
    pub unit_type: String,
    /// Display name.
    pub name: String,
    /// Kind.
    pub kind: UnitKind,
    /// Hex.
    pub position: Hex,
    /// Facing.
    pub facing: Facing,
    /// Elevation above the hex floor.
    pub elevation: i32,
    /// Current heat.
    pub heat: u32,
    /// Aerospace velocity.
    pub velocity: u32,
    /// Walking MP.
    pub walk_mp: u32,
    /// Running MP.
    pub run_mp: u32,
    /// Jumping MP.
    pub jump_mp: u32,
    /// Prone.
    pub prone: bool,
    /// Shut down.
    pub shutdown: bool,
    /// Out of the game.
    pub destroyed: bool,
    /// Finished for this phase.
    pub done: bool,
    /// Per-location protection.
    pub locations: Vec<LocationView>,
    /// Mounted items.
    pub mounts: Vec<MountView>,
}

impl From<&Entity> for EntityView {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            owner: entity.owner(),
            unit_type: entity.unit_type().to_string(),
            name: entity.name().to_string(),
            kind: entity.kind(),
            position: entity.position(),
            facing: entity.facing(),
            elevation: entity.elevation(),
            heat: entity.heat(),
            velocity: entity.velocity(),
            walk_mp: entity.walk_mp(),
            run_mp: entity.run_mp(),
            jump_mp: entity.jump_mp(),
            prone: entity.is_prone(),
            shutdown: entity.is_shutdown(),
            destroyed: entity.is_destroyed(),
            done: entity.is_done(),
            locations: entity
                .locations()
                .iter()
                .map(|l| LocationView {
                    armor: l.armor(),
                    rear_armor: l.rear_armor(),
                    internal: l.internal(),
                })
                .collect(),
            mounts: entity
                .mounts()
                .iter()
                .enumerate()
                .map(|(index, m)| MountView {
                    index,
                    equipment: m.equipment().to_string(),
                    location: m.location(),
                    weapon: m.is_weapon(),
                    shots_left: m.shots_left(),
                    destroyed: m.is_destroyed(),
                    fired: m.fired_this_round(),
                    spent: m.is_spent(),
                })
                .collect(),
        }
    }
}

/// Everything a client needs to draw the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    /// Round number.
    pub round: u32,
    /// Current phase.
    pub phase: Phase,
    /// Acting player of each turn in this phase.
    pub turn_order: Vec<PlayerId>,
    /// Index of the current turn.
    pub turn_index: usize,
    /// Players by id.
    pub players: Vec<PlayerView>,
    /// Units by id.
    pub entities: Vec<EntityView>,
    /// The map.
    pub board: Board,
    /// Attacks waiting for resolution.
    pub pending_actions: usize,
    /// Final result once the game is over.
    pub result: Option<GameResult>,
}

impl GameView {
    /// Project `state`.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        Self {
            round: state.round(),
            phase: state.phase(),
            turn_order: state.turns().iter().map(|t| t.player).collect(),
            turn_index: state.turn_index(),
            players: state.players().values().map(PlayerView::from).collect(),
            entities: state.entities().values().map(EntityView::from).collect(),
            board: state.board().clone(),
            pending_actions: state.pending().len(),
            result: state.result(),
        }
    }

    /// Player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<PlayerId> {
        self.turn_order.get(self.turn_index).copied()
    }

    /// Look up a unit.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityView> {
        self.entities.iter().find(|e| e.id == id)
    }
}
