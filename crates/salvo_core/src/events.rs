//! Itemized state changes.
//!
//! Every mutation of a [`Game`](crate::game::Game) returns the list of
//! [`GameEvent`]s it produced, in the order they happened. The session layer
//! forwards them verbatim as a state delta; a client that applies them in
//! order reaches the server's view.

use serde::{Deserialize, Serialize};

use crate::action::{ActionId, Target};
use crate::entity::EntityId;
use crate::hex::{Facing, Hex};
use crate::movement::MoveMode;
use crate::phase::Phase;
use crate::player::{ConnectionStatus, PlayerId, Team};
use crate::rules::Outcome;

/// One state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A player joined the lobby.
    PlayerJoined {
        /// New player.
        player: PlayerId,
        /// Display name.
        name: String,
        /// Team.
        team: Team,
    },
    /// A player's session state changed.
    ConnectionChanged {
        /// Player.
        player: PlayerId,
        /// New state.
        status: ConnectionStatus,
    },
    /// A unit was placed during setup.
    EntityDeployed {
        /// New entity.
        entity: EntityId,
        /// Owner.
        owner: PlayerId,
        /// Catalog type.
        unit_type: String,
        /// Hex.
        position: Hex,
        /// Facing.
        facing: Facing,
    },
    /// The game moved into a new phase.
    PhaseChanged {
        /// Round number.
        round: u32,
        /// Phase entered.
        phase: Phase,
    },
    /// A player's initiative result for the round.
    InitiativeRolled {
        /// Player.
        player: PlayerId,
        /// Rolls in order, tie re-rolls included.
        rolls: Vec<u8>,
    },
    /// The turn order for the phase was fixed.
    TurnOrder {
        /// Acting player of each turn, in order.
        turns: Vec<PlayerId>,
    },
    /// The active turn changed.
    TurnChanged {
        /// Index into the turn order.
        index: usize,
        /// Player now acting.
        player: PlayerId,
    },
    /// An action was accepted.
    ActionDeclared {
        /// Assigned id.
        action: ActionId,
        /// Acting entity.
        actor: EntityId,
        /// Target, if any.
        target: Option<Target>,
        /// Human-readable kind.
        kind: String,
    },
    /// A pending action was dropped before resolution.
    ActionCancelled {
        /// Dropped action.
        action: ActionId,
        /// Why.
        reason: String,
    },
    /// A unit moved.
    EntityMoved {
        /// Unit.
        entity: EntityId,
        /// Start hex.
        from: Hex,
        /// End hex.
        to: Hex,
        /// Final facing.
        facing: Facing,
        /// Mode, `None` when standing still.
        mode: Option<MoveMode>,
        /// Hexes entered.
        hexes: u32,
        /// MP spent.
        mp_spent: u32,
        /// Prone after moving.
        prone: bool,
    },
    /// A player passed a turn.
    TurnPassed {
        /// Player.
        player: PlayerId,
        /// Entity marked done, if any.
        entity: Option<EntityId>,
    },
    /// An entity finished for this phase.
    EntityDone {
        /// Entity.
        entity: EntityId,
    },
    /// A queued attack was resolved.
    AttackResolved {
        /// Action.
        action: ActionId,
        /// Attacker.
        attacker: EntityId,
        /// Target entity.
        target: Option<EntityId>,
        /// Result.
        outcome: Outcome,
    },
    /// A weapon used ammunition or a one-shot charge.
    AmmoUsed {
        /// Firing entity.
        entity: EntityId,
        /// Mount index.
        mount: usize,
        /// Shots remaining.
        shots_left: Option<u32>,
    },
    /// Damage landed in a location.
    DamageApplied {
        /// Entity hit.
        entity: EntityId,
        /// Location index.
        location: usize,
        /// Rear armor was struck.
        rear: bool,
        /// Armor removed.
        armor_damage: u32,
        /// Internal structure removed.
        internal_damage: u32,
        /// Armor left on the struck side.
        armor_left: u32,
        /// Internal structure left.
        internal_left: u32,
    },
    /// Excess damage moved inward.
    DamageTransferred {
        /// Entity.
        entity: EntityId,
        /// Exhausted location.
        from: usize,
        /// Receiving location, `None` if discarded.
        to: Option<usize>,
        /// Points moved.
        amount: u32,
    },
    /// A critical hit knocked out equipment.
    CriticalHit {
        /// Entity.
        entity: EntityId,
        /// Location.
        location: usize,
        /// Slot index.
        slot: usize,
        /// Equipment destroyed.
        equipment: String,
    },
    /// A critical roll found nothing to break.
    CriticalLost {
        /// Entity.
        entity: EntityId,
        /// Location.
        location: usize,
    },
    /// A location's structure is gone.
    LocationDestroyed {
        /// Entity.
        entity: EntityId,
        /// Location.
        location: usize,
    },
    /// The unit is out of the game.
    EntityDestroyed {
        /// Entity.
        entity: EntityId,
    },
    /// Heat changed during the End phase.
    HeatChanged {
        /// Entity.
        entity: EntityId,
        /// New heat level.
        heat: u32,
        /// Shut down after the change.
        shutdown: bool,
    },
    /// A one-shot weapon was marked spent.
    WeaponSpent {
        /// Entity.
        entity: EntityId,
        /// Mount index.
        mount: usize,
    },
    /// The game ended.
    GameOver {
        /// Winning team, `None` for a draw.
        winner: Option<Team>,
        /// Final round.
        round: u32,
    },
    /// The game halted after detecting corrupted state.
    Halted {
        /// What went wrong.
        reason: String,
    },
    /// The whole state was replaced from a snapshot.
    SnapshotLoaded {
        /// Round of the loaded state.
        round: u32,
        /// Phase of the loaded state.
        phase: Phase,
    },
}

impl GameEvent {
    /// Entity the event concerns, if it is about one.
    #[must_use]
    pub const fn entity(&self) -> Option<EntityId> {
        match self {
            Self::EntityDeployed { entity, .. }
            | Self::EntityMoved { entity, .. }
            | Self::EntityDone { entity }
            | Self::AmmoUsed { entity, .. }
            | Self::DamageApplied { entity, .. }
            | Self::DamageTransferred { entity, .. }
            | Self::CriticalHit { entity, .. }
            | Self::CriticalLost { entity, .. }
            | Self::LocationDestroyed { entity, .. }
            | Self::EntityDestroyed { entity }
            | Self::HeatChanged { entity, .. }
            | Self::WeaponSpent { entity, .. } => Some(*entity),
            Self::ActionDeclared { actor, .. } => Some(*actor),
            Self::AttackResolved { attacker, .. } => Some(*attacker),
            _ => None,
        }
    }
}
