//! The authoritative game state.
//!
//! `GameState` is plain data: ordered maps of players and entities, the
//! current phase and turn order, and the pending-action queue. All mutation
//! goes through [`Game`](crate::game::Game); this module only provides
//! lookups, invariant checks and a stable hash.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::action::PendingAction;
use crate::board::Board;
use crate::config::GameConfig;
use crate::entity::{Entity, EntityId};
use crate::error::{GameError, Result};
use crate::hex::Hex;
use crate::location::{location_count, slot_count};
use crate::phase::Phase;
use crate::player::{Player, PlayerId, Team};

/// One slot in a phase's turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    /// Player who acts.
    pub player: PlayerId,
    /// Entity the turn has been committed to, once one has acted.
    pub entity: Option<EntityId>,
}

impl Turn {
    /// An uncommitted turn for `player`.
    #[must_use]
    pub const fn new(player: PlayerId) -> Self {
        Self {
            player,
            entity: None,
        }
    }
}

/// How the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameResult {
    /// Winning team, `None` for a draw.
    pub winner: Option<Team>,
    /// Round in which the game ended.
    pub round: u32,
}

/// Complete game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) config: GameConfig,
    pub(crate) board: Board,
    pub(crate) round: u32,
    pub(crate) phase: Phase,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    pub(crate) initiative_order: Vec<PlayerId>,
    pub(crate) turns: Vec<Turn>,
    pub(crate) turn_index: usize,
    pub(crate) pending: Vec<PendingAction>,
    pub(crate) next_player_id: u32,
    pub(crate) next_entity_id: u32,
    pub(crate) next_action_id: u64,
    pub(crate) result: Option<GameResult>,
}

impl GameState {
    /// Empty lobby state.
    #[must_use]
    pub fn new(config: GameConfig, board: Board) -> Self {
        Self {
            config,
            board,
            round: 0,
            phase: Phase::Lobby,
            players: BTreeMap::new(),
            entities: BTreeMap::new(),
            initiative_order: Vec::new(),
            turns: Vec::new(),
            turn_index: 0,
            pending: Vec::new(),
            next_player_id: 1,
            next_entity_id: 1,
            next_action_id: 1,
            result: None,
        }
    }

    /// Insert a player with a preassigned id.
    pub fn insert_player(&mut self, player: Player) {
        self.next_player_id = self.next_player_id.max(player.id.0 + 1);
        self.players.insert(player.id, player);
    }

    /// Insert an entity with a preassigned id.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.next_entity_id = self.next_entity_id.max(entity.id().0 + 1);
        self.entities.insert(entity.id(), entity);
    }

    /// Rules configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Current round, zero before the game starts.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// All players by id.
    #[must_use]
    pub const fn players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.players
    }

    /// One player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Player by display name.
    #[must_use]
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.values().find(|p| p.name == name)
    }

    /// All entities by id.
    #[must_use]
    pub const fn entities(&self) -> &BTreeMap<EntityId, Entity> {
        &self.entities
    }

    /// One entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Entities standing in `hex`. Passengers are not on the board.
    pub fn entities_at(&self, hex: Hex) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(move |e| e.position() == hex && e.transport().is_none())
    }

    /// Entities owned by `player`.
    pub fn entities_of(&self, player: PlayerId) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(move |e| e.owner() == player)
    }

    /// Team of `player`.
    #[must_use]
    pub fn team_of(&self, player: PlayerId) -> Option<Team> {
        self.players.get(&player).map(|p| p.team)
    }

    /// Whether two players fight on the same side. A player is its own ally.
    #[must_use]
    pub fn are_allies(&self, a: PlayerId, b: PlayerId) -> bool {
        if a == b {
            return true;
        }
        match (self.team_of(a), self.team_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Players from lowest to highest initiative this round.
    #[must_use]
    pub fn initiative_order(&self) -> &[PlayerId] {
        &self.initiative_order
    }

    /// Turn order of the current phase.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Index of the current turn.
    #[must_use]
    pub const fn turn_index(&self) -> usize {
        self.turn_index
    }

    /// The turn being played, if any remain.
    #[must_use]
    pub fn current_turn(&self) -> Option<&Turn> {
        self.turns.get(self.turn_index)
    }

    /// Declared attacks awaiting resolution, in declaration order.
    #[must_use]
    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    /// How the game ended, once it has.
    #[must_use]
    pub const fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Teams that still have a unit in the fight.
    #[must_use]
    pub fn live_teams(&self) -> BTreeSet<Team> {
        self.entities
            .values()
            .filter(|e| !e.is_destroyed())
            .filter_map(|e| self.team_of(e.owner()))
            .collect()
    }

    /// Check the structural invariants of the state.
    ///
    /// # Errors
    ///
    /// [`GameError::StateCorruption`] naming the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        let corrupt = |msg: String| Err(GameError::StateCorruption(msg));

        if self.turn_index > self.turns.len() {
            return corrupt(format!(
                "turn index {} beyond {} turns",
                self.turn_index,
                self.turns.len()
            ));
        }
        if let Some(turn) = self.turns.iter().find(|t| !self.players.contains_key(&t.player)) {
            return corrupt(format!("turn held by unknown player {}", turn.player));
        }
        if (self.phase == Phase::GameOver) != self.result.is_some() {
            return corrupt("game-over phase and result disagree".into());
        }
        for (id, entity) in &self.entities {
            if *id != entity.id() {
                return corrupt(format!("entity {} stored under {id}", entity.id()));
            }
            if !self.players.contains_key(&entity.owner()) {
                return corrupt(format!("{id} owned by unknown player {}", entity.owner()));
            }
            if entity.transport().is_none() && !self.board.contains(entity.position()) {
                return corrupt(format!("{id} is off the board at {}", entity.position()));
            }
            let expected = location_count(entity.kind(), entity.is_clan());
            if entity.locations.len() != expected {
                return corrupt(format!(
                    "{id} has {} locations, a {} has {expected}",
                    entity.locations.len(),
                    entity.kind()
                ));
            }
            for (index, loc) in entity.locations.iter().enumerate() {
                if loc.slots.len() != slot_count(entity.kind(), index) {
                    return corrupt(format!(
                        "{id} location {index} has {} critical slots",
                        loc.slots.len()
                    ));
                }
                if loc.internal > loc.original_internal
                    || loc.armor > loc.original_armor
                    || loc.rear_armor > loc.original_rear_armor
                {
                    return corrupt(format!("{id} location {index} exceeds its original values"));
                }
                if loc
                    .slots
                    .iter()
                    .flatten()
                    .any(|slot| slot.mount >= entity.mounts.len())
                {
                    return corrupt(format!("{id} location {index} references a missing mount"));
                }
            }
            if entity
                .mounts
                .iter()
                .any(|m| m.location >= entity.locations.len())
            {
                return corrupt(format!("{id} mounts equipment in a missing location"));
            }
        }
        for pending in &self.pending {
            if !self.entities.contains_key(&pending.action.actor) {
                return corrupt(format!(
                    "pending action {} has unknown actor {}",
                    pending.action.id, pending.action.actor
                ));
            }
        }
        Ok(())
    }

    /// Hash of everything that affects play.
    ///
    /// Connection status is excluded: a reconnect does not change the game.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.config.hash(&mut hasher);
        self.board.hash(&mut hasher);
        self.round.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        for player in self.players.values() {
            player.id.hash(&mut hasher);
            player.team.hash(&mut hasher);
            player.initiative.hash(&mut hasher);
        }
        self.entities.hash(&mut hasher);
        self.initiative_order.hash(&mut hasher);
        self.turns.hash(&mut hasher);
        self.turn_index.hash(&mut hasher);
        self.pending.hash(&mut hasher);
        self.next_entity_id.hash(&mut hasher);
        self.next_action_id.hash(&mut hasher);
        self.result.hash(&mut hasher);
        hasher.finish()
    }
}
