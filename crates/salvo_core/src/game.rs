//! The phase state machine.
//!
//! [`Game`] owns the authoritative [`GameState`], the catalog and the die
//! source. Every mutation goes through one of its methods and returns the
//! [`GameEvent`]s it produced, in order.
//!
//! Round structure:
//! - Initiative: players with a live unit roll 2d6; no input needed.
//! - Movement, WeaponAttack, PhysicalAttack: players take turns one unit at
//!   a time in initiative order. Queued attacks resolve when their phase
//!   ends.
//! - End: heat, per-round cleanup and the victory check.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::action::{Action, ActionId, ActionKind, ActionRequest, PendingAction, Target};
use crate::board::{Board, Terrain};
use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::data::Crew;
use crate::dice::{DiceRoller, SeededDice};
use crate::entity::{Entity, EntityId};
use crate::error::{GameError, Rejection, Result};
use crate::events::GameEvent;
use crate::hex::{Facing, Hex};
use crate::initiative;
use crate::movement::{self, CompiledPath, MovePath, MovementRecord};
use crate::phase::Phase;
use crate::player::{ConnectionStatus, Player, PlayerId, Team};
use crate::rules::{self, heat};
use crate::snapshot::{Snapshot, SNAPSHOT_VERSION};
use crate::state::{GameResult, GameState, Turn};
use crate::tohit::ToHit;
use crate::unit_kind::Capabilities;
use crate::view::GameView;

/// A successfully declared action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Id assigned to the action.
    pub action_id: ActionId,
    /// Everything that changed, including any phase transitions the action
    /// triggered.
    pub events: Vec<GameEvent>,
}

/// Where and how a unit enters the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Owning player.
    pub owner: PlayerId,
    /// Catalog unit type.
    pub unit_type: String,
    /// Starting hex.
    pub position: Hex,
    /// Starting facing.
    pub facing: Facing,
    /// Levels above the hex floor.
    pub elevation: i32,
    /// Crew override; the catalog default otherwise.
    pub crew: Option<Crew>,
    /// Starting velocity for aerospace units.
    pub velocity: u32,
}

impl Deployment {
    /// Ground-level deployment with the default crew.
    #[must_use]
    pub fn new(owner: PlayerId, unit_type: impl Into<String>, position: Hex, facing: Facing) -> Self {
        Self {
            owner,
            unit_type: unit_type.into(),
            position,
            facing,
            elevation: 0,
            crew: None,
            velocity: 0,
        }
    }
}

/// One game instance.
#[derive(Debug, Clone)]
pub struct Game<D: DiceRoller = SeededDice> {
    state: GameState,
    catalog: Arc<Catalog>,
    dice: D,
    halted: Option<String>,
    setup_events: Vec<GameEvent>,
}

impl Game<SeededDice> {
    /// Create a game whose dice are seeded from `config.seed`.
    #[must_use]
    pub fn seeded(config: GameConfig, board: Board, catalog: Arc<Catalog>) -> Self {
        let dice = SeededDice::new(config.seed);
        Self::new(config, board, catalog, dice)
    }
}

impl<D: DiceRoller> Game<D> {
    /// Create a game in the lobby.
    pub fn new(config: GameConfig, board: Board, catalog: Arc<Catalog>, dice: D) -> Self {
        Self {
            state: GameState::new(config, board),
            catalog,
            dice,
            halted: None,
            setup_events: Vec::new(),
        }
    }

    /// Authoritative state, read-only.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// The static data catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared handle to the catalog.
    #[must_use]
    pub fn catalog_handle(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// The die source.
    #[must_use]
    pub const fn dice(&self) -> &D {
        &self.dice
    }

    /// Whether corrupted state halted the game.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Why the game halted.
    #[must_use]
    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state.phase == Phase::GameOver
    }

    /// Stable hash of the state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    /// Read-only view for clients.
    #[must_use]
    pub fn view(&self) -> GameView {
        GameView::from_state(&self.state)
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    fn require_lobby(&self, what: &str) -> Result<()> {
        if self.state.phase == Phase::Lobby {
            Ok(())
        } else {
            Err(GameError::InvalidState(format!(
                "cannot {what} after the game has started"
            )))
        }
    }

    /// Add a player to the lobby.
    pub fn add_player(&mut self, name: &str, team: Team) -> Result<PlayerId> {
        self.require_lobby("add players")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::InvalidState("player name is empty".into()));
        }
        if self.state.player_by_name(name).is_some() {
            return Err(GameError::InvalidState(format!(
                "a player named '{name}' already exists"
            )));
        }
        if self.state.players.len() >= self.state.config.max_players {
            return Err(GameError::InvalidState(format!(
                "the game is full ({} players)",
                self.state.config.max_players
            )));
        }

        let id = PlayerId(self.state.next_player_id);
        self.state.insert_player(Player::new(id, name, team));
        info!(player = %id, name, %team, "player joined");
        self.setup_events.push(GameEvent::PlayerJoined {
            player: id,
            name: name.to_string(),
            team,
        });
        Ok(id)
    }

    /// Place a unit of `unit_type` for `owner`.
    pub fn add_entity(
        &mut self,
        owner: PlayerId,
        unit_type: &str,
        hex: Hex,
        facing: Facing,
    ) -> Result<EntityId> {
        self.deploy(Deployment::new(owner, unit_type, hex, facing))
    }

    /// Place a unit as described by `deployment`.
    pub fn deploy(&mut self, deployment: Deployment) -> Result<EntityId> {
        self.require_lobby("deploy units")?;
        let Deployment {
            owner,
            unit_type,
            position,
            facing,
            elevation,
            crew,
            velocity,
        } = deployment;

        if self.state.player(owner).is_none() {
            return Err(GameError::PlayerNotFound(owner));
        }
        let definition = self
            .catalog
            .unit(&unit_type)
            .ok_or_else(|| GameError::Catalog(format!("unknown unit type '{unit_type}'")))?;
        if !self.state.board.contains(position) {
            return Err(GameError::InvalidState(format!(
                "hex {position} is off the board"
            )));
        }

        let id = EntityId(self.state.next_entity_id);
        let mut entity = Entity::from_definition(id, owner, definition, &self.catalog, position, facing)?
            .with_elevation(elevation);
        if let Some(crew) = crew {
            entity = entity.with_crew(crew);
        }
        entity.velocity = velocity;
        self.check_placement(&entity)?;

        info!(entity = %id, owner = %owner, unit_type, hex = %position, "entity deployed");
        self.setup_events.push(GameEvent::EntityDeployed {
            entity: id,
            owner,
            unit_type: unit_type.clone(),
            position,
            facing,
        });
        self.state.insert_entity(entity);
        Ok(id)
    }

    fn check_placement(&self, entity: &Entity) -> Result<()> {
        if entity.kind().is_aerospace() {
            return Ok(());
        }
        let hex = entity.position();
        if self.state.board.terrain(hex) == Terrain::Impassable {
            return Err(GameError::InvalidState(format!("hex {hex} is impassable")));
        }
        let mut others = self
            .state
            .entities_at(hex)
            .filter(|other| other.kind().is_ground());
        let conflict = others.find(|other| {
            !self.state.are_allies(other.owner(), entity.owner())
                || (!entity.capabilities().contains(Capabilities::STACKS)
                    && !other.capabilities().contains(Capabilities::STACKS))
        });
        match conflict {
            Some(other) => Err(GameError::InvalidState(format!(
                "hex {hex} is already occupied by {}",
                other.id()
            ))),
            None => Ok(()),
        }
    }

    /// Leave the lobby and play the first round up to the first turn.
    ///
    /// Returns the setup events followed by everything the start caused.
    pub fn start(&mut self) -> Result<Vec<GameEvent>> {
        self.require_lobby("start")?;
        if self.state.players.is_empty() {
            return Err(GameError::InvalidState("no players have joined".into()));
        }
        if self.state.entities.is_empty() {
            return Err(GameError::InvalidState("no units are deployed".into()));
        }
        self.state.validate()?;

        info!(
            players = self.state.players.len(),
            entities = self.state.entities.len(),
            "game starting"
        );
        let mut events = std::mem::take(&mut self.setup_events);
        self.drive(&mut events);
        Ok(events)
    }

    // ------------------------------------------------------------------
    // Turn control
    // ------------------------------------------------------------------

    /// Player holding the current turn.
    #[must_use]
    pub fn current_turn(&self) -> Option<PlayerId> {
        if !self.state.phase.has_turns() {
            return None;
        }
        self.state.current_turn().map(|turn| turn.player)
    }

    /// Whether `player` holds the current turn.
    #[must_use]
    pub fn is_players_turn(&self, player: PlayerId) -> bool {
        self.current_turn() == Some(player)
    }

    fn check_running(&self) -> std::result::Result<(), Rejection> {
        if self.halted.is_some() {
            return Err(Rejection::Halted);
        }
        if self.state.phase == Phase::GameOver {
            return Err(Rejection::GameOver);
        }
        Ok(())
    }

    /// Declare an action.
    ///
    /// Movement is applied at once and ends the turn; charges and rams also
    /// move the unit and end the turn, queueing the attack for the physical
    /// attack phase. Weapon and physical attacks are queued and commit the
    /// turn to the acting unit until the player ends it.
    pub fn submit(
        &mut self,
        player: PlayerId,
        request: ActionRequest,
    ) -> std::result::Result<Accepted, Rejection> {
        match self.declare(player, request) {
            Ok(accepted) => Ok(accepted),
            Err(rejection) => {
                warn!(player = %player, %rejection, "action rejected");
                Err(rejection)
            }
        }
    }

    fn declare(
        &mut self,
        player: PlayerId,
        request: ActionRequest,
    ) -> std::result::Result<Accepted, Rejection> {
        self.check_running()?;
        if self.state.player(player).is_none() {
            return Err(Rejection::UnknownPlayer(player));
        }
        let phase = self.state.phase;
        let ActionRequest {
            actor,
            target,
            kind,
        } = request;
        if !phase.has_turns() || kind.declared_in() != phase {
            return Err(Rejection::WrongPhase {
                action: kind.name(),
                phase,
            });
        }
        let turn = self.state.current_turn().copied().ok_or(Rejection::NotYourTurn)?;
        if turn.player != player {
            return Err(Rejection::NotYourTurn);
        }

        let entity = self
            .state
            .entity(actor)
            .ok_or(Rejection::UnknownEntity(actor))?;
        if entity.owner() != player {
            return Err(Rejection::NotOwner(actor));
        }
        let cannot_act = |reason: &str| Rejection::CannotAct {
            entity: actor,
            reason: reason.to_string(),
        };
        if entity.is_destroyed() {
            return Err(cannot_act("destroyed"));
        }
        if entity.transport().is_some() {
            return Err(cannot_act("carried by another unit"));
        }
        if let Some(bound) = turn.entity {
            if bound != actor {
                return Err(Rejection::TurnBoundToOther(bound));
            }
        }
        if entity.is_done() {
            return Err(cannot_act("already finished this phase"));
        }

        let mut events = Vec::new();
        let accepted = match kind {
            ActionKind::Move(path) => self.declare_move(actor, path, &mut events)?,
            ActionKind::Charge(_) | ActionKind::Ram(_) => {
                self.declare_charge(actor, target, kind, &mut events)?
            }
            ActionKind::WeaponAttack { weapon } => {
                let target_id = self.attack_target(actor, target)?;
                self.check_not_charging(actor)?;
                self.check_to_hit(actor, target_id, &kind)?;
                if let Some(mount) = self
                    .state
                    .entity_mut(actor)
                    .and_then(|e| e.mounts.get_mut(weapon))
                {
                    mount.fired_this_round = true;
                }
                let id = self.queue(actor, Some(Target::Entity(target_id)), kind, &mut events);
                self.bind_turn(actor);
                id
            }
            ActionKind::Punch { arm } => {
                let target_id = self.attack_target(actor, target)?;
                self.check_not_charging(actor)?;
                let committed = self.committed_blows(actor);
                if committed.iter().any(|k| matches!(k, ActionKind::Kick)) {
                    return Err(Rejection::Impossible("already kicking this phase".into()));
                }
                if committed
                    .iter()
                    .any(|k| matches!(k, ActionKind::Punch { arm: used } if *used == arm))
                {
                    return Err(Rejection::Impossible("that arm already punches".into()));
                }
                self.check_to_hit(actor, target_id, &kind)?;
                let id = self.queue(actor, Some(Target::Entity(target_id)), kind, &mut events);
                self.bind_turn(actor);
                id
            }
            ActionKind::Kick => {
                let target_id = self.attack_target(actor, target)?;
                self.check_not_charging(actor)?;
                if !self.committed_blows(actor).is_empty() {
                    return Err(Rejection::Impossible(
                        "already committed to another physical attack".into(),
                    ));
                }
                self.check_to_hit(actor, target_id, &kind)?;
                let id = self.queue(actor, Some(Target::Entity(target_id)), kind, &mut events);
                self.bind_turn(actor);
                id
            }
        };

        Ok(Accepted {
            action_id: accepted,
            events,
        })
    }

    fn declare_move(
        &mut self,
        actor: EntityId,
        path: MovePath,
        events: &mut Vec<GameEvent>,
    ) -> std::result::Result<ActionId, Rejection> {
        let entity = self
            .state
            .entity(actor)
            .ok_or(Rejection::UnknownEntity(actor))?;
        let compiled = movement::compile(entity, &path, &self.state)?;
        let id = self.next_action_id();
        events.push(GameEvent::ActionDeclared {
            action: id,
            actor,
            target: None,
            kind: ActionKind::Move(path).name().to_string(),
        });
        self.apply_path(actor, &compiled, events);
        self.finish_entity(actor, events);
        self.advance_turn(events);
        Ok(id)
    }

    /// Charges and rams move the unit and queue the blow in one step.
    fn declare_charge(
        &mut self,
        actor: EntityId,
        target: Option<Target>,
        kind: ActionKind,
        events: &mut Vec<GameEvent>,
    ) -> std::result::Result<ActionId, Rejection> {
        let target_id = self.attack_target(actor, target)?;
        let Some(path) = kind.path() else {
            return Err(Rejection::Impossible("missing movement path".into()));
        };
        let entity = self
            .state
            .entity(actor)
            .ok_or(Rejection::UnknownEntity(actor))?;
        let compiled = movement::compile(entity, path, &self.state)?;

        let mut moved = entity.clone();
        place(&mut moved, &compiled);
        let to_hit = match self.state.entity(target_id) {
            Some(target) => {
                rules::evaluate(&moved, target, &kind, &self.state, &self.catalog)
            }
            None => return Err(Rejection::BadTarget(format!("unknown unit {target_id}"))),
        };
        if let ToHit::Impossible(reason) = to_hit {
            return Err(Rejection::Impossible(reason));
        }

        let ramming = matches!(kind, ActionKind::Ram(_));
        let id = self.queue(actor, Some(Target::Entity(target_id)), kind, events);
        self.apply_path(actor, &compiled, events);
        if ramming {
            if let Some(entity) = self.state.entity_mut(actor) {
                entity.ramming = true;
            }
        }
        self.finish_entity(actor, events);
        self.advance_turn(events);
        Ok(id)
    }

    fn attack_target(
        &self,
        actor: EntityId,
        target: Option<Target>,
    ) -> std::result::Result<EntityId, Rejection> {
        let target_id = match target {
            Some(Target::Entity(id)) => id,
            Some(Target::Hex(hex)) => {
                return Err(Rejection::BadTarget(format!(
                    "hex {hex} cannot be attacked directly"
                )))
            }
            None => return Err(Rejection::BadTarget("no target given".into())),
        };
        if self.state.entity(target_id).is_none() {
            return Err(Rejection::BadTarget(format!("unknown unit {target_id}")));
        }
        if target_id == actor {
            return Err(Rejection::BadTarget("a unit cannot attack itself".into()));
        }
        Ok(target_id)
    }

    fn check_to_hit(
        &self,
        actor: EntityId,
        target: EntityId,
        kind: &ActionKind,
    ) -> std::result::Result<(), Rejection> {
        let (Some(attacker), Some(target)) = (self.state.entity(actor), self.state.entity(target))
        else {
            return Err(Rejection::UnknownEntity(actor));
        };
        match rules::evaluate(attacker, target, kind, &self.state, &self.catalog) {
            ToHit::Impossible(reason) => Err(Rejection::Impossible(reason)),
            _ => Ok(()),
        }
    }

    /// A pending charge or ram rules out every other attack by the same unit,
    /// whichever phase it was declared in.
    fn check_not_charging(&self, actor: EntityId) -> std::result::Result<(), Rejection> {
        let committed = self.state.pending.iter().find(|p| {
            p.action.actor == actor
                && matches!(p.action.kind, ActionKind::Charge(_) | ActionKind::Ram(_))
        });
        match committed {
            Some(p) => Err(Rejection::Impossible(format!(
                "already committed to {}",
                p.action.kind.name()
            ))),
            None => Ok(()),
        }
    }

    /// Physical attacks `actor` already declared this phase.
    fn committed_blows(&self, actor: EntityId) -> Vec<ActionKind> {
        self.state
            .pending
            .iter()
            .filter(|p| p.action.actor == actor && p.declared_in == Phase::PhysicalAttack)
            .map(|p| p.action.kind.clone())
            .collect()
    }

    fn next_action_id(&mut self) -> ActionId {
        let id = ActionId(self.state.next_action_id);
        self.state.next_action_id += 1;
        id
    }

    fn queue(
        &mut self,
        actor: EntityId,
        target: Option<Target>,
        kind: ActionKind,
        events: &mut Vec<GameEvent>,
    ) -> ActionId {
        let id = self.next_action_id();
        let resolves_in = kind.resolves_in().unwrap_or(Phase::PhysicalAttack);
        debug!(action = %id, actor = %actor, kind = kind.name(), "action queued");
        events.push(GameEvent::ActionDeclared {
            action: id,
            actor,
            target,
            kind: kind.name().to_string(),
        });
        self.state.pending.push(PendingAction {
            action: Action {
                id,
                actor,
                target,
                kind,
                round: self.state.round,
            },
            resolves_in,
            declared_in: self.state.phase,
        });
        id
    }

    fn apply_path(&mut self, actor: EntityId, compiled: &CompiledPath, events: &mut Vec<GameEvent>) {
        let Some(entity) = self.state.entity_mut(actor) else {
            return;
        };
        place(entity, compiled);
        debug!(entity = %actor, from = %compiled.start, to = %compiled.end, mp = compiled.mp_spent, "entity moved");
        events.push(GameEvent::EntityMoved {
            entity: actor,
            from: compiled.start,
            to: compiled.end,
            facing: compiled.facing,
            mode: compiled.mode,
            hexes: compiled.hexes,
            mp_spent: compiled.mp_spent,
            prone: compiled.prone,
        });
    }

    fn bind_turn(&mut self, actor: EntityId) {
        let index = self.state.turn_index;
        if let Some(turn) = self.state.turns.get_mut(index) {
            turn.entity = Some(actor);
        }
    }

    fn finish_entity(&mut self, id: EntityId, events: &mut Vec<GameEvent>) {
        if let Some(entity) = self.state.entity_mut(id) {
            entity.done = true;
            events.push(GameEvent::EntityDone { entity: id });
        }
    }

    /// Finish the current turn of `player`.
    ///
    /// A turn committed to a unit marks that unit done; an uncommitted turn
    /// is a pass and marks the player's first eligible unit done.
    pub fn end_turn(&mut self, player: PlayerId) -> std::result::Result<Vec<GameEvent>, Rejection> {
        self.check_running()?;
        if self.state.player(player).is_none() {
            return Err(Rejection::UnknownPlayer(player));
        }
        if !self.is_players_turn(player) {
            return Err(Rejection::NotYourTurn);
        }
        let mut events = Vec::new();
        self.close_turn(&mut events);
        Ok(events)
    }

    /// Pass the current turn on behalf of whoever holds it.
    pub fn force_pass(&mut self) -> std::result::Result<Vec<GameEvent>, Rejection> {
        self.check_running()?;
        let Some(holder) = self.current_turn() else {
            return Err(Rejection::WrongPhase {
                action: "passing",
                phase: self.state.phase,
            });
        };
        info!(player = %holder, round = self.state.round, phase = %self.state.phase, "turn force-passed");
        let mut events = Vec::new();
        self.close_turn(&mut events);
        Ok(events)
    }

    fn close_turn(&mut self, events: &mut Vec<GameEvent>) {
        let Some(turn) = self.state.current_turn().copied() else {
            return;
        };
        match turn.entity {
            Some(entity) => self.finish_entity(entity, events),
            None => {
                let passed = self
                    .state
                    .entities_of(turn.player)
                    .find(|e| !e.is_done() && e.can_act())
                    .map(Entity::id);
                if let Some(id) = passed {
                    if let Some(entity) = self.state.entity_mut(id) {
                        entity.done = true;
                    }
                }
                debug!(player = %turn.player, entity = ?passed, "turn passed");
                events.push(GameEvent::TurnPassed {
                    player: turn.player,
                    entity: passed,
                });
            }
        }
        self.advance_turn(events);
    }

    fn advance_turn(&mut self, events: &mut Vec<GameEvent>) {
        self.state.turn_index += 1;
        match self.state.turns.get(self.state.turn_index) {
            Some(turn) => events.push(GameEvent::TurnChanged {
                index: self.state.turn_index,
                player: turn.player,
            }),
            None => self.drive(events),
        }
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Mark `player` disconnected and drop their unresolved actions from
    /// the current phase.
    pub fn player_disconnected(
        &mut self,
        player: PlayerId,
    ) -> std::result::Result<Vec<GameEvent>, Rejection> {
        let mut events = self.set_status(player, ConnectionStatus::Disconnected)?;
        let phase = self.state.phase;
        let owned = |state: &GameState, actor: EntityId| {
            state.entity(actor).is_some_and(|e| e.owner() == player)
        };

        let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.pending)
            .into_iter()
            .partition(|p| p.declared_in == phase && owned(&self.state, p.action.actor));
        self.state.pending = kept;

        for pending in cancelled {
            let action = pending.action;
            if let Some(entity) = self.state.entity_mut(action.actor) {
                match action.kind {
                    ActionKind::WeaponAttack { weapon } => {
                        if let Some(mount) = entity.mounts.get_mut(weapon) {
                            mount.fired_this_round = false;
                        }
                    }
                    ActionKind::Ram(_) => entity.ramming = false,
                    _ => {}
                }
            }
            debug!(action = %action.id, player = %player, "action cancelled");
            events.push(GameEvent::ActionCancelled {
                action: action.id,
                reason: "player disconnected".into(),
            });
        }
        Ok(events)
    }

    /// Mark `player` connected again.
    pub fn player_reconnected(
        &mut self,
        player: PlayerId,
    ) -> std::result::Result<Vec<GameEvent>, Rejection> {
        self.set_status(player, ConnectionStatus::Connected)
    }

    fn set_status(
        &mut self,
        player: PlayerId,
        status: ConnectionStatus,
    ) -> std::result::Result<Vec<GameEvent>, Rejection> {
        let entry = self
            .state
            .players
            .get_mut(&player)
            .ok_or(Rejection::UnknownPlayer(player))?;
        if entry.status == status {
            return Ok(Vec::new());
        }
        entry.status = status;
        info!(player = %player, ?status, "connection changed");
        Ok(vec![GameEvent::ConnectionChanged { player, status }])
    }

    // ------------------------------------------------------------------
    // Phase machine
    // ------------------------------------------------------------------

    /// Run phase transitions until a player has to act or the game ends.
    /// Corruption detected on the way halts the game.
    fn drive(&mut self, events: &mut Vec<GameEvent>) {
        if let Err(err) = self.advance_phases(events) {
            self.halt(&err, events);
        }
    }

    fn halt(&mut self, err: &GameError, events: &mut Vec<GameEvent>) {
        let reason = err.to_string();
        error!(round = self.state.round, phase = %self.state.phase, %reason, "game halted");
        self.halted = Some(reason.clone());
        events.push(GameEvent::Halted { reason });
    }

    fn advance_phases(&mut self, events: &mut Vec<GameEvent>) -> Result<()> {
        loop {
            let leaving = self.state.phase;
            if leaving.resolves_attacks() {
                self.resolve_queue(leaving, events)?;
                self.state.validate()?;
            }

            let next = leaving.next();
            if matches!(leaving, Phase::Lobby | Phase::End) {
                self.state.round += 1;
            }
            self.state.phase = next;
            self.state.turns.clear();
            self.state.turn_index = 0;
            info!(round = self.state.round, phase = %next, "phase changed");
            events.push(GameEvent::PhaseChanged {
                round: self.state.round,
                phase: next,
            });

            match next {
                Phase::Initiative => self.roll_initiative(events),
                Phase::Movement | Phase::WeaponAttack | Phase::PhysicalAttack => {
                    if self.begin_turns(next, events) {
                        return Ok(());
                    }
                }
                Phase::End => {
                    self.end_of_round(events);
                    self.state.validate()?;
                    debug!(round = self.state.round, hash = self.state.state_hash(), "round complete");
                    if self.state.phase == Phase::GameOver {
                        return Ok(());
                    }
                }
                Phase::Lobby | Phase::GameOver => return Ok(()),
            }
        }
    }

    fn roll_initiative(&mut self, events: &mut Vec<GameEvent>) {
        let contenders: Vec<PlayerId> = self
            .state
            .players
            .keys()
            .copied()
            .filter(|&p| self.state.entities_of(p).any(Entity::can_act))
            .collect();
        let rolled = initiative::roll(&contenders, &mut self.dice);

        for player in self.state.players.values_mut() {
            player.initiative = rolled.rolls.get(&player.id).and_then(|r| r.last().copied());
        }
        for (player, rolls) in &rolled.rolls {
            events.push(GameEvent::InitiativeRolled {
                player: *player,
                rolls: rolls.clone(),
            });
        }
        debug!(order = ?rolled.order, "initiative rolled");
        self.state.initiative_order = rolled.order;
    }

    /// Set up the turn order for `phase`. Returns whether anyone has a turn.
    fn begin_turns(&mut self, phase: Phase, events: &mut Vec<GameEvent>) -> bool {
        let mut eligible: BTreeMap<PlayerId, usize> = BTreeMap::new();
        for entity in self.state.entities.values_mut() {
            entity.begin_phase();
            if eligible_in(entity, phase) {
                *eligible.entry(entity.owner()).or_default() += 1;
            } else {
                entity.done = true;
            }
        }

        let order = initiative::interleave(&self.state.initiative_order, &eligible);
        self.state.turns = order.iter().copied().map(Turn::new).collect();
        self.state.turn_index = 0;
        if order.is_empty() {
            debug!(%phase, "no eligible units, skipping phase");
            return false;
        }
        events.push(GameEvent::TurnOrder {
            turns: order.clone(),
        });
        events.push(GameEvent::TurnChanged {
            index: 0,
            player: order[0],
        });
        true
    }

    fn resolve_queue(&mut self, phase: Phase, events: &mut Vec<GameEvent>) -> Result<()> {
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.pending)
            .into_iter()
            .partition(|p| p.resolves_in == phase);
        self.state.pending = later;
        if due.is_empty() {
            return Ok(());
        }
        debug!(%phase, count = due.len(), "resolving attacks");
        for pending in &due {
            rules::resolve_action(pending, &mut self.state, &self.catalog, &mut self.dice, events)?;
        }
        Ok(())
    }

    fn end_of_round(&mut self, events: &mut Vec<GameEvent>) {
        let shutdown_heat = self.state.config.shutdown_heat;
        for entity in self.state.entities.values_mut() {
            heat::end_of_round(entity, shutdown_heat, events);

            for (index, mount) in entity.mounts.iter_mut().enumerate() {
                if mount.one_shot && !mount.spent && mount.shots_left == Some(0) {
                    mount.spent = true;
                    events.push(GameEvent::WeaponSpent {
                        entity: entity.id,
                        mount: index,
                    });
                }
                mount.fired_this_round = false;
            }
            entity.done = false;
            entity.ramming = false;
            entity.movement = MovementRecord::stationary(entity.position);
        }
        self.state.pending.clear();
        self.check_victory(events);
    }

    fn check_victory(&mut self, events: &mut Vec<GameEvent>) {
        let teams = self.state.live_teams();
        let round = self.state.round;
        let winner = match teams.len() {
            0 => None,
            1 => teams.into_iter().next(),
            _ => {
                let out_of_rounds = self.state.config.max_rounds.is_some_and(|max| round >= max);
                if !out_of_rounds {
                    return;
                }
                None
            }
        };
        info!(round, ?winner, "game over");
        self.state.phase = Phase::GameOver;
        self.state.turns.clear();
        self.state.result = Some(GameResult { winner, round });
        events.push(GameEvent::GameOver { winner, round });
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Capture the full state and die generator.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<D>
    where
        D: Clone,
    {
        Snapshot {
            version: SNAPSHOT_VERSION,
            state: self.state.clone(),
            dice: self.dice.clone(),
            halted: self.halted.clone(),
        }
    }

    /// Replace the state with `snapshot` after validating it fully.
    ///
    /// On error the game is left untouched.
    pub fn load_snapshot(&mut self, snapshot: Snapshot<D>) -> Result<Vec<GameEvent>> {
        snapshot.check(&self.catalog)?;
        let Snapshot {
            state,
            dice,
            halted,
            ..
        } = snapshot;
        self.state = state;
        self.dice = dice;
        self.halted = halted;
        self.setup_events.clear();
        info!(round = self.state.round, phase = %self.state.phase, hash = self.state.state_hash(), "snapshot loaded");
        Ok(vec![GameEvent::SnapshotLoaded {
            round: self.state.round,
            phase: self.state.phase,
        }])
    }

    /// Build a game directly from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot<D>, catalog: Arc<Catalog>) -> Result<Self> {
        snapshot.check(&catalog)?;
        Ok(Self {
            state: snapshot.state,
            catalog,
            dice: snapshot.dice,
            halted: snapshot.halted,
            setup_events: Vec::new(),
        })
    }
}

/// Move `entity` to where `compiled` ends.
fn place(entity: &mut Entity, compiled: &CompiledPath) {
    entity.position = compiled.end;
    entity.facing = compiled.facing;
    entity.prone = compiled.prone;
    entity.movement = compiled.record();
    if entity.kind().is_aerospace() {
        entity.velocity = compiled.hexes;
    }
}

/// Whether `entity` gets a turn in `phase`.
fn eligible_in(entity: &Entity, phase: Phase) -> bool {
    if !entity.can_act() {
        return false;
    }
    match phase {
        Phase::Movement => true,
        Phase::WeaponAttack => !entity.is_shutdown(),
        Phase::PhysicalAttack => entity.kind().is_ground() && !entity.is_shutdown(),
        _ => false,
    }
}
