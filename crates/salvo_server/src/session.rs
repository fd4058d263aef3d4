//! Session and broadcast layer.
//!
//! A [`Session`] owns the one authoritative [`Game`] of the process and the
//! bookkeeping around it: which connection speaks for which player, the
//! delta sequence number, disconnect timestamps and the turn clock. Every
//! method runs under the server's lock and returns an [`Outbox`] that the
//! caller delivers after releasing it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use salvo_core::action::ActionRequest;
use salvo_core::catalog::Catalog;
use salvo_core::dice::SeededDice;
use salvo_core::events::GameEvent;
use salvo_core::game::Game;
use salvo_core::phase::Phase;
use salvo_core::player::PlayerId;
use salvo_core::replay::{Replay, ReplayInput};
use salvo_core::scenario::Scenario;
use salvo_core::snapshot::Snapshot;

use crate::config::ServerConfig;
use crate::error::{ProtocolError, ServerError};
use crate::protocol::{ClientMessage, ServerMessage, TurnInfo};

/// Outbound half of one connection.
pub type Client = UnboundedSender<ServerMessage>;

/// Messages computed under the lock, delivered after it is released.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<(Client, ServerMessage)>,
}

impl Outbox {
    fn push(&mut self, to: &Client, message: ServerMessage) {
        self.deliveries.push((to.clone(), message));
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Hand every message to its connection's writer. Returns how many
    /// writers were still alive to take them.
    pub fn deliver(self) -> usize {
        self.deliveries
            .into_iter()
            .filter(|(to, message)| to.send(message.clone()).is_ok())
            .count()
    }
}

/// One client connection as the session sees it.
#[derive(Debug)]
pub struct Connection {
    player: Option<PlayerId>,
    client: Client,
}

impl Connection {
    /// A fresh, not yet joined connection.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self {
            player: None,
            client,
        }
    }

    /// Player this connection speaks for.
    #[must_use]
    pub const fn player(&self) -> Option<PlayerId> {
        self.player
    }
}

/// Session timing and access settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Password joining players must present.
    pub password: Option<String>,
    /// Disconnected players' turns are auto-passed after this long.
    pub grace_period: Duration,
    /// Connected players' turns are force-passed after this long.
    pub turn_timeout: Option<Duration>,
    /// Start with whoever joined once the lobby has been open this long.
    pub lobby_timeout: Option<Duration>,
    /// Replay destination.
    pub replay_path: Option<PathBuf>,
}

impl From<&ServerConfig> for SessionSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            password: config.password.clone(),
            grace_period: config.grace_period(),
            turn_timeout: config.turn_timeout(),
            lobby_timeout: config.lobby_timeout(),
            replay_path: config.replay_path.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TurnClock {
    key: (u32, Phase, usize),
    since: Instant,
}

/// The authoritative game plus everything needed to serve it.
#[derive(Debug)]
pub struct Session {
    game: Game<SeededDice>,
    replay: Replay,
    settings: SessionSettings,
    clients: BTreeMap<PlayerId, Client>,
    seq: u64,
    disconnected_since: BTreeMap<PlayerId, Instant>,
    turn_clock: Option<TurnClock>,
    opened_at: Instant,
    replay_written: bool,
}

impl Session {
    /// Build the game described by `config`: a fresh scenario, or a
    /// snapshot to resume.
    pub fn boot(config: &ServerConfig, now: Instant) -> Result<Self, ServerError> {
        let catalog = if config.catalog.exists() {
            Catalog::load(&config.catalog)?
        } else {
            warn!(path = %config.catalog.display(), "catalog not found, using built-in data");
            Catalog::builtin()
        };
        let catalog = Arc::new(catalog);

        let (game, scenario_id) = match &config.resume {
            Some(path) => {
                let snapshot = Snapshot::<SeededDice>::load(path)?;
                let game = Game::from_snapshot(snapshot, catalog)?;
                info!(path = %path.display(), round = game.state().round(), "resuming snapshot");
                (game, format!("resume:{}", path.display()))
            }
            None => {
                let mut scenario = Scenario::load(&config.scenario)?;
                if let Some(seed) = config.seed {
                    scenario = scenario.with_seed(seed);
                }
                info!(scenario = scenario.id(), name = scenario.name(), "loading scenario");
                (scenario.build_seeded(catalog)?, scenario.id().to_string())
            }
        };
        Self::new(game, scenario_id, SessionSettings::from(config), now)
    }

    /// Serve `game`. Every player starts disconnected until they join.
    pub fn new(
        mut game: Game<SeededDice>,
        scenario_id: impl Into<String>,
        settings: SessionSettings,
        now: Instant,
    ) -> Result<Self, ServerError> {
        let players: Vec<PlayerId> = game.state().players().keys().copied().collect();
        for &player in &players {
            if let Err(rejection) = game.player_disconnected(player) {
                warn!(player = %player, %rejection, "cannot mark player disconnected");
            }
        }
        let replay = Replay::new(scenario_id, &game)?;

        let mut session = Self {
            game,
            replay,
            settings,
            clients: BTreeMap::new(),
            seq: 0,
            disconnected_since: players.into_iter().map(|p| (p, now)).collect(),
            turn_clock: None,
            opened_at: now,
            replay_written: false,
        };
        session.sync_turn_clock(now);
        Ok(session)
    }

    /// The game being served.
    #[must_use]
    pub const fn game(&self) -> &Game<SeededDice> {
        &self.game
    }

    /// Inputs recorded so far.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Sequence number of the last broadcast delta.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether `player` has a live connection.
    #[must_use]
    pub fn is_connected(&self, player: PlayerId) -> bool {
        self.clients.contains_key(&player)
    }

    /// Full resync message for the current state.
    #[must_use]
    pub fn full_snapshot(&self) -> ServerMessage {
        ServerMessage::FullSnapshot {
            seq: self.seq,
            view: self.game.view(),
        }
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Apply one decoded client message.
    pub fn handle(&mut self, conn: &mut Connection, message: ClientMessage, now: Instant) -> Outbox {
        let mut out = Outbox::default();
        let result = match message {
            ClientMessage::JoinGame { name, password } => {
                self.join(conn, &name, password.as_deref(), &mut out)
            }
            ClientMessage::SubmitAction { action } => self.submit(conn, action, &mut out),
            ClientMessage::EndTurn => self.end_turn(conn, &mut out),
            ClientMessage::RequestSnapshot => match conn.player {
                Some(_) => {
                    out.push(&conn.client, self.full_snapshot());
                    Ok(())
                }
                None => Err(ProtocolError::NotJoined),
            },
        };
        if let Err(error) = result {
            warn!(player = ?conn.player, %error, "protocol error");
            out.push(&conn.client, error.into());
        }
        self.after_mutation(now);
        out
    }

    /// Report a line that did not decode.
    pub fn reject(&self, conn: &Connection, error: ProtocolError) -> Outbox {
        warn!(player = ?conn.player, %error, "protocol error");
        let mut out = Outbox::default();
        out.push(&conn.client, error.into());
        out
    }

    fn join(
        &mut self,
        conn: &mut Connection,
        name: &str,
        password: Option<&str>,
        out: &mut Outbox,
    ) -> Result<(), ProtocolError> {
        if let Some(id) = conn.player {
            return Err(ProtocolError::AlreadyJoined(id.0));
        }
        if let Some(expected) = &self.settings.password {
            if password != Some(expected.as_str()) {
                return Err(ProtocolError::BadPassword);
            }
        }
        let player = self
            .game
            .state()
            .player_by_name(name)
            .ok_or_else(|| ProtocolError::UnknownName(name.to_string()))?;
        let id = player.id;
        if player.is_connected() || self.clients.contains_key(&id) {
            return Err(ProtocolError::AlreadyConnected(name.to_string()));
        }

        self.replay
            .record(&self.game, ReplayInput::Reconnect { player: id });
        let events = self.game.player_reconnected(id).unwrap_or_else(|rejection| {
            warn!(player = %id, %rejection, "reconnect refused");
            Vec::new()
        });
        self.disconnected_since.remove(&id);
        conn.player = Some(id);
        info!(player = %id, name, "player joined");

        self.broadcast(events, out);
        self.clients.insert(id, conn.client.clone());
        out.push(&conn.client, ServerMessage::Joined { player_id: id });
        out.push(&conn.client, self.full_snapshot());

        let everyone_here = self
            .game
            .state()
            .players()
            .keys()
            .all(|p| self.clients.contains_key(p));
        if self.game.state().phase() == Phase::Lobby && everyone_here {
            self.start(out);
        }
        Ok(())
    }

    fn submit(
        &mut self,
        conn: &Connection,
        action: ActionRequest,
        out: &mut Outbox,
    ) -> Result<(), ProtocolError> {
        let player = conn.player.ok_or(ProtocolError::NotJoined)?;
        if !self.game.is_players_turn(player) {
            return Err(ProtocolError::OutOfTurn);
        }
        self.replay.record(
            &self.game,
            ReplayInput::Submit {
                player,
                request: action.clone(),
            },
        );
        match self.game.submit(player, action) {
            Ok(accepted) => {
                out.push(
                    &conn.client,
                    ServerMessage::ActionAccepted {
                        action_id: accepted.action_id,
                    },
                );
                self.broadcast(accepted.events, out);
            }
            Err(rejection) => out.push(
                &conn.client,
                ServerMessage::ActionRejected {
                    reason: rejection.to_string(),
                },
            ),
        }
        Ok(())
    }

    fn end_turn(&mut self, conn: &Connection, out: &mut Outbox) -> Result<(), ProtocolError> {
        let player = conn.player.ok_or(ProtocolError::NotJoined)?;
        if !self.game.is_players_turn(player) {
            return Err(ProtocolError::OutOfTurn);
        }
        self.replay
            .record(&self.game, ReplayInput::EndTurn { player });
        match self.game.end_turn(player) {
            Ok(events) => self.broadcast(events, out),
            Err(rejection) => out.push(
                &conn.client,
                ServerMessage::ActionRejected {
                    reason: rejection.to_string(),
                },
            ),
        }
        Ok(())
    }

    /// The connection dropped. Does nothing if the player has already
    /// joined again on a newer connection.
    pub fn disconnect(&mut self, conn: &Connection, now: Instant) -> Outbox {
        let mut out = Outbox::default();
        let Some(player) = conn.player else {
            return out;
        };
        match self.clients.get(&player) {
            Some(current) if current.same_channel(&conn.client) => {}
            _ => return out,
        }
        self.clients.remove(&player);
        self.disconnected_since.insert(player, now);
        info!(player = %player, "player disconnected");

        self.replay
            .record(&self.game, ReplayInput::Disconnect { player });
        match self.game.player_disconnected(player) {
            Ok(events) => self.broadcast(events, &mut out),
            Err(rejection) => warn!(player = %player, %rejection, "disconnect refused"),
        }
        self.after_mutation(now);
        out
    }

    // ------------------------------------------------------------------
    // Watchdog
    // ------------------------------------------------------------------

    /// Push a stalled game along. Called periodically.
    ///
    /// - An open lobby starts once the lobby timeout runs out, if anyone is
    ///   there.
    /// - A disconnected player's turn passes once they have been gone for
    ///   the grace period.
    /// - A connected player's turn is force-passed after the turn timeout.
    pub fn tick(&mut self, now: Instant) -> Outbox {
        let mut out = Outbox::default();
        if self.game.is_halted() || self.game.is_over() {
            return out;
        }
        self.sync_turn_clock(now);

        if self.game.state().phase() == Phase::Lobby {
            if let Some(limit) = self.settings.lobby_timeout {
                if !self.clients.is_empty() && now.saturating_duration_since(self.opened_at) >= limit {
                    info!(joined = self.clients.len(), "lobby timed out, starting");
                    self.start(&mut out);
                }
            }
        } else if let Some(holder) = self.game.current_turn() {
            let expired = match self.disconnected_since.get(&holder) {
                Some(since) => now.saturating_duration_since(*since) >= self.settings.grace_period,
                None => match (self.settings.turn_timeout, self.turn_clock) {
                    (Some(limit), Some(clock)) => {
                        now.saturating_duration_since(clock.since) >= limit
                    }
                    _ => false,
                },
            };
            if expired {
                self.force_pass(holder, &mut out);
            }
        }
        self.after_mutation(now);
        out
    }

    fn force_pass(&mut self, holder: PlayerId, out: &mut Outbox) {
        let connected = self.clients.contains_key(&holder);
        info!(player = %holder, connected, "passing stalled turn");
        self.replay.record(&self.game, ReplayInput::ForcePass);
        match self.game.force_pass() {
            Ok(events) => self.broadcast(events, out),
            Err(rejection) => warn!(%rejection, "force pass refused"),
        }
    }

    fn start(&mut self, out: &mut Outbox) {
        self.replay.record(&self.game, ReplayInput::Start);
        match self.game.start() {
            Ok(events) => {
                info!(players = self.clients.len(), "game started");
                self.broadcast(events, out);
            }
            Err(e) => error!(error = %e, "game failed to start"),
        }
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    fn broadcast(&mut self, events: Vec<GameEvent>, out: &mut Outbox) {
        if events.is_empty() {
            return;
        }
        self.seq += 1;
        let state = self.game.state();
        let turn = self.game.current_turn().map(|player| TurnInfo {
            index: state.turn_index(),
            player,
        });
        debug!(seq = self.seq, events = events.len(), hash = self.game.state_hash(), "broadcasting delta");
        let delta = ServerMessage::StateDelta {
            seq: self.seq,
            round: state.round(),
            phase: state.phase(),
            turn,
            events,
        };
        for client in self.clients.values() {
            out.push(client, delta.clone());
        }
    }

    fn sync_turn_clock(&mut self, now: Instant) {
        let state = self.game.state();
        let key = self
            .game
            .current_turn()
            .map(|_| (state.round(), state.phase(), state.turn_index()));
        match (key, self.turn_clock) {
            (Some(key), Some(clock)) if clock.key == key => {}
            (Some(key), _) => self.turn_clock = Some(TurnClock { key, since: now }),
            (None, _) => self.turn_clock = None,
        }
    }

    fn after_mutation(&mut self, now: Instant) {
        self.sync_turn_clock(now);
        if self.game.is_over() && !self.replay_written {
            self.replay_written = true;
            self.replay.finalize(&self.game);
            info!(
                round = self.game.state().round(),
                result = ?self.game.state().result(),
                commands = self.replay.command_count(),
                "game over"
            );
            if let Some(path) = &self.settings.replay_path {
                let written = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map_or(Ok(()), std::fs::create_dir_all)
                    .map_err(|e| e.to_string())
                    .and_then(|()| self.replay.save(path).map_err(|e| e.to_string()));
                match written {
                    Ok(()) => info!(path = %path.display(), "replay saved"),
                    Err(e) => error!(path = %path.display(), error = %e, "failed to save replay"),
                }
            }
        }
    }
}
