//! Snapshot inspector.

use std::fmt;
use std::path::Path;

use salvo_core::catalog::Catalog;
use salvo_core::dice::SeededDice;
use salvo_core::error::Result;
use salvo_core::phase::Phase;
use salvo_core::snapshot::Snapshot;

/// One line per player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLine {
    /// Player id.
    pub id: u32,
    /// Name.
    pub name: String,
    /// Team number.
    pub team: u32,
    /// Whether the player was connected.
    pub connected: bool,
    /// Units still in the fight.
    pub live_units: usize,
}

/// One line per unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLine {
    /// Entity id.
    pub id: u32,
    /// Owning player id.
    pub owner: u32,
    /// Unit type id.
    pub unit_type: String,
    /// Position as `(q, r)`.
    pub position: (i32, i32),
    /// Armor left across all locations.
    pub armor: u32,
    /// Internal structure left across all locations.
    pub internal: u32,
    /// Current heat.
    pub heat: u32,
    /// Destroyed units are kept in the state.
    pub destroyed: bool,
}

/// What a snapshot holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Format version.
    pub version: u32,
    /// Round.
    pub round: u32,
    /// Phase.
    pub phase: Phase,
    /// Turn index within the phase.
    pub turn_index: usize,
    /// Pending attacks.
    pub pending: usize,
    /// State hash.
    pub state_hash: u64,
    /// Die seed.
    pub seed: u64,
    /// Halt reason, if halted.
    pub halted: Option<String>,
    /// Players.
    pub players: Vec<PlayerLine>,
    /// Units.
    pub units: Vec<UnitLine>,
}

impl SnapshotSummary {
    /// Summarize a decoded snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot<SeededDice>) -> Self {
        let state = &snapshot.state;
        let players = state
            .players()
            .values()
            .map(|p| PlayerLine {
                id: p.id.0,
                name: p.name.clone(),
                team: p.team.0,
                connected: p.is_connected(),
                live_units: state.entities_of(p.id).filter(|e| !e.is_destroyed()).count(),
            })
            .collect();
        let units = state
            .entities()
            .values()
            .map(|e| UnitLine {
                id: e.id().0,
                owner: e.owner().0,
                unit_type: e.unit_type().to_string(),
                position: (e.position().q, e.position().r),
                armor: e.locations().iter().map(|l| l.armor() + l.rear_armor()).sum(),
                internal: e.locations().iter().map(|l| l.internal()).sum(),
                heat: e.heat(),
                destroyed: e.is_destroyed(),
            })
            .collect();
        Self {
            version: snapshot.version,
            round: state.round(),
            phase: state.phase(),
            turn_index: state.turn_index(),
            pending: state.pending().len(),
            state_hash: snapshot.state_hash(),
            seed: snapshot.dice.seed(),
            halted: snapshot.halted.clone(),
            players,
            units,
        }
    }
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "snapshot v{}  round {}  {} phase  turn {}  hash {:016x}  seed {}",
            self.version, self.round, self.phase, self.turn_index, self.state_hash, self.seed
        )?;
        if let Some(reason) = &self.halted {
            writeln!(f, "HALTED: {reason}")?;
        }
        if self.pending > 0 {
            writeln!(f, "{} attacks pending", self.pending)?;
        }
        writeln!(f, "players:")?;
        for p in &self.players {
            writeln!(
                f,
                "  P{} {:<12} team {}  {}  {} units",
                p.id,
                p.name,
                p.team,
                if p.connected { "connected" } else { "disconnected" },
                p.live_units
            )?;
        }
        writeln!(f, "units:")?;
        for u in &self.units {
            writeln!(
                f,
                "  E{} {:<18} P{}  ({}, {})  armor {:>3}  internal {:>3}  heat {:>2}{}",
                u.id,
                u.unit_type,
                u.owner,
                u.position.0,
                u.position.1,
                u.armor,
                u.internal,
                u.heat,
                if u.destroyed { "  DESTROYED" } else { "" }
            )?;
        }
        Ok(())
    }
}

/// Load and summarize a snapshot file, checking it against `catalog` when
/// one is given.
pub fn inspect_snapshot(path: &Path, catalog: Option<&Catalog>) -> Result<SnapshotSummary> {
    let snapshot = Snapshot::<SeededDice>::load(path)?;
    if let Some(catalog) = catalog {
        snapshot.check(catalog)?;
    }
    Ok(SnapshotSummary::from_snapshot(&snapshot))
}
