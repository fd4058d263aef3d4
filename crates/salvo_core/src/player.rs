//! Players and their connection state.

use serde::{Deserialize, Serialize};

/// Unique player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Team marker. Players on the same team are allies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Team(pub u32);

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Team {}", self.0)
    }
}

/// Whether a player currently has a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Session attached.
    #[default]
    Connected,
    /// Session lost or not yet attached; turns are auto-passed after the
    /// grace period.
    Disconnected,
}

/// A participant in the game. Never removed while the game runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identifier.
    pub id: PlayerId,
    /// Display name, unique within a game.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Session state.
    pub status: ConnectionStatus,
    /// Last initiative total (after tie re-rolls), if rolled this round.
    pub initiative: Option<u8>,
}

impl Player {
    /// Create a connected player.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, team: Team) -> Self {
        Self {
            id,
            name: name.into(),
            team,
            status: ConnectionStatus::Connected,
            initiative: None,
        }
    }

    /// Whether the player has a live session.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
