//! Phase sequencing.
//!
//! Phase flow within a round:
//! - Initiative     -> Movement
//! - Movement       -> WeaponAttack
//! - WeaponAttack   -> PhysicalAttack
//! - PhysicalAttack -> End
//! - End            -> Initiative (next round) or GameOver
//!
//! `Lobby` precedes the first round; `GameOver` is terminal.

use serde::{Deserialize, Serialize};

/// A named stage of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Setup: players and units are added.
    Lobby,
    /// Initiative is rolled.
    Initiative,
    /// Units move; charges and rams are declared.
    Movement,
    /// Weapon attacks are declared.
    WeaponAttack,
    /// Punches and kicks are declared; charges and rams resolve.
    PhysicalAttack,
    /// Heat, cleanup and the victory check.
    End,
    /// The game has ended.
    GameOver,
}

impl Phase {
    /// The phase that follows this one in a round.
    ///
    /// `End` wraps to `Initiative`; the caller decides whether the game is
    /// over instead. `GameOver` stays put.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Lobby | Self::End => Self::Initiative,
            Self::Initiative => Self::Movement,
            Self::Movement => Self::WeaponAttack,
            Self::WeaponAttack => Self::PhysicalAttack,
            Self::PhysicalAttack => Self::End,
            Self::GameOver => Self::GameOver,
        }
    }

    /// Whether players take turns in this phase.
    #[must_use]
    pub const fn has_turns(self) -> bool {
        matches!(
            self,
            Self::Movement | Self::WeaponAttack | Self::PhysicalAttack
        )
    }

    /// Whether queued attacks resolve when this phase ends.
    #[must_use]
    pub const fn resolves_attacks(self) -> bool {
        matches!(self, Self::WeaponAttack | Self::PhysicalAttack)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lobby => "Lobby",
            Self::Initiative => "Initiative",
            Self::Movement => "Movement",
            Self::WeaponAttack => "Weapon Attack",
            Self::PhysicalAttack => "Physical Attack",
            Self::End => "End",
            Self::GameOver => "Game Over",
        };
        f.write_str(name)
    }
}
