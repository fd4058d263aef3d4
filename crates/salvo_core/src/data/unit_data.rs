//! Unit data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::unit_kind::UnitKind;

/// Crew skills. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crew {
    /// Base to-hit for weapon attacks.
    pub gunnery: u8,
    /// Base to-hit for physical attacks and piloting checks.
    pub piloting: u8,
}

impl Default for Crew {
    fn default() -> Self {
        Self {
            gunnery: 4,
            piloting: 5,
        }
    }
}

/// Starting protection of one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationDefinition {
    /// Front-facing armor.
    pub armor: u32,

    /// Rear armor (mech torsos only).
    #[serde(default)]
    pub rear_armor: u32,

    /// Internal structure. For troopers, 1 means the trooper exists.
    pub internal: u32,
}

impl LocationDefinition {
    /// Create a location definition without rear armor.
    #[must_use]
    pub const fn new(armor: u32, internal: u32) -> Self {
        Self {
            armor,
            rear_armor: 0,
            internal,
        }
    }

    /// Builder: set rear armor.
    #[must_use]
    pub const fn with_rear(mut self, rear_armor: u32) -> Self {
        self.rear_armor = rear_armor;
        self
    }
}

/// One piece of equipment mounted on a unit definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDefinition {
    /// Weapon or equipment identifier (or lookup name).
    pub equipment: String,

    /// Location index the item is installed in.
    pub location: usize,

    /// Starting shots; defaults from the weapon when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<u32>,
}

impl MountDefinition {
    /// Create a mount with default ammunition.
    #[must_use]
    pub fn new(equipment: impl Into<String>, location: usize) -> Self {
        Self {
            equipment: equipment.into(),
            location,
            shots: None,
        }
    }

    /// Builder: override starting shots.
    #[must_use]
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = Some(shots);
        self
    }
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitDefinition(
///     id: "HBK-4G",
///     name: "Hunchback HBK-4G",
///     kind: Mech,
///     tonnage: 50,
///     walk_mp: 4,
///     heat_sinks: 13,
///     crew: Crew(gunnery: 4, piloting: 5),
///     locations: [
///         LocationDefinition(armor: 9, internal: 3),
///         // ...
///     ],
///     equipment: [
///         MountDefinition(equipment: "ISAC20", location: 2),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Unique type identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit kind.
    pub kind: UnitKind,

    /// Mass in tons.
    pub tonnage: u32,

    /// Clan technology base.
    #[serde(default)]
    pub clan: bool,

    /// Powered armor able to operate underwater.
    #[serde(default)]
    pub amphibious: bool,

    /// Walking MP (safe thrust for aerospace).
    pub walk_mp: u32,

    /// Jumping MP.
    #[serde(default)]
    pub jump_mp: u32,

    /// Heat sinks (heat dissipated per round while intact).
    #[serde(default)]
    pub heat_sinks: u32,

    /// Default crew.
    #[serde(default)]
    pub crew: Crew,

    /// Per-location protection, in location-index order.
    pub locations: Vec<LocationDefinition>,

    /// Mounted equipment.
    #[serde(default)]
    pub equipment: Vec<MountDefinition>,
}

impl UnitDefinition {
    /// Total internal structure across all locations.
    #[must_use]
    pub fn total_internal(&self) -> u32 {
        self.locations.iter().map(|l| l.internal).sum()
    }
}
