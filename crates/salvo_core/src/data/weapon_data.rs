//! Weapon and equipment data structures.

use serde::{Deserialize, Serialize};

/// Broad weapon family, deciding how damage is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Lasers, PPCs: full damage in one location, no ammunition.
    Energy,
    /// Autocannon and rifles: full damage in one location, uses ammunition.
    Ballistic,
    /// Long-range missile rack: 1 damage per missile, 5-point clusters.
    Lrm,
    /// Short-range missile rack: 2 damage per missile, 2-point clusters.
    Srm,
}

impl WeaponKind {
    /// Whether this kind rolls on the cluster table.
    #[must_use]
    pub const fn is_missile(self) -> bool {
        matches!(self, Self::Lrm | Self::Srm)
    }

    /// Damage grouping for missile hits, `None` for single-location kinds.
    #[must_use]
    pub const fn cluster_group(self) -> Option<u32> {
        match self {
            Self::Lrm => Some(5),
            Self::Srm => Some(2),
            Self::Energy | Self::Ballistic => None,
        }
    }
}

/// Data-driven weapon definition.
///
/// # Example RON
///
/// ```ron
/// WeaponDefinition(
///     id: "ISAC20",
///     name: "AC/20",
///     lookup_names: ["IS Auto Cannon/20", "IS Autocannon/20"],
///     kind: Ballistic,
///     heat: 7,
///     damage: 20,
///     short_range: 3,
///     medium_range: 6,
///     long_range: 9,
///     criticals: 10,
///     ammo_per_ton: Some(5),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDefinition {
    /// Unique type identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Alternate names accepted when resolving unit equipment lists.
    #[serde(default)]
    pub lookup_names: Vec<String>,

    /// Weapon family.
    pub kind: WeaponKind,

    /// Heat generated per shot.
    pub heat: u32,

    /// Damage per shot, or per missile for missile racks.
    pub damage: u32,

    /// Missiles per salvo (missile racks only).
    #[serde(default)]
    pub rack_size: u32,

    /// Minimum range; attacks at or inside it take a penalty.
    #[serde(default)]
    pub min_range: u32,

    /// Upper bound of short range.
    pub short_range: u32,

    /// Upper bound of medium range.
    pub medium_range: u32,

    /// Upper bound of long range.
    pub long_range: u32,

    /// Upper bound of extreme range (informational; attacks stop at long).
    #[serde(default)]
    pub extreme_range: u32,

    /// Critical slots occupied.
    pub criticals: u32,

    /// Shots per ton of ammunition; `None` for weapons without ammunition.
    #[serde(default)]
    pub ammo_per_ton: Option<u32>,

    /// Fires once per game.
    #[serde(default)]
    pub one_shot: bool,

    /// Streak launcher: all missiles hit, nothing is spent on a miss.
    #[serde(default)]
    pub streak: bool,

    /// Disposable pack that burdens powered armor until spent.
    #[serde(default)]
    pub disposable: bool,
}

impl WeaponDefinition {
    /// Whether this weapon consumes ammunition or a one-shot charge.
    #[must_use]
    pub fn uses_ammo(&self) -> bool {
        self.ammo_per_ton.is_some() || self.one_shot
    }

    /// Check if `name` refers to this weapon.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.id == name || self.name == name || self.lookup_names.iter().any(|n| n == name)
    }

    /// Total damage when every missile (or the single shot) hits.
    #[must_use]
    pub fn full_damage(&self) -> u32 {
        if self.kind.is_missile() {
            self.damage * self.rack_size
        } else {
            self.damage
        }
    }
}

/// What a piece of non-weapon equipment does when it matters to the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiscKind {
    /// Dissipates one point of heat per round while intact.
    HeatSink,
    /// Fusion engine; every destroyed slot adds 5 heat per round.
    Engine,
    /// Gyro.
    Gyro,
    /// Sensors; every destroyed slot is a sensor hit.
    Sensors,
    /// Cockpit.
    Cockpit,
    /// Avionics (aerospace); every destroyed slot is an avionics hit.
    Avionics,
    /// Arm actuator; destroyed actuators hamper punches.
    ArmActuator,
    /// Leg actuator; destroyed actuators hamper kicks.
    LegActuator,
    /// Jump jet; every destroyed jet removes one jump MP.
    JumpJet,
    /// Anything else.
    Other,
}

/// Data-driven definition of non-weapon equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscDefinition {
    /// Unique type identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Rules role.
    pub kind: MiscKind,

    /// Critical slots occupied.
    pub criticals: u32,
}
