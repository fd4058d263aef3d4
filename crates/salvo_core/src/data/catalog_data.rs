//! Catalog file structure combining every static definition.

use serde::{Deserialize, Serialize};

use super::ram_data::RamModifiers;
use super::unit_data::UnitDefinition;
use super::weapon_data::{MiscDefinition, WeaponDefinition};

/// Complete catalog file.
///
/// # Example RON
///
/// ```ron
/// CatalogData(
///     weapons: [...],
///     equipment: [...],
///     units: [...],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Weapon definitions.
    #[serde(default)]
    pub weapons: Vec<WeaponDefinition>,

    /// Non-weapon equipment definitions.
    #[serde(default)]
    pub equipment: Vec<MiscDefinition>,

    /// Unit definitions.
    #[serde(default)]
    pub units: Vec<UnitDefinition>,

    /// Ram modifier overrides; the standard table when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_modifiers: Option<RamModifiers>,
}
