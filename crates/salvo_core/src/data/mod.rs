//! Data structures for the static catalog and scenarios.
//!
//! This module contains pure data structures that define units, weapons,
//! equipment and scenarios. All structs are designed to be deserialized from
//! RON files.
//!
//! **Note:** This module contains no IO - loading and validation live in
//! [`crate::catalog`] and [`crate::scenario`].

mod catalog_data;
mod ram_data;
mod scenario_data;
mod unit_data;
mod weapon_data;

pub use catalog_data::CatalogData;
pub use ram_data::{ClassModifiers, RamModifiers};
pub use scenario_data::{BoardData, PlacementData, PlayerData, ScenarioData, TileData};
pub use unit_data::{Crew, LocationDefinition, MountDefinition, UnitDefinition};
pub use weapon_data::{MiscDefinition, MiscKind, WeaponDefinition, WeaponKind};
