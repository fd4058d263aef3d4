//! Static unit, weapon and equipment catalog.
//!
//! The catalog is read-only once built. Games share it through an `Arc`
//! and resolve every mounted item and unit type through it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::data::{
    CatalogData, MiscDefinition, MiscKind, RamModifiers, UnitDefinition, WeaponDefinition,
    WeaponKind,
};
use crate::error::{GameError, Result};
use crate::location::{location_count, slot_count};
use crate::unit_kind::UnitKind;

/// Resolved catalog entry for a mounted item.
#[derive(Debug, Clone, Copy)]
pub enum EquipmentRef<'a> {
    /// A weapon.
    Weapon(&'a WeaponDefinition),
    /// Non-weapon equipment.
    Misc(&'a MiscDefinition),
}

impl EquipmentRef<'_> {
    /// Canonical identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Weapon(w) => &w.id,
            Self::Misc(m) => &m.id,
        }
    }

    /// Critical slots the item needs on a unit of `kind`.
    ///
    /// Powered armor mounts every item in a single slot.
    #[must_use]
    pub fn criticals_on(&self, kind: UnitKind) -> u32 {
        if kind == UnitKind::BattleArmor {
            return 1;
        }
        match self {
            Self::Weapon(w) => w.criticals,
            Self::Misc(m) => m.criticals,
        }
    }
}

/// Registry of static definitions keyed by type identifier.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    units: BTreeMap<String, UnitDefinition>,
    weapons: BTreeMap<String, WeaponDefinition>,
    equipment: BTreeMap<String, MiscDefinition>,
    ram_modifiers: RamModifiers,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in weapons and equipment, no units.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for weapon in builtin_weapons() {
            catalog.weapons.insert(weapon.id.clone(), weapon);
        }
        for misc in builtin_equipment() {
            catalog.equipment.insert(misc.id.clone(), misc);
        }
        catalog
    }

    /// Build a catalog from parsed data, on top of the built-ins, and
    /// validate it.
    pub fn from_data(data: CatalogData) -> Result<Self> {
        let mut catalog = Self::builtin();
        for weapon in data.weapons {
            catalog.weapons.insert(weapon.id.clone(), weapon);
        }
        for misc in data.equipment {
            catalog.equipment.insert(misc.id.clone(), misc);
        }
        for unit in data.units {
            if catalog.units.contains_key(&unit.id) {
                return Err(GameError::Catalog(format!("duplicate unit id '{}'", unit.id)));
            }
            catalog.units.insert(unit.id.clone(), unit);
        }
        if let Some(ram) = data.ram_modifiers {
            catalog.ram_modifiers = ram;
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let data: CatalogData = ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_data(data)
    }

    /// Load a catalog from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let data: CatalogData = ron::from_str(&content).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let catalog = Self::from_data(data)?;
        info!(
            path = %path.display(),
            units = catalog.units.len(),
            weapons = catalog.weapons.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Add or replace a unit definition after validating it.
    pub fn insert_unit(&mut self, unit: UnitDefinition) -> Result<()> {
        self.validate_unit(&unit)?;
        debug!(unit = %unit.id, "Registered unit definition");
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Builder form of [`Catalog::insert_unit`].
    pub fn with_unit(mut self, unit: UnitDefinition) -> Result<Self> {
        self.insert_unit(unit)?;
        Ok(self)
    }

    /// Add or replace a weapon definition.
    pub fn insert_weapon(&mut self, weapon: WeaponDefinition) {
        self.weapons.insert(weapon.id.clone(), weapon);
    }

    /// Replace the ram modifier table.
    pub fn set_ram_modifiers(&mut self, modifiers: RamModifiers) {
        self.ram_modifiers = modifiers;
    }

    /// Unit definition by id.
    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&UnitDefinition> {
        self.units.get(id)
    }

    /// Weapon by id or any of its lookup names.
    #[must_use]
    pub fn weapon(&self, name: &str) -> Option<&WeaponDefinition> {
        self.weapons
            .get(name)
            .or_else(|| self.weapons.values().find(|w| w.answers_to(name)))
    }

    /// Equipment by id.
    #[must_use]
    pub fn misc(&self, id: &str) -> Option<&MiscDefinition> {
        self.equipment.get(id)
    }

    /// Resolve a mounted item name to its definition.
    #[must_use]
    pub fn equipment(&self, name: &str) -> Option<EquipmentRef<'_>> {
        self.weapon(name)
            .map(EquipmentRef::Weapon)
            .or_else(|| self.misc(name).map(EquipmentRef::Misc))
    }

    /// Ram modifier table.
    #[must_use]
    pub const fn ram_modifiers(&self) -> &RamModifiers {
        &self.ram_modifiers
    }

    /// All unit definitions in id order.
    pub fn units(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.units.values()
    }

    /// All weapon definitions in id order.
    pub fn weapons(&self) -> impl Iterator<Item = &WeaponDefinition> {
        self.weapons.values()
    }

    /// Check every definition for internal consistency.
    pub fn validate(&self) -> Result<()> {
        for weapon in self.weapons.values() {
            validate_weapon(weapon)?;
        }
        for unit in self.units.values() {
            self.validate_unit(unit)?;
        }
        Ok(())
    }

    fn validate_unit(&self, unit: &UnitDefinition) -> Result<()> {
        let expected = location_count(unit.kind, unit.clan);
        if unit.locations.len() != expected {
            return Err(GameError::Catalog(format!(
                "unit '{}' ({}) has {} locations, expected {expected}",
                unit.id,
                unit.kind,
                unit.locations.len()
            )));
        }
        if unit.tonnage == 0 {
            return Err(GameError::Catalog(format!("unit '{}' has zero tonnage", unit.id)));
        }

        let mut used = vec![0u32; expected];
        for mount in &unit.equipment {
            let item = self.equipment(&mount.equipment).ok_or_else(|| {
                GameError::Catalog(format!(
                    "unit '{}' mounts unknown equipment '{}'",
                    unit.id, mount.equipment
                ))
            })?;
            let Some(slot) = used.get_mut(mount.location) else {
                return Err(GameError::Catalog(format!(
                    "unit '{}' mounts '{}' in missing location {}",
                    unit.id, mount.equipment, mount.location
                )));
            };
            *slot += item.criticals_on(unit.kind);
            if *slot as usize > slot_count(unit.kind, mount.location) {
                return Err(GameError::LocationFull {
                    unit: unit.id.clone(),
                    location: mount.location,
                    equipment: mount.equipment.clone(),
                });
            }
        }
        Ok(())
    }
}

fn validate_weapon(weapon: &WeaponDefinition) -> Result<()> {
    let ranges_ordered = weapon.short_range <= weapon.medium_range
        && weapon.medium_range <= weapon.long_range
        && weapon.short_range > 0;
    if !ranges_ordered {
        return Err(GameError::Catalog(format!(
            "weapon '{}' has unordered range brackets",
            weapon.id
        )));
    }
    if weapon.kind.is_missile() && weapon.rack_size == 0 {
        return Err(GameError::Catalog(format!(
            "missile weapon '{}' has no rack size",
            weapon.id
        )));
    }
    Ok(())
}

fn weapon(
    id: &str,
    name: &str,
    kind: WeaponKind,
    heat: u32,
    damage: u32,
    rack_size: u32,
    ranges: [u32; 5],
    criticals: u32,
) -> WeaponDefinition {
    let [min_range, short_range, medium_range, long_range, extreme_range] = ranges;
    WeaponDefinition {
        id: id.to_string(),
        name: name.to_string(),
        lookup_names: Vec::new(),
        kind,
        heat,
        damage,
        rack_size,
        min_range,
        short_range,
        medium_range,
        long_range,
        extreme_range,
        criticals,
        ammo_per_ton: None,
        one_shot: false,
        streak: false,
        disposable: false,
    }
}

fn builtin_weapons() -> Vec<WeaponDefinition> {
    let names = |list: &[&str]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
    vec![
        WeaponDefinition {
            lookup_names: names(&["IS Auto Cannon/20", "ISAC20", "IS Autocannon/20"]),
            ammo_per_ton: Some(5),
            ..weapon("ISAC20", "Auto Cannon/20", WeaponKind::Ballistic, 7, 20, 20, [0, 3, 6, 9, 12], 10)
        },
        WeaponDefinition {
            lookup_names: names(&["Clan OS LRM-10", "Clan LRM 10 (OS)"]),
            one_shot: true,
            ..weapon("CLLRM10OS", "LRM 10 (OS)", WeaponKind::Lrm, 4, 1, 10, [0, 7, 14, 21, 28], 1)
        },
        WeaponDefinition {
            lookup_names: names(&["Clan Streak LRM-18 (OS)", "Clan Streak LRM 18 (OS)"]),
            one_shot: true,
            streak: true,
            ..weapon("CLStreakLRM18OS", "Streak LRM 18 (OS)", WeaponKind::Lrm, 0, 1, 18, [0, 7, 14, 21, 28], 1)
        },
        WeaponDefinition {
            lookup_names: names(&["IS Medium Laser", "ISMediumLaser"]),
            ..weapon("ISMediumLaser", "Medium Laser", WeaponKind::Energy, 3, 5, 0, [0, 3, 6, 9, 12], 1)
        },
        WeaponDefinition {
            lookup_names: names(&["IS Large Laser"]),
            ..weapon("ISLargeLaser", "Large Laser", WeaponKind::Energy, 8, 8, 0, [0, 5, 10, 15, 20], 2)
        },
        WeaponDefinition {
            lookup_names: names(&["IS LRM-10", "IS LRM 10"]),
            ammo_per_ton: Some(12),
            ..weapon("ISLRM10", "LRM 10", WeaponKind::Lrm, 4, 1, 10, [6, 7, 14, 21, 28], 2)
        },
        WeaponDefinition {
            lookup_names: names(&["IS SRM-6", "IS SRM 6"]),
            ammo_per_ton: Some(15),
            ..weapon("ISSRM6", "SRM 6", WeaponKind::Srm, 4, 2, 6, [0, 3, 6, 9, 12], 2)
        },
        WeaponDefinition {
            lookup_names: names(&["BA-SRM2 (one shot)", "BA-SRM2 (one shot) Ammo"]),
            one_shot: true,
            disposable: true,
            ..weapon("BASRM2OS", "SRM 2 (OS)", WeaponKind::Srm, 0, 2, 2, [0, 3, 6, 9, 12], 1)
        },
        WeaponDefinition {
            lookup_names: names(&["BA Small Laser"]),
            ..weapon("BASmallLaser", "Small Laser", WeaponKind::Energy, 0, 3, 0, [0, 1, 2, 3, 4], 1)
        },
    ]
}

fn builtin_equipment() -> Vec<MiscDefinition> {
    [
        ("HeatSink", "Heat Sink", MiscKind::HeatSink, 1),
        ("Engine", "Fusion Engine", MiscKind::Engine, 1),
        ("Gyro", "Gyro", MiscKind::Gyro, 1),
        ("Sensors", "Sensors", MiscKind::Sensors, 1),
        ("Cockpit", "Cockpit", MiscKind::Cockpit, 1),
        ("Avionics", "Avionics", MiscKind::Avionics, 1),
        ("ArmActuator", "Arm Actuator", MiscKind::ArmActuator, 1),
        ("LegActuator", "Leg Actuator", MiscKind::LegActuator, 1),
        ("JumpJet", "Jump Jet", MiscKind::JumpJet, 1),
    ]
    .into_iter()
    .map(|(id, name, kind, criticals)| MiscDefinition {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        criticals,
    })
    .collect()
}
