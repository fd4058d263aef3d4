//! Data validation utilities.
//!
//! An asset directory holds `data/catalog.ron` and any number of scenarios
//! under `scenarios/`. Every scenario is built against the catalog and
//! started, so a file that passes here will also load on the server.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use salvo_core::catalog::Catalog;
use salvo_core::error::GameError;
use salvo_core::scenario::Scenario;

/// Validation could not run at all.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Directory listing failed.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Directory that could not be read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog itself is broken, so no scenario can be checked.
    #[error("catalog '{path}' is invalid: {source}")]
    Catalog {
        /// Catalog file.
        path: String,
        /// Underlying error.
        #[source]
        source: GameError,
    },
}

/// A scenario that built and started cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSummary {
    /// Scenario id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Board width and height.
    pub board: (u32, u32),
    /// Number of players.
    pub players: usize,
    /// Number of deployed units.
    pub units: usize,
}

impl fmt::Display for ScenarioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}x{} board, {} players, {} units",
            self.id, self.name, self.board.0, self.board.1, self.players, self.units
        )
    }
}

/// Outcome of validating an asset directory.
#[derive(Debug)]
pub struct ValidationReport {
    /// Catalog file used, `None` for the built-in data.
    pub catalog: Option<PathBuf>,
    /// Unit definitions in the catalog.
    pub units: usize,
    /// Weapon definitions in the catalog.
    pub weapons: usize,
    /// Every scenario file and what became of it.
    pub scenarios: Vec<(PathBuf, Result<ScenarioSummary, GameError>)>,
}

impl ValidationReport {
    /// Whether every scenario passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.scenarios.iter().all(|(_, result)| result.is_ok())
    }

    /// Scenarios that failed.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &GameError)> {
        self.scenarios
            .iter()
            .filter_map(|(path, result)| result.as_ref().err().map(|e| (path.as_path(), e)))
    }
}

/// Build `path` against `catalog` and play it up to the first turn.
pub fn validate_scenario(path: &Path, catalog: Arc<Catalog>) -> Result<ScenarioSummary, GameError> {
    let scenario = Scenario::load(path)?;
    scenario.check_units(&catalog)?;
    let mut game = scenario.build_seeded(catalog)?;
    game.state().validate()?;
    game.start()?;
    if let Some(reason) = game.halt_reason() {
        return Err(GameError::Halted(reason.to_string()));
    }

    let data = scenario.data();
    Ok(ScenarioSummary {
        id: scenario.id().to_string(),
        name: scenario.name().to_string(),
        board: (data.board.width, data.board.height),
        players: data.players.len(),
        units: data.units.len(),
    })
}

/// Validate all RON data files in an asset directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or the catalog is
/// invalid. Individual scenario failures are collected in the report.
pub fn validate_data_directory(root: &Path) -> Result<ValidationReport, ValidationError> {
    let catalog_path = root.join("data").join("catalog.ron");
    let (catalog, catalog_file) = if catalog_path.exists() {
        let catalog = Catalog::load(&catalog_path).map_err(|source| ValidationError::Catalog {
            path: catalog_path.display().to_string(),
            source,
        })?;
        (catalog, Some(catalog_path))
    } else {
        warn!(path = %catalog_path.display(), "no catalog file, checking against built-in data");
        (Catalog::builtin(), None)
    };
    let catalog = Arc::new(catalog);

    let mut report = ValidationReport {
        catalog: catalog_file,
        units: catalog.units().count(),
        weapons: catalog.weapons().count(),
        scenarios: Vec::new(),
    };

    let scenario_dir = root.join("scenarios");
    if !scenario_dir.is_dir() {
        info!(path = %scenario_dir.display(), "no scenarios directory");
        return Ok(report);
    }
    for path in ron_files(&scenario_dir)? {
        debug!(path = %path.display(), "validating scenario");
        let result = validate_scenario(&path, Arc::clone(&catalog));
        match &result {
            Ok(summary) => info!(%summary, "scenario ok"),
            Err(e) => warn!(path = %path.display(), error = %e, "scenario failed"),
        }
        report.scenarios.push((path, result));
    }
    Ok(report)
}

/// `.ron` files directly under `dir`, sorted by name.
fn ron_files(dir: &Path) -> Result<Vec<PathBuf>, ValidationError> {
    let io_error = |source| ValidationError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_test_utils::fixtures;

    fn asset_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::create_dir_all(dir.path().join("scenarios")).unwrap();
        fs::write(
            dir.path().join("data").join("catalog.ron"),
            fixtures::STANDARD_CATALOG,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_shipped_assets_pass() {
        let dir = asset_dir();
        let scenarios = dir.path().join("scenarios");
        fs::write(scenarios.join("duel.ron"), fixtures::DUEL).unwrap();
        fs::write(scenarios.join("ridge_line.ron"), fixtures::RIDGE_LINE).unwrap();
        fs::write(scenarios.join("notes.txt"), "not a scenario").unwrap();

        let report = validate_data_directory(dir.path()).unwrap();
        assert!(report.is_ok());
        assert!(report.catalog.is_some());
        assert!(report.units >= 9);
        assert_eq!(report.scenarios.len(), 2);
        let duel = report.scenarios[0].1.as_ref().unwrap();
        assert_eq!(duel.id, "duel");
        assert_eq!(duel.players, 2);
        assert_eq!(duel.board, (12, 12));
    }

    #[test]
    fn test_unknown_unit_type_is_reported() {
        let dir = asset_dir();
        let broken = fixtures::DUEL.replace("WVR-6R", "NOT-A-MECH");
        fs::write(dir.path().join("scenarios").join("broken.ron"), broken).unwrap();

        let report = validate_data_directory(dir.path()).unwrap();
        assert!(!report.is_ok());
        let (path, error) = report.failures().next().unwrap();
        assert!(path.ends_with("broken.ron"));
        assert!(error.to_string().contains("NOT-A-MECH"));
    }

    #[test]
    fn test_unparseable_scenario_is_reported() {
        let dir = asset_dir();
        fs::write(dir.path().join("scenarios").join("junk.ron"), "ScenarioData(").unwrap();
        let report = validate_data_directory(dir.path()).unwrap();
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_broken_catalog_stops_validation() {
        let dir = asset_dir();
        fs::write(dir.path().join("data").join("catalog.ron"), "CatalogData(units: 3)").unwrap();
        assert!(matches!(
            validate_data_directory(dir.path()),
            Err(ValidationError::Catalog { .. })
        ));
    }

    #[test]
    fn test_empty_directory_uses_builtin_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_data_directory(dir.path()).unwrap();
        assert!(report.catalog.is_none());
        assert_eq!(report.units, 0);
        assert!(report.weapons > 0);
        assert!(report.is_ok());
    }
}
