//! RON data loader
//!
//! Loads `elements.ron` and `synergies.ron`, with fallback to hardcoded defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::elements::SynergyTable;
use super::config::{ConfigError, ElementsConfig};
use super::synergies::{default_synergy_defs, SynergyDefs};

pub const ELEMENTS_FILE: &str = "elements.ron";
pub const SYNERGIES_FILE: &str = "synergies.ron";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ELEMANCY_DATA";

/// Manages all external engine data
#[derive(Debug, Clone, PartialEq)]
pub struct DataManager {
    pub config: ElementsConfig,
    pub synergies: SynergyDefs,
}

impl DataManager {
    /// Load from [`config_directory`], using defaults for anything unusable
    pub fn new() -> Self {
        Self::load_from(config_directory())
    }

    /// Load from `dir`. Missing, unreadable, unparsable or invalid files are
    /// logged and replaced by their defaults.
    pub fn load_from(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();

        let config = match load_config(dir) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}. Using default engine config.", e);
                ElementsConfig::default()
            }
        };
        let synergies = match load_synergies(dir) {
            Ok(synergies) => synergies,
            Err(e) => {
                log::warn!("{}. Using default synergies.", e);
                default_synergy_defs()
            }
        };

        Self { config, synergies }
    }

    /// Load from `dir`, surfacing any problem except a missing file
    pub fn load_strict(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        Ok(Self {
            config: load_config(dir)?,
            synergies: load_synergies(dir)?,
        })
    }

    /// Runtime synergy table
    pub fn synergy_table(&self) -> SynergyTable {
        self.synergies.to_table().unwrap_or_else(|e| {
            log::warn!("{}. Using default synergies.", e);
            SynergyTable::with_defaults()
        })
    }
}

impl Default for DataManager {
    fn default() -> Self {
        Self {
            config: ElementsConfig::default(),
            synergies: default_synergy_defs(),
        }
    }
}

fn load_config(dir: &Path) -> Result<ElementsConfig, ConfigError> {
    let config: ElementsConfig = read_ron(&dir.join(ELEMENTS_FILE))?.unwrap_or_default();
    config.validate()?;
    Ok(config)
}

fn load_synergies(dir: &Path) -> Result<SynergyDefs, ConfigError> {
    let defs: SynergyDefs = read_ron(&dir.join(SYNERGIES_FILE))?.unwrap_or_else(default_synergy_defs);
    defs.to_table()?;
    Ok(defs)
}

/// Parse a RON file. `Ok(None)` when it does not exist.
fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if !path.exists() {
        log::debug!("{} not found, using defaults", path.display());
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded {}", path.display());
    Ok(Some(value))
}

fn write_ron<T: Serialize>(path: &Path, value: &T, what: &'static str) -> Result<(), ConfigError> {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|source| ConfigError::Serialize { what, source })?;
    fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Export all default data to RON files for easy editing
pub fn export_default_data(dir: impl AsRef<Path>) -> Result<(), ConfigError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    write_ron(&dir.join(ELEMENTS_FILE), &ElementsConfig::default(), "engine config")?;
    write_ron(&dir.join(SYNERGIES_FILE), &default_synergy_defs(), "synergies")?;

    log::info!("Exported default data to {}", dir.display());
    Ok(())
}

/// Where data files are looked up: `$ELEMANCY_DATA`, then `./assets/data`,
/// then the platform config directory
pub fn config_directory() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let local = PathBuf::from("assets/data");
    if local.is_dir() {
        return local;
    }
    if let Some(proj_dirs) = ProjectDirs::from("com", "elemancy", "Elemancy") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, SynergyKind};

    #[test]
    fn test_missing_files_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(DataManager::load_from(dir.path()), DataManager::default());
        assert_eq!(DataManager::load_strict(dir.path()).unwrap(), DataManager::default());
    }

    #[test]
    fn test_export_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");
        export_default_data(&nested).unwrap();

        assert!(nested.join(ELEMENTS_FILE).exists());
        assert!(nested.join(SYNERGIES_FILE).exists());

        let data = DataManager::load_strict(&nested).unwrap();
        assert_eq!(data, DataManager::default());
        assert_eq!(data.synergy_table().len(), 3);
    }

    #[test]
    fn test_edited_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(ELEMENTS_FILE),
            "(manager: (reaction_delay: 1.0), ambient: (probability: 0.25))",
        )
        .unwrap();

        let data = DataManager::load_strict(dir.path()).unwrap();
        assert_eq!(data.config.manager.reaction_delay, 1.0);
        assert_eq!(data.config.ambient.probability, 0.25);
        assert_eq!(data.config.ambient.elements.len(), 3);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ELEMENTS_FILE), "(manager: [oops").unwrap();

        assert!(matches!(
            DataManager::load_strict(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(DataManager::load_from(dir.path()).config, ElementsConfig::default());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ELEMENTS_FILE), "(effects: (freeze_duration: 0.0))").unwrap();

        assert!(matches!(
            DataManager::load_strict(dir.path()),
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(DataManager::load_from(dir.path()).config.effects.freeze_duration, 3.0);
    }

    #[test]
    fn test_duplicate_synergy_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SYNERGIES_FILE),
            "(synergies: [(a: Fire, b: Wind, kind: Positive), (a: Wind, b: Fire, kind: Negative)])",
        )
        .unwrap();

        assert!(DataManager::load_strict(dir.path()).is_err());
        let table = DataManager::load_from(dir.path()).synergy_table();
        assert_eq!(table.kind_of(ElementKind::Fire, ElementKind::Wind), SynergyKind::Positive);
        assert_eq!(table.len(), 3);
    }
}
