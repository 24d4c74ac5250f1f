//! Layered configuration
//!
//! Paths are resolved with this precedence (highest wins):
//! 1. Command-line flags
//! 2. Environment variables: `BIOS_STORE_DIR`, `BIOS_TRASH_DIR`, `BIOS_CATALOG_DIR`
//! 3. Project-local: `.bios/config.toml`
//! 4. Global: `~/.bios/config.toml`
//! 5. Defaults under the platform data directory

use bios_core::{BiosError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const STORE_ENV: &str = "BIOS_STORE_DIR";
const TRASH_ENV: &str = "BIOS_TRASH_DIR";
const CATALOG_ENV: &str = "BIOS_CATALOG_DIR";

/// `[paths]` table of a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub store: Option<PathBuf>,
    #[serde(default)]
    pub trash: Option<PathBuf>,
    #[serde(default)]
    pub catalogs: Option<PathBuf>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BiosConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiosConfig {
    pub store_dir: PathBuf,
    pub trash_dir: PathBuf,
    pub catalog_dir: PathBuf,
}

/// Command-line path overrides
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store: Option<PathBuf>,
    pub trash: Option<PathBuf>,
    pub catalogs: Option<PathBuf>,
}

impl BiosConfig {
    /// Load config with layered precedence: defaults < global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = BiosConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".bios/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path only, plus environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::load_from_file_with_env(path, |key| std::env::var(key).ok())
    }

    fn load_from_file_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config, env);
        Ok(Self::resolve(config))
    }

    /// Apply command-line flags on top of the loaded layers
    pub fn apply_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(store) = overrides.store {
            self.store_dir = store;
        }
        if let Some(trash) = overrides.trash {
            self.trash_dir = trash;
        }
        if let Some(catalogs) = overrides.catalogs {
            self.catalog_dir = catalogs;
        }
        self
    }

    fn resolve(file: BiosConfigFile) -> Self {
        let base = Self::default_base_dir();
        Self {
            store_dir: file.paths.store.unwrap_or_else(|| base.join("store")),
            trash_dir: file.paths.trash.unwrap_or_else(|| base.join("trash")),
            catalog_dir: file.paths.catalogs.unwrap_or_else(|| base.join("catalogs")),
        }
    }

    fn default_base_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("bios"))
            .unwrap_or_else(|| PathBuf::from(".bios"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".bios").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<BiosConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: BiosConfigFile = toml::from_str(&content).map_err(|e| {
            BiosError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut BiosConfigFile, overlay: BiosConfigFile) {
        if overlay.paths.store.is_some() {
            base.paths.store = overlay.paths.store;
        }
        if overlay.paths.trash.is_some() {
            base.paths.trash = overlay.paths.trash;
        }
        if overlay.paths.catalogs.is_some() {
            base.paths.catalogs = overlay.paths.catalogs;
        }
    }

    fn apply_env_overrides(config: &mut BiosConfigFile, env: impl Fn(&str) -> Option<String>) {
        if let Some(store) = env(STORE_ENV) {
            config.paths.store = Some(PathBuf::from(store));
        }
        if let Some(trash) = env(TRASH_ENV) {
            config.paths.trash = Some(PathBuf::from(trash));
        }
        if let Some(catalogs) = env(CATALOG_ENV) {
            config.paths.catalogs = Some(PathBuf::from(catalogs));
        }
    }
}
