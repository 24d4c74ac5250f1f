//! CLI command implementations

pub mod check;
pub mod import;
pub mod list;
pub mod remove;
pub mod verify;

use crate::config::BiosConfig;
use anyhow::{Context, Result};
use bios_asset::{Catalog, CatalogSet, ManagedStore};

/// Output format shared by the reporting commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Json,
}

pub(crate) fn open_store(config: &BiosConfig) -> ManagedStore {
    ManagedStore::new(&config.store_dir, &config.trash_dir)
}

pub(crate) fn load_catalogs(config: &BiosConfig) -> Result<CatalogSet> {
    CatalogSet::load_from_directory(&config.catalog_dir).with_context(|| {
        format!(
            "Failed to load core catalogs from {}",
            config.catalog_dir.display()
        )
    })
}

/// The catalog for one core, or every core combined when none is named
pub(crate) fn select_catalog(catalogs: &CatalogSet, core: Option<&str>) -> Result<Catalog> {
    match core {
        Some(id) => Ok(catalogs.require(id)?.catalog.clone()),
        None => Ok(catalogs.combined()),
    }
}
