//! `bios verify`

use super::{load_catalogs, open_store, select_catalog};
use crate::config::BiosConfig;
use anyhow::Result;
use bios_asset::Verification;

/// Returns whether the file is valid
pub fn run(config: &BiosConfig, name: &str, core: Option<&str>) -> Result<bool> {
    let catalogs = load_catalogs(config)?;
    let catalog = select_catalog(&catalogs, core)?;
    let descriptor = catalog.require_by_name(name)?;

    let store = open_store(config);
    let verification = store.inspect(descriptor);
    let purge_note = match &verification {
        Verification::Mismatch {
            trashed: Some(dest),
            ..
        } => Some(format!("moved to {}", dest.display())),
        Verification::Mismatch { trashed: None, .. } => {
            Some("could not move it to the trash; the file is still in the store".to_string())
        }
        _ => None,
    };

    match verification.into_result(descriptor) {
        Ok(()) => {
            println!("{}: OK", name);
            Ok(true)
        }
        Err(e) => {
            println!("{}: {}", name, e);
            if let Some(note) = purge_note {
                println!("  {}", note);
            }
            Ok(false)
        }
    }
}
