//! `bios check`

use super::{load_catalogs, open_store, select_catalog, Format};
use crate::config::BiosConfig;
use anyhow::Result;
use bios_asset::RequirementChecker;

/// Returns whether every mandatory file for the core is present
pub fn run(config: &BiosConfig, core: &str, format: Format) -> Result<bool> {
    let catalogs = load_catalogs(config)?;
    let catalog = select_catalog(&catalogs, Some(core))?;
    let store = open_store(config);

    let report = RequirementChecker::new(&store).check_all(catalog.descriptors());

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => {
            if report.satisfied {
                println!("All required BIOS files for '{}' are present.", core);
            } else {
                println!("Missing required BIOS files for '{}':", core);
                for (name, description) in report.missing_descriptions() {
                    println!("  {}  {}", name, description);
                }
                println!("Drop the files onto `bios import` to add them.");
            }
        }
    }
    Ok(report.satisfied)
}
