//! `bios list`

use super::{load_catalogs, open_store, select_catalog, Format};
use crate::config::BiosConfig;
use anyhow::Result;
use bios_asset::Catalog;
use serde::Serialize;

#[derive(Serialize)]
struct Entry<'a> {
    name: &'a str,
    description: &'a str,
    optional: bool,
    present: bool,
}

pub fn run(config: &BiosConfig, core: Option<&str>, format: Format) -> Result<()> {
    let store = open_store(config);
    let catalogs = load_catalogs(config)?;

    if catalogs.is_empty() {
        // No metadata to compare against; just show what is stored
        let names = store.list()?;
        match format {
            Format::Json => println!("{}", serde_json::to_string_pretty(&names)?),
            Format::Text => {
                for name in &names {
                    println!("  {}", name);
                }
                println!("{} file(s) in {}", names.len(), store.root().display());
            }
        }
        return Ok(());
    }

    let catalog = select_catalog(&catalogs, core)?;
    // Presence only: listing never hashes or purges
    let entries: Vec<Entry> = Catalog::sorted_by_name(catalog.descriptors())
        .into_iter()
        .map(|d| Entry {
            name: d.name(),
            description: d.description(),
            optional: d.is_optional(),
            present: store.is_present(d.name()),
        })
        .collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        Format::Text => {
            for e in &entries {
                println!(
                    "  [{}] {}{}  {}",
                    if e.present { "x" } else { " " },
                    e.name,
                    if e.optional { " (optional)" } else { "" },
                    e.description
                );
            }
        }
    }
    Ok(())
}
