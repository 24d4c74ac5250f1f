//! `bios import`

use super::{load_catalogs, open_store, select_catalog, Format};
use crate::config::BiosConfig;
use anyhow::Result;
use bios_asset::{EventLog, ImportOutcome, ImportPipeline};
use std::path::PathBuf;
use std::sync::Arc;

pub struct ImportArgs {
    pub paths: Vec<PathBuf>,
    pub core: Option<String>,
    pub format: Format,
}

pub fn run(config: &BiosConfig, args: ImportArgs) -> Result<()> {
    let catalogs = load_catalogs(config)?;
    let catalog = select_catalog(&catalogs, args.core.as_deref())?;
    if catalog.is_empty() {
        anyhow::bail!(
            "No BIOS descriptors known; add core catalogs to {}",
            config.catalog_dir.display()
        );
    }

    let mut pipeline = ImportPipeline::new(open_store(config));
    let log = Arc::new(EventLog::new());
    pipeline.events_mut().subscribe(log.clone());

    let summary = pipeline.import_paths(&args.paths, &catalog);

    if args.format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for record in &summary.records {
        match &record.outcome {
            ImportOutcome::Imported { descriptor, .. } => {
                println!("  imported  {} <- {}", descriptor.name(), record.source.display());
            }
            ImportOutcome::CopyFailed { descriptor, error } => {
                println!(
                    "  FAILED    {} <- {}: {}",
                    descriptor.name(),
                    record.source.display(),
                    error
                );
            }
            ImportOutcome::Unmatched { .. } => {
                println!("  skipped   {} (unknown)", record.source.display());
            }
            ImportOutcome::Unreadable { error } => {
                println!("  skipped   {} ({})", record.source.display(), error);
            }
        }
    }

    let events = log.drain();
    println!(
        "Imported {} of {} file(s) into {} ({} unknown, {} failed)",
        events.len(),
        summary.records.len(),
        pipeline.store().root().display(),
        summary.unmatched(),
        summary.copy_failed() + summary.unreadable(),
    );
    Ok(())
}
