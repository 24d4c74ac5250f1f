//! BIOS Asset - Verified storage for emulator BIOS files
//!
//! This crate recognizes BIOS files by content digest, copies them into a
//! single managed directory under their canonical names, and reports
//! whether a core's mandatory files are present and intact.

mod catalog;
mod events;
mod pipeline;
mod requirements;
mod store;
mod trash;
mod types;

pub use catalog::{Catalog, CatalogSet, CoreCatalog};
pub use events::{EventLog, ImportEvent, ImportEvents, ImportListener};
pub use pipeline::{ImportOutcome, ImportPipeline, ImportRecord, ImportSummary};
pub use requirements::{RequirementChecker, RequirementReport};
pub use store::{ManagedStore, Verification};
pub use trash::{DirectoryTrash, Trash};
pub use types::{AssetDescriptor, CoreCatalogFile, CoreInfo};
