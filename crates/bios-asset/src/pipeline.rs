//! Importing candidate files into the managed store

use crate::catalog::Catalog;
use crate::events::{ImportEvent, ImportEvents};
use crate::store::ManagedStore;
use crate::types::AssetDescriptor;
use bios_core::ContentDigest;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of one import attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Recognized and placed in the store
    Imported {
        descriptor: AssetDescriptor,
        path: PathBuf,
    },
    /// Recognized, but the copy failed; retrying the same file re-attempts it
    CopyFailed {
        descriptor: AssetDescriptor,
        error: String,
    },
    /// Content does not match any known descriptor
    Unmatched { digest: String },
    /// The candidate could not be read
    Unreadable { error: String },
}

impl ImportOutcome {
    /// True when the file was recognized, whether or not the copy succeeded
    pub fn is_matched(&self) -> bool {
        matches!(
            self,
            ImportOutcome::Imported { .. } | ImportOutcome::CopyFailed { .. }
        )
    }

    pub fn descriptor(&self) -> Option<&AssetDescriptor> {
        match self {
            ImportOutcome::Imported { descriptor, .. }
            | ImportOutcome::CopyFailed { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }
}

/// One candidate file and what happened to it
#[derive(Debug, Clone, Serialize)]
pub struct ImportRecord {
    pub source: PathBuf,
    pub outcome: ImportOutcome,
}

/// Results of importing a batch of paths
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportSummary {
    pub records: Vec<ImportRecord>,
}

impl ImportSummary {
    pub fn imported(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Imported { .. }))
    }

    pub fn copy_failed(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::CopyFailed { .. }))
    }

    pub fn unmatched(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Unmatched { .. }))
    }

    pub fn unreadable(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Unreadable { .. }))
    }

    fn count(&self, pred: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Hash, look up, place, notify
#[derive(Debug)]
pub struct ImportPipeline {
    store: ManagedStore,
    events: ImportEvents,
}

impl ImportPipeline {
    pub fn new(store: ManagedStore) -> Self {
        Self {
            store,
            events: ImportEvents::new(),
        }
    }

    pub fn store(&self) -> &ManagedStore {
        &self.store
    }

    /// Subscribers for successful imports
    pub fn events_mut(&mut self) -> &mut ImportEvents {
        &mut self.events
    }

    /// Import `path` if its content matches a descriptor in `catalog`
    pub fn import_if_known<P: AsRef<Path>>(&self, path: P, catalog: &Catalog) -> ImportOutcome {
        let path = path.as_ref();
        match ContentDigest::from_file(path) {
            Ok(digest) => self.import_with_digest(path, &digest, catalog),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "candidate unreadable");
                ImportOutcome::Unreadable {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Same as [`import_if_known`](Self::import_if_known) with the digest already computed
    pub fn import_with_digest<P: AsRef<Path>>(
        &self,
        path: P,
        digest: &ContentDigest,
        catalog: &Catalog,
    ) -> ImportOutcome {
        let path = path.as_ref();
        let hex = digest.to_hex();

        let Some(descriptor) = catalog.find_by_digest(&hex) else {
            debug!(path = %path.display(), digest = %hex, "no catalog match");
            return ImportOutcome::Unmatched { digest: hex };
        };
        let descriptor = descriptor.clone();

        match self.store.place(path, descriptor.name()) {
            Ok(dest) => {
                info!(
                    name = descriptor.name(),
                    source = %path.display(),
                    "imported BIOS file"
                );
                let event = ImportEvent {
                    descriptor: descriptor.clone(),
                    path: dest.clone(),
                };
                self.events.emit(&event);
                ImportOutcome::Imported {
                    descriptor,
                    path: dest,
                }
            }
            Err(e) => {
                warn!(
                    name = descriptor.name(),
                    source = %path.display(),
                    error = %e,
                    "recognized BIOS file but could not copy it into the store"
                );
                ImportOutcome::CopyFailed {
                    descriptor,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Import every file under the given paths; directories are walked recursively
    pub fn import_paths<P: AsRef<Path>>(&self, paths: &[P], catalog: &Catalog) -> ImportSummary {
        let mut candidates = Vec::new();
        for path in paths {
            self.collect_candidates(path.as_ref(), &mut candidates);
        }

        let records = candidates
            .into_iter()
            .map(|source| {
                let outcome = self.import_if_known(&source, catalog);
                ImportRecord { source, outcome }
            })
            .collect();
        ImportSummary { records }
    }

    /// Paths named by the caller are followed even if they are symlinks;
    /// inside a walk, symlinked directories are skipped so link cycles
    /// cannot re-enter the tree
    fn collect_candidates(&self, path: &Path, out: &mut Vec<PathBuf>) {
        if path.is_dir() {
            self.walk_directory(path, out);
        } else {
            out.push(path.to_path_buf());
        }
    }

    fn walk_directory(&self, dir: &Path, out: &mut Vec<PathBuf>) {
        if self.is_store_root(dir) {
            debug!(path = %dir.display(), "skipping the store itself");
            return;
        }

        let mut entries: Vec<(PathBuf, fs::FileType)> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .filter_map(|e| e.file_type().ok().map(|t| (e.path(), t)))
                .collect(),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "cannot read directory");
                return;
            }
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (entry, file_type) in entries {
            let hidden = entry
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false);
            if hidden {
                continue;
            }

            if file_type.is_dir() {
                self.walk_directory(&entry, out);
            } else if file_type.is_symlink() {
                if entry.is_file() {
                    out.push(entry);
                } else {
                    debug!(path = %entry.display(), "not following directory symlink");
                }
            } else {
                out.push(entry);
            }
        }
    }

    fn is_store_root(&self, path: &Path) -> bool {
        match (fs::canonicalize(path), fs::canonicalize(self.store.root())) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
