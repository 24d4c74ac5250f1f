//! Catalogs of known BIOS descriptors

use crate::types::{AssetDescriptor, CoreCatalogFile, CoreInfo};
use bios_core::{BiosError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const TOML_SUFFIX: &str = ".bios.toml";
const JSON_SUFFIX: &str = ".bios.json";

/// Read-only lookup over a caller-supplied list of descriptors
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Descriptors in the order they were supplied
    descriptors: Vec<AssetDescriptor>,
    /// Lowercase digest to index of the first descriptor carrying it
    digest_index: HashMap<String, usize>,
    /// Digests that appeared more than once
    duplicates: Vec<String>,
}

impl Catalog {
    pub fn new(descriptors: Vec<AssetDescriptor>) -> Self {
        let mut digest_index = HashMap::new();
        let mut duplicates = Vec::new();

        for (idx, d) in descriptors.iter().enumerate() {
            let key = d.expected_digest().to_ascii_lowercase();
            if digest_index.contains_key(&key) {
                warn!(
                    digest = %key,
                    name = d.name(),
                    "duplicate digest in catalog; first entry wins"
                );
                if !duplicates.contains(&key) {
                    duplicates.push(key);
                }
            } else {
                digest_index.insert(key, idx);
            }
        }

        Self {
            descriptors,
            digest_index,
            duplicates,
        }
    }

    /// Find the first descriptor whose expected digest matches, ignoring case
    pub fn find_by_digest(&self, digest: &str) -> Option<&AssetDescriptor> {
        let found = self
            .digest_index
            .get(&digest.trim().to_ascii_lowercase())
            .map(|&idx| &self.descriptors[idx]);
        debug!(digest, matched = found.map(|d| d.name()), "catalog lookup");
        found
    }

    /// Find a descriptor by canonical file name (exact match)
    pub fn find_by_name(&self, name: &str) -> Option<&AssetDescriptor> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    /// Like [`find_by_name`](Self::find_by_name), but an unknown name is `NotFound`
    pub fn require_by_name(&self, name: &str) -> Result<&AssetDescriptor> {
        self.find_by_name(name)
            .ok_or_else(|| BiosError::NotFound(format!("'{}' is not a known BIOS file", name)))
    }

    pub fn descriptors(&self) -> &[AssetDescriptor] {
        &self.descriptors
    }

    /// Digests that occur on more than one descriptor, a configuration error upstream
    pub fn duplicate_digests(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Stable ascending sort by name, ignoring case
    pub fn sorted_by_name(descriptors: &[AssetDescriptor]) -> Vec<&AssetDescriptor> {
        let mut sorted: Vec<&AssetDescriptor> = descriptors.iter().collect();
        sorted.sort_by_key(|d| d.name().to_lowercase());
        sorted
    }
}

impl FromIterator<AssetDescriptor> for Catalog {
    fn from_iter<I: IntoIterator<Item = AssetDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The BIOS list of a single core plugin
#[derive(Debug, Clone)]
pub struct CoreCatalog {
    pub core: CoreInfo,
    pub catalog: Catalog,
}

impl CoreCatalog {
    /// Load a `.bios.toml` or `.bios.json` metadata file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let file: CoreCatalogFile = if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
        {
            serde_json::from_str(&content).map_err(|e| {
                BiosError::CatalogParse(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                BiosError::CatalogParse(format!("Failed to parse {}: {}", path.display(), e))
            })?
        };

        Ok(Self {
            core: file.core,
            catalog: Catalog::new(file.bios),
        })
    }
}

/// Every core catalog found under a metadata directory, keyed by core id
#[derive(Debug, Default)]
pub struct CatalogSet {
    cores: BTreeMap<String, CoreCatalog>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `*.bios.toml` and `*.bios.json` files from a directory tree
    pub fn load_from_directory<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut set = Self::new();
        Self::scan_directory(&mut set, path.as_ref())?;
        Ok(set)
    }

    fn scan_directory(set: &mut CatalogSet, dir: &Path) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            // Does not follow symlinks, so a link back up the tree is not re-entered
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                Self::scan_directory(set, &path)?;
            } else if file_type.is_symlink() && path.is_dir() {
                debug!(path = %path.display(), "not following directory symlink");
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(TOML_SUFFIX) || n.ends_with(JSON_SUFFIX))
                .unwrap_or(false)
            {
                let core = CoreCatalog::load_from_file(&path)?;
                debug!(core = %core.core.id, path = %path.display(), entries = core.catalog.len(), "loaded core catalog");
                set.insert(core);
            }
        }

        Ok(())
    }

    /// Add a core catalog; a later file for the same core id replaces the earlier one
    pub fn insert(&mut self, core: CoreCatalog) {
        if let Some(previous) = self.cores.insert(core.core.id.clone(), core) {
            warn!(core = %previous.core.id, "core catalog defined twice; keeping the last one");
        }
    }

    pub fn get(&self, core_id: &str) -> Option<&CoreCatalog> {
        self.cores.get(core_id)
    }

    /// Like [`get`](Self::get), but an unknown core is `NotFound`
    pub fn require(&self, core_id: &str) -> Result<&CoreCatalog> {
        self.get(core_id).ok_or_else(|| {
            BiosError::NotFound(format!(
                "core '{}' (known cores: {})",
                core_id,
                self.core_ids().join(", ")
            ))
        })
    }

    /// Core ids in ascending order
    pub fn core_ids(&self) -> Vec<&str> {
        self.cores.keys().map(|s| s.as_str()).collect()
    }

    /// One catalog over every core, in core id order
    pub fn combined(&self) -> Catalog {
        self.cores
            .values()
            .flat_map(|c| c.catalog.descriptors().iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}
