//! Checking that a core's mandatory BIOS files are in place

use crate::catalog::Catalog;
use crate::store::ManagedStore;
use crate::types::AssetDescriptor;
use serde::Serialize;
use tracing::debug;

/// Outcome of checking a descriptor list against the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementReport {
    pub satisfied: bool,
    /// Mandatory descriptors that failed verification, sorted by name ignoring case
    pub missing: Vec<AssetDescriptor>,
}

impl RequirementReport {
    /// `(name, description)` pairs for presentation
    pub fn missing_descriptions(&self) -> Vec<(&str, &str)> {
        self.missing
            .iter()
            .map(|d| (d.name(), d.description()))
            .collect()
    }
}

pub struct RequirementChecker<'a> {
    store: &'a ManagedStore,
}

impl<'a> RequirementChecker<'a> {
    pub fn new(store: &'a ManagedStore) -> Self {
        Self { store }
    }

    /// Verify every descriptor and collect the mandatory ones that failed.
    ///
    /// Optional descriptors are verified too (so stale copies get purged) but
    /// never count against the result.
    pub fn check_all(&self, descriptors: &[AssetDescriptor]) -> RequirementReport {
        let mut missing = Vec::new();

        for descriptor in Catalog::sorted_by_name(descriptors) {
            let valid = self.store.verify(descriptor);
            debug!(
                name = descriptor.name(),
                valid,
                optional = descriptor.is_optional(),
                "checked requirement"
            );
            if !valid && !descriptor.is_optional() {
                missing.push(descriptor.clone());
            }
        }

        RequirementReport {
            satisfied: missing.is_empty(),
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ImportPipeline;
    use bios_core::ContentDigest;
    use std::fs;
    use std::path::PathBuf;

    struct Fixture {
        dir: PathBuf,
        store: ManagedStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("bios_requirements_test_{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&dir).unwrap();
            let store = ManagedStore::new(dir.join("store"), dir.join("trash"));
            Self { dir, store }
        }

        fn put(&self, name: &str, content: &[u8]) {
            let src = self.dir.join(format!("{}.src", name));
            fs::write(&src, content).unwrap();
            self.store.place(&src, name).unwrap();
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn descriptor(name: &str, content: &[u8], optional: bool) -> AssetDescriptor {
        let md5 = ContentDigest::from_bytes(content).to_hex();
        AssetDescriptor::new(name, format!("{} BIOS", name), md5, optional, None).unwrap()
    }

    #[test]
    fn test_all_present() {
        let fx = Fixture::new();
        fx.put("a.bin", b"aaa");
        fx.put("b.bin", b"bbb");

        let report = RequirementChecker::new(&fx.store).check_all(&[
            descriptor("a.bin", b"aaa", false),
            descriptor("b.bin", b"bbb", false),
        ]);
        assert!(report.satisfied);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_missing_sorted_by_name() {
        let fx = Fixture::new();
        fx.put("b.bin", b"bbb");

        let report = RequirementChecker::new(&fx.store).check_all(&[
            descriptor("zeta.bin", b"zzz", false),
            descriptor("b.bin", b"bbb", false),
            descriptor("Alpha.bin", b"aaa", false),
        ]);
        assert!(!report.satisfied);
        let names: Vec<&str> = report.missing.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Alpha.bin", "zeta.bin"]);
        assert_eq!(
            report.missing_descriptions()[0],
            ("Alpha.bin", "Alpha.bin BIOS")
        );
    }

    #[test]
    fn test_all_optional_and_absent_is_satisfied() {
        let fx = Fixture::new();
        let report = RequirementChecker::new(&fx.store).check_all(&[
            descriptor("a.bin", b"aaa", true),
            descriptor("b.bin", b"bbb", true),
        ]);
        assert!(report.satisfied);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_corrupt_mandatory_is_missing_and_purged() {
        let fx = Fixture::new();
        fx.put("a.bin", b"corrupted");

        let report =
            RequirementChecker::new(&fx.store).check_all(&[descriptor("a.bin", b"aaa", false)]);
        assert!(!report.satisfied);
        assert_eq!(report.missing.len(), 1);
        assert!(!fx.store.is_present("a.bin"));
    }

    #[test]
    fn test_corrupt_optional_is_purged_but_not_reported() {
        let fx = Fixture::new();
        fx.put("opt.bin", b"stale");

        let report =
            RequirementChecker::new(&fx.store).check_all(&[descriptor("opt.bin", b"fresh", true)]);
        assert!(report.satisfied);
        assert!(!fx.store.is_present("opt.bin"));
    }

    #[test]
    fn test_import_then_check() {
        let fx = Fixture::new();
        let catalog = Catalog::new(vec![descriptor("bios.bin", b"bios bytes", false)]);
        let src = fx.dir.join("dump.rom");
        fs::write(&src, b"bios bytes").unwrap();

        let pipeline = ImportPipeline::new(ManagedStore::new(
            fx.dir.join("store"),
            fx.dir.join("trash"),
        ));
        assert!(pipeline.import_if_known(&src, &catalog).is_matched());

        let report = RequirementChecker::new(&fx.store).check_all(catalog.descriptors());
        assert!(report.satisfied);
    }
}
