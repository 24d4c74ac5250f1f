//! The managed BIOS directory

use crate::trash::{DirectoryTrash, Trash};
use crate::types::{validate_name, AssetDescriptor};
use bios_core::{BiosError, ContentDigest, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Result of checking one descriptor against the store
#[derive(Debug)]
pub enum Verification {
    /// Present with the expected digest
    Valid,
    /// No file at the canonical path
    Missing,
    /// Present with a different digest. `trashed` is where the file was moved,
    /// or `None` if the move failed and the file is still in the store.
    Mismatch {
        actual: ContentDigest,
        trashed: Option<PathBuf>,
    },
    /// Present but could not be hashed
    Unreadable(BiosError),
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }

    /// Collapse into the error taxonomy: `NotFound`, `IntegrityMismatch` or the I/O error
    pub fn into_result(self, descriptor: &AssetDescriptor) -> Result<()> {
        match self {
            Verification::Valid => Ok(()),
            Verification::Missing => Err(BiosError::NotFound(format!(
                "{} is not in the store",
                descriptor.name()
            ))),
            Verification::Mismatch { actual, .. } => Err(BiosError::IntegrityMismatch {
                name: descriptor.name().to_string(),
                expected: descriptor.expected_digest().to_string(),
                actual: actual.to_hex(),
            }),
            Verification::Unreadable(e) => Err(e),
        }
    }
}

/// Flat directory of canonical BIOS files.
///
/// Files live at `<root>/<descriptor name>` with no subdirectories. A file's
/// identity is its content digest only.
pub struct ManagedStore {
    root: PathBuf,
    trash: Box<dyn Trash>,
}

impl ManagedStore {
    /// Create a store whose removed files go to `trash_root`
    pub fn new<P: AsRef<Path>, T: AsRef<Path>>(root: P, trash_root: T) -> Self {
        Self::with_trash(root, Box::new(DirectoryTrash::new(trash_root)))
    }

    pub fn with_trash<P: AsRef<Path>>(root: P, trash: Box<dyn Trash>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            trash,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path for a name
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Existence check only; says nothing about content
    pub fn is_present(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Whether the descriptor's file is present with the expected digest.
    ///
    /// A file that is present but has the wrong digest is moved to the trash
    /// before this returns false, so a stale or corrupt copy never survives
    /// to a later check. If the trash refuses the file it stays put; see
    /// [`inspect`](Self::inspect) to tell the two apart.
    pub fn verify(&self, descriptor: &AssetDescriptor) -> bool {
        self.inspect(descriptor).is_valid()
    }

    /// Typed form of [`verify`](Self::verify), with the same purge side effect
    pub fn inspect(&self, descriptor: &AssetDescriptor) -> Verification {
        let path = match self.path_for(descriptor.name()) {
            Ok(path) => path,
            Err(e) => return Verification::Unreadable(e),
        };
        if !path.is_file() {
            debug!(name = descriptor.name(), "not present in store");
            return Verification::Missing;
        }

        let actual = match ContentDigest::from_file(&path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(name = descriptor.name(), error = %e, "could not hash stored file");
                return Verification::Unreadable(e);
            }
        };

        if actual.matches_hex(descriptor.expected_digest()) {
            return Verification::Valid;
        }

        warn!(
            name = descriptor.name(),
            expected = descriptor.expected_digest(),
            actual = %actual,
            "stored file does not match expected digest; moving to trash"
        );
        let trashed = match self.trash.discard(&path) {
            Ok(dest) => Some(dest),
            Err(e) => {
                warn!(name = descriptor.name(), error = %e, "failed to trash mismatched file");
                None
            }
        };
        Verification::Mismatch { actual, trashed }
    }

    /// Move a stored file to the trash. Returns false when nothing was there.
    pub fn remove(&self, name: &str) -> bool {
        match self.discard(name) {
            Ok(moved) => moved.is_some(),
            Err(e) => {
                warn!(name, error = %e, "failed to remove stored file");
                false
            }
        }
    }

    /// Typed form of [`remove`](Self::remove): the trash location, or `None` if absent
    pub fn discard(&self, name: &str) -> Result<Option<PathBuf>> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Ok(None);
        }
        let dest = self.trash.discard(&path)?;
        info!(name, trash = %dest.display(), "moved stored file to trash");
        Ok(Some(dest))
    }

    /// Copy `source` into the store as `name`, replacing any existing file.
    ///
    /// The bytes are streamed into a temporary file inside the store and then
    /// renamed over the destination, so a failed copy leaves the previous
    /// file (and every other file) untouched.
    pub fn place<P: AsRef<Path>>(&self, source: P, name: &str) -> Result<PathBuf> {
        let source = source.as_ref();
        let dest = self.path_for(name)?;

        if let Err(e) = fs::create_dir_all(&self.root) {
            // The copy below fails too and reports the real error
            warn!(root = %self.root.display(), error = %e, "could not create store directory");
        }

        let mut input = File::open(source)?;
        let mut staged = NamedTempFile::new_in(&self.root)?;
        io::copy(&mut input, &mut staged)?;
        // Temp files are created owner-only; keep the source's mode instead
        staged
            .as_file()
            .set_permissions(input.metadata()?.permissions())?;
        staged.as_file().sync_all()?;
        staged.persist(&dest).map_err(|e| BiosError::Io(e.error))?;

        debug!(source = %source.display(), dest = %dest.display(), "placed file in store");
        Ok(dest)
    }

    /// Names of all files directly under the store root, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        if !self.root.exists() {
            return Ok(names);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                // Skips in-flight temp files too
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for ManagedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: PathBuf,
        store: ManagedStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("bios_store_test_{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&dir).unwrap();
            let store = ManagedStore::new(dir.join("store"), dir.join("trash"));
            Self { dir, store }
        }

        fn source(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.dir.join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn descriptor_for(&self, name: &str, content: &[u8]) -> AssetDescriptor {
            let md5 = ContentDigest::from_bytes(content).to_hex();
            AssetDescriptor::new(name, "Test BIOS", md5, false, None).unwrap()
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.dir).ok();
        }
    }

    #[test]
    fn test_place_then_verify() {
        let fx = Fixture::new();
        let src = fx.source("download.bin", b"bios bytes");
        let descriptor = fx.descriptor_for("bios.bin", b"bios bytes");

        let dest = fx.store.place(&src, descriptor.name()).unwrap();
        assert_eq!(dest, fx.dir.join("store").join("bios.bin"));
        assert!(fx.store.is_present("bios.bin"));
        assert!(fx.store.verify(&descriptor));
        // Source is copied, not moved
        assert!(src.exists());
    }

    #[test]
    fn test_verify_uppercase_expected_digest() {
        let fx = Fixture::new();
        let src = fx.source("download.bin", b"bios bytes");
        let md5 = ContentDigest::from_bytes(b"bios bytes").to_hex().to_uppercase();
        let descriptor = AssetDescriptor::new("bios.bin", "", md5, false, None).unwrap();

        fx.store.place(&src, "bios.bin").unwrap();
        assert!(fx.store.verify(&descriptor));
    }

    #[test]
    fn test_verify_missing() {
        let fx = Fixture::new();
        let descriptor = fx.descriptor_for("bios.bin", b"anything");
        assert!(matches!(fx.store.inspect(&descriptor), Verification::Missing));
        assert!(!fx.store.verify(&descriptor));
    }

    #[test]
    fn test_verify_mismatch_purges() {
        let fx = Fixture::new();
        let src = fx.source("corrupt.bin", b"corrupted");
        fx.store.place(&src, "bios.bin").unwrap();
        let descriptor = fx.descriptor_for("bios.bin", b"the real thing");

        let result = fx.store.inspect(&descriptor);
        assert!(matches!(
            result,
            Verification::Mismatch { trashed: Some(_), .. }
        ));
        assert!(!fx.store.is_present("bios.bin"));
        assert_eq!(
            fs::read(fx.dir.join("trash").join("bios.bin")).unwrap(),
            b"corrupted"
        );

        // A later check sees it as absent, not as mismatched
        assert!(matches!(fx.store.inspect(&descriptor), Verification::Missing));
    }

    #[test]
    fn test_place_overwrites() {
        let fx = Fixture::new();
        let old = fx.source("old.bin", b"old");
        let new = fx.source("new.bin", b"new");

        fx.store.place(&old, "bios.bin").unwrap();
        fx.store.place(&new, "bios.bin").unwrap();

        assert_eq!(fs::read(fx.store.root().join("bios.bin")).unwrap(), b"new");
        assert_eq!(fx.store.list().unwrap(), vec!["bios.bin".to_string()]);
    }

    #[test]
    fn test_place_missing_source_leaves_store_intact() {
        let fx = Fixture::new();
        let good = fx.source("good.bin", b"good");
        fx.store.place(&good, "bios.bin").unwrap();

        let err = fx
            .store
            .place(fx.dir.join("vanished.bin"), "bios.bin")
            .unwrap_err();
        assert!(err.is_io());
        assert_eq!(fs::read(fx.store.root().join("bios.bin")).unwrap(), b"good");
        assert_eq!(fx.store.list().unwrap(), vec!["bios.bin".to_string()]);
    }

    #[test]
    fn test_place_rejects_nested_name() {
        let fx = Fixture::new();
        let src = fx.source("src.bin", b"x");
        let err = fx.store.place(&src, "nested/bios.bin").unwrap_err();
        assert!(matches!(err, BiosError::InvalidName(_)));
    }

    #[test]
    fn test_remove() {
        let fx = Fixture::new();
        let src = fx.source("src.bin", b"to be removed");
        fx.store.place(&src, "bios.bin").unwrap();

        assert!(fx.store.remove("bios.bin"));
        assert!(!fx.store.is_present("bios.bin"));
        assert!(fx.dir.join("trash").join("bios.bin").exists());

        // Nothing left to remove
        assert!(!fx.store.remove("bios.bin"));
    }

    #[test]
    fn test_list_missing_root() {
        let fx = Fixture::new();
        assert!(fx.store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_and_skips_hidden() {
        let fx = Fixture::new();
        let src = fx.source("src.bin", b"x");
        fx.store.place(&src, "b.bin").unwrap();
        fx.store.place(&src, "a.bin").unwrap();
        fs::write(fx.store.root().join(".partial"), b"x").unwrap();

        assert_eq!(
            fx.store.list().unwrap(),
            vec!["a.bin".to_string(), "b.bin".to_string()]
        );
    }

    struct RefusingTrash;

    impl Trash for RefusingTrash {
        fn discard(&self, _path: &Path) -> io::Result<PathBuf> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "trash is read-only"))
        }
    }

    #[test]
    fn test_mismatch_kept_when_trash_refuses() {
        let fx = Fixture::new();
        let store = ManagedStore::with_trash(fx.dir.join("store"), Box::new(RefusingTrash));
        let src = fx.source("corrupt.bin", b"corrupted");
        store.place(&src, "bios.bin").unwrap();
        let descriptor = fx.descriptor_for("bios.bin", b"the real thing");

        let result = store.inspect(&descriptor);
        assert!(matches!(result, Verification::Mismatch { trashed: None, .. }));
        assert!(store.is_present("bios.bin"));
        assert!(!store.verify(&descriptor));
        // Nothing to remove into a refusing trash either
        assert!(!store.remove("bios.bin"));
        assert!(store.is_present("bios.bin"));
    }

    #[test]
    fn test_into_result_maps_to_error_taxonomy() {
        let fx = Fixture::new();
        let descriptor = fx.descriptor_for("bios.bin", b"the real thing");

        let missing = fx.store.inspect(&descriptor).into_result(&descriptor);
        assert!(matches!(missing, Err(BiosError::NotFound(_))));

        let src = fx.source("corrupt.bin", b"corrupted");
        fx.store.place(&src, "bios.bin").unwrap();
        let mismatch = fx.store.inspect(&descriptor).into_result(&descriptor);
        match mismatch {
            Err(BiosError::IntegrityMismatch { name, expected, actual }) => {
                assert_eq!(name, "bios.bin");
                assert_eq!(expected, descriptor.expected_digest());
                assert_eq!(actual, ContentDigest::from_bytes(b"corrupted").to_hex());
            }
            other => panic!("expected integrity mismatch, got {:?}", other),
        }

        let good = fx.source("good.bin", b"the real thing");
        fx.store.place(&good, "bios.bin").unwrap();
        assert!(fx.store.inspect(&descriptor).into_result(&descriptor).is_ok());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unreadable_stored_file_is_not_purged() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.store.root()).unwrap();
        // Looks like a regular file, but reading from offset 0 fails with EIO
        let link = fx.store.root().join("bios.bin");
        std::os::unix::fs::symlink("/proc/self/mem", &link).unwrap();
        let descriptor = fx.descriptor_for("bios.bin", b"the real thing");

        let result = fx.store.inspect(&descriptor);
        assert!(matches!(result, Verification::Unreadable(ref e) if e.is_io()));
        assert!(!fx.store.verify(&descriptor));
        assert!(fs::symlink_metadata(&link).is_ok());
        assert!(!fx.dir.join("trash").exists());
    }

    #[test]
    fn test_place_surfaces_copy_error_when_root_cannot_be_created() {
        let fx = Fixture::new();
        let blocker = fx.source("blocker", b"a regular file");
        let store = ManagedStore::new(blocker.join("store"), fx.dir.join("trash"));
        let src = fx.source("src.bin", b"bios bytes");

        let err = store.place(&src, "bios.bin").unwrap_err();
        assert!(err.is_io());
        assert!(!store.is_present("bios.bin"));
        assert_eq!(fs::read(&src).unwrap(), b"bios bytes");
        assert_eq!(fs::read(&blocker).unwrap(), b"a regular file");
    }

    #[cfg(unix)]
    #[test]
    fn test_place_keeps_source_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        let src = fx.source("src.bin", b"bios bytes");
        fs::set_permissions(&src, fs::Permissions::from_mode(0o644)).unwrap();

        let dest = fx.store.place(&src, "bios.bin").unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
