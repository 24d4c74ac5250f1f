//! Recoverable deletion for store files

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Somewhere removed files go instead of being erased
pub trait Trash: Send + Sync {
    /// Move `path` out of the way, returning where it ended up
    fn discard(&self, path: &Path) -> io::Result<PathBuf>;
}

/// A plain directory acting as the trash can.
///
/// Files keep their name; if an earlier file with that name is already in
/// the trash, a numeric suffix (`name.1`, `name.2`, ...) is appended so
/// nothing already trashed is ever overwritten.
#[derive(Debug, Clone)]
pub struct DirectoryTrash {
    root: PathBuf,
}

impl DirectoryTrash {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Claim an unused slot by creating it exclusively, so a concurrent
    /// discard can never pick the same name
    fn claim_slot(&self, file_name: &str) -> io::Result<PathBuf> {
        let mut n = 0u32;
        loop {
            let candidate = if n == 0 {
                self.root.join(file_name)
            } else {
                self.root.join(format!("{}.{}", file_name, n))
            };
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Trash for DirectoryTrash {
    fn discard(&self, path: &Path) -> io::Result<PathBuf> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("cannot trash {}: no file name", path.display()),
                )
            })?;

        fs::create_dir_all(&self.root)?;
        let dest = self.claim_slot(file_name)?;

        // Only our own empty placeholder is replaced here. Rename fails across
        // filesystems; fall back to copy + remove.
        if fs::rename(path, &dest).is_err() {
            let copied = fs::copy(path, &dest).and_then(|_| fs::remove_file(path));
            if let Err(e) = copied {
                fs::remove_file(&dest).ok();
                return Err(e);
            }
        }
        Ok(dest)
    }
}
