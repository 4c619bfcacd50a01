//! Named-file storage for uploaded category images.
//!
//! Files live flat under a single root directory. Names are
//! [`ImageFileName`] values, which cannot contain path separators, so a
//! stored name always resolves inside the root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::types::ImageFileName;

#[cfg(test)]
pub mod test;
pub mod thumbnail;

/// Errors produced by storage backends and thumbnail generation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing a file failed.
    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),
    /// The uploaded bytes could not be decoded or re-encoded.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Minimal file store the category manager writes images through.
pub trait FileStorage {
    /// Write `bytes` under `name`, replacing any existing file.
    fn save(&self, name: &ImageFileName, bytes: &[u8]) -> StorageResult<()>;
    /// Remove `name`. A missing file is not an error; returns whether a file
    /// was actually removed.
    fn delete(&self, name: &ImageFileName) -> StorageResult<bool>;
    /// Whether a file called `name` is stored.
    fn exists(&self, name: &ImageFileName) -> bool;
}

/// [`FileStorage`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a storage rooted at `root`. The directory is not created here;
    /// call [`Self::ensure_root`] during startup.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet.
    pub fn ensure_root(&self) -> StorageResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Directory holding the stored files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &ImageFileName) -> PathBuf {
        self.root.join(name.as_str())
    }
}

impl FileStorage for LocalFileStorage {
    fn save(&self, name: &ImageFileName, bytes: &[u8]) -> StorageResult<()> {
        let path = self.path(name);
        std::fs::write(&path, bytes)?;
        log::debug!("Stored {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn delete(&self, name: &ImageFileName) -> StorageResult<bool> {
        let path = self.path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, name: &ImageFileName) -> bool {
        self.path(name).is_file()
    }
}
