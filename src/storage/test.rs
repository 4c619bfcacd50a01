use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::types::ImageFileName;
use crate::storage::{FileStorage, StorageError, StorageResult};

/// In-memory [`FileStorage`] used by unit tests.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose every `save` fails with an I/O error.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Seed a file as if it had been uploaded earlier.
    pub fn with_file(self, name: &str, bytes: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        self
    }

    /// Sorted names of all stored files.
    pub fn names(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn read(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }
}

impl FileStorage for MemoryStorage {
    fn save(&self, name: &ImageFileName, bytes: &[u8]) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.files
            .lock()
            .unwrap()
            .insert(name.as_str().to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, name: &ImageFileName) -> StorageResult<bool> {
        Ok(self.files.lock().unwrap().remove(name.as_str()).is_some())
    }

    fn exists(&self, name: &ImageFileName) -> bool {
        self.files.lock().unwrap().contains_key(name.as_str())
    }
}
