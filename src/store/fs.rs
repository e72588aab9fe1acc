//! Filesystem-based storage.
//!
//! One file per key, plus a lock file per key:
//!
//! ```text
//! root/
//! ├── {base64(blake3(key))}.json
//! └── .{base64(blake3(key))}.lock
//! ```
//!
//! Keys are hashed so that any identity string (slashes, dots, 4KB of emoji)
//! maps to a safe, fixed-length filename. Writes go to a uniquely named temp
//! file first and are renamed into place, so readers never see half a record.
//!
//! Writes and compare-and-swaps hold an OS lock on the key's lock file, so
//! they are atomic across every `FsBackend` pointed at the same directory,
//! whether in this process or another one. Lock files are left in place.

use crate::{
    crypto::base::Hash,
    store::backend::{Backend, BackendError},
    util::ser,
};
use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Filesystem-based storage backend.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Create a new filesystem backend at the given root directory, creating
    /// the directory if needed.
    pub fn new(root: PathBuf) -> Result<Self, BackendError> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the root directory of the storage.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn filename(key: &str) -> Result<String, BackendError> {
        let hash = Hash::new_blake3(key.as_bytes()).map_err(|e| BackendError::Other(e.to_string()))?;
        Ok(ser::base64_encode(hash.as_bytes()))
    }

    fn path(&self, key: &str) -> Result<PathBuf, BackendError> {
        Ok(self.root.join(format!("{}.json", Self::filename(key)?)))
    }

    fn lock_file(&self, key: &str) -> Result<fd_lock::RwLock<File>, BackendError> {
        let path = self.root.join(format!(".{}.lock", Self::filename(key)?));
        let file = OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path)?;
        Ok(fd_lock::RwLock::new(file))
    }

    fn read(path: &Path) -> Result<Option<Vec<u8>>, BackendError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `value` to a fresh temp file and move it into place. With
    /// `clobber` false, an existing file wins and we return `Ok(false)`.
    fn write(&self, path: &Path, value: &[u8], clobber: bool) -> Result<bool, BackendError> {
        let mut tmp = tempfile::Builder::new().prefix(".").suffix(".tmp").tempfile_in(&self.root)?;
        tmp.write_all(value)?;
        tmp.as_file().sync_all()?;
        let persisted = if clobber { tmp.persist(path) } else { tmp.persist_noclobber(path) };
        match persisted {
            Ok(_) => Ok(true),
            Err(e) if !clobber && e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error.into()),
        }
    }
}

impl Backend for FsBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        let mut lock = self.lock_file(key)?;
        let _guard = lock.write()?;
        self.write(&self.path(key)?, value, true)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        Self::read(&self.path(key)?)?.ok_or(BackendError::NotFound)
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, value: &[u8]) -> Result<bool, BackendError> {
        let mut lock = self.lock_file(key)?;
        let _guard = lock.write()?;
        let path = self.path(key)?;
        let current = Self::read(&path)?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        // a first claim must never replace a file that showed up after our read
        self.write(&path, value, expected.is_some())
    }
}
