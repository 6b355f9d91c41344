//! # Key-Value Store
//!
//! Small byte blobs kept as one file per key under a directory: the last
//! host address typed into the join screen, and the solo save game.
//!
//! Writes go to a temporary file first and are renamed into place, so a
//! crash mid-write leaves the previous value intact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Key under which the join screen remembers the last host address.
pub const LAST_HOST_KEY: &str = "last_host";

/// Key under which the solo game is saved.
pub const SOLO_SAVE_KEY: &str = "solo_save";

/// Errors that can occur in the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Keys are plain file names: ASCII letters, digits, `-`, `_` and `.`.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    /// Filesystem failure.
    #[error("store I/O failed for {key}: {reason}")]
    Io {
        /// Key being accessed.
        key: String,
        /// OS error text.
        reason: String,
    },

    /// The blob exists but does not decode.
    #[error("corrupt value for {key}: {reason}")]
    Corrupt {
        /// Key being decoded.
        key: String,
        /// Decoder error text.
        reason: String,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Directory-backed key-value store.
#[derive(Clone, Debug)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Opens (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir.display().to_string(), &e))?;
        Ok(Self { dir })
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores `bytes` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] or [`StoreError::Io`].
    pub fn save_bytes(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        let path = self.path(key)?;
        // Keys never start with '.', so this cannot clash with a real key
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, bytes).map_err(|e| io_error(key, &e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(key, &e))?;
        tracing::debug!("Saved {} bytes under {}", bytes.len(), key);
        Ok(())
    }

    /// Reads the value under `key`, or `None` if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] or [`StoreError::Io`].
    pub fn read_bytes(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, &e)),
        }
    }

    /// Reads a UTF-8 value.
    ///
    /// # Errors
    ///
    /// As [`Self::read_bytes`], plus [`StoreError::Corrupt`] for invalid
    /// UTF-8.
    pub fn read_string(&self, key: &str) -> StoreResult<Option<String>> {
        self.read_bytes(key)?
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Deletes the value under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] or [`StoreError::Io`].
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, &e)),
        }
    }

    fn path(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

fn io_error(key: &str, err: &io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        reason: err.to_string(),
    }
}
