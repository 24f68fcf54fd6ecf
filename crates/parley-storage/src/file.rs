// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory-backed key-value store.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temporary file in the
//! same directory which is then renamed over the target, so a crash never
//! leaves a half-written document behind.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parley_core::{KeyValueStore, ParleyError};
use tracing::debug;

/// A [`KeyValueStore`] that keeps one file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document holding `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, ParleyError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(ParleyError::Storage {
                message: format!("invalid storage key `{key}`"),
                source: None,
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ParleyError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ParleyError::storage(
                format!("failed to read {}", path.display()),
                e,
            )),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ParleyError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ParleyError::storage(format!("failed to create {}", self.dir.display()), e)
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| ParleyError::storage("failed to create temporary file", e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| ParleyError::storage("failed to write temporary file", e))?;
        tmp.persist(&path).map_err(|e| {
            ParleyError::storage(format!("failed to replace {}", path.display()), e.error)
        })?;

        debug!(key, path = %path.display(), "stored document");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ParleyError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "removed document");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ParleyError::storage(
                format!("failed to remove {}", path.display()),
                e,
            )),
        }
    }
}
