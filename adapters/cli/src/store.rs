//! Progress store persisting [`SavedProgress`] as a JSON document.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use gravity_defence_core::{ProgressStore, SavedProgress, StoreError};

/// Keeps saved progress in a single JSON file.
///
/// A missing file loads as empty progress.
#[derive(Clone, Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
}

impl JsonProgressStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SavedProgress> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(SavedProgress::default())
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        serde_json::from_str(&text)
            .with_context(|| format!("corrupt progress file {}", self.path.display()))
    }

    fn write(&self, progress: &SavedProgress) -> Result<()> {
        let json = serde_json::to_string_pretty(progress)?;
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl ProgressStore for JsonProgressStore {
    fn load(&mut self) -> Result<SavedProgress, StoreError> {
        self.read().map_err(Into::into)
    }

    fn save(&mut self, progress: &SavedProgress) -> Result<(), StoreError> {
        self.write(progress).map_err(Into::into)
    }
}
