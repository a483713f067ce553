//! Local persistent store. Every key is a JSON file `<key>.json` in the data
//! directory. A missing or unreadable file reads as the default value so a
//! corrupt file never stops the program.

mod dismissals;
mod notifications;
mod recurring;
mod theme;

pub use dismissals::*;
pub use notifications::*;
pub use recurring::*;
pub use theme::*;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

fn secure_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Reads a key, falling back to the default when the file is missing or
    /// cannot be parsed.
    pub fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(key);
        if !path.exists() {
            return T::default();
        }

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read local store, using empty state");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "malformed local store, using empty state");
                T::default()
            }
        }
    }

    pub fn save<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path(key);
        let raw = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", key))?;
        secure_write(&path, &raw).with_context(|| format!("Failed to write {}", path.display()))
    }
}
