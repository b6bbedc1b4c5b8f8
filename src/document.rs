//! On-disk format of a resource file.
//!
//! A resource file is a small JSON document holding an ordered list of
//! entries:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     { "key": "title", "value": "Hello" }
//!   ]
//! }
//! ```
//!
//! Every write goes to a sibling temporary file first and is then moved over
//! the target, so a reader sees either the old or the new document.

use std::fs;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use std::process;
use std::sync::atomic::{ AtomicU64, Ordering };

use bevy::log::debug;
use serde::{ Deserialize, Serialize };

use crate::error::{ LocalizerError, Result };

/// A single `(key, value)` pair of a resource file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub key: String,
    pub value: String,
}

impl ResourceEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// The whole content of one resource file, in storage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDocument {
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<ResourceEntry>,
}

impl Default for ResourceDocument {
    fn default() -> Self {
        Self { version: Self::CURRENT_VERSION, entries: Vec::new() }
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl ResourceDocument {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn with_entries(entries: Vec<ResourceEntry>) -> Self {
        Self { version: Self::CURRENT_VERSION, entries }
    }

    /// Reads and validates the document stored at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LocalizerError::io(path, e))?;
        let document: Self = serde_json
            ::from_str(&content)
            .map_err(|source| LocalizerError::Malformed { path: path.to_path_buf(), source })?;

        if document.version != Self::CURRENT_VERSION {
            return Err(LocalizerError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: document.version,
            });
        }

        Ok(document)
    }

    /// Replaces the file at `path` with this document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let temp = self.write_temp(path)?;
        fs::rename(&temp, path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            LocalizerError::io(path, e)
        })?;
        debug!("Wrote {} resource entries to '{}'", self.entries.len(), path.display());
        Ok(())
    }

    /// Creates an empty document at `path` unless a file is already there.
    ///
    /// Returns `true` when this call published the file. A file that shows
    /// up concurrently is left untouched.
    pub fn create_empty(path: &Path) -> Result<bool> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LocalizerError::io(parent, e))?;
        }

        let temp = Self::default().write_temp(path)?;
        let published = match fs::hard_link(&temp, path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            // Filesystems without hard links: last writer wins, every
            // candidate is the same empty document.
            Err(_) if !path.exists() =>
                fs::rename(&temp, path)
                    .map(|_| true)
                    .map_err(|e| LocalizerError::io(path, e)),
            Err(_) => Ok(false),
        };
        let _ = fs::remove_file(&temp);

        if let Ok(true) = published {
            debug!("Created empty resource file '{}'", path.display());
        }
        published
    }

    fn write_temp(&self, path: &Path) -> Result<PathBuf> {
        let temp = temp_path_for(path);
        let content = serde_json
            ::to_string_pretty(self)
            .map_err(|source| LocalizerError::Malformed { path: path.to_path_buf(), source })?;
        fs::write(&temp, content).map_err(|e| LocalizerError::io(&temp, e))?;
        Ok(temp)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resource".to_string());
    let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", file_name, process::id(), unique))
}
