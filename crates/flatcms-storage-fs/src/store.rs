//! Persisted directory-handle store.
//!
//! A single JSON state file holds the granted root directory under a fixed
//! key, so permission need not be re-requested every session:
//!
//! ```json
//! { "version": 1, "handles": { "root_dir": "/home/me/site" } }
//! ```
//!
//! The file (and its parent directory) is created on first save. A corrupt
//! or version-mismatched file is logged and treated as "no handle" rather
//! than surfaced as an error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use flatcms_storage::StorageError;

use crate::session::DirHandle;

/// Current schema version of the state file.
const SCHEMA_VERSION: u32 = 1;

/// Fixed key under which the root directory handle is stored.
const ROOT_DIR_KEY: &str = "root_dir";

/// Default state file location.
const DEFAULT_STORE_PATH: &str = "~/.flatcms/handles.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    handles: BTreeMap<String, PathBuf>,
}

/// File-backed store for the persisted directory handle.
#[derive(Debug)]
pub struct HandleStore {
    path: PathBuf,
}

impl HandleStore {
    /// Create a store backed by the given state file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the default per-user location
    /// (`~/.flatcms/handles.json`).
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(PathBuf::from(
            shellexpand::tilde(DEFAULT_STORE_PATH).into_owned(),
        ))
    }

    /// Path of the backing state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted handle, if one exists.
    ///
    /// Missing, corrupt, or version-mismatched state files all read as
    /// "no handle"; corruption is logged.
    #[must_use]
    pub fn load(&self) -> Option<DirHandle> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to read handle store {}: {e}", self.path.display());
                return None;
            }
        };

        let store: StoreFile = match serde_json::from_str(&raw) {
            Ok(store) => store,
            Err(e) => {
                warn!(
                    "corrupt handle store {}, ignoring persisted grant: {e}",
                    self.path.display()
                );
                return None;
            }
        };

        if store.version != SCHEMA_VERSION {
            warn!(
                "handle store {} has unknown schema version {}, ignoring",
                self.path.display(),
                store.version
            );
            return None;
        }

        store.handles.get(ROOT_DIR_KEY).map(DirHandle::new)
    }

    /// Persist a granted root directory, creating the state file and its
    /// parent directory on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the state file cannot be written.
    pub fn save(&self, root: &Path) -> Result<(), StorageError> {
        let to_io = |e: std::io::Error| {
            StorageError::io(e, Some(self.path.display().to_string()))
                .with_context("failed to persist directory handle")
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(to_io)?;
        }

        let mut handles = BTreeMap::new();
        handles.insert(ROOT_DIR_KEY.to_owned(), root.to_path_buf());
        let store = StoreFile {
            version: SCHEMA_VERSION,
            handles,
        };

        let raw = serde_json::to_string_pretty(&store).map_err(|e| {
            StorageError::io(std::io::Error::other(e), Some(self.path.display().to_string()))
        })?;
        fs::write(&self.path, raw).map_err(to_io)
    }
}
