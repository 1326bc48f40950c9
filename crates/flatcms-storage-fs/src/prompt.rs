//! User-grant prompts for the local backend.
//!
//! Acquiring access to a root directory is an explicit user decision. The
//! backend never picks a directory on its own; it asks through
//! [`AccessPrompt`], which the embedding application implements with
//! whatever surface it has (dialog, terminal prompt). The library ships a
//! denying [`NullPrompt`] for headless use — where only a previously
//! persisted grant can connect — and a [`StaticGrant`] that always answers
//! with a fixed directory, for tests and pre-authorized embedders.

use std::path::{Path, PathBuf};

/// Asks the user for directory access.
pub trait AccessPrompt: Send + Sync {
    /// Ask the user to pick a root directory, granting read-write access.
    ///
    /// Returns `None` when the user declines.
    fn pick_directory(&self) -> Option<PathBuf>;

    /// Ask the user to re-authorize read-write access to a previously
    /// granted root whose permission has been downgraded.
    fn request_permission(&self, root: &Path) -> bool;
}

/// Prompt that always declines. Connecting succeeds only when a persisted
/// grant is already usable.
#[derive(Debug, Default)]
pub struct NullPrompt;

impl AccessPrompt for NullPrompt {
    fn pick_directory(&self) -> Option<PathBuf> {
        None
    }

    fn request_permission(&self, _root: &Path) -> bool {
        false
    }
}

/// Prompt that always grants a fixed directory.
#[derive(Debug)]
pub struct StaticGrant {
    root: PathBuf,
}

impl StaticGrant {
    /// Grant the given root on every prompt.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AccessPrompt for StaticGrant {
    fn pick_directory(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }

    fn request_permission(&self, _root: &Path) -> bool {
        true
    }
}
