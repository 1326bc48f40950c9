//! Capability-scoped directory handles and the per-process session cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A permission-scoped reference to a granted root directory.
///
/// The handle itself is just a path; whether the grant is still usable is
/// answered by [`query_permission`](Self::query_permission), which probes
/// the directory at call time. Permission loss (directory removed, made
/// read-only) is detected lazily on the next probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirHandle {
    root: PathBuf,
}

impl DirHandle {
    /// Wrap a granted root directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The granted root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Probe whether read-write access to the root is currently usable.
    ///
    /// Never prompts and never errors; any failure reads as "not granted".
    #[must_use]
    pub fn query_permission(&self) -> bool {
        let Ok(meta) = fs::metadata(&self.root) else {
            return false;
        };
        meta.is_dir() && !meta.permissions().readonly() && fs::read_dir(&self.root).is_ok()
    }
}

/// Process-wide session cache for the granted directory handle.
///
/// The original design held the handle as a hidden per-process static;
/// here it is an explicit object shared between provider instances via
/// `Arc`, with [`reset`](Self::reset) for tests and for forcing a reload
/// from the persisted store.
#[derive(Debug, Default)]
pub struct DirSession {
    handle: Mutex<Option<DirHandle>>,
}

impl DirSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached handle, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn handle(&self) -> Option<DirHandle> {
        self.handle.lock().unwrap().clone()
    }

    /// Cache a handle for the rest of the session.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set(&self, handle: DirHandle) {
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Drop the cached handle. The next connect reloads from the store.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn reset(&self) {
        *self.handle.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_handle_permission_granted_for_writable_dir() {
        let tmp = TempDir::new().unwrap();
        let handle = DirHandle::new(tmp.path());
        assert!(handle.query_permission());
    }

    #[test]
    fn test_handle_permission_denied_for_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let handle = DirHandle::new(tmp.path().join("gone"));
        assert!(!handle.query_permission());
    }

    #[test]
    fn test_handle_permission_denied_for_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(!DirHandle::new(&file).query_permission());
    }

    #[test]
    fn test_session_set_and_reset() {
        let session = DirSession::new();
        assert!(session.handle().is_none());

        session.set(DirHandle::new("/tmp/root"));
        assert_eq!(session.handle(), Some(DirHandle::new("/tmp/root")));

        session.reset();
        assert!(session.handle().is_none());
    }
}
