//! Local filesystem storage backend for flatcms.
//!
//! This crate provides [`LocalProvider`], a filesystem-based implementation
//! of the [`StorageProvider`](flatcms_storage::StorageProvider) contract.
//! It operates against a capability-scoped root directory granted by the
//! user through an [`AccessPrompt`], persisted across sessions by a
//! [`HandleStore`], and cached per-process in a shared [`DirSession`].
//!
//! # Example
//!
//! ```ignore
//! use flatcms_storage::{EntryFormat, StorageProvider};
//! use flatcms_storage_fs::{HandleStore, LocalProvider, NullPrompt};
//!
//! let provider = LocalProvider::new(
//!     HandleStore::at_default_location(),
//!     Box::new(NullPrompt),
//! );
//! provider.connect()?;
//! let posts = provider.list_entries("content/posts", "md", EntryFormat::Frontmatter)?;
//! ```

mod prompt;
mod session;
mod store;

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use flatcms_storage::{
    Entry, EntryFormat, ProviderType, StorageError, StorageErrorKind, StorageProvider, codec,
};

pub use prompt::{AccessPrompt, NullPrompt, StaticGrant};
pub use session::{DirHandle, DirSession};
pub use store::HandleStore;

/// Backend identifier for error messages.
const BACKEND: &str = "Local";

/// Join folder, id, and extension into the logical entry path used in
/// error context.
fn entry_path(folder: &str, id: &str, extension: &str) -> String {
    if folder.is_empty() {
        format!("{id}.{extension}")
    } else {
        format!("{folder}/{id}.{extension}")
    }
}

/// Strip exactly one leading line break.
///
/// Serializers insert a blank line after the closing frontmatter delimiter;
/// this undoes that single newline after decode. Backend-specific — the
/// codec itself never trims the body.
fn strip_one_leading_newline(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}

/// Filesystem storage provider over a user-granted root directory.
///
/// Connection flow: a handle cached in the session is used as-is; otherwise
/// the persisted store is consulted; otherwise the prompt asks the user to
/// grant a directory, which is then persisted for future sessions. A
/// downgraded permission triggers a re-request through the prompt before
/// failing with `PermissionDenied`.
pub struct LocalProvider {
    session: Arc<DirSession>,
    store: HandleStore,
    prompt: Box<dyn AccessPrompt>,
}

impl LocalProvider {
    /// Create a provider with a fresh session cache.
    #[must_use]
    pub fn new(store: HandleStore, prompt: Box<dyn AccessPrompt>) -> Self {
        Self {
            session: Arc::new(DirSession::new()),
            store,
            prompt,
        }
    }

    /// Share an existing session cache between provider instances.
    #[must_use]
    pub fn with_session(mut self, session: Arc<DirSession>) -> Self {
        self.session = session;
        self
    }

    /// The session cache, for resetting in tests or on explicit sign-out.
    #[must_use]
    pub fn session(&self) -> &Arc<DirSession> {
        &self.session
    }

    /// Reject logical folder paths that try to escape the granted root.
    fn validate_folder(folder: &str) -> Result<(), StorageError> {
        if folder.split('/').any(|seg| seg == "..") {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_backend(BACKEND)
                .with_context("folder path escapes the granted root")
                .with_path(folder));
        }
        Ok(())
    }

    /// The granted root, connecting on demand if the session is empty.
    fn connected_root(&self) -> Result<PathBuf, StorageError> {
        if self.session.handle().is_none() {
            self.connect()?;
        }
        self.session
            .handle()
            .map(|h| h.root().to_path_buf())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::PermissionDenied).with_backend(BACKEND)
            })
    }

    /// Resolve a logical folder to a directory under the granted root,
    /// walking one path segment at a time.
    ///
    /// Missing segments are created only when `create` is set; otherwise a
    /// missing segment resolves to `None`.
    fn resolve_dir(&self, folder: &str, create: bool) -> Result<Option<PathBuf>, StorageError> {
        Self::validate_folder(folder)?;
        let mut dir = self.connected_root()?;

        for segment in folder.split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
            if dir.is_dir() {
                continue;
            }
            if !create {
                return Ok(None);
            }
            if let Err(e) = fs::create_dir(&dir) {
                // Tolerate a concurrent create of the same segment.
                if e.kind() != std::io::ErrorKind::AlreadyExists {
                    return Err(StorageError::io(e, Some(folder.to_owned())).with_backend(BACKEND));
                }
            }
        }

        Ok(Some(dir))
    }
}

impl StorageProvider for LocalProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Local
    }

    fn connect(&self) -> Result<(), StorageError> {
        if self.session.handle().is_none()
            && let Some(handle) = self.store.load()
        {
            debug!("reloaded persisted directory handle: {}", handle.root().display());
            self.session.set(handle);
        }

        if let Some(handle) = self.session.handle() {
            if handle.query_permission() {
                return Ok(());
            }
            // Grant was downgraded since it was persisted; ask again.
            if self.prompt.request_permission(handle.root()) && handle.query_permission() {
                return Ok(());
            }
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_backend(BACKEND)
                .with_path(handle.root().display().to_string()));
        }

        let Some(root) = self.prompt.pick_directory() else {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_backend(BACKEND)
                .with_context("no directory granted"));
        };
        let handle = DirHandle::new(root);
        self.store.save(handle.root())?;
        self.session.set(handle);
        Ok(())
    }

    fn has_access(&self) -> bool {
        if self.session.handle().is_none()
            && let Some(handle) = self.store.load()
        {
            self.session.set(handle);
        }
        self.session
            .handle()
            .is_some_and(|h| h.query_permission())
    }

    fn list_entries(
        &self,
        folder: &str,
        extension: &str,
        format: EntryFormat,
    ) -> Result<Vec<Entry>, StorageError> {
        let Some(dir) = self.resolve_dir(folder, false)? else {
            return Ok(Vec::new());
        };

        let suffix = format!(".{extension}");
        let mut ids = Vec::new();
        let read_dir = fs::read_dir(&dir)
            .map_err(|e| StorageError::io(e, Some(folder.to_owned())).with_backend(BACKEND))?;
        for child in read_dir {
            let child = child
                .map_err(|e| StorageError::io(e, Some(folder.to_owned())).with_backend(BACKEND))?;
            if !child.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            let name = child.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_suffix(&suffix) {
                ids.push(id.to_owned());
            }
        }
        ids.sort_unstable();

        // Delegating to get_entry keeps decode behavior and error handling
        // identical between list and get.
        ids.iter()
            .map(|id| self.get_entry(folder, id, extension, format))
            .collect()
    }

    fn get_entry(
        &self,
        folder: &str,
        id: &str,
        extension: &str,
        format: EntryFormat,
    ) -> Result<Entry, StorageError> {
        let path = entry_path(folder, id, extension);
        let Some(dir) = self.resolve_dir(folder, false)? else {
            return Err(StorageError::not_found(path).with_backend(BACKEND));
        };

        let raw = fs::read_to_string(dir.join(format!("{id}.{extension}")))
            .map_err(|e| StorageError::io(e, Some(path)).with_backend(BACKEND))?;

        let mut entry = codec::decode(&raw, format).with_id(id);
        if format == EntryFormat::Frontmatter
            && let Some(content) = entry.content.take()
        {
            entry.content = Some(strip_one_leading_newline(&content).to_owned());
        }
        Ok(entry)
    }

    fn save_entry(
        &self,
        folder: &str,
        id: &str,
        entry: &Entry,
        extension: &str,
        format: EntryFormat,
    ) -> Result<(), StorageError> {
        let path = entry_path(folder, id, extension);
        let dir = self.resolve_dir(folder, true)?.ok_or_else(|| {
            StorageError::new(StorageErrorKind::PermissionDenied)
                .with_backend(BACKEND)
                .with_path(path.clone())
        })?;

        let raw = codec::encode(entry, format)?;
        let target = dir.join(format!("{id}.{extension}"));

        // Stage in a temporary file and persist over the target, so either
        // the full new content lands or the old content remains.
        let to_err = |e: std::io::Error| StorageError::io(e, Some(path.clone())).with_backend(BACKEND);
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(to_err)?;
        tmp.write_all(raw.as_bytes()).map_err(to_err)?;
        tmp.persist(&target).map_err(|e| to_err(e.error))?;
        Ok(())
    }

    fn delete_entry(&self, folder: &str, id: &str, extension: &str) -> Result<(), StorageError> {
        let Some(dir) = self.resolve_dir(folder, false)? else {
            return Ok(());
        };

        match fs::remove_file(dir.join(format!("{id}.{extension}"))) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::DeleteFailed)
                .with_backend(BACKEND)
                .with_path(entry_path(folder, id, extension))
                .with_source(e)),
        }
    }
}
