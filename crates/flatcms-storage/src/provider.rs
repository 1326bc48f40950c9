//! Storage provider trait and error types.
//!
//! Provides the core [`StorageProvider`] trait implemented by every backend,
//! along with [`StorageError`] for unified error handling.
//!
//! # Path Convention
//!
//! Entries are addressed by a logical `folder` path (slash-separated,
//! relative to the backend's root), an `id` (filename stem), and a file
//! `extension`. Backends map these onto their own storage layout; the full
//! file location is always `{folder}/{id}.{extension}`.

use crate::entry::{Entry, EntryFormat};

/// Concrete backend variants.
///
/// `Mock` exists for the in-memory test double; real deployments select
/// `Local` or `Github` through the provider factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Local filesystem backend with a capability-scoped root directory.
    Local,
    /// Remote GitHub-hosted repository backend.
    Github,
    /// In-memory test backend.
    Mock,
}

impl ProviderType {
    /// Stable lowercase name, matching the configuration vocabulary.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Github => "github",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic error categories for storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Missing folder or entry on a targeted read.
    NotFound,
    /// Local access not granted, or granted permission was revoked.
    PermissionDenied,
    /// Missing credentials or an unimplemented provider type.
    Configuration,
    /// Remote write rejected because the expected version hash was stale.
    Conflict,
    /// Removal failed for a reason other than absence.
    DeleteFailed,
    /// Underlying network or filesystem fault, not otherwise classified.
    Transport,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Logical path context (e.g., `posts/hello.md`), if applicable.
    pub path: Option<String>,
    /// Backend identifier (e.g., "Local", "Github").
    pub backend: Option<&'static str>,
    /// Operation context (e.g., which editorial-mode step failed).
    pub context: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            context: None,
            source: None,
        }
    }

    /// Attach logical path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach operation context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Configuration).with_context(message)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            _ => StorageErrorKind::Transport,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: context: source (path: foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::Configuration => "Configuration error",
            StorageErrorKind::Conflict => "Conflict",
            StorageErrorKind::DeleteFailed => "Delete failed",
            StorageErrorKind::Transport => "Transport error",
        };

        write!(f, "{kind_str}")?;

        if let Some(context) = &self.context {
            write!(f, ": {context}")?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Capability contract implemented by every storage backend.
///
/// Each backend instance moves lazily through `Disconnected → Connected`;
/// a revoked permission or rejected credential is detected on the next
/// operation, not by background polling.
///
/// Callers must not issue overlapping save/delete calls for the same
/// `folder` + `id` without external serialization; the contract makes no
/// ordering guarantee between concurrent operations on one entry.
pub trait StorageProvider: Send + Sync {
    /// The concrete backend variant.
    fn provider_type(&self) -> ProviderType;

    /// Establish whatever session state the backend needs.
    ///
    /// Idempotent: safe to call repeatedly, a no-op once access is
    /// established.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] with kind `PermissionDenied` when the user
    /// declines access, or `Configuration` when credentials are missing.
    fn connect(&self) -> Result<(), StorageError>;

    /// Non-throwing capability probe.
    ///
    /// Reports current state only; never attempts to acquire access.
    fn has_access(&self) -> bool;

    /// List every entry in `folder` whose filename ends with `.{extension}`.
    ///
    /// Each entry is decoded via the codec and tagged with its derived id.
    /// A missing folder yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on I/O or transport failure.
    fn list_entries(
        &self,
        folder: &str,
        extension: &str,
        format: EntryFormat,
    ) -> Result<Vec<Entry>, StorageError>;

    /// Fetch and decode a single entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] with kind `NotFound` when the file is
    /// absent.
    fn get_entry(
        &self,
        folder: &str,
        id: &str,
        extension: &str,
        format: EntryFormat,
    ) -> Result<Entry, StorageError>;

    /// Encode and persist an entry at `{folder}/{id}.{extension}`.
    ///
    /// Creates intermediate directories as needed; creates the file if
    /// absent and overwrites if present. The write is all-or-nothing:
    /// either the full new content lands or the old content remains.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on write failure, including `Conflict`
    /// when a remote backend rejects a stale version hash.
    fn save_entry(
        &self,
        folder: &str,
        id: &str,
        entry: &Entry,
        extension: &str,
        format: EntryFormat,
    ) -> Result<(), StorageError>;

    /// Remove an entry's file.
    ///
    /// Succeeds silently when the file is already absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] with kind `DeleteFailed` when removal
    /// fails for any reason other than absence.
    fn delete_entry(&self, folder: &str, id: &str, extension: &str) -> Result<(), StorageError>;
}

impl std::fmt::Debug for dyn StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StorageProvider")
            .field(&self.provider_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_names() {
        assert_eq!(ProviderType::Local.as_str(), "local");
        assert_eq!(ProviderType::Github.as_str(), "github");
        assert_eq!(ProviderType::Mock.to_string(), "mock");
    }

    #[test]
    fn test_error_kind_variants() {
        assert_ne!(StorageErrorKind::NotFound, StorageErrorKind::PermissionDenied);
        assert_ne!(StorageErrorKind::Configuration, StorageErrorKind::Conflict);
        assert_ne!(StorageErrorKind::DeleteFailed, StorageErrorKind::Transport);
    }

    #[test]
    fn test_error_new() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert!(err.path.is_none());
        assert!(err.backend.is_none());
        assert!(err.context.is_none());
    }

    #[test]
    fn test_error_not_found() {
        let err = StorageError::not_found("posts/hello.md");

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.path.as_deref(), Some("posts/hello.md"));
    }

    #[test]
    fn test_error_configuration() {
        let err = StorageError::configuration("GitHub configuration missing");

        assert_eq!(err.kind, StorageErrorKind::Configuration);
        assert_eq!(
            err.to_string(),
            "Configuration error: GitHub configuration missing"
        );
    }

    #[test]
    fn test_error_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = StorageError::io(io_err, Some("posts/hello.md".to_owned()));

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.path.as_deref(), Some("posts/hello.md"));
    }

    #[test]
    fn test_error_io_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::io(io_err, None);

        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_error_io_other_is_transport() {
        let io_err = std::io::Error::other("disk on fire");
        let err = StorageError::io(io_err, None);

        assert_eq!(err.kind, StorageErrorKind::Transport);
    }

    #[test]
    fn test_error_display_simple() {
        let err = StorageError::new(StorageErrorKind::NotFound);
        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_error_display_full() {
        let io_err = std::io::Error::other("socket closed");
        let err = StorageError::new(StorageErrorKind::Transport)
            .with_backend("Github")
            .with_context("create branch")
            .with_path("posts/hello.md")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Github] Transport error: create branch: socket closed (path: posts/hello.md)"
        );
    }

    #[test]
    fn test_error_downcast_source() {
        let io_err = std::io::Error::other("boom");
        let err = StorageError::new(StorageErrorKind::Transport).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
        assert!(err.downcast_source::<std::fmt::Error>().is_none());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
