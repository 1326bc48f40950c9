//! GitHub repository storage backend for flatcms.
//!
//! Entries live as files in a GitHub repository, read and written through
//! the REST contents API. Saves either commit directly to the configured
//! branch, or — in editorial mode — create a short-lived `cms/` branch,
//! commit there, and open a pull request for review. Deletes are always
//! direct to the configured branch.

mod client;
mod error;
mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use flatcms_storage::{
    Entry, EntryFormat, ProviderType, StorageError, StorageErrorKind, StorageProvider, codec,
};

pub use client::GithubClient;
pub use error::ApiError;
pub use types::{ContentFile, ContentItem, GitObject, GitRef, PullRequest};

/// Backend identifier for error messages.
const BACKEND: &str = "GitHub";

/// Connection settings for a repository.
#[derive(Debug, Clone)]
pub struct GithubOptions {
    /// Personal access token or installation token.
    pub token: String,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch that holds the published content.
    pub branch: String,
    /// Route saves through a feature branch and pull request instead of
    /// committing directly.
    pub editorial_mode: bool,
}

/// Join folder, id, and extension into the repository-relative file path.
fn entry_path(folder: &str, id: &str, extension: &str) -> String {
    if folder.is_empty() {
        format!("{id}.{extension}")
    } else {
        format!("{folder}/{id}.{extension}")
    }
}

/// Editorial branch name for one save of one entry. Unique per save, so
/// branches are never reused across edits.
fn editorial_branch(id: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("cms/{id}-{millis}")
}

/// Storage provider backed by a GitHub repository.
pub struct GithubProvider {
    client: GithubClient,
    branch: String,
    editorial_mode: bool,
    connected: AtomicBool,
}

impl GithubProvider {
    /// Create a provider for the given repository settings.
    #[must_use]
    pub fn new(options: &GithubOptions) -> Self {
        Self {
            client: GithubClient::new(&options.token, &options.owner, &options.repo),
            branch: options.branch.clone(),
            editorial_mode: options.editorial_mode,
            connected: AtomicBool::new(false),
        }
    }

    /// Point the underlying client at a different API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.client = self.client.with_api_base(api_base);
        self
    }

    /// Map an API failure onto the storage error taxonomy.
    fn api_error(err: ApiError, path: Option<String>) -> StorageError {
        let kind = match err.status() {
            Some(404) => StorageErrorKind::NotFound,
            Some(401 | 403) => StorageErrorKind::PermissionDenied,
            _ => StorageErrorKind::Transport,
        };
        let mut mapped = StorageError::new(kind).with_backend(BACKEND).with_source(err);
        if let Some(path) = path {
            mapped = mapped.with_path(path);
        }
        mapped
    }

    /// [`api_error`](Self::api_error) for the commit path, where a 409 or
    /// 422 means the remote rejected a stale content hash. That reading is
    /// specific to hash-keyed writes; a 422 elsewhere (say, from opening a
    /// pull request) is not a conflict.
    fn commit_error(err: ApiError, path: Option<String>) -> StorageError {
        if matches!(err.status(), Some(409 | 422)) {
            let mut mapped = StorageError::new(StorageErrorKind::Conflict)
                .with_backend(BACKEND)
                .with_source(err);
            if let Some(path) = path {
                mapped = mapped.with_path(path);
            }
            return mapped;
        }
        Self::api_error(err, path)
    }

    /// Current content hash of a file, or `None` when it does not exist.
    ///
    /// Any lookup failure reads as "new file"; the subsequent write
    /// surfaces real faults.
    fn probe_sha(&self, path: &str, branch: &str) -> Option<String> {
        match self.client.get_content_file(path, branch) {
            Ok(file) => Some(file.sha),
            Err(e) => {
                debug!("no existing file at {path} on {branch}: {e}");
                None
            }
        }
    }
}

impl StorageProvider for GithubProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Github
    }

    fn connect(&self) -> Result<(), StorageError> {
        // No-op once access has been established.
        if self.connected.load(Ordering::Relaxed) {
            return Ok(());
        }
        if !self.client.has_token() {
            return Err(StorageError::configuration("GitHub token is not configured")
                .with_backend(BACKEND));
        }
        // Verify the token and branch actually resolve.
        self.client
            .get_branch_ref(&self.branch)
            .map_err(|e| Self::api_error(e, None).with_context("failed to reach repository"))?;
        self.connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn has_access(&self) -> bool {
        self.client.has_token()
    }

    fn list_entries(
        &self,
        folder: &str,
        extension: &str,
        format: EntryFormat,
    ) -> Result<Vec<Entry>, StorageError> {
        let value = match self.client.get_contents(folder, &self.branch) {
            Ok(value) => value,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(Self::api_error(e, Some(folder.to_owned()))),
        };

        // A file path answers with an object; only directories list.
        if !value.is_array() {
            return Ok(Vec::new());
        }
        let items: Vec<ContentItem> = serde_json::from_value(value)
            .map_err(|e| Self::api_error(ApiError::Json(e), Some(folder.to_owned())))?;

        let suffix = format!(".{extension}");
        let mut ids: Vec<String> = items
            .iter()
            .filter(|item| item.item_type == "file")
            .filter_map(|item| item.name.strip_suffix(&suffix))
            .map(str::to_owned)
            .collect();
        ids.sort_unstable();

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
        let file = self
            .client
            .get_content_file(&path, &self.branch)
            .map_err(|e| Self::api_error(e, Some(path.clone())))?;
        let text = file
            .decoded_text()
            .map_err(|e| Self::api_error(e, Some(path)))?;
        Ok(codec::decode(&text, format).with_id(id))
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
        let raw = codec::encode(entry, format)?;

        let target_branch = if self.editorial_mode {
            editorial_branch(id)
        } else {
            self.branch.clone()
        };

        if self.editorial_mode {
            let base = self.client.get_branch_ref(&self.branch).map_err(|e| {
                Self::api_error(e, Some(path.clone()))
                    .with_context("failed to read base branch for editorial save")
            })?;
            self.client
                .create_branch_ref(&target_branch, &base.object.sha)
                .map_err(|e| {
                    Self::api_error(e, Some(path.clone()))
                        .with_context("failed to create editorial branch")
                })?;
        }

        let sha = self.probe_sha(&path, &target_branch);
        self.client
            .put_content(
                &path,
                &format!("content: update {id}"),
                &BASE64.encode(raw.as_bytes()),
                &target_branch,
                sha.as_deref(),
            )
            .map_err(|e| Self::commit_error(e, Some(path.clone())).with_context("failed to commit"))?;

        if self.editorial_mode {
            self.client
                .create_pull(
                    &format!("CMS: Edit {id}"),
                    &target_branch,
                    &self.branch,
                    "Changes made via Flat CMS.",
                )
                .map_err(|e| {
                    Self::api_error(e, Some(path))
                        .with_context("failed to open pull request for editorial save")
                })?;
        }

        Ok(())
    }

    fn delete_entry(&self, folder: &str, id: &str, extension: &str) -> Result<(), StorageError> {
        let path = entry_path(folder, id, extension);

        let sha = match self.client.get_content_file(&path, &self.branch) {
            Ok(file) => file.sha,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::DeleteFailed)
                    .with_backend(BACKEND)
                    .with_path(path)
                    .with_source(e));
            }
        };

        self.client
            .delete_content(&path, &format!("content: delete {id}"), &sha, &self.branch)
            .map_err(|e| {
                StorageError::new(StorageErrorKind::DeleteFailed)
                    .with_backend(BACKEND)
                    .with_path(path)
                    .with_source(e)
            })
    }
}
