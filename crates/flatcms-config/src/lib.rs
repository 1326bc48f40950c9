//! Configuration management for flatcms.
//!
//! Parses the application's JSON configuration file (`config.json`) with
//! serde. The storage layer consumes this configuration read-only: it cares
//! about the selected provider, the optional GitHub coordinates, and the
//! folder/extension/format triple of each collection. Field-level schema is
//! opaque to storage and carried through for the editing surface.
//!
//! ## Environment Variable Expansion
//!
//! `github.token` supports environment variable expansion so tokens stay
//! out of checked-in config files:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use expand::expand_env;
use flatcms_storage::EntryFormat;

/// Configured provider selection, including the `auto` mode resolved at
/// provider-creation time.
///
/// `gitlab` and `bitbucket` are part of the configuration vocabulary but
/// have no backend yet; selecting them fails fast in the provider factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSetting {
    /// Local filesystem backend.
    Local,
    /// GitHub-hosted repository backend.
    Github,
    /// Declared but unimplemented.
    Gitlab,
    /// Declared but unimplemented.
    Bitbucket,
    /// Resolve by execution context: local in local development, github
    /// otherwise.
    Auto,
}

/// GitHub provider coordinates and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSettings {
    /// Access token. Supports `${VAR}` expansion.
    pub token: String,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Target branch for reads and direct-mode writes.
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    "main".to_owned()
}

/// One editable field of a collection, consumed by the editing surface.
/// Opaque to the storage layer.
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    /// Field name (the key stored in the entry).
    pub name: String,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Widget type (e.g., "text", "markdown", "date", "boolean").
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
    /// Default value for new entries.
    #[serde(default)]
    pub default: Option<Value>,
    /// Hint text shown in the editor.
    #[serde(default)]
    pub hint: Option<String>,
    /// Editor column placement.
    #[serde(default)]
    pub column: Option<String>,
}

/// List-view column descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    /// Field name to display.
    pub name: String,
    /// Column header label.
    pub label: String,
}

/// Default sort order for a collection listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Sort {
    /// Field to sort by.
    pub key: String,
    /// `"asc"` or `"desc"`.
    pub direction: String,
}

/// A logical grouping of entries.
///
/// The storage layer uses only `path`, `extension`, and `format`; the rest
/// drives listing and editing.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    /// Machine name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Storage folder, relative to the provider root (e.g., `content/posts`).
    pub path: String,
    /// File extension without the dot (e.g., `md`, `json`).
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Serialization format of entry files.
    pub format: EntryFormat,
    /// Field whose value names new entries.
    #[serde(default)]
    pub identifier_field: Option<String>,
    /// Filename template (e.g., `{year}-{month}-{day}-{slug}`).
    #[serde(default)]
    pub filename: Option<String>,
    /// Icon name for navigation.
    #[serde(default)]
    pub icon: Option<String>,
    /// Editable fields.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// List-view columns.
    #[serde(default)]
    pub columns: Option<Vec<Column>>,
    /// Default sort order.
    #[serde(default)]
    pub sort: Option<Sort>,
    /// Routing slug override.
    #[serde(default)]
    pub slug: Option<String>,
}

fn default_extension() -> String {
    "md".to_owned()
}

/// Application-wide configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatCmsConfig {
    /// Site title.
    pub title: String,
    /// Selected storage provider.
    pub provider: ProviderSetting,
    /// Route remote writes through a feature branch and pull request
    /// instead of committing directly.
    #[serde(default)]
    pub editorial_mode: bool,
    /// Logo asset path.
    #[serde(default)]
    pub logo: Option<String>,
    /// Dark-mode logo asset path.
    #[serde(default)]
    pub logo_dark: Option<String>,
    /// Folder where uploaded media lands.
    #[serde(default)]
    pub media_folder: Option<String>,
    /// Public URL prefix for media.
    #[serde(default)]
    pub public_folder: Option<String>,
    /// Entry collections.
    #[serde(default)]
    pub collections: Vec<Collection>,
    /// Single-entry collections (site settings and the like).
    #[serde(default)]
    pub singletons: Vec<Collection>,
    /// GitHub coordinates, required when the github provider is selected.
    #[serde(default)]
    pub github: Option<GithubSettings>,
}

impl FlatCmsConfig {
    /// Load configuration from a JSON file.
    ///
    /// Expands environment variables in `github.token` after parsing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, not
    /// valid JSON, or references an unset environment variable.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;

        if let Some(github) = &mut config.github {
            github.token = expand_env(&github.token, "github.token")?;
        }

        Ok(config)
    }

    /// Validate provider-specific requirements.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` when the github provider is
    /// selected without complete GitHub settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.provider, ProviderSetting::Github) {
            let Some(github) = &self.github else {
                return Err(ConfigError::Validation(
                    "github provider selected but no github section present".to_owned(),
                ));
            };
            github.validate()?;
        }
        Ok(())
    }
}

impl GithubSettings {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.token, "github.token")?;
        require_non_empty(&self.owner, "github.owner")?;
        require_non_empty(&self.repo, "github.repo")?;
        require_non_empty(&self.branch, "github.branch")?;
        Ok(())
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., `github.token`).
        field: String,
        /// Description of the failure.
        message: String,
    },
}
