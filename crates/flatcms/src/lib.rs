//! Flat-file CMS storage layer.
//!
//! Ties the pieces together: [`flatcms_config`] describes what to connect
//! to, [`flatcms_storage`] defines the provider contract and content
//! codec, and the `fs` and `github` backends implement it. This crate adds
//! the provider selector, which resolves a configured provider name
//! (including `auto` mode) to a concrete backend.
//!
//! ```ignore
//! use flatcms::{ExecutionContext, FlatCmsConfig, create_provider};
//!
//! let config = FlatCmsConfig::load(Path::new("config.json"))?;
//! let provider = create_provider(&config, &ExecutionContext::new("localhost"))?;
//! provider.connect()?;
//! ```

pub use flatcms_config::{Collection, ConfigError, FlatCmsConfig, GithubSettings, ProviderSetting};
pub use flatcms_storage::{
    CONTENT_FIELD, Entry, EntryFormat, ID_FIELD, ProviderType, StorageError, StorageErrorKind,
    StorageProvider, codec,
};
pub use flatcms_storage_fs::{AccessPrompt, HandleStore, LocalProvider, NullPrompt, StaticGrant};
pub use flatcms_storage_github::{GithubOptions, GithubProvider};

/// Where the application is running, for resolving `auto` provider mode.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    host: String,
}

impl ExecutionContext {
    /// Context for an application served from the given host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Whether this is a recognized local-development host.
    #[must_use]
    pub fn is_local_dev(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1")
    }
}

fn provider_name(setting: ProviderSetting) -> &'static str {
    match setting {
        ProviderSetting::Local => "local",
        ProviderSetting::Github => "github",
        ProviderSetting::Gitlab => "gitlab",
        ProviderSetting::Bitbucket => "bitbucket",
        ProviderSetting::Auto => "auto",
    }
}

/// Resolve the configured provider to a concrete backend.
///
/// `auto` resolves to the local backend in a local-development context and
/// to the GitHub backend otherwise. This is a pure factory: no backend is
/// connected, no prompt is shown, no network or filesystem is touched.
///
/// The local backend is created headless: it persists grants at the
/// default per-user location and never prompts, so it only connects when a
/// prior grant exists. Use [`create_provider_with_prompt`] to supply an
/// interactive prompt.
///
/// # Errors
///
/// Returns a `Configuration` error for provider types with no backend
/// (`gitlab`, `bitbucket`) and for the github provider without a `github`
/// config section.
pub fn create_provider(
    config: &FlatCmsConfig,
    ctx: &ExecutionContext,
) -> Result<Box<dyn StorageProvider>, StorageError> {
    create_provider_with_prompt(
        config,
        ctx,
        HandleStore::at_default_location(),
        Box::new(NullPrompt),
    )
}

/// [`create_provider`] with an explicit handle store and access prompt for
/// the local backend.
///
/// # Errors
///
/// Same as [`create_provider`].
pub fn create_provider_with_prompt(
    config: &FlatCmsConfig,
    ctx: &ExecutionContext,
    store: HandleStore,
    prompt: Box<dyn AccessPrompt>,
) -> Result<Box<dyn StorageProvider>, StorageError> {
    let mut setting = config.provider;
    if setting == ProviderSetting::Auto {
        setting = if ctx.is_local_dev() {
            ProviderSetting::Local
        } else {
            ProviderSetting::Github
        };
    }

    match setting {
        ProviderSetting::Local => Ok(Box::new(LocalProvider::new(store, prompt))),
        ProviderSetting::Github => {
            let Some(github) = &config.github else {
                return Err(StorageError::configuration(
                    "github provider selected but no github section configured",
                ));
            };
            Ok(Box::new(GithubProvider::new(&GithubOptions {
                token: github.token.clone(),
                owner: github.owner.clone(),
                repo: github.repo.clone(),
                branch: github.branch.clone(),
                editorial_mode: config.editorial_mode,
            })))
        }
        ProviderSetting::Gitlab | ProviderSetting::Bitbucket | ProviderSetting::Auto => {
            Err(StorageError::configuration(format!(
                "provider {} not implemented",
                provider_name(setting)
            )))
        }
    }
}
