//! Storage abstraction for the flatcms content layer.
//!
//! This crate defines the contract shared by all storage backends:
//!
//! - [`StorageProvider`] trait with connect/probe and the four CRUD
//!   operations over named entries
//! - [`Entry`] and [`EntryFormat`] data types
//! - [`StorageError`] for unified error handling across backends
//! - [`codec`] for converting entries to and from serialized file bodies
//! - [`MockProvider`] for testing (behind the `mock` feature flag)
//!
//! Backends live in sibling crates (`flatcms-storage-fs`,
//! `flatcms-storage-github`) and are selected by the `flatcms` facade.
//!
//! # Example
//!
//! ```ignore
//! use flatcms_storage::{EntryFormat, StorageProvider};
//!
//! fn titles(provider: &dyn StorageProvider) -> Vec<String> {
//!     let entries = provider
//!         .list_entries("posts", "md", EntryFormat::Frontmatter)
//!         .unwrap_or_default();
//!     entries
//!         .iter()
//!         .filter_map(|e| e.field_str("title").map(str::to_owned))
//!         .collect()
//! }
//! ```

pub mod codec;
mod entry;
#[cfg(feature = "mock")]
mod mock;
mod provider;

pub use entry::{CONTENT_FIELD, Entry, EntryFormat, ID_FIELD};
#[cfg(feature = "mock")]
pub use mock::MockProvider;
pub use provider::{ProviderType, StorageError, StorageErrorKind, StorageProvider};
