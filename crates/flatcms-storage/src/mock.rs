//! Mock storage provider for testing.
//!
//! Provides [`MockProvider`] for unit testing consumers without filesystem
//! or network access. Stores raw file bodies in memory and runs them
//! through the shared codec, so decode behavior matches real backends.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::codec;
use crate::entry::{Entry, EntryFormat};
use crate::provider::{ProviderType, StorageError, StorageProvider};

/// Join folder, id, and extension into the canonical storage key.
fn file_key(folder: &str, id: &str, extension: &str) -> String {
    if folder.is_empty() {
        format!("{id}.{extension}")
    } else {
        format!("{folder}/{id}.{extension}")
    }
}

/// In-memory storage provider for testing.
///
/// Use the builder methods to seed the mock with raw file bodies or
/// pre-encoded entries.
///
/// # Example
///
/// ```ignore
/// use flatcms_storage::{EntryFormat, MockProvider, StorageProvider};
///
/// let provider = MockProvider::new()
///     .with_raw_file("posts", "hello", "md", "---\ntitle: Hello\n---\n\nWorld");
///
/// let entry = provider
///     .get_entry("posts", "hello", "md", EntryFormat::Frontmatter)
///     .unwrap();
/// assert_eq!(entry.field_str("title"), Some("Hello"));
/// ```
#[derive(Debug, Default)]
pub struct MockProvider {
    files: RwLock<HashMap<String, String>>,
}

impl MockProvider {
    /// Create a new empty mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw file body.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_raw_file(
        self,
        folder: &str,
        id: &str,
        extension: &str,
        raw: impl Into<String>,
    ) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(file_key(folder, id, extension), raw.into());
        self
    }

    /// Seed an entry, encoding it through the codec.
    ///
    /// # Panics
    ///
    /// Panics if the entry cannot be encoded or the internal lock is
    /// poisoned.
    #[must_use]
    pub fn with_entry(
        self,
        folder: &str,
        id: &str,
        extension: &str,
        format: EntryFormat,
        entry: &Entry,
    ) -> Self {
        let raw = codec::encode(entry, format).unwrap();
        self.with_raw_file(folder, id, extension, raw)
    }

    /// The raw file body currently stored for an entry, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn raw_file(&self, folder: &str, id: &str, extension: &str) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(&file_key(folder, id, extension))
            .cloned()
    }
}

impl StorageProvider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Mock
    }

    fn connect(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn has_access(&self) -> bool {
        true
    }

    fn list_entries(
        &self,
        folder: &str,
        extension: &str,
        format: EntryFormat,
    ) -> Result<Vec<Entry>, StorageError> {
        let suffix = format!(".{extension}");
        let files = self.files.read().unwrap();

        let mut ids: Vec<&str> = files
            .keys()
            .filter_map(|key| {
                let (dir, name) = key.rsplit_once('/').unwrap_or(("", key));
                (dir == folder).then_some(name)
            })
            .filter_map(|name| name.strip_suffix(&suffix))
            .collect();
        ids.sort_unstable();

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let raw = &files[&file_key(folder, id, extension)];
            entries.push(codec::decode(raw, format).with_id(id));
        }
        Ok(entries)
    }

    fn get_entry(
        &self,
        folder: &str,
        id: &str,
        extension: &str,
        format: EntryFormat,
    ) -> Result<Entry, StorageError> {
        let key = file_key(folder, id, extension);
        let files = self.files.read().unwrap();
        let raw = files.get(&key).ok_or_else(|| StorageError::not_found(&key))?;
        Ok(codec::decode(raw, format).with_id(id))
    }

    fn save_entry(
        &self,
        folder: &str,
        id: &str,
        entry: &Entry,
        extension: &str,
        format: EntryFormat,
    ) -> Result<(), StorageError> {
        let raw = codec::encode(entry, format)?;
        self.files
            .write()
            .unwrap()
            .insert(file_key(folder, id, extension), raw);
        Ok(())
    }

    fn delete_entry(&self, folder: &str, id: &str, extension: &str) -> Result<(), StorageError> {
        self.files
            .write()
            .unwrap()
            .remove(&file_key(folder, id, extension));
        Ok(())
    }
}
