//! Content entry types.
//!
//! An [`Entry`] is one content record: a mapping from field name to JSON
//! value, plus two reserved fields handled outside the map. `id` is derived
//! from the filename by the backend and never persisted inside the file
//! body; `content` is the free-text body of hybrid (frontmatter) files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved field name for the entry identifier.
///
/// Injected by backends after decoding, stripped by the codec before
/// serialization. Never part of the on-disk payload.
pub const ID_FIELD: &str = "id";

/// Reserved field name for the free-text body.
pub const CONTENT_FIELD: &str = "content";

/// Serialization format of an entry's file body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryFormat {
    /// YAML metadata block followed by a free-text body, delimited by
    /// `---` lines.
    Frontmatter,
    /// Pure structured JSON document.
    Json,
}

impl std::fmt::Display for EntryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frontmatter => write!(f, "frontmatter"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// One content record, identified by folder + id + extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    /// Identifier derived from the filename (stem without extension).
    /// `None` until a backend tags the entry.
    pub id: Option<String>,
    /// Field name to value mapping (the structured part of the record).
    pub fields: serde_json::Map<String, Value>,
    /// Free-text body. Meaningful for the frontmatter format; for JSON
    /// documents a top-level string `"content"` key is lifted here so
    /// reserved-field handling is uniform across formats.
    pub content: Option<String>,
}

impl Entry {
    /// Create an empty entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a structured field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder: set the free-text body.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Builder: set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Look up a structured field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a structured field, expecting a string value.
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// True if the entry carries no fields and no body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.content.is_none()
    }
}
