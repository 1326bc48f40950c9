//! Content codec: bidirectional conversion between an [`Entry`] and a
//! serialized file body.
//!
//! Two formats are supported: pure structured JSON documents and hybrid
//! "frontmatter" files pairing a YAML metadata block with a free-text body:
//!
//! ```text
//! ---
//! title: Hello
//! ---
//!
//! World
//! ```
//!
//! Decoding favors availability over hard failure: malformed input is
//! logged and degraded to an empty or whole-body entry, never an error.
//! The reserved `id` field is stripped before serialization — it is derived
//! from the filename and never part of the payload written to disk.
//!
//! The codec performs no body trimming. The single normalization of a
//! leading blank line after the closing delimiter belongs to the local
//! backend, which applies it after decode.

use serde_json::Value;
use tracing::warn;

use crate::entry::{CONTENT_FIELD, Entry, EntryFormat, ID_FIELD};
use crate::provider::{StorageError, StorageErrorKind};

/// Decode a raw file body into an entry.
///
/// The returned entry is untagged (`id` is `None`); backends attach the
/// filename-derived id afterwards. This function never fails:
///
/// - malformed JSON (or a non-object document) yields an empty entry
/// - a frontmatter body without the delimiter pattern yields an entry whose
///   only content is the raw input, verbatim
/// - an unparsable metadata block falls back to the same whole-body entry
#[must_use]
pub fn decode(raw: &str, format: EntryFormat) -> Entry {
    match format {
        EntryFormat::Json => decode_json(raw),
        EntryFormat::Frontmatter => decode_frontmatter(raw),
    }
}

/// Encode an entry into a raw file body.
///
/// JSON documents are pretty-printed with 2-space indentation for
/// human-reviewable diffs. Frontmatter files are reassembled as
/// `---\n{metadata}\n---\n\n{body}` with exactly one blank line after the
/// closing delimiter, whether or not the body is empty.
///
/// # Errors
///
/// Returns [`StorageError`] if a field value cannot be serialized in the
/// target format. All JSON-representable values serialize cleanly; this is
/// a safety net, not an expected path.
pub fn encode(entry: &Entry, format: EntryFormat) -> Result<String, StorageError> {
    match format {
        EntryFormat::Json => encode_json(entry),
        EntryFormat::Frontmatter => encode_frontmatter(entry),
    }
}

fn decode_json(raw: &str) -> Entry {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("failed to parse JSON content, degrading to empty entry: {e}");
            return Entry::new();
        }
    };

    let Value::Object(mut fields) = value else {
        warn!("JSON content is not an object, degrading to empty entry");
        return Entry::new();
    };

    fields.remove(ID_FIELD);
    let content = take_string_content(&mut fields);

    Entry {
        id: None,
        fields,
        content,
    }
}

fn decode_frontmatter(raw: &str) -> Entry {
    let Some((metadata, body)) = split_frontmatter(raw) else {
        // No delimiter pattern: the whole input is the body.
        return Entry::new().with_content(raw);
    };

    let mut fields: serde_json::Map<String, Value> = match serde_yaml::from_str(metadata) {
        Ok(fields) => fields,
        Err(e) => {
            warn!("failed to parse YAML frontmatter, degrading to whole-body entry: {e}");
            return Entry::new().with_content(raw);
        }
    };

    fields.remove(ID_FIELD);
    // The body always wins over a `content` key in the metadata block.
    fields.remove(CONTENT_FIELD);

    Entry {
        id: None,
        fields,
        content: Some(body.to_owned()),
    }
}

fn encode_json(entry: &Entry) -> Result<String, StorageError> {
    let mut fields = entry.fields.clone();
    fields.remove(ID_FIELD);
    if let Some(content) = &entry.content {
        fields.insert(CONTENT_FIELD.to_owned(), Value::String(content.clone()));
    }

    serde_json::to_string_pretty(&fields).map_err(|e| {
        StorageError::new(StorageErrorKind::Transport)
            .with_context("failed to encode entry as json")
            .with_source(e)
    })
}

fn encode_frontmatter(entry: &Entry) -> Result<String, StorageError> {
    let mut fields = entry.fields.clone();
    fields.remove(ID_FIELD);
    fields.remove(CONTENT_FIELD);

    let metadata = serde_yaml::to_string(&fields).map_err(|e| {
        StorageError::new(StorageErrorKind::Transport)
            .with_context("failed to encode entry as frontmatter")
            .with_source(e)
    })?;
    let metadata = metadata.trim();
    let body = entry.content.as_deref().unwrap_or_default();

    Ok(format!("---\n{metadata}\n---\n\n{body}"))
}

/// Lift a top-level string `content` value out of the field map.
fn take_string_content(fields: &mut serde_json::Map<String, Value>) -> Option<String> {
    match fields.get(CONTENT_FIELD) {
        Some(Value::String(_)) => match fields.remove(CONTENT_FIELD) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

/// Split a raw frontmatter file into (metadata, body).
///
/// The input must match `---\n{metadata}\n---\n{body}` where every line
/// break may be CRLF or LF, the metadata block is non-empty, and the
/// closing delimiter is followed by a line break. Returns `None` when the
/// pattern is absent.
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw
        .strip_prefix("---\r\n")
        .or_else(|| raw.strip_prefix("---\n"))?;

    let mut search = 0;
    while let Some(found) = rest[search..].find("\n---") {
        let delim = search + found;
        let after = &rest[delim + 4..];

        let Some(body) = after
            .strip_prefix("\r\n")
            .or_else(|| after.strip_prefix('\n'))
        else {
            search = delim + 4;
            continue;
        };

        let metadata = rest[..delim].strip_suffix('\r').unwrap_or(&rest[..delim]);
        if metadata.is_empty() {
            search = delim + 4;
            continue;
        }

        return Some((metadata, body));
    }

    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    // ── frontmatter decode ───────────────────────────────────────────

    #[test]
    fn test_decode_frontmatter_well_formed() {
        let entry = decode("---\ntitle: Hello\n---\n\nWorld", EntryFormat::Frontmatter);

        assert_eq!(entry.field_str("title"), Some("Hello"));
        assert_eq!(entry.content.as_deref(), Some("\nWorld"));
        assert!(entry.id.is_none());
    }

    #[test]
    fn test_decode_frontmatter_crlf() {
        let entry = decode(
            "---\r\ntitle: Hello\r\n---\r\nWorld",
            EntryFormat::Frontmatter,
        );

        assert_eq!(entry.field_str("title"), Some("Hello"));
        assert_eq!(entry.content.as_deref(), Some("World"));
    }

    #[test]
    fn test_decode_frontmatter_typed_values() {
        let raw = "---\ntitle: Post\ndraft: true\nrating: 4\ntags:\n  - a\n  - b\n---\nbody";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert_eq!(entry.field("draft"), Some(&json!(true)));
        assert_eq!(entry.field("rating"), Some(&json!(4)));
        assert_eq!(entry.field("tags"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_decode_no_delimiters_is_whole_body() {
        let raw = "just some markdown\n\nwith paragraphs";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert!(entry.fields.is_empty());
        assert_eq!(entry.content.as_deref(), Some(raw));
    }

    #[test]
    fn test_decode_unterminated_frontmatter_is_whole_body() {
        let raw = "---\ntitle: Hello\nno closing delimiter";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert!(entry.fields.is_empty());
        assert_eq!(entry.content.as_deref(), Some(raw));
    }

    #[test]
    fn test_decode_closing_delimiter_without_newline_is_whole_body() {
        // The closing `---` must be followed by a line break.
        let raw = "---\ntitle: Hello\n---";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert!(entry.fields.is_empty());
        assert_eq!(entry.content.as_deref(), Some(raw));
    }

    #[test]
    fn test_decode_malformed_yaml_is_whole_body() {
        let raw = "---\ntitle: [invalid yaml\n---\nbody";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert!(entry.fields.is_empty());
        assert_eq!(entry.content.as_deref(), Some(raw));
    }

    #[test]
    fn test_decode_non_mapping_yaml_is_whole_body() {
        let raw = "---\n- a\n- b\n---\nbody";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert!(entry.fields.is_empty());
        assert_eq!(entry.content.as_deref(), Some(raw));
    }

    #[test]
    fn test_decode_body_wins_over_content_field() {
        let raw = "---\ntitle: Hello\ncontent: from-metadata\n---\nreal body";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert_eq!(entry.content.as_deref(), Some("real body"));
        assert!(entry.field(CONTENT_FIELD).is_none());
    }

    #[test]
    fn test_decode_id_in_metadata_is_dropped() {
        let raw = "---\nid: sneaky\ntitle: Hello\n---\nbody";
        let entry = decode(raw, EntryFormat::Frontmatter);

        assert!(entry.id.is_none());
        assert!(entry.field(ID_FIELD).is_none());
        assert_eq!(entry.field_str("title"), Some("Hello"));
    }

    #[test]
    fn test_decode_empty_input() {
        let entry = decode("", EntryFormat::Frontmatter);

        assert!(entry.fields.is_empty());
        assert_eq!(entry.content.as_deref(), Some(""));
    }

    // ── frontmatter encode ───────────────────────────────────────────

    #[test]
    fn test_encode_frontmatter_exact_shape() {
        let entry = Entry::new().with_field("title", "Hello").with_content("World");
        let raw = encode(&entry, EntryFormat::Frontmatter).unwrap();

        assert_eq!(raw, "---\ntitle: Hello\n---\n\nWorld");
    }

    #[test]
    fn test_encode_frontmatter_empty_body_keeps_blank_line() {
        let entry = Entry::new().with_field("title", "Hello");
        let raw = encode(&entry, EntryFormat::Frontmatter).unwrap();

        assert_eq!(raw, "---\ntitle: Hello\n---\n\n");
    }

    #[test]
    fn test_encode_frontmatter_strips_id() {
        let entry = Entry::new()
            .with_id("hello")
            .with_field("title", "Hello")
            .with_content("World");
        let raw = encode(&entry, EntryFormat::Frontmatter).unwrap();

        assert!(!raw.contains("id:"));
        assert!(!raw.contains("hello"));
    }

    #[test]
    fn test_encode_frontmatter_strips_reserved_fields_from_map() {
        // Reserved names placed directly in the field map never reach the
        // metadata block.
        let entry = Entry::new()
            .with_field("id", "sneaky")
            .with_field("content", "also sneaky")
            .with_field("title", "Hello");
        let raw = encode(&entry, EntryFormat::Frontmatter).unwrap();

        assert_eq!(raw, "---\ntitle: Hello\n---\n\n");
    }

    // ── round trips ──────────────────────────────────────────────────

    #[test]
    fn test_frontmatter_round_trip_fields_and_body() {
        let raw = "---\ntitle: Hello\ndraft: false\n---\nWorld\nmore lines\n";
        let first = decode(raw, EntryFormat::Frontmatter);
        let encoded = encode(&first, EntryFormat::Frontmatter).unwrap();
        let second = decode(&encoded, EntryFormat::Frontmatter);

        assert_eq!(first.fields, second.fields);
        // Encoding inserts the canonical blank line after the delimiter;
        // the local backend strips it again after decode.
        assert_eq!(second.content.as_deref(), Some("\nWorld\nmore lines\n"));
    }

    #[test]
    fn test_json_round_trip() {
        let entry = Entry::new()
            .with_field("title", "Hello")
            .with_field("count", 3)
            .with_field("nested", json!({"a": [1, 2]}))
            .with_content("body text");

        let encoded = encode(&entry, EntryFormat::Json).unwrap();
        let decoded = decode(&encoded, EntryFormat::Json);

        assert_eq!(decoded, entry);
    }

    // ── json ─────────────────────────────────────────────────────────

    #[test]
    fn test_decode_json_object() {
        let entry = decode(r#"{"title": "Hello", "count": 3}"#, EntryFormat::Json);

        assert_eq!(entry.field_str("title"), Some("Hello"));
        assert_eq!(entry.field("count"), Some(&json!(3)));
        assert!(entry.content.is_none());
    }

    #[test]
    fn test_decode_json_lifts_string_content() {
        let entry = decode(r#"{"title": "Hello", "content": "body"}"#, EntryFormat::Json);

        assert_eq!(entry.content.as_deref(), Some("body"));
        assert!(entry.field(CONTENT_FIELD).is_none());
    }

    #[test]
    fn test_decode_json_keeps_non_string_content_as_field() {
        let entry = decode(r#"{"content": 42}"#, EntryFormat::Json);

        assert!(entry.content.is_none());
        assert_eq!(entry.field(CONTENT_FIELD), Some(&json!(42)));
    }

    #[test]
    fn test_decode_json_malformed_is_empty() {
        let entry = decode("{not json", EntryFormat::Json);
        assert!(entry.is_empty());
    }

    #[test]
    fn test_decode_json_non_object_is_empty() {
        let entry = decode("[1, 2, 3]", EntryFormat::Json);
        assert!(entry.is_empty());
    }

    #[test]
    fn test_encode_json_pretty_two_space_indent() {
        let entry = Entry::new().with_field("title", "Hello");
        let raw = encode(&entry, EntryFormat::Json).unwrap();

        assert_eq!(raw, "{\n  \"title\": \"Hello\"\n}");
    }

    #[test]
    fn test_encode_json_strips_id() {
        let entry = Entry::new().with_id("hello").with_field("title", "Hello");
        let raw = encode(&entry, EntryFormat::Json).unwrap();

        assert!(!raw.contains("\"id\""));
    }
}
