//! GitHub REST API response types.
//!
//! Only the fields this backend reads are modeled; the API returns many
//! more, which serde ignores.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::error::ApiError;

/// One item of a directory-contents listing.
#[derive(Debug, Deserialize)]
pub struct ContentItem {
    /// File name including extension.
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// Current content hash.
    pub sha: String,
    /// Item kind: `file`, `dir`, `symlink`, or `submodule`.
    #[serde(rename = "type")]
    pub item_type: String,
}

/// A single file fetched through the contents API.
#[derive(Debug, Deserialize)]
pub struct ContentFile {
    /// File name including extension.
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// Current content hash, required for updates and deletes.
    pub sha: String,
    /// Encoded file content.
    pub content: String,
    /// Content encoding, `base64` in practice.
    pub encoding: String,
}

impl ContentFile {
    /// Decode the file body to text.
    ///
    /// The API wraps base64 content in newlines every 60 characters;
    /// whitespace is stripped before decoding.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the content is not valid base64 or the
    /// decoded bytes are not UTF-8.
    pub fn decoded_text(&self) -> Result<String, ApiError> {
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = BASE64.decode(compact)?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// A git reference, as returned by the ref API.
#[derive(Debug, Deserialize)]
pub struct GitRef {
    /// The object the reference points at.
    pub object: GitObject,
}

/// Target object of a git reference.
#[derive(Debug, Deserialize)]
pub struct GitObject {
    /// Commit hash.
    pub sha: String,
}

/// A created pull request.
#[derive(Debug, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Web URL of the pull request.
    #[serde(default)]
    pub html_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn file_with_content(content: &str) -> ContentFile {
        ContentFile {
            name: "hello.md".to_owned(),
            path: "posts/hello.md".to_owned(),
            sha: "abc123".to_owned(),
            content: content.to_owned(),
            encoding: "base64".to_owned(),
        }
    }

    #[test]
    fn test_decoded_text_strips_line_wrapping() {
        // "---\ntitle: Hello\n---\n\nWorld" base64-encoded, wrapped the way
        // the contents API wraps it.
        let file = file_with_content("LS0tCnRpdGxlOiBIZWxs\nbwotLS0KCldvcmxk\n");
        assert_eq!(file.decoded_text().unwrap(), "---\ntitle: Hello\n---\n\nWorld");
    }

    #[test]
    fn test_decoded_text_rejects_invalid_base64() {
        let file = file_with_content("not base64!!");
        assert!(matches!(file.decoded_text(), Err(ApiError::Base64(_))));
    }

    #[test]
    fn test_content_item_type_field() {
        let item: ContentItem = serde_json::from_str(
            r#"{ "name": "hello.md", "path": "posts/hello.md", "sha": "abc", "type": "file" }"#,
        )
        .unwrap();
        assert_eq!(item.item_type, "file");
    }
}
