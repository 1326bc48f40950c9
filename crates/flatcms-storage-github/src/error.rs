//! Error types for the GitHub backend.

/// Error from GitHub API operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    Http(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// File content was not valid base64.
    #[error("invalid base64 in file content")]
    Base64(#[from] base64::DecodeError),

    /// Decoded file content was not valid UTF-8.
    #[error("file content is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl ApiError {
    /// HTTP status code of a rejected response, if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote answered 404 for the requested resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
