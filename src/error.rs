/// Error type for fetches, accessors and the HTTP collaborator.
///
/// The type is `Clone` because one settled fetch is shared by every caller that
/// was deduplicated onto it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// The request never produced a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected payload type.
    #[error("decode error: {0}")]
    Decode(String),

    /// The fetch was cancelled by a forced refresh of the same key.
    #[error("fetch cancelled")]
    Cancelled,

    /// The cached value for `key` was stored under a different type.
    #[error("cached value for key '{key}' has a different type")]
    TypeMismatch { key: String },

    /// An authenticated call was attempted without a bearer token.
    #[error("not signed in")]
    Unauthorized,

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Create a new HTTP status error.
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        FetchError::Http {
            status,
            detail: detail.into(),
        }
    }

    /// Whether this error came from a cancelled fetch.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
