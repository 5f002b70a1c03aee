//! Content store errors

/// Errors from talking to the content store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout)
    #[error("content store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-2xx status
    #[error("content store error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not match the expected projection
    #[error("unexpected content store response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A write was attempted without a token
    #[error("no write token configured; set SANITY_API_TOKEN to accept comments")]
    MissingToken,

    /// The store is not reachable (local stores and fixtures)
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Short machine-readable kind, used in logs and JSON error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Request(_) => "request",
            StoreError::Api { .. } => "api",
            StoreError::Decode(_) => "decode",
            StoreError::MissingToken => "missing_token",
            StoreError::Unavailable(_) => "unavailable",
        }
    }
}
