/// Errors from catalog requests.
///
/// Returned to the caller untouched; no operation substitutes a fallback value.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Transport failure (connection refused, TLS, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the server.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The query was rejected before any request was sent.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl CatalogError {
    /// HTTP status attached to the failure, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}
