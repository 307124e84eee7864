use thiserror::Error;

/// Top-level error type for the `zerotrust-api` crate.
///
/// Every variant describes one failed attempt against the upstream API.
/// `zerotrust-core` folds these into the cycle-level `CollectionError`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API token cannot be carried in an HTTP header.
    #[error("Invalid API token: {message}")]
    InvalidToken { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing or joining error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Upstream ────────────────────────────────────────────────────
    /// Non-2xx response. Carries the status line and raw body for diagnostics.
    #[error("failed to fetch {resource}: {status} {reason}, response body: {body}")]
    Upstream {
        resource: &'static str,
        status: u16,
        reason: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request hit the transport timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
