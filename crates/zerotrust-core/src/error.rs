// ── Core error types ──
//
// `CollectionError` is the outcome of one failed cycle. It never escapes the
// poller; it is logged and mirrored into the health signal. `CoreError`
// covers setup failures that happen before any cycle runs.

use thiserror::Error;

/// Why a collection cycle produced no metrics.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The request could not be built or sent, or the body could not be read.
    #[error("transport error: {0}")]
    Transport(#[source] zerotrust_api::Error),

    /// The API answered with a non-2xx status.
    #[error("upstream returned {status} {reason}: {body}")]
    Upstream {
        status: u16,
        reason: String,
        body: String,
    },

    /// The response body was not the expected JSON envelope.
    #[error("failed to decode response: {message}")]
    Decode { message: String, body: String },

    /// The caller cancelled the cycle while the fetch was in flight.
    #[error("collection cancelled")]
    Cancelled,
}

impl CollectionError {
    /// Short, stable name of the failure class (used as a log field).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Upstream { .. } => "upstream",
            Self::Decode { .. } => "decode",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<zerotrust_api::Error> for CollectionError {
    fn from(err: zerotrust_api::Error) -> Self {
        match err {
            zerotrust_api::Error::Upstream {
                status,
                reason,
                body,
                ..
            } => Self::Upstream {
                status,
                reason,
                body,
            },
            zerotrust_api::Error::Deserialization { message, body } => {
                Self::Decode { message, body }
            }
            other => Self::Transport(other),
        }
    }
}

/// Setup errors raised while wiring collectors from configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("failed to build API client: {0}")]
    ClientSetup(#[from] zerotrust_api::Error),
}
