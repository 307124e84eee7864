//! CLI error types with miette diagnostics.
//!
//! Maps config, setup, and collection errors into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use zerotrust_config::ConfigError;
use zerotrust_core::{CollectionError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Cloudflare API")]
    #[diagnostic(
        code(zerotrust::connection_failed),
        help("Check network access to the API base URL and any proxy or CA settings.")
    )]
    ConnectionFailed {
        #[source]
        source: zerotrust_api::Error,
    },

    #[error("Request to the Cloudflare API timed out")]
    #[diagnostic(
        code(zerotrust::timeout),
        help("Increase the timeout with --timeout or `timeout` in the config file.")
    )]
    Timeout,

    #[error("Could not bind metrics server to {addr}")]
    #[diagnostic(
        code(zerotrust::bind_failed),
        help("Choose a free address with --listen or `listen` in the config file.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Cloudflare rejected the API token ({status})")]
    #[diagnostic(
        code(zerotrust::auth_failed),
        help(
            "The token needs the account-level `Zero Trust: Read` permission\n\
             for the configured account ID."
        )
    )]
    AuthFailed { status: u16 },

    #[error("No API token configured")]
    #[diagnostic(
        code(zerotrust::no_credentials),
        help(
            "Pass --api-token, set ZEROTRUST_API_TOKEN, set api_token_env in the\n\
             config file, or run: zerotrust-exporter config set-token"
        )
    )]
    NoCredentials,

    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Cloudflare API returned {status} {reason}")]
    #[diagnostic(code(zerotrust::upstream))]
    Upstream {
        status: u16,
        reason: String,
        #[help]
        body: Option<String>,
    },

    #[error("Unexpected response from the Cloudflare API: {message}")]
    #[diagnostic(code(zerotrust::decode))]
    Decode { message: String },

    #[error("Interrupted")]
    #[diagnostic(code(zerotrust::interrupted))]
    Interrupted,

    // ── Validation / configuration ──────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(zerotrust::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(zerotrust::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(zerotrust::keyring),
        help("Store the token in the config file or an environment variable instead.")
    )]
    Keyring(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(zerotrust::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Bind { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Interrupted => exit_code::INTERRUPTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials => Self::NoCredentials,
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Keyring(e) => Self::Keyring(e.to_string()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig { field, reason } => Self::Validation { field, reason },
            CoreError::ClientSetup(source) => Self::Validation {
                field: "client".into(),
                reason: source.to_string(),
            },
        }
    }
}

impl From<CollectionError> for CliError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::Transport(source) if source.is_timeout() => Self::Timeout,
            CollectionError::Transport(source) => Self::ConnectionFailed { source },
            CollectionError::Upstream { status, .. } if matches!(status, 401 | 403) => {
                Self::AuthFailed { status }
            }
            CollectionError::Upstream {
                status,
                reason,
                body,
            } => Self::Upstream {
                status,
                reason,
                body: (!body.is_empty()).then(|| format!("Response body: {body}")),
            },
            CollectionError::Decode { message, .. } => Self::Decode { message },
            CollectionError::Cancelled => Self::Interrupted,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_maps_to_auth_exit_code() {
        let err = CliError::from(CollectionError::Upstream {
            status: 403,
            reason: "Forbidden".into(),
            body: String::new(),
        });
        assert!(matches!(err, CliError::AuthFailed { status: 403 }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn server_error_keeps_body_as_help() {
        let err = CliError::from(CollectionError::Upstream {
            status: 500,
            reason: "Internal Server Error".into(),
            body: "boom".into(),
        });
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert!(matches!(err, CliError::Upstream { body: Some(ref b), .. } if b.contains("boom")));
    }

    #[test]
    fn missing_token_and_validation_codes() {
        assert_eq!(CliError::from(ConfigError::NoCredentials).exit_code(), exit_code::AUTH);
        let err = CliError::from(ConfigError::Validation {
            field: "account_id".into(),
            reason: "not set".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn cancelled_cycle_is_interrupted() {
        assert_eq!(
            CliError::from(CollectionError::Cancelled).exit_code(),
            exit_code::INTERRUPTED
        );
    }
}
