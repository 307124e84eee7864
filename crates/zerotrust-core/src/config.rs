// ── Runtime exporter configuration ──
//
// Describes *what* to poll and *how* to reach the API. Carries credential
// data but never touches disk or the environment: the binary builds an
// `ExporterConfig` (via `zerotrust-config`) and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use zerotrust_api::{Credentials, DEFAULT_API_BASE, DexClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// Which entity-kind collectors run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorToggles {
    pub devices: bool,
}

impl Default for CollectorToggles {
    fn default() -> Self {
        Self { devices: true }
    }
}

/// Immutable configuration for one exporter process.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Cloudflare account the fleet belongs to.
    pub account_id: String,
    /// Scoped API token (sent as a bearer token).
    pub api_token: SecretString,
    /// API root, normally [`DEFAULT_API_BASE`].
    pub api_base: String,
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Time between collection cycles.
    pub poll_interval: Duration,
    /// Remove a device series after this many consecutive successful cycles
    /// without it. 0 = never.
    pub stale_after_cycles: u32,
    pub collectors: CollectorToggles,
    /// Verbose cycle logging.
    pub debug: bool,
}

impl ExporterConfig {
    /// Configuration with defaults for everything but the account and token.
    pub fn new(account_id: impl Into<String>, api_token: SecretString) -> Self {
        Self {
            account_id: account_id.into(),
            api_token,
            api_base: DEFAULT_API_BASE.into(),
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(60),
            stale_after_cycles: 0,
            collectors: CollectorToggles::default(),
            debug: false,
        }
    }

    /// Check the invariants the collectors rely on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.account_id.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                field: "account_id".into(),
                reason: "must not be empty".into(),
            });
        }
        if !self.account_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidConfig {
                field: "account_id".into(),
                reason: format!("expected an alphanumeric account ID, got '{}'", self.account_id),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::InvalidConfig {
                field: "interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::InvalidConfig {
                field: "timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }

    /// Build the DEX client bound to this account and token.
    pub fn dex_client(&self) -> Result<DexClient, CoreError> {
        self.validate()?;
        let credentials = Credentials::ApiToken(self.api_token.clone());
        Ok(DexClient::new(
            &self.api_base,
            self.account_id.clone(),
            &credentials,
            &self.transport(),
        )?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(account: &str) -> ExporterConfig {
        ExporterConfig::new(account, SecretString::from("tok".to_string()))
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = config("0123456789abcdef0123456789abcdef");
        assert!(cfg.validate().is_ok());
        assert!(cfg.collectors.devices);
        assert_eq!(cfg.stale_after_cycles, 0);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn empty_account_is_rejected() {
        let err = config("  ").validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { ref field, .. } if field == "account_id"));
    }

    #[test]
    fn path_characters_in_account_are_rejected() {
        assert!(config("abc/../x").validate().is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut cfg = config("abc");
        cfg.poll_interval = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn dex_client_is_bound_to_account() {
        let cfg = config("abc");
        let client = cfg.dex_client().unwrap_or_else(|e| panic!("client: {e}"));
        assert_eq!(client.account_id(), "abc");
    }
}
