//! Configuration for zerotrust-exporter.
//!
//! Layered TOML + environment loading, API token resolution (env + keyring +
//! plaintext), and translation to `zerotrust_core::ExporterConfig`. The
//! binary adds CLI-flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zerotrust_core::{CollectorToggles, CoreError, ExporterConfig, TlsMode};

/// Keyring service name the API token is stored under.
pub const KEYRING_SERVICE: &str = "zerotrust-exporter";

/// Environment prefix for every config key (`ZEROTRUST_ACCOUNT_ID`, ...).
pub const ENV_PREFIX: &str = "ZEROTRUST_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured")]
    NoCredentials,

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<CoreError> for ConfigError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig { field, reason } => Self::Validation { field, reason },
            other => Self::Validation {
                field: "api_base".into(),
                reason: other.to_string(),
            },
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Cloudflare account ID.
    pub account_id: Option<String>,

    /// API token (plaintext; prefer keyring or env var).
    pub api_token: Option<String>,

    /// Environment variable name containing the API token.
    pub api_token_env: Option<String>,

    /// API root URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub debug: bool,

    /// Address the metrics server binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Seconds between collection cycles.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Drop a device series after this many successful cycles without it.
    /// 0 keeps series forever.
    #[serde(default)]
    pub stale_after_cycles: u32,

    #[serde(default)]
    pub collectors: Collectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_id: None,
            api_token: None,
            api_token_env: None,
            api_base: default_api_base(),
            timeout: default_timeout(),
            ca_cert: None,
            debug: false,
            listen: default_listen(),
            interval: default_interval(),
            stale_after_cycles: 0,
            collectors: Collectors::default(),
        }
    }
}

/// Per-entity-kind enable flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Collectors {
    #[serde(default = "default_true")]
    pub devices: bool,
}

impl Default for Collectors {
    fn default() -> Self {
        Self { devices: true }
    }
}

fn default_api_base() -> String {
    zerotrust_core::DEFAULT_API_BASE.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_listen() -> String {
    "0.0.0.0:9184".into()
}
fn default_interval() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Copy with the plaintext token masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_token.is_some() {
            copy.api_token = Some("********".into());
        }
        copy
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "zerotrust", "zerotrust-exporter").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("zerotrust-exporter");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Figment for defaults, then the TOML file, then `ZEROTRUST_*` env vars.
///
/// Nested keys use a double underscore: `ZEROTRUST_COLLECTORS__DEVICES`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config from `path` (or the platform default) + environment.
/// A missing file is not an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let config: Config = figment(&path).extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(account_id: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{account_id}/api-token"))?)
}

/// Store the API token for `account_id` in the system keyring.
pub fn store_api_token(account_id: &str, token: &SecretString) -> Result<(), ConfigError> {
    use secrecy::ExposeSecret;
    keyring_entry(account_id)?.set_password(token.expose_secret())?;
    Ok(())
}

/// Resolve the API token.
///
/// Order: explicit token (CLI flag or `ZEROTRUST_API_TOKEN`), then the
/// variable named by `api_token_env`, then the system keyring, then the
/// plaintext `api_token` in the file.
pub fn resolve_api_token(
    config: &Config,
    explicit: Option<SecretString>,
) -> Result<SecretString, ConfigError> {
    resolve_api_token_with(
        config,
        explicit,
        |name| std::env::var(name).ok(),
        |account_id| {
            keyring_entry(account_id)
                .ok()
                .and_then(|entry| entry.get_password().ok())
        },
    )
}

fn resolve_api_token_with(
    config: &Config,
    explicit: Option<SecretString>,
    env_lookup: impl Fn(&str) -> Option<String>,
    keyring_lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Flag / ZEROTRUST_API_TOKEN
    if let Some(token) = explicit {
        return Ok(token);
    }

    // 2. api_token_env → env var lookup
    if let Some(val) = config
        .api_token_env
        .as_deref()
        .and_then(|name| env_lookup(name))
        .filter(|val| !val.is_empty())
    {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = config.account_id.as_deref().and_then(|id| keyring_lookup(id)) {
        return Ok(SecretString::from(secret));
    }

    // 4. Plaintext in config
    if let Some(ref token) = config.api_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials)
}

// ── Translation ─────────────────────────────────────────────────────

/// Check the fields the exporter cannot run without.
pub fn validate(config: &Config) -> Result<String, ConfigError> {
    let account_id = config
        .account_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ConfigError::Validation {
            field: "account_id".into(),
            reason: "not set (use --account-id, ZEROTRUST_ACCOUNT_ID, or account_id in the config file)".into(),
        })?;

    url::Url::parse(&config.api_base).map_err(|e| ConfigError::Validation {
        field: "api_base".into(),
        reason: format!("invalid URL '{}': {e}", config.api_base),
    })?;

    if config.interval == 0 {
        return Err(ConfigError::Validation {
            field: "interval".into(),
            reason: "must be greater than zero".into(),
        });
    }

    Ok(account_id.to_owned())
}

/// Build an [`ExporterConfig`] from a loaded config and a resolved token.
pub fn to_exporter_config(
    config: &Config,
    api_token: SecretString,
) -> Result<ExporterConfig, ConfigError> {
    let account_id = validate(config)?;

    let mut exporter = ExporterConfig::new(account_id, api_token);
    exporter.api_base.clone_from(&config.api_base);
    exporter.tls = config
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);
    exporter.timeout = Duration::from_secs(config.timeout);
    exporter.poll_interval = Duration::from_secs(config.interval);
    exporter.stale_after_cycles = config.stale_after_cycles;
    exporter.collectors = CollectorToggles {
        devices: config.collectors.devices,
    };
    exporter.debug = config.debug;

    exporter.validate()?;
    Ok(exporter)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn config_with(account: &str) -> Config {
        Config {
            account_id: Some(account.into()),
            ..Config::default()
        }
    }

    fn resolve(
        config: &Config,
        explicit: Option<&str>,
        env: Option<&str>,
        keyring: Option<&str>,
    ) -> Result<String, ConfigError> {
        resolve_api_token_with(
            config,
            explicit.map(|t| SecretString::from(t.to_string())),
            |_| env.map(str::to_string),
            |_| keyring.map(str::to_string),
        )
        .map(|s| s.expose_secret().to_string())
    }

    #[test]
    fn token_chain_prefers_explicit() {
        let mut cfg = config_with("abc");
        cfg.api_token_env = Some("CF_TOKEN".into());
        cfg.api_token = Some("plain".into());
        assert_eq!(resolve(&cfg, Some("flag"), Some("env"), Some("ring")).unwrap(), "flag");
    }

    #[test]
    fn token_chain_env_then_keyring_then_plaintext() {
        let mut cfg = config_with("abc");
        cfg.api_token = Some("plain".into());
        cfg.api_token_env = Some("CF_TOKEN".into());

        assert_eq!(resolve(&cfg, None, Some("env"), Some("ring")).unwrap(), "env");
        assert_eq!(resolve(&cfg, None, Some(""), Some("ring")).unwrap(), "ring");
        assert_eq!(resolve(&cfg, None, None, None).unwrap(), "plain");
    }

    #[test]
    fn env_lookup_needs_api_token_env() {
        let cfg = config_with("abc");
        assert!(matches!(
            resolve(&cfg, None, Some("env"), None),
            Err(ConfigError::NoCredentials)
        ));
    }

    #[test]
    fn missing_account_is_a_validation_error() {
        let err = validate(&Config::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "account_id"));
    }

    #[test]
    fn bad_api_base_is_rejected() {
        let mut cfg = config_with("abc");
        cfg.api_base = "not a url".into();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn non_alphanumeric_account_fails_core_validation() {
        let cfg = config_with("abc/def");
        let err = to_exporter_config(&cfg, SecretString::from("t".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "account_id"));
    }

    #[test]
    fn translation_carries_every_field() {
        let mut cfg = config_with("abc123");
        cfg.timeout = 5;
        cfg.interval = 15;
        cfg.stale_after_cycles = 3;
        cfg.ca_cert = Some(PathBuf::from("/etc/ca.pem"));
        cfg.collectors.devices = false;
        cfg.debug = true;

        let exporter = to_exporter_config(&cfg, SecretString::from("t".to_string())).unwrap();
        assert_eq!(exporter.account_id, "abc123");
        assert_eq!(exporter.timeout, Duration::from_secs(5));
        assert_eq!(exporter.poll_interval, Duration::from_secs(15));
        assert_eq!(exporter.stale_after_cycles, 3);
        assert!(matches!(exporter.tls, TlsMode::CustomCa(ref p) if p == Path::new("/etc/ca.pem")));
        assert!(!exporter.collectors.devices);
        assert!(exporter.debug);
    }

    #[test]
    fn redacted_masks_plaintext_token() {
        let mut cfg = config_with("abc");
        cfg.api_token = Some("secret".into());
        assert_eq!(cfg.redacted().api_token.as_deref(), Some("********"));
        assert_eq!(Config::default().redacted().api_token, None);
    }
}
