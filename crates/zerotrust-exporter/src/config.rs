//! CLI configuration: thin wrapper around `zerotrust_config`.
//!
//! Applies `GlobalOpts` flag overrides on top of the layered file + env
//! config, then resolves the token and builds an `ExporterConfig`.

use secrecy::SecretString;

use zerotrust_config::Config;
use zerotrust_core::ExporterConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Path of the config file in effect (`--config` or the platform default).
pub fn effective_path(global: &GlobalOpts) -> std::path::PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(zerotrust_config::config_path)
}

/// Load file + env config and apply global flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = zerotrust_config::load_config(Some(effective_path(global).as_path()))?;

    if let Some(ref account_id) = global.account_id {
        cfg.account_id = Some(account_id.clone());
    }
    if let Some(ref api_base) = global.api_base {
        cfg.api_base.clone_from(api_base);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    cfg.debug |= global.debug;

    Ok(cfg)
}

/// Whether the loaded config asks for debug logging. Used before tracing is
/// set up, so load failures are ignored here and reported later.
pub fn wants_debug(global: &GlobalOpts) -> bool {
    global.debug || load(global).is_ok_and(|cfg| cfg.debug)
}

/// Resolve the token (flag > env > keyring > plaintext) and translate.
pub fn exporter_config(global: &GlobalOpts, cfg: &Config) -> Result<ExporterConfig, CliError> {
    // The keyring lookup is keyed by account ID.
    zerotrust_config::validate(cfg)?;

    let explicit = global
        .api_token
        .as_ref()
        .filter(|token| !token.is_empty())
        .map(|token| SecretString::from(token.clone()));
    let token = zerotrust_config::resolve_api_token(cfg, explicit)?;

    Ok(zerotrust_config::to_exporter_config(cfg, token)?)
}
