//! `config`: show the resolved configuration and store the API token.

use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Show: redacted TOML ─────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let path = config::effective_path(global);
            eprintln!("# {}", path.display());
            output::print_output(&toml::to_string_pretty(&cfg.redacted())?);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::effective_path(global).display().to_string());
            Ok(())
        }

        // ── SetToken: prompt + keyring ──────────────────────────────
        ConfigCommand::SetToken => {
            let cfg = config::load(global)?;
            let account_id = zerotrust_config::validate(&cfg)?;

            let token = rpassword::prompt_password("API token: ").map_err(prompt_err)?;
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "api_token".into(),
                    reason: "API token cannot be empty".into(),
                });
            }

            zerotrust_config::store_api_token(&account_id, &SecretString::from(token))?;
            eprintln!("   ✓ API token for account {account_id} stored in system keyring");
            Ok(())
        }
    }
}
