//! Clap derive structures for the `zerotrust-exporter` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// zerotrust-exporter -- Cloudflare Zero Trust DEX fleet status as Prometheus metrics
#[derive(Debug, Parser)]
#[command(
    name = "zerotrust-exporter",
    version,
    about = "Export Cloudflare Zero Trust device status as Prometheus metrics",
    long_about = "Polls the Cloudflare DEX fleet-status API on an interval and publishes\n\
        one `zerotrust_devices_up` gauge per connected device, plus `up`,\n\
        `api_calls_total` and `api_errors_total`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "ZEROTRUST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Cloudflare account ID
    #[arg(long, short = 'a', env = "ZEROTRUST_ACCOUNT_ID", global = true)]
    pub account_id: Option<String>,

    /// Cloudflare API token
    #[arg(long, env = "ZEROTRUST_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// API root URL
    #[arg(long, env = "ZEROTRUST_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "ZEROTRUST_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Verbose cycle logging (at least `debug`)
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Device IDs, one per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll on an interval and serve /metrics and /healthz
    Serve(ServeArgs),

    /// Run one collection cycle and print the connected devices
    Collect(CollectArgs),

    /// Inspect configuration and store credentials
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Serve ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind the metrics server to (e.g. 0.0.0.0:9184)
    #[arg(long, short = 'l', env = "ZEROTRUST_LISTEN")]
    pub listen: Option<String>,

    /// Seconds between collection cycles
    #[arg(long, short = 'i', env = "ZEROTRUST_INTERVAL")]
    pub interval: Option<u64>,

    /// Drop a device series after this many successful cycles without it (0 = never)
    #[arg(long)]
    pub stale_after_cycles: Option<u32>,
}

// ── Collect ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    pub output: OutputFormat,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (token redacted)
    Show,

    /// Print the config file path
    Path,

    /// Prompt for an API token and store it in the system keyring
    SetToken,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
