//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use zerotrust_core::DeviceStatus;

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Row types ────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct DeviceRow {
    #[tabled(rename = "Device ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "User")]
    pub user: String,
    #[tabled(rename = "Colo")]
    pub colo: String,
    #[tabled(rename = "Mode")]
    pub mode: String,
    #[tabled(rename = "Platform")]
    pub platform: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Last Seen")]
    pub last_seen: String,
}

impl From<&DeviceStatus> for DeviceRow {
    fn from(d: &DeviceStatus) -> Self {
        Self {
            id: d.device_id.clone(),
            name: d.device_name.clone(),
            user: d.person_email.clone(),
            colo: d.colo.clone(),
            mode: d.mode.clone(),
            platform: d.platform.clone(),
            version: d.version.clone(),
            last_seen: d.timestamp.clone(),
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
