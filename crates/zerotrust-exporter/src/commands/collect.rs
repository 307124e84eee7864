//! `collect`: one device cycle against a private registry, printed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use zerotrust_core::{DeviceCollector, DeviceStatus, HealthSignal, PrometheusSink};

use crate::cli::{CollectArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::{self, DeviceRow};

pub async fn handle(args: CollectArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let exporter = config::exporter_config(global, &cfg)?;

    let sink = Arc::new(PrometheusSink::new());
    let health = HealthSignal::new(sink.clone());
    let collector = DeviceCollector::from_config(&exporter, sink, health.clone())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = collector.collect_devices(&cancel).await;
    watcher.abort();
    debug!(health = ?health.snapshot(), "collect finished");

    let mut devices: Vec<DeviceStatus> = result?.into_values().collect();
    devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));

    let rendered = output::render_list(
        args.output,
        &devices,
        |d| DeviceRow::from(d),
        |d| d.device_id.clone(),
    )?;
    output::print_output(&rendered);
    Ok(())
}
