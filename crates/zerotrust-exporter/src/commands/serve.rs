//! `serve`: run the enabled collectors and expose /metrics until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use zerotrust_core::{DeviceCollector, HealthSignal, Poller, PrometheusSink};

use crate::cli::{GlobalOpts, ServeArgs};
use crate::config;
use crate::error::CliError;
use crate::server::{self, AppState};

pub async fn handle(args: ServeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }
    if let Some(interval) = args.interval {
        cfg.interval = interval;
    }
    if let Some(cycles) = args.stale_after_cycles {
        cfg.stale_after_cycles = cycles;
    }

    let exporter = config::exporter_config(global, &cfg)?;
    let addr: SocketAddr = cfg.listen.parse().map_err(|e| CliError::Validation {
        field: "listen".into(),
        reason: format!("'{}': {e}", cfg.listen),
    })?;

    let sink = Arc::new(PrometheusSink::new());
    let health = HealthSignal::new(sink.clone());

    let mut poller = Poller::new(exporter.poll_interval);
    if exporter.collectors.devices {
        let devices = DeviceCollector::from_config(&exporter, sink.clone(), health.clone())?;
        poller.spawn(Arc::new(devices));
    }
    if poller.is_empty() {
        warn!("no collectors enabled; only health metrics will be served");
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(
        %addr,
        account_id = %exporter.account_id,
        interval_secs = exporter.poll_interval.as_secs(),
        stale_after_cycles = exporter.stale_after_cycles,
        "serving metrics on http://{addr}/metrics"
    );

    let result = server::serve(listener, AppState { sink, health }, server::shutdown_signal()).await;

    // In-flight fetches are abandoned; nothing partial is published.
    if tokio::time::timeout(Duration::from_secs(5), poller.shutdown())
        .await
        .is_err()
    {
        warn!("collectors did not stop within 5s");
    }
    info!("shutdown complete");

    result.map_err(CliError::from)
}
