// ── Device collector ──
//
// Fetches the fleet-status page, keeps the connected devices, and sets
// `zerotrust_devices_up{...} = 1` for each of them.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zerotrust_api::{DeviceStatus, DeviceStatusSet, DexClient, TimeWindow};

use super::Collector;
use super::staleness::StaleTracker;
use crate::config::ExporterConfig;
use crate::error::{CollectionError, CoreError};
use crate::health::HealthSignal;
use crate::metrics::{DEVICES_UP, LabelSet, MetricsSink};

/// Keep only records whose status is `connected`.
pub fn filter_connected(set: DeviceStatusSet) -> DeviceStatusSet {
    set.into_iter()
        .filter(|(_, device)| device.is_connected())
        .collect()
}

/// Label set of the `zerotrust_devices_up` series for one device.
pub fn device_labels(device: &DeviceStatus) -> LabelSet {
    LabelSet::new()
        .with("device_id", device.device_id.as_str())
        .with("device_name", device.device_name.as_str())
        .with("user_email", device.person_email.as_str())
        .with("colo", device.colo.as_str())
        .with("mode", device.mode.as_str())
        .with("platform", device.platform.as_str())
        .with("version", device.version.as_str())
}

pub struct DeviceCollector {
    client: DexClient,
    sink: Arc<dyn MetricsSink>,
    health: HealthSignal,
    stale: Option<Mutex<StaleTracker>>,
    cycle_stats: bool,
}

impl DeviceCollector {
    pub fn new(client: DexClient, sink: Arc<dyn MetricsSink>, health: HealthSignal) -> Self {
        Self {
            client,
            sink,
            health,
            stale: None,
            cycle_stats: false,
        }
    }

    /// Build the client from `config` and apply its expiry setting.
    pub fn from_config(
        config: &ExporterConfig,
        sink: Arc<dyn MetricsSink>,
        health: HealthSignal,
    ) -> Result<Self, CoreError> {
        let client = config.dex_client()?;
        Ok(Self::new(client, sink, health)
            .with_stale_expiry(config.stale_after_cycles)
            .with_cycle_stats(config.debug))
    }

    /// Remove a device's series after `cycles` consecutive successful cycles
    /// without it. `0` keeps series forever.
    #[must_use]
    pub fn with_stale_expiry(mut self, cycles: u32) -> Self {
        self.stale = (cycles > 0).then(|| Mutex::new(StaleTracker::new(cycles)));
        self
    }

    /// Log fetch size and latency of every cycle at `info`.
    #[must_use]
    pub fn with_cycle_stats(mut self, enabled: bool) -> Self {
        self.cycle_stats = enabled;
        self
    }

    /// Run one cycle over the standard look-back window ending now.
    pub async fn collect_devices(
        &self,
        cancel: &CancellationToken,
    ) -> Result<DeviceStatusSet, CollectionError> {
        self.collect_window(TimeWindow::ending_now(), cancel).await
    }

    async fn collect_window(
        &self,
        window: TimeWindow,
        cancel: &CancellationToken,
    ) -> Result<DeviceStatusSet, CollectionError> {
        let started = Instant::now();

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("device collection cancelled");
                return Err(CollectionError::Cancelled);
            }
            result = self.client.list_device_status(&window) => result,
        };

        let all = match fetched {
            Ok(all) => all,
            Err(e) => {
                let err = CollectionError::from(e);
                warn!(kind = err.kind(), error = %err, "device metrics collection failed");
                self.health.record_failure();
                return Err(err);
            }
        };
        self.health.record_success();

        let total = all.len();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if self.cycle_stats {
            info!(fetched = total, elapsed_ms, "fetched device status");
        } else {
            debug!(fetched = total, elapsed_ms, "fetched device status");
        }

        let connected = filter_connected(all);

        // Publish and expiry happen under one lock so an overlapping cycle
        // cannot expire a series this one just set.
        let mut tracker = match &self.stale {
            Some(stale) => Some(stale.lock().await),
            None => None,
        };

        let mut published = HashSet::with_capacity(connected.len());
        for device in connected.values() {
            let labels = device_labels(device);
            self.sink.set_gauge(&DEVICES_UP, &labels, 1.0);
            published.insert(labels);
        }

        if let Some(tracker) = tracker.as_mut() {
            let expired = tracker.observe(&published);
            for labels in &expired {
                self.sink.remove_gauge(&DEVICES_UP, labels);
            }
            if !expired.is_empty() {
                debug!(expired = expired.len(), "removed stale device series");
            }
        }
        drop(tracker);

        info!(connected = connected.len(), "device metrics collection completed");
        Ok(connected)
    }
}

impl Collector for DeviceCollector {
    type Output = DeviceStatusSet;

    fn name(&self) -> &'static str {
        "devices"
    }

    async fn collect(&self, cancel: &CancellationToken) -> Result<DeviceStatusSet, CollectionError> {
        self.collect_devices(cancel).await
    }
}

impl std::fmt::Debug for DeviceCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCollector")
            .field("client", &self.client)
            .field("health", &self.health)
            .field("stale_expiry", &self.stale.is_some())
            .field("cycle_stats", &self.cycle_stats)
            .finish_non_exhaustive()
    }
}
