// ── Collectors ──
//
// One collector per entity kind. Each owns its API client and publishes
// through the shared `MetricsSink` and `HealthSignal`; nothing else is
// shared between collectors.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::CollectionError;

pub mod devices;
mod staleness;

pub use devices::{DeviceCollector, device_labels, filter_connected};

/// One entity kind's fetch-filter-publish cycle.
pub trait Collector: Send + Sync {
    /// What a successful cycle returns (the published entity set).
    type Output: Send;

    /// Entity kind, used in logs.
    fn name(&self) -> &'static str;

    /// Run one cycle. Failures are already reflected in the health signal
    /// by the time this returns; cancellation publishes nothing.
    fn collect(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Self::Output, CollectionError>> + Send;
}
