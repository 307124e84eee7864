//! Collection cycle between `zerotrust-api` and the metrics endpoint.
//!
//! - **[`DeviceCollector`]**: one fetch-filter-publish cycle per call.
//!   Keeps connected devices and sets `zerotrust_devices_up{...} = 1` for
//!   each. Returns `Result<DeviceStatusSet, CollectionError>` so callers can
//!   tell "no devices connected" apart from "collection failed".
//!
//! - **[`MetricsSink`]**: the write side of the registry, injected into every
//!   collector. [`PrometheusSink`] backs it with a `prometheus::Registry`.
//!
//! - **[`HealthSignal`]**: process-wide `up` gauge plus `api_calls_total`
//!   and `api_errors_total`. Updated exactly once per fetch attempt.
//!
//! - **[`Poller`]**: runs collectors on an interval until cancelled.

pub mod collector;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod poller;

// ── Primary re-exports ──────────────────────────────────────────────
pub use collector::{Collector, DeviceCollector, device_labels, filter_connected};
pub use config::{CollectorToggles, ExporterConfig};
pub use error::{CollectionError, CoreError};
pub use health::{HealthSignal, HealthSnapshot};
pub use metrics::{LabelSet, MetricDesc, MetricsSink, PrometheusSink};
pub use poller::Poller;

// Types callers need alongside the collector API.
pub use zerotrust_api::{DEFAULT_API_BASE, DeviceStatus, DeviceStatusSet, TimeWindow, TlsMode};
