// ── Metrics sink ──
//
// Collectors publish through the `MetricsSink` trait and never touch a
// concrete registry. `PrometheusSink` is the production implementation:
// metric families are created lazily on first write and registered with a
// `prometheus::Registry` that the HTTP layer encodes on scrape.

use std::collections::HashMap;

use dashmap::DashMap;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, IntCounter, Opts, Registry, TextEncoder};
use tracing::warn;

/// Name and help text of an exported metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
}

/// `1` for every device seen connected in the last successful cycle.
pub const DEVICES_UP: MetricDesc = MetricDesc {
    name: "zerotrust_devices_up",
    help: "Device connection status (1 = connected)",
};

/// Outcome of the most recent fetch (1 = success).
pub const UP: MetricDesc = MetricDesc {
    name: "up",
    help: "Whether the last fetch from the Cloudflare API succeeded",
};

pub const API_CALLS_TOTAL: MetricDesc = MetricDesc {
    name: "api_calls_total",
    help: "Total number of Cloudflare API calls attempted",
};

pub const API_ERRORS_TOTAL: MetricDesc = MetricDesc {
    name: "api_errors_total",
    help: "Total number of failed Cloudflare API calls",
};

/// Ordered label pairs identifying one series of a metric family.
///
/// Label names are fixed per metric; values are free-form and an empty
/// string is a valid value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelSet(Vec<(&'static str, String)>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label (builder style).
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.0.push((name, value.into()));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|(name, _)| *name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(n, v)| (*n, v.as_str()))
    }

    fn as_map(&self) -> HashMap<&str, &str> {
        self.iter().collect()
    }
}

/// Write side of the metrics registry.
///
/// Implementations must tolerate concurrent writers: every collector task
/// holds the same sink. Writes are infallible from the caller's point of
/// view; an implementation that cannot apply one logs and drops it.
pub trait MetricsSink: Send + Sync {
    /// Create the series if needed and overwrite its value.
    fn set_gauge(&self, metric: &MetricDesc, labels: &LabelSet, value: f64);

    /// Drop a series. Returns `false` if it did not exist.
    fn remove_gauge(&self, metric: &MetricDesc, labels: &LabelSet) -> bool;

    /// Create an unlabeled counter at zero if it does not exist yet.
    fn register_counter(&self, metric: &MetricDesc);

    /// Add one to an unlabeled monotone counter.
    fn increment_counter(&self, metric: &MetricDesc);
}

/// [`MetricsSink`] backed by the `prometheus` crate.
pub struct PrometheusSink {
    registry: Registry,
    gauges: DashMap<&'static str, GaugeVec>,
    counters: DashMap<&'static str, IntCounter>,
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            gauges: DashMap::new(),
            counters: DashMap::new(),
        }
    }

    /// Render every registered family in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let families = self.registry.gather();
        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Current value of one gauge series, without creating it.
    pub fn gauge_value(&self, metric: &MetricDesc, labels: &LabelSet) -> Option<f64> {
        let family = self.family(metric.name)?;
        family
            .get_metric()
            .iter()
            .find(|m| {
                let pairs = m.get_label();
                pairs.len() == labels.0.len()
                    && pairs
                        .iter()
                        .all(|lp| labels.get(lp.get_name()) == Some(lp.get_value()))
            })
            .map(|m| m.get_gauge().get_value())
    }

    /// Number of series currently exported for a gauge family.
    pub fn series_count(&self, metric: &MetricDesc) -> usize {
        self.family(metric.name)
            .map_or(0, |family| family.get_metric().len())
    }

    /// Current value of a counter (`None` until first incremented).
    pub fn counter_value(&self, metric: &MetricDesc) -> Option<u64> {
        self.counters.get(metric.name).map(|c| c.get())
    }

    fn family(&self, name: &str) -> Option<MetricFamily> {
        self.registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == name)
    }

    /// Fetch or lazily create and register the family for `metric`.
    fn gauge_vec(&self, metric: &MetricDesc, labels: &LabelSet) -> prometheus::Result<GaugeVec> {
        if let Some(existing) = self.gauges.get(metric.name) {
            return Ok(existing.value().clone());
        }
        let entry = self.gauges.entry(metric.name).or_try_insert_with(|| {
            let vec = GaugeVec::new(Opts::new(metric.name, metric.help), &labels.names())?;
            self.registry.register(Box::new(vec.clone()))?;
            Ok::<_, prometheus::Error>(vec)
        })?;
        Ok(entry.value().clone())
    }

    fn counter(&self, metric: &MetricDesc) -> prometheus::Result<IntCounter> {
        if let Some(existing) = self.counters.get(metric.name) {
            return Ok(existing.value().clone());
        }
        let entry = self.counters.entry(metric.name).or_try_insert_with(|| {
            let counter = IntCounter::new(metric.name, metric.help)?;
            self.registry.register(Box::new(counter.clone()))?;
            Ok::<_, prometheus::Error>(counter)
        })?;
        Ok(entry.value().clone())
    }
}

impl MetricsSink for PrometheusSink {
    fn set_gauge(&self, metric: &MetricDesc, labels: &LabelSet, value: f64) {
        let result = self
            .gauge_vec(metric, labels)
            .and_then(|vec| vec.get_metric_with(&labels.as_map()));
        match result {
            Ok(gauge) => gauge.set(value),
            Err(e) => warn!(metric = metric.name, error = %e, "dropping gauge update"),
        }
    }

    fn remove_gauge(&self, metric: &MetricDesc, labels: &LabelSet) -> bool {
        self.gauges
            .get(metric.name)
            .is_some_and(|vec| vec.remove(&labels.as_map()).is_ok())
    }

    fn register_counter(&self, metric: &MetricDesc) {
        if let Err(e) = self.counter(metric) {
            warn!(metric = metric.name, error = %e, "dropping counter registration");
        }
    }

    fn increment_counter(&self, metric: &MetricDesc) {
        match self.counter(metric) {
            Ok(counter) => counter.inc(),
            Err(e) => warn!(metric = metric.name, error = %e, "dropping counter increment"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn labels(id: &str) -> LabelSet {
        LabelSet::new().with("device_id", id).with("user_email", "")
    }

    #[test]
    fn set_gauge_creates_and_overwrites() {
        let sink = PrometheusSink::new();
        sink.set_gauge(&DEVICES_UP, &labels("a"), 1.0);
        assert_eq!(sink.gauge_value(&DEVICES_UP, &labels("a")), Some(1.0));

        sink.set_gauge(&DEVICES_UP, &labels("a"), 0.0);
        assert_eq!(sink.gauge_value(&DEVICES_UP, &labels("a")), Some(0.0));
        assert_eq!(sink.series_count(&DEVICES_UP), 1);
    }

    #[test]
    fn remove_gauge_drops_series() {
        let sink = PrometheusSink::new();
        sink.set_gauge(&DEVICES_UP, &labels("a"), 1.0);
        sink.set_gauge(&DEVICES_UP, &labels("b"), 1.0);

        assert!(sink.remove_gauge(&DEVICES_UP, &labels("a")));
        assert!(!sink.remove_gauge(&DEVICES_UP, &labels("a")));
        assert_eq!(sink.gauge_value(&DEVICES_UP, &labels("a")), None);
        assert_eq!(sink.series_count(&DEVICES_UP), 1);
    }

    #[test]
    fn mismatched_label_names_are_dropped() {
        let sink = PrometheusSink::new();
        sink.set_gauge(&DEVICES_UP, &labels("a"), 1.0);
        sink.set_gauge(&DEVICES_UP, &LabelSet::new().with("colo", "AMS"), 1.0);
        assert_eq!(sink.series_count(&DEVICES_UP), 1);
    }

    #[test]
    fn counters_start_absent_then_count() {
        let sink = PrometheusSink::new();
        assert_eq!(sink.counter_value(&API_CALLS_TOTAL), None);
        sink.increment_counter(&API_CALLS_TOTAL);
        sink.increment_counter(&API_CALLS_TOTAL);
        assert_eq!(sink.counter_value(&API_CALLS_TOTAL), Some(2));
    }

    #[test]
    fn registered_counter_is_exported_at_zero() {
        let sink = PrometheusSink::new();
        sink.register_counter(&API_ERRORS_TOTAL);
        sink.register_counter(&API_ERRORS_TOTAL);
        assert_eq!(sink.counter_value(&API_ERRORS_TOTAL), Some(0));
        assert!(sink.encode().unwrap().contains("api_errors_total 0"));

        sink.increment_counter(&API_ERRORS_TOTAL);
        assert_eq!(sink.counter_value(&API_ERRORS_TOTAL), Some(1));
    }

    #[test]
    fn encode_escapes_label_values() {
        let sink = PrometheusSink::new();
        sink.set_gauge(&DEVICES_UP, &LabelSet::new().with("device_name", "say \"hi\""), 1.0);
        sink.set_gauge(&UP, &LabelSet::new(), 1.0);

        let text = sink.encode().unwrap();
        assert!(text.contains("# TYPE zerotrust_devices_up gauge"));
        assert!(text.contains(r#"zerotrust_devices_up{device_name="say \"hi\""} 1"#));
        assert!(text.contains("up 1"));
    }

    #[test]
    fn concurrent_writers_share_one_family() {
        let sink = Arc::new(PrometheusSink::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    sink.set_gauge(&DEVICES_UP, &labels(&format!("dev-{i}")), 1.0);
                    sink.increment_counter(&API_CALLS_TOTAL);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.series_count(&DEVICES_UP), 8);
        assert_eq!(sink.counter_value(&API_CALLS_TOTAL), Some(8));
    }
}
