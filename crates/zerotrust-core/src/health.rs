// ── Health signal ──
//
// Process-wide `up` gauge plus API call/error counters. Every fetch attempt
// records exactly one outcome; `up` reflects only the latest one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

use crate::metrics::{API_CALLS_TOTAL, API_ERRORS_TOTAL, LabelSet, MetricsSink, UP};

/// Point-in-time copy of the health signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub up: bool,
    pub api_calls: u64,
    pub api_errors: u64,
}

/// Shared handle to the health signal. Cheap to clone.
#[derive(Clone)]
pub struct HealthSignal {
    inner: Arc<HealthInner>,
}

struct HealthInner {
    sink: Arc<dyn MetricsSink>,
    up: AtomicBool,
    api_calls: AtomicU64,
    api_errors: AtomicU64,
}

impl HealthSignal {
    /// Registers `up = 0` and both counters at zero so they are scraped
    /// before the first cycle completes.
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        sink.set_gauge(&UP, &LabelSet::new(), 0.0);
        sink.register_counter(&API_CALLS_TOTAL);
        sink.register_counter(&API_ERRORS_TOTAL);
        Self {
            inner: Arc::new(HealthInner {
                sink,
                up: AtomicBool::new(false),
                api_calls: AtomicU64::new(0),
                api_errors: AtomicU64::new(0),
            }),
        }
    }

    /// A fetch succeeded: `up = 1`, calls + 1.
    pub fn record_success(&self) {
        self.inner.api_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.up.store(true, Ordering::Relaxed);
        self.inner.sink.increment_counter(&API_CALLS_TOTAL);
        self.inner.sink.set_gauge(&UP, &LabelSet::new(), 1.0);
    }

    /// A fetch failed: `up = 0`, calls + 1, errors + 1.
    pub fn record_failure(&self) {
        self.inner.api_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.api_errors.fetch_add(1, Ordering::Relaxed);
        self.inner.up.store(false, Ordering::Relaxed);
        self.inner.sink.increment_counter(&API_CALLS_TOTAL);
        self.inner.sink.increment_counter(&API_ERRORS_TOTAL);
        self.inner.sink.set_gauge(&UP, &LabelSet::new(), 0.0);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            up: self.inner.up.load(Ordering::Relaxed),
            api_calls: self.inner.api_calls.load(Ordering::Relaxed),
            api_errors: self.inner.api_errors.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for HealthSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HealthSignal").field(&self.snapshot()).finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::metrics::PrometheusSink;

    fn signal() -> (Arc<PrometheusSink>, HealthSignal) {
        let sink = Arc::new(PrometheusSink::new());
        let health = HealthSignal::new(sink.clone());
        (sink, health)
    }

    #[test]
    fn starts_down_with_zero_counts() {
        let (sink, health) = signal();
        assert_eq!(sink.gauge_value(&UP, &LabelSet::new()), Some(0.0));
        assert_eq!(sink.counter_value(&API_CALLS_TOTAL), Some(0));
        assert_eq!(sink.counter_value(&API_ERRORS_TOTAL), Some(0));
        assert_eq!(
            health.snapshot(),
            HealthSnapshot {
                up: false,
                api_calls: 0,
                api_errors: 0
            }
        );
    }

    #[test]
    fn success_then_failure_overwrites_up() {
        let (sink, health) = signal();

        health.record_success();
        assert_eq!(sink.gauge_value(&UP, &LabelSet::new()), Some(1.0));
        assert_eq!(sink.counter_value(&API_CALLS_TOTAL), Some(1));
        assert_eq!(sink.counter_value(&API_ERRORS_TOTAL), Some(0));

        health.record_failure();
        assert_eq!(sink.gauge_value(&UP, &LabelSet::new()), Some(0.0));
        assert_eq!(sink.counter_value(&API_CALLS_TOTAL), Some(2));
        assert_eq!(sink.counter_value(&API_ERRORS_TOTAL), Some(1));

        health.record_success();
        assert_eq!(
            health.snapshot(),
            HealthSnapshot {
                up: true,
                api_calls: 3,
                api_errors: 1
            }
        );
    }
}
