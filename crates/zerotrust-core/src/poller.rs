// ── Poller ──
//
// Runs each collector on its own tokio task at a fixed interval until the
// shared cancellation token fires. A failed cycle is already logged and
// reflected in the health signal by the collector; the next tick retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::collector::Collector;

pub struct Poller {
    interval: Duration,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Start polling `collector`. The first cycle runs immediately.
    pub fn spawn<C>(&mut self, collector: Arc<C>)
    where
        C: Collector + 'static,
    {
        info!(
            collector = collector.name(),
            interval_secs = self.interval.as_secs(),
            "starting collector"
        );
        let handle = tokio::spawn(poll_task(collector, self.interval, self.cancel.clone()));
        self.handles.push(handle);
    }

    /// Number of running collector tasks.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel all collectors and wait for their tasks to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
        debug!("poller stopped");
    }
}

async fn poll_task<C: Collector>(collector: Arc<C>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!(collector = collector.name(), "poll tick");
                // Failures are logged and counted inside the collector.
                let _ = collector.collect(&cancel).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::CollectionError;

    struct Counting {
        cycles: AtomicUsize,
    }

    impl Collector for Counting {
        type Output = usize;

        fn name(&self) -> &'static str {
            "counting"
        }

        async fn collect(&self, _cancel: &CancellationToken) -> Result<usize, CollectionError> {
            Ok(self.cycles.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_on_each_tick() {
        let collector = Arc::new(Counting {
            cycles: AtomicUsize::new(0),
        });
        let mut poller = Poller::new(Duration::from_secs(60));
        poller.spawn(Arc::clone(&collector));
        assert_eq!(poller.len(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(collector.cycles.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(collector.cycles.load(Ordering::SeqCst), 3);

        poller.shutdown().await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(collector.cycles.load(Ordering::SeqCst), 3);
    }
}
