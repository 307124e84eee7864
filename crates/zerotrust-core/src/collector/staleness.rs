// Stale-series bookkeeping.
//
// A series that is missing from `threshold` consecutive successful cycles is
// reported for removal. Only successful cycles are observed, so an outage
// never expires anything.

use std::collections::{HashMap, HashSet};

use crate::metrics::LabelSet;

#[derive(Debug)]
pub(crate) struct StaleTracker {
    threshold: u32,
    misses: HashMap<LabelSet, u32>,
}

impl StaleTracker {
    /// `threshold` must be non-zero; zero disables expiry and is handled by
    /// not constructing a tracker at all.
    pub(crate) fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            misses: HashMap::new(),
        }
    }

    /// Record one successful cycle that published `seen`. Returns the label
    /// sets that just crossed the threshold; they are forgotten afterwards.
    pub(crate) fn observe(&mut self, seen: &HashSet<LabelSet>) -> Vec<LabelSet> {
        let threshold = self.threshold;
        let mut expired = Vec::new();
        self.misses.retain(|labels, misses| {
            if seen.contains(labels) {
                return true;
            }
            *misses += 1;
            if *misses >= threshold {
                expired.push(labels.clone());
                false
            } else {
                true
            }
        });
        for labels in seen {
            self.misses.insert(labels.clone(), 0);
        }
        expired
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.misses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<LabelSet> {
        ids.iter()
            .map(|id| LabelSet::new().with("device_id", *id))
            .collect()
    }

    #[test]
    fn expires_after_threshold_consecutive_misses() {
        let mut tracker = StaleTracker::new(2);
        assert!(tracker.observe(&set(&["a", "b"])).is_empty());
        assert!(tracker.observe(&set(&["a"])).is_empty());

        let expired = tracker.observe(&set(&["a"]));
        assert_eq!(expired, vec![LabelSet::new().with("device_id", "b")]);
        assert_eq!(tracker.tracked(), 1);
    }

    #[test]
    fn reappearing_resets_the_count() {
        let mut tracker = StaleTracker::new(2);
        tracker.observe(&set(&["a", "b"]));
        tracker.observe(&set(&["a"]));
        tracker.observe(&set(&["a", "b"]));
        assert!(tracker.observe(&set(&["a"])).is_empty());
        assert_eq!(tracker.observe(&set(&["a"])).len(), 1);
    }

    #[test]
    fn threshold_one_expires_on_first_miss() {
        let mut tracker = StaleTracker::new(1);
        tracker.observe(&set(&["a"]));
        assert_eq!(tracker.observe(&set(&[])).len(), 1);
        assert_eq!(tracker.tracked(), 0);
    }
}
