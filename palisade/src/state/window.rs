// palisade/src/state/window.rs
//
// Per-origin sliding rate windows.
// DashMap = sharded concurrent HashMap — evaluations for different origins
// do not contend; evaluations for the same origin serialize on that origin's
// RwLock, so append+prune+read is one atomic unit per key.
//
// The reference behavior only pruned timestamps inside an active key's list
// and never evicted aged-out keys. `sweep` closes that gap: it drops windows
// whose newest timestamp has left the trailing window entirely.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

/// What one `observe` call saw after appending and pruning: the surviving
/// count and the successive inter-arrival gaps, in seconds.
#[derive(Debug, Clone)]
pub struct WindowSnapshot {
    pub count: usize,
    pub gaps_secs: Vec<f64>,
}

#[derive(Debug, Default)]
struct OriginWindow {
    timestamps: VecDeque<DateTime<Utc>>,
}

impl OriginWindow {
    fn prune(&mut self, cutoff: DateTime<Utc>) {
        while self.timestamps.front().map(|t| *t <= cutoff).unwrap_or(false) {
            self.timestamps.pop_front();
        }
    }

    fn gaps_secs(&self) -> Vec<f64> {
        self.timestamps
            .iter()
            .zip(self.timestamps.iter().skip(1))
            .map(|(a, b)| (*b - *a).num_milliseconds() as f64 / 1000.0)
            .collect()
    }
}

pub struct RateTracker {
    windows: DashMap<String, Arc<RwLock<OriginWindow>>>,
    window: Duration,
    total_observed: AtomicU64,
}

impl RateTracker {
    pub fn new(window_minutes: i64) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::minutes(window_minutes),
            total_observed: AtomicU64::new(0),
        }
    }

    /// Record one request for `origin` at `now`: append, prune entries older
    /// than the trailing window, and return what remains. One atomic unit
    /// under the key's write lock.
    pub fn observe(&self, origin: &str, now: DateTime<Utc>) -> WindowSnapshot {
        self.total_observed.fetch_add(1, Ordering::Relaxed);

        let window = self
            .windows
            .entry(origin.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(OriginWindow::default())))
            .clone();

        let mut w = window.write();
        w.timestamps.push_back(now);
        w.prune(now - self.window);
        WindowSnapshot { count: w.timestamps.len(), gaps_secs: w.gaps_secs() }
    }

    /// Read-only count of timestamps currently held for `origin`, without
    /// pruning. This is the count as of the key's last `observe`.
    pub fn count(&self, origin: &str) -> usize {
        self.windows
            .get(origin)
            .map(|w| w.read().timestamps.len())
            .unwrap_or(0)
    }

    /// Evict origins whose newest timestamp has aged past the window.
    /// Returns the number of windows removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        let before = self.windows.len();
        self.windows
            .retain(|_, w| w.read().timestamps.back().map(|t| *t > cutoff).unwrap_or(false));
        let removed = before - self.windows.len();
        if removed > 0 {
            debug!(removed, "evicted stale origin windows");
        }
        removed
    }

    /// Drop all tracking state.
    pub fn clear(&self) {
        self.windows.clear();
    }

    // ── Stats ────────────────────────────────────────────────────────────────

    pub fn tracked_origins(&self) -> usize {
        self.windows.len()
    }

    pub fn tracked_timestamps(&self) -> usize {
        self.windows.iter().map(|e| e.value().read().timestamps.len()).sum()
    }

    pub fn active_origins(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        self.windows
            .iter()
            .filter(|e| e.value().read().timestamps.back().map(|t| *t > cutoff).unwrap_or(false))
            .count()
    }

    pub fn total_observed(&self) -> u64 {
        self.total_observed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_appends_and_prunes() {
        let tracker = RateTracker::new(60);
        let t0 = Utc::now();

        for i in 0..4 {
            tracker.observe("10.0.0.1", t0 + Duration::minutes(i));
        }
        assert_eq!(tracker.count("10.0.0.1"), 4);

        // 62 minutes later only the t0+3m entry survives alongside the new one.
        let snap = tracker.observe("10.0.0.1", t0 + Duration::minutes(62));
        assert_eq!(snap.count, 2);
    }

    #[test]
    fn count_is_read_only() {
        let tracker = RateTracker::new(60);
        assert_eq!(tracker.count("absent"), 0);
        assert_eq!(tracker.tracked_origins(), 0);
    }

    #[test]
    fn sweep_evicts_aged_out_keys_only() {
        let tracker = RateTracker::new(60);
        let t0 = Utc::now();
        tracker.observe("stale", t0);
        tracker.observe("fresh", t0 + Duration::minutes(90));

        let removed = tracker.sweep(t0 + Duration::minutes(100));
        assert_eq!(removed, 1);
        assert_eq!(tracker.tracked_origins(), 1);
        assert_eq!(tracker.count("fresh"), 1);
        assert_eq!(tracker.count("stale"), 0);
    }

    #[test]
    fn gaps_are_successive_interarrivals() {
        let tracker = RateTracker::new(60);
        let t0 = Utc::now();
        tracker.observe("k", t0);
        tracker.observe("k", t0 + Duration::seconds(10));
        let snap = tracker.observe("k", t0 + Duration::seconds(25));
        assert_eq!(snap.gaps_secs, vec![10.0, 15.0]);
    }
}
