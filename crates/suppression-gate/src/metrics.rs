//! Metrics hooks for suppression checks, ad serving and list maintenance.
//!
//! ## Usage
//!
//! ```ignore
//! use suppression_gate::metrics::{Metrics, MetricsRecorder};
//!
//! let metrics = Metrics::new();
//! let start = std::time::Instant::now();
//! let result = registry.lookup(identifier);
//! metrics.record_check(start.elapsed(), !result.is_empty());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Mutation kinds tracked by [`Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

/// Thread-safe counters for the suppression gate.
#[derive(Default)]
pub struct Metrics {
    pub checks_performed: AtomicU64,
    /// Checks that returned at least one advertiser.
    pub checks_suppressed: AtomicU64,
    /// Checks rejected as malformed.
    pub checks_rejected: AtomicU64,
    /// Cumulative check time in nanoseconds.
    pub check_time_ns: AtomicU64,
    /// Worst single check time in nanoseconds.
    pub check_time_max_ns: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub ads_served: AtomicU64,
    /// Serve requests with no eligible banner.
    pub ads_unfilled: AtomicU64,
    pub lists_created: AtomicU64,
    pub lists_updated: AtomicU64,
    pub lists_deleted: AtomicU64,
    pub index_rebuilds: AtomicU64,
    pub inconsistencies: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&self, duration: Duration, suppressed: bool) {
        let ns = duration.as_nanos() as u64;
        self.checks_performed.fetch_add(1, Ordering::Relaxed);
        self.check_time_ns.fetch_add(ns, Ordering::Relaxed);
        self.check_time_max_ns.fetch_max(ns, Ordering::Relaxed);
        if suppressed {
            self.checks_suppressed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_check_rejected(&self) {
        self.checks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_serve(&self, filled: bool) {
        if filled {
            self.ads_served.fetch_add(1, Ordering::Relaxed);
        } else {
            self.ads_unfilled.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_mutation(&self, mutation: Mutation) {
        let counter = match mutation {
            Mutation::Create => &self.lists_created,
            Mutation::Update => &self.lists_updated,
            Mutation::Delete => &self.lists_deleted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rebuild(&self) {
        self.index_rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inconsistency(&self) {
        self.inconsistencies.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_performed: self.checks_performed.load(Ordering::Relaxed),
            checks_suppressed: self.checks_suppressed.load(Ordering::Relaxed),
            checks_rejected: self.checks_rejected.load(Ordering::Relaxed),
            avg_check_ns: self.avg_check_time_ns(),
            max_check_ns: self.check_time_max_ns.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_hit_rate: self.cache_hit_rate(),
            ads_served: self.ads_served.load(Ordering::Relaxed),
            ads_unfilled: self.ads_unfilled.load(Ordering::Relaxed),
            lists_created: self.lists_created.load(Ordering::Relaxed),
            lists_updated: self.lists_updated.load(Ordering::Relaxed),
            lists_deleted: self.lists_deleted.load(Ordering::Relaxed),
            index_rebuilds: self.index_rebuilds.load(Ordering::Relaxed),
            inconsistencies: self.inconsistencies.load(Ordering::Relaxed),
        }
    }

    pub fn avg_check_time_ns(&self) -> u64 {
        let total = self.check_time_ns.load(Ordering::Relaxed);
        let count = self.checks_performed.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Hits over hits + misses; 0.0 when the cache was never consulted.
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let total = hits + self.cache_misses.load(Ordering::Relaxed);
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub checks_performed: u64,
    pub checks_suppressed: u64,
    pub checks_rejected: u64,
    pub avg_check_ns: u64,
    pub max_check_ns: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub ads_served: u64,
    pub ads_unfilled: u64,
    pub lists_created: u64,
    pub lists_updated: u64,
    pub lists_deleted: u64,
    pub index_rebuilds: u64,
    pub inconsistencies: u64,
}

/// Sink for gate events.
///
/// Implement this trait to forward to Prometheus, StatsD or similar.
pub trait MetricsRecorder: Send + Sync {
    fn record_check(&self, duration: Duration, suppressed: bool);
    fn record_check_rejected(&self);
    fn record_cache(&self, hit: bool);
    fn record_serve(&self, filled: bool);
    fn record_mutation(&self, mutation: Mutation);
    fn record_rebuild(&self);
    fn record_inconsistency(&self);
}

/// No-op recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_check(&self, _: Duration, _: bool) {}
    fn record_check_rejected(&self) {}
    fn record_cache(&self, _: bool) {}
    fn record_serve(&self, _: bool) {}
    fn record_mutation(&self, _: Mutation) {}
    fn record_rebuild(&self) {}
    fn record_inconsistency(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_check(&self, duration: Duration, suppressed: bool) {
        Metrics::record_check(self, duration, suppressed);
    }

    fn record_check_rejected(&self) {
        Metrics::record_check_rejected(self);
    }

    fn record_cache(&self, hit: bool) {
        Metrics::record_cache(self, hit);
    }

    fn record_serve(&self, filled: bool) {
        Metrics::record_serve(self, filled);
    }

    fn record_mutation(&self, mutation: Mutation) {
        Metrics::record_mutation(self, mutation);
    }

    fn record_rebuild(&self) {
        Metrics::record_rebuild(self);
    }

    fn record_inconsistency(&self) {
        Metrics::record_inconsistency(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_record_checks() {
        let metrics = Metrics::new();

        metrics.record_check(Duration::from_nanos(100), true);
        metrics.record_check(Duration::from_nanos(150), false);
        metrics.record_check(Duration::from_nanos(120), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.checks_performed, 3);
        assert_eq!(snapshot.checks_suppressed, 2);
        assert_eq!(snapshot.avg_check_ns, 123); // (100 + 150 + 120) / 3
        assert_eq!(snapshot.max_check_ns, 150);
    }

    #[test]
    fn test_cache_hit_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.cache_hit_rate(), 0.0);

        for _ in 0..3 {
            metrics.record_cache(true);
        }
        metrics.record_cache(false);

        assert!((metrics.cache_hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mutation_counters() {
        let metrics = Metrics::new();
        metrics.record_mutation(Mutation::Create);
        metrics.record_mutation(Mutation::Create);
        metrics.record_mutation(Mutation::Delete);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lists_created, 2);
        assert_eq!(snapshot.lists_updated, 0);
        assert_eq!(snapshot.lists_deleted, 1);
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_check(Duration::from_nanos(100), true);
        metrics.record_serve(false);
        metrics.record_rebuild();
    }
}
