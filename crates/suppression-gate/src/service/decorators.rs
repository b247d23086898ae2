//! # Checker Decorators
//!
//! Wrappers around any [`SuppressionCheck`]:
//!
//! - [`CachingChecker`]: LRU of recent results, tagged with the registry
//!   generation at lookup time. Any mutation bumps the generation, so a
//!   cached answer older than the latest mutation is treated as a miss.
//! - [`AuditingChecker`]: bounded log of every check and its outcome.
//!
//! The gate composes them as `Auditing(Caching(SuppressionChecker))`.

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::domain::{AuditConfig, CacheConfig, SuppressionCheckResult, SuppressionError};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::SuppressionCheck;
use crate::service::registry::SuppressionRegistry;

struct CachedEntry {
    result: SuppressionCheckResult,
    generation: u64,
    inserted_at: Instant,
}

/// Generation-tagged LRU cache in front of a checker.
pub struct CachingChecker<C> {
    inner: C,
    registry: Arc<SuppressionRegistry>,
    cache: Mutex<LruCache<String, CachedEntry>>,
    ttl: Duration,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<C: SuppressionCheck> CachingChecker<C> {
    pub fn new(inner: C, registry: Arc<SuppressionRegistry>, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            registry,
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn from_config(inner: C, registry: Arc<SuppressionRegistry>, config: &CacheConfig) -> Self {
        Self::new(inner, registry, config.capacity, config.ttl())
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Cached identifiers, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    fn cached(&self, identifier: &str, generation: u64) -> Option<SuppressionCheckResult> {
        let mut cache = self.cache.lock();
        let fresh = match cache.get(identifier) {
            Some(entry) => entry.generation == generation && entry.inserted_at.elapsed() < self.ttl,
            None => return None,
        };
        if !fresh {
            cache.pop(identifier);
            return None;
        }
        cache.get(identifier).map(|entry| entry.result.clone())
    }
}

impl<C: SuppressionCheck> SuppressionCheck for CachingChecker<C> {
    fn check(&self, identifier: &str) -> Result<SuppressionCheckResult, SuppressionError> {
        let start = Instant::now();
        // Read before the lookup: a mutation racing with it can only make
        // the stored entry look older than it is.
        let generation = self.registry.generation();

        if let Some(result) = self.cached(identifier, generation) {
            let elapsed = start.elapsed();
            self.metrics.record_cache(true);
            self.metrics.record_check(elapsed, !result.suppressed_advertisers.is_empty());
            return Ok(result.as_cached(elapsed));
        }

        let result = self.inner.check(identifier)?;
        self.metrics.record_cache(false);
        self.cache.lock().put(
            identifier.to_string(),
            CachedEntry {
                result: result.clone(),
                generation,
                inserted_at: Instant::now(),
            },
        );
        Ok(result)
    }
}

/// One audited check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub identifier: String,
    /// `None` when the check failed.
    pub suppressed_advertisers: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub check_time_us: u64,
    pub cached: bool,
}

/// Bounded audit trail around a checker. Oldest entries are dropped first.
pub struct AuditingChecker<C> {
    inner: C,
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl<C: SuppressionCheck> AuditingChecker<C> {
    pub fn new(inner: C, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn from_config(inner: C, config: &AuditConfig) -> Self {
        Self::new(inner, config.capacity)
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Retained entries for one identifier, oldest first.
    pub fn entries_for(&self, identifier: &str) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.identifier == identifier)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn push(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

impl<C: SuppressionCheck> SuppressionCheck for AuditingChecker<C> {
    fn check(&self, identifier: &str) -> Result<SuppressionCheckResult, SuppressionError> {
        let start = Instant::now();
        let outcome = self.inner.check(identifier);
        let check_time_us = start.elapsed().as_micros() as u64;

        let entry = match &outcome {
            Ok(result) => {
                info!(
                    target: "audit",
                    identifier,
                    suppressed = ?result.suppressed_advertisers,
                    cached = result.cached,
                    check_time_us,
                    "Suppression check"
                );
                AuditEntry {
                    timestamp: Utc::now(),
                    identifier: identifier.to_string(),
                    suppressed_advertisers: Some(result.suppressed_advertisers.clone()),
                    error: None,
                    check_time_us,
                    cached: result.cached,
                }
            }
            Err(err) => {
                info!(target: "audit", identifier, error = %err, "Suppression check failed");
                AuditEntry {
                    timestamp: Utc::now(),
                    identifier: identifier.to_string(),
                    suppressed_advertisers: None,
                    error: Some(err.to_string()),
                    check_time_us,
                    cached: false,
                }
            }
        };
        self.push(entry);
        outcome
    }
}

/// Read access to an audit trail without knowing the wrapped checker type.
pub trait AuditLog: Send + Sync {
    fn recent(&self, limit: usize) -> Vec<AuditEntry>;
}

impl<C: SuppressionCheck> AuditLog for AuditingChecker<C> {
    fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        AuditingChecker::recent(self, limit)
    }
}
