//! Base suppression checker: validate, look up, time.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::domain::{SuppressionCheckResult, SuppressionError, CHECK_LATENCY_BUDGET};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::SuppressionCheck;
use crate::service::registry::SuppressionRegistry;

/// Index-backed [`SuppressionCheck`].
pub struct SuppressionChecker {
    registry: Arc<SuppressionRegistry>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl SuppressionChecker {
    pub fn new(registry: Arc<SuppressionRegistry>) -> Self {
        Self::with_metrics(registry, Arc::new(NoOpMetrics))
    }

    pub fn with_metrics(registry: Arc<SuppressionRegistry>, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { registry, metrics }
    }
}

impl SuppressionCheck for SuppressionChecker {
    fn check(&self, identifier: &str) -> Result<SuppressionCheckResult, SuppressionError> {
        if identifier.trim().is_empty() {
            self.metrics.record_check_rejected();
            return Err(SuppressionError::missing("identifier"));
        }

        let start = Instant::now();
        let advertisers = self.registry.lookup(identifier);
        let elapsed = start.elapsed();

        if elapsed > CHECK_LATENCY_BUDGET {
            warn!(
                elapsed_us = elapsed.as_micros() as u64,
                budget_ms = CHECK_LATENCY_BUDGET.as_millis() as u64,
                "Suppression check exceeded latency budget"
            );
        }
        self.metrics.record_check(elapsed, !advertisers.is_empty());
        debug!(suppressed = advertisers.len(), "Suppression check");

        Ok(SuppressionCheckResult::new(advertisers, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SuppressionListDraft;
    use crate::metrics::Metrics;
    use crate::ports::SystemTimeSource;

    fn checker_with(lists: &[(&str, &[&str])]) -> (SuppressionChecker, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let registry = Arc::new(SuppressionRegistry::with_dependencies(
            Arc::new(SystemTimeSource),
            metrics.clone(),
        ));
        for (advertiser, identifiers) in lists {
            registry
                .create(SuppressionListDraft::new(
                    *advertiser,
                    "list",
                    identifiers.iter().map(|s| s.to_string()).collect(),
                ))
                .unwrap();
        }
        (SuppressionChecker::with_metrics(registry, metrics.clone()), metrics)
    }

    #[test]
    fn test_check_returns_all_suppressing_advertisers() {
        let (checker, metrics) = checker_with(&[("adv1", &["u1"]), ("adv2", &["u1", "u2"])]);

        let result = checker.check("u1").unwrap();
        assert!(result.is_suppressed("adv1"));
        assert!(result.is_suppressed("adv2"));
        assert!(!result.cached);
        assert_eq!(metrics.snapshot().checks_suppressed, 1);
    }

    #[test]
    fn test_unknown_identifier_is_empty_not_error() {
        let (checker, _) = checker_with(&[("adv1", &["u1"])]);
        let result = checker.check("nobody").unwrap();
        assert!(result.suppressed_advertisers.is_empty());
    }

    #[test]
    fn test_blank_identifier_rejected() {
        let (checker, metrics) = checker_with(&[]);
        assert!(matches!(checker.check("  "), Err(SuppressionError::Validation { .. })));
        assert_eq!(metrics.snapshot().checks_rejected, 1);
        assert_eq!(metrics.snapshot().checks_performed, 0);
    }

    #[test]
    fn test_check_within_latency_budget() {
        let (checker, _) = checker_with(&[("adv1", &["u1"])]);
        let result = checker.check("u1").unwrap();
        assert!(result.elapsed() < CHECK_LATENCY_BUDGET);
    }
}
