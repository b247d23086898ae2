//! # Suppression Gate Service
//!
//! Wires the registry, the checker chain, the catalog and the selector, and
//! implements the inbound ports.
//!
//! ## Serving Flow
//!
//! 1. Check the identifier through the checker chain (audit, cache, index).
//! 2. Exclude every advertiser in the result.
//! 3. Weighted draw over the remaining banners.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{
    AdCatalog, AdDecision, AdSelector, Banner, GateConfig, SourceError, SuppressionCheckResult,
    SuppressionError, SuppressionList, SuppressionListDraft, SuppressionStats,
};
use crate::metrics::{Metrics, MetricsRecorder, MetricsSnapshot};
use crate::ports::{
    AdServingApi, BannerSource, CatalogApi, SuppressionCheck, SuppressionListApi,
    SuppressionListSource, SystemTimeSource,
};
use crate::service::checker::SuppressionChecker;
use crate::service::decorators::{AuditEntry, AuditLog, AuditingChecker, CachingChecker};
use crate::service::registry::{LoadReport, SuppressionRegistry};

/// Liveness summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub total_lists: usize,
    pub total_identifiers: usize,
    pub total_banners: usize,
}

/// The suppression gate.
pub struct SuppressionGateService {
    registry: Arc<SuppressionRegistry>,
    checker: Arc<dyn SuppressionCheck>,
    audit: Option<Arc<dyn AuditLog>>,
    selector: AdSelector,
    catalog: Arc<AdCatalog>,
    metrics: Arc<Metrics>,
    config: GateConfig,
}

impl SuppressionGateService {
    /// Empty registry over `catalog`.
    pub fn new(config: GateConfig, catalog: AdCatalog) -> Result<Self, SuppressionError> {
        config.validate()?;

        let metrics = Arc::new(Metrics::new());
        let recorder: Arc<dyn MetricsRecorder> = metrics.clone();
        let registry = Arc::new(SuppressionRegistry::with_dependencies(
            Arc::new(SystemTimeSource),
            recorder.clone(),
        ));

        let mut checker: Arc<dyn SuppressionCheck> =
            Arc::new(SuppressionChecker::with_metrics(registry.clone(), recorder.clone()));
        if config.cache.enabled {
            checker = Arc::new(
                CachingChecker::from_config(checker, registry.clone(), &config.cache)
                    .with_metrics(recorder),
            );
        }
        let audit = if config.audit.enabled {
            let auditing = Arc::new(AuditingChecker::from_config(checker.clone(), &config.audit));
            checker = auditing.clone();
            Some(auditing as Arc<dyn AuditLog>)
        } else {
            None
        };

        let catalog = Arc::new(catalog);
        info!(
            banners = catalog.len(),
            advertisers = catalog.count_by_advertiser().len(),
            cache = config.cache.enabled,
            audit = config.audit.enabled,
            "Suppression gate initialized"
        );

        Ok(Self {
            registry,
            checker,
            audit,
            selector: AdSelector::new(catalog.clone()),
            catalog,
            metrics,
            config,
        })
    }

    /// Load banners and lists from their sources, then build the index.
    pub fn from_sources(
        config: GateConfig,
        lists: &dyn SuppressionListSource,
        banners: &dyn BannerSource,
    ) -> Result<(Self, LoadReport), SourceError> {
        let catalog = AdCatalog::new(banners.load_banners()?)?;
        let service = Self::new(config, catalog)?;
        let report = service.registry.load(lists.load_lists()?);
        Ok((service, report))
    }

    pub fn stats(&self) -> SuppressionStats {
        self.registry.stats()
    }

    pub fn health(&self) -> HealthStatus {
        let stats = self.registry.stats();
        HealthStatus {
            status: "healthy".to_string(),
            total_lists: stats.total_lists,
            total_identifiers: stats.total_identifiers,
            total_banners: self.catalog.len(),
        }
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Recent audit entries, newest first. Empty when auditing is off.
    pub fn audit_log(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit
            .as_ref()
            .map(|audit| audit.recent(limit))
            .unwrap_or_default()
    }

    pub fn verify_consistency(&self) -> Result<(), SuppressionError> {
        self.registry.verify_consistency()
    }

    pub fn registry(&self) -> &Arc<SuppressionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

impl SuppressionCheck for SuppressionGateService {
    fn check(&self, identifier: &str) -> Result<SuppressionCheckResult, SuppressionError> {
        self.checker.check(identifier)
    }
}

impl SuppressionListApi for SuppressionGateService {
    fn create_list(&self, draft: SuppressionListDraft) -> Result<SuppressionList, SuppressionError> {
        self.registry.create(draft)
    }

    fn list_lists(&self) -> Vec<SuppressionList> {
        self.registry.get_all()
    }

    fn get_list(&self, id: &str) -> Option<SuppressionList> {
        self.registry.get_by_id(id)
    }

    fn update_list(
        &self,
        id: &str,
        draft: SuppressionListDraft,
    ) -> Result<Option<SuppressionList>, SuppressionError> {
        self.registry.update(id, draft)
    }

    fn delete_list(&self, id: &str) -> Result<bool, SuppressionError> {
        self.registry.delete(id)
    }
}

impl AdServingApi for SuppressionGateService {
    fn serve_ad(&self, placement_id: &str, excluded_advertisers: &HashSet<String>) -> Option<Banner> {
        let banner = self.selector.serve(placement_id, excluded_advertisers);
        self.metrics.record_serve(banner.is_some());
        banner
    }

    fn serve_ad_for_user(
        &self,
        placement_id: &str,
        identifier: &str,
    ) -> Result<AdDecision, SuppressionError> {
        let suppression = self.checker.check(identifier)?;
        let banner = self.selector.serve_with_rng(
            placement_id,
            |advertiser| suppression.suppressed_advertisers.contains(advertiser),
            &mut rand::thread_rng(),
        );
        self.metrics.record_serve(banner.is_some());
        debug!(
            placement_id,
            excluded = suppression.suppressed_advertisers.len(),
            banner_id = banner.as_ref().map(|b| b.id.as_str()),
            "Ad request served"
        );
        Ok(AdDecision::new(placement_id, banner, suppression))
    }
}

impl CatalogApi for SuppressionGateService {
    fn all_banners(&self) -> Vec<Banner> {
        self.catalog.all_banners().to_vec()
    }

    fn banner_counts(&self) -> BTreeMap<String, u64> {
        self.catalog.count_by_advertiser().clone()
    }
}
