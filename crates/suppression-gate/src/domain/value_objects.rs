//! # Value Objects
//!
//! Configuration for the suppression gate and its checker decorators.
//!
//! # Example
//!
//! ```ignore
//! use suppression_gate::domain::GateConfigBuilder;
//!
//! let config = GateConfigBuilder::new()
//!     .cache_capacity(50_000)
//!     .cache_ttl_secs(300)
//!     .audit(true)
//!     .build()
//!     .expect("valid config");
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::SuppressionError;

/// Latency budget for a single suppression check.
///
/// Checks slower than this are logged at `warn!`.
pub const CHECK_LATENCY_BUDGET: Duration = Duration::from_millis(10);

/// Default number of identifiers held by the check cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default lifetime of a cached check result.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default number of audit entries retained.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Upper bound for either bounded buffer.
pub const MAX_BUFFER_CAPACITY: usize = 10_000_000;

/// Check cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum cached identifiers (LRU eviction beyond this).
    pub capacity: usize,
    /// Seconds before a cached result is considered stale.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Entries retained before the oldest are dropped.
    pub capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

/// Suppression gate configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    pub cache: CacheConfig,
    pub audit: AuditConfig,
}

impl GateConfig {
    /// Validate bounds. Disabled decorators are not checked.
    pub fn validate(&self) -> Result<(), SuppressionError> {
        if self.cache.enabled {
            if self.cache.capacity == 0 || self.cache.capacity > MAX_BUFFER_CAPACITY {
                return Err(SuppressionError::invalid(
                    "cache.capacity",
                    format!("must be between 1 and {}", MAX_BUFFER_CAPACITY),
                ));
            }
            if self.cache.ttl_secs == 0 {
                return Err(SuppressionError::invalid("cache.ttl_secs", "must be positive"));
            }
        }

        if self.audit.enabled
            && (self.audit.capacity == 0 || self.audit.capacity > MAX_BUFFER_CAPACITY)
        {
            return Err(SuppressionError::invalid(
                "audit.capacity",
                format!("must be between 1 and {}", MAX_BUFFER_CAPACITY),
            ));
        }

        Ok(())
    }
}

/// Fluent builder for [`GateConfig`].
#[derive(Default)]
pub struct GateConfigBuilder {
    cache_enabled: Option<bool>,
    cache_capacity: Option<usize>,
    cache_ttl_secs: Option<u64>,
    audit_enabled: Option<bool>,
    audit_capacity: Option<usize>,
}

impl GateConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the check cache.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    /// Set cache capacity. Implies `cache(true)` unless set explicitly.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self.cache_enabled.get_or_insert(true);
        self
    }

    /// Set cache TTL in seconds. Implies `cache(true)` unless set explicitly.
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = Some(secs);
        self.cache_enabled.get_or_insert(true);
        self
    }

    /// Enable or disable the audit log.
    pub fn audit(mut self, enabled: bool) -> Self {
        self.audit_enabled = Some(enabled);
        self
    }

    /// Set audit capacity. Implies `audit(true)` unless set explicitly.
    pub fn audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = Some(capacity);
        self.audit_enabled.get_or_insert(true);
        self
    }

    /// Build and validate.
    pub fn build(self) -> Result<GateConfig, SuppressionError> {
        let defaults = GateConfig::default();
        let config = GateConfig {
            cache: CacheConfig {
                enabled: self.cache_enabled.unwrap_or(defaults.cache.enabled),
                capacity: self.cache_capacity.unwrap_or(defaults.cache.capacity),
                ttl_secs: self.cache_ttl_secs.unwrap_or(defaults.cache.ttl_secs),
            },
            audit: AuditConfig {
                enabled: self.audit_enabled.unwrap_or(defaults.audit.enabled),
                capacity: self.audit_capacity.unwrap_or(defaults.audit.capacity),
            },
        };
        config.validate()?;
        Ok(config)
    }
}
