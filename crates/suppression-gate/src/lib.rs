//! # Suppression Gate
//!
//! Advertiser suppression index with suppression-aware weighted ad selection.
//!
//! Advertisers register suppression lists: named sets of user identifiers
//! (typically hashed emails) that must never receive that advertiser's
//! creatives. A serving request checks the user's identifier against the
//! index, excludes every suppressing advertiser, then draws a banner by
//! weight from what remains.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O, no locks
//!   - `SuppressionStore`: authoritative list storage
//!   - `SuppressionIndex`: identifier -> advertiser set
//!   - `AdCatalog` / `AdSelector`: banners and weighted selection
//!   - `GateConfig`, `GateConfigBuilder`: configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `SuppressionCheck`, `SuppressionListApi`, `AdServingApi`, `CatalogApi`:
//!     driving ports
//!   - `SuppressionListSource`, `BannerSource`, `TimeSource`: driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `SuppressionRegistry`: store + index behind one `RwLock`
//!   - `SuppressionChecker`, `CachingChecker`, `AuditingChecker`
//!   - `SuppressionGateService`: implements the driving ports
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `JsonFileListSource`, `JsonFileBannerSource`: seed files
//!   - `ApiGatewayHandler`: JSON method dispatcher
//!
//! ## Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | `advertiser ∈ index[id]` iff some live list of that advertiser contains `id` | `SuppressionRegistry` patches + rollback |
//! | No index entry maps to an empty set | `SuppressionIndex::remove` |
//! | Checks never observe a half-applied mutation | single write lock per mutation |
//! | A suppressed advertiser's banner is never served | `AdSelector` filters before drawing |
//! | Unknown identifier is an empty result, not an error | `SuppressionChecker` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use suppression_gate::{AdCatalog, GateConfig, SuppressionGateService};
//! use suppression_gate::ports::{AdServingApi, SuppressionListApi};
//! use suppression_gate::domain::SuppressionListDraft;
//!
//! let gate = SuppressionGateService::new(GateConfig::default(), AdCatalog::new(banners)?)?;
//! gate.create_list(SuppressionListDraft::new("adv1", "Churned", vec!["hash_abc".into()]))?;
//!
//! let decision = gate.serve_ad_for_user("homepage-top", "hash_abc")?;
//! assert!(decision.banner.map_or(true, |b| b.advertiser_id != "adv1"));
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use domain::{
    AdCatalog, AdDecision, AdSelector, Banner, GateConfig, GateConfigBuilder, SourceError,
    SuppressionCheckResult, SuppressionError, SuppressionIndex, SuppressionList,
    SuppressionListDraft, SuppressionStats, SuppressionStore,
};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{
    AdServingApi, BannerSource, CatalogApi, SuppressionCheck, SuppressionListApi,
    SuppressionListSource, TimeSource,
};
pub use service::{
    AuditEntry, AuditingChecker, CachingChecker, HealthStatus, LoadReport, SuppressionChecker,
    SuppressionGateService, SuppressionRegistry,
};

pub use adapters::{
    handle_api_query, ApiGatewayHandler, ApiQueryError, JsonFileBannerSource, JsonFileListSource,
};
