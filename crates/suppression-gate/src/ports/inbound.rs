//! # Inbound Ports (Driving Ports)
//!
//! Public APIs exposed by the suppression gate.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::domain::{
    AdDecision, Banner, SuppressionCheckResult, SuppressionError, SuppressionList,
    SuppressionListDraft,
};

/// Suppression lookup for one identifier.
///
/// This is the seam the checker decorators (cache, audit) wrap.
pub trait SuppressionCheck: Send + Sync {
    /// Advertisers suppressing `identifier`, with lookup latency.
    ///
    /// ## Returns
    ///
    /// - `Ok(result)`: empty `suppressed_advertisers` for unknown identifiers
    /// - `Err(Validation)`: identifier is empty
    fn check(&self, identifier: &str) -> Result<SuppressionCheckResult, SuppressionError>;
}

impl<T: SuppressionCheck + ?Sized> SuppressionCheck for Arc<T> {
    fn check(&self, identifier: &str) -> Result<SuppressionCheckResult, SuppressionError> {
        (**self).check(identifier)
    }
}

/// CRUD over suppression lists.
///
/// Not-found is a negative result (`None`/`false`), never an error. The
/// only errors are validation failures and detected index inconsistencies.
pub trait SuppressionListApi {
    /// Create a list, generating an id if absent and stamping `created_at`.
    fn create_list(&self, draft: SuppressionListDraft) -> Result<SuppressionList, SuppressionError>;

    /// Snapshot of every live list.
    fn list_lists(&self) -> Vec<SuppressionList>;

    fn get_list(&self, id: &str) -> Option<SuppressionList>;

    /// Replace name, advertiser and identifiers of an existing list.
    fn update_list(
        &self,
        id: &str,
        draft: SuppressionListDraft,
    ) -> Result<Option<SuppressionList>, SuppressionError>;

    /// Returns `Ok(false)` if no list had this id.
    fn delete_list(&self, id: &str) -> Result<bool, SuppressionError>;
}

/// Ad serving.
pub trait AdServingApi {
    /// Weighted selection among banners whose advertiser is not excluded.
    fn serve_ad(&self, placement_id: &str, excluded_advertisers: &HashSet<String>) -> Option<Banner>;

    /// Suppression check followed by selection.
    fn serve_ad_for_user(
        &self,
        placement_id: &str,
        identifier: &str,
    ) -> Result<AdDecision, SuppressionError>;
}

/// Read-only catalog introspection.
pub trait CatalogApi {
    fn all_banners(&self) -> Vec<Banner>;

    fn banner_counts(&self) -> BTreeMap<String, u64>;
}
