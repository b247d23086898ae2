//! # Ad Catalog
//!
//! Banners loaded once from the banner configuration source. Immutable after
//! load and shared across serving threads behind an `Arc`.

use std::collections::{BTreeMap, HashSet};

use super::entities::Banner;
use super::errors::SuppressionError;

/// Loaded banner collection.
#[derive(Debug, Clone, Default)]
pub struct AdCatalog {
    banners: Vec<Banner>,
    counts: BTreeMap<String, u64>,
}

impl AdCatalog {
    /// Build a catalog, rejecting banners without an id or advertiser and
    /// duplicate banner ids. Load order is preserved.
    pub fn new(banners: Vec<Banner>) -> Result<Self, SuppressionError> {
        let mut seen = HashSet::with_capacity(banners.len());
        let mut counts = BTreeMap::new();

        for banner in &banners {
            if banner.id.trim().is_empty() {
                return Err(SuppressionError::missing("banner.id"));
            }
            if banner.advertiser_id.trim().is_empty() {
                return Err(SuppressionError::invalid(
                    "banner.advertiser_id",
                    format!("is empty for banner {}", banner.id),
                ));
            }
            if !seen.insert(banner.id.as_str()) {
                return Err(SuppressionError::invalid(
                    "banner.id",
                    format!("duplicate banner id {}", banner.id),
                ));
            }
            *counts.entry(banner.advertiser_id.clone()).or_insert(0) += 1;
        }

        Ok(Self { banners, counts })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all_banners(&self) -> &[Banner] {
        &self.banners
    }

    /// Banner count per advertiser.
    pub fn count_by_advertiser(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Advertisers with at least one banner.
    pub fn advertisers(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn get(&self, banner_id: &str) -> Option<&Banner> {
        self.banners.iter().find(|b| b.id == banner_id)
    }

    pub fn len(&self) -> usize {
        self.banners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banners.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn banner(id: &str, advertiser_id: &str, weight: u32) -> Banner {
    Banner {
        id: id.to_string(),
        advertiser_id: advertiser_id.to_string(),
        campaign_id: format!("camp_{}", advertiser_id),
        name: format!("Banner {}", id),
        creative_url: format!("https://cdn.example.com/{}.png", id),
        click_url: format!("https://example.com/click/{}", id),
        width: 300,
        height: 250,
        weight,
    }
}
