//! # Domain Entities
//!
//! Core records of the suppression gate.
//!
//! - `SuppressionList`: an advertiser-owned set of user identifiers
//! - `SuppressionListDraft`: create/update input, every field optional
//! - `Banner`: a servable creative with a selection weight
//! - `SuppressionCheckResult`: suppressed advertisers plus lookup latency
//! - `AdDecision`: outcome of a full serving request
//!
//! Wire names are snake_case. camelCase spellings are accepted on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use super::errors::SuppressionError;

/// A named, advertiser-owned collection of identifiers that must not
/// receive that advertiser's ads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionList {
    pub id: String,
    #[serde(alias = "advertiserId")]
    pub advertiser_id: String,
    pub name: String,
    /// Identifiers in the order they were supplied. Duplicates are allowed
    /// and have no additional effect.
    pub identifiers: Vec<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl SuppressionList {
    /// Distinct identifiers of this list.
    pub fn identifier_set(&self) -> HashSet<String> {
        self.identifiers.iter().cloned().collect()
    }
}

/// Create or update request for a suppression list.
///
/// Every field is optional so that "missing" and "empty" are both
/// reported as a validation error naming the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionListDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "advertiserId")]
    pub advertiser_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifiers: Option<Vec<String>>,
    /// Honoured for bulk loads only; create stamps the current time.
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SuppressionListDraft {
    /// Build a draft from the three required fields.
    pub fn new(
        advertiser_id: impl Into<String>,
        name: impl Into<String>,
        identifiers: Vec<String>,
    ) -> Self {
        Self {
            id: None,
            advertiser_id: Some(advertiser_id.into()),
            name: Some(name.into()),
            identifiers: Some(identifiers),
            created_at: None,
        }
    }

    /// Set a client-assigned id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set an explicit creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Check required fields.
    ///
    /// `advertiser_id`, `name` and `identifiers` must be present and
    /// non-empty; no single identifier may be blank. A supplied `id`
    /// must not be blank either.
    pub fn validate(&self) -> Result<(), SuppressionError> {
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err(SuppressionError::invalid("id", "must not be blank when supplied"));
            }
        }
        require_text(&self.advertiser_id, "advertiser_id")?;
        require_text(&self.name, "name")?;

        let identifiers = match &self.identifiers {
            Some(ids) if !ids.is_empty() => ids,
            _ => return Err(SuppressionError::missing("identifiers")),
        };
        if let Some(pos) = identifiers.iter().position(|i| i.trim().is_empty()) {
            return Err(SuppressionError::invalid(
                "identifiers",
                format!("entry {} is blank", pos),
            ));
        }
        Ok(())
    }

    /// Turn a validated draft into a list.
    ///
    /// Callers must run [`validate`](Self::validate) first.
    pub(crate) fn into_list(self, id: String, created_at: DateTime<Utc>) -> SuppressionList {
        SuppressionList {
            id,
            advertiser_id: self.advertiser_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            identifiers: self.identifiers.unwrap_or_default(),
            created_at,
        }
    }
}

fn require_text(value: &Option<String>, field: &str) -> Result<(), SuppressionError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(SuppressionError::missing(field)),
    }
}

/// A servable creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    #[serde(alias = "advertiserId")]
    pub advertiser_id: String,
    #[serde(alias = "campaignId")]
    pub campaign_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "creativeUrl")]
    pub creative_url: String,
    #[serde(default, alias = "clickUrl")]
    pub click_url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Relative selection weight. Zero means "eligible, never drawn"
    /// unless every eligible banner has weight zero.
    #[serde(default)]
    pub weight: u32,
}

/// Result of one suppression check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionCheckResult {
    /// Advertisers that must not be shown to this identifier.
    pub suppressed_advertisers: BTreeSet<String>,
    /// Lookup latency in whole milliseconds.
    pub check_time_ms: u64,
    /// True when served from the check cache.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
    #[serde(skip)]
    elapsed: Duration,
}

impl SuppressionCheckResult {
    pub fn new(suppressed_advertisers: BTreeSet<String>, elapsed: Duration) -> Self {
        Self {
            suppressed_advertisers,
            check_time_ms: elapsed.as_millis() as u64,
            cached: false,
            elapsed,
        }
    }

    /// An empty result. Absence of suppression is the default state.
    pub fn empty(elapsed: Duration) -> Self {
        Self::new(BTreeSet::new(), elapsed)
    }

    /// Precise lookup latency.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_suppressed(&self, advertiser_id: &str) -> bool {
        self.suppressed_advertisers.contains(advertiser_id)
    }

    /// Copy of this result marked as a cache hit with a new latency.
    pub fn as_cached(&self, elapsed: Duration) -> Self {
        Self {
            suppressed_advertisers: self.suppressed_advertisers.clone(),
            check_time_ms: elapsed.as_millis() as u64,
            cached: true,
            elapsed,
        }
    }
}

/// Outcome of serving an ad for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdDecision {
    pub placement_id: String,
    /// `None` when no eligible banner remains. Not an error.
    pub banner: Option<Banner>,
    #[serde(rename = "suppression_info")]
    pub suppression: SuppressionCheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdDecision {
    pub const NO_ELIGIBLE_AD: &'static str = "No eligible ad available";

    pub fn new(
        placement_id: impl Into<String>,
        banner: Option<Banner>,
        suppression: SuppressionCheckResult,
    ) -> Self {
        let message = banner.is_none().then(|| Self::NO_ELIGIBLE_AD.to_string());
        Self {
            placement_id: placement_id.into(),
            banner,
            suppression,
            message,
        }
    }
}

/// Statistics about the suppression registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionStats {
    /// Live suppression lists.
    pub total_lists: usize,
    /// Distinct identifiers in the index.
    pub total_identifiers: usize,
    /// Advertisers owning at least one list.
    pub total_advertisers: usize,
    /// Sum of advertiser-set sizes across the index.
    pub index_entries: usize,
    /// Mutation generation.
    pub generation: u64,
}
