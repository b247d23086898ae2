//! # Outbound Ports (Driven Ports)
//!
//! SPIs required by the suppression gate: bulk loaders and a clock.

use chrono::{DateTime, Utc};

use crate::domain::{Banner, SourceError, SuppressionListDraft};

/// Bulk source of suppression lists, read once at startup.
pub trait SuppressionListSource: Send + Sync {
    /// Lists in source order. Records may be incomplete; the registry
    /// validates each one.
    fn load_lists(&self) -> Result<Vec<SuppressionListDraft>, SourceError>;
}

/// Banner configuration source, read once at startup.
pub trait BannerSource: Send + Sync {
    fn load_banners(&self) -> Result<Vec<Banner>, SourceError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock [`TimeSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl SuppressionListSource for Vec<SuppressionListDraft> {
    fn load_lists(&self) -> Result<Vec<SuppressionListDraft>, SourceError> {
        Ok(self.clone())
    }
}

impl BannerSource for Vec<Banner> {
    fn load_banners(&self) -> Result<Vec<Banner>, SourceError> {
        Ok(self.clone())
    }
}
