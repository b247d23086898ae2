//! # JSON File Sources
//!
//! Startup loaders for the seed files.
//!
//! - Suppression lists: a JSON array of list records.
//! - Banners: an object `{"banners": [...]}`.
//!
//! A missing file yields an empty result and a warning. An unreadable or
//! malformed file is an error.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::{Banner, SourceError, SuppressionListDraft};
use crate::ports::{BannerSource, SuppressionListSource};

/// Suppression lists file.
#[derive(Debug, Clone)]
pub struct JsonFileListSource {
    path: PathBuf,
}

impl JsonFileListSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SuppressionListSource for JsonFileListSource {
    fn load_lists(&self) -> Result<Vec<SuppressionListDraft>, SourceError> {
        let lists: Vec<SuppressionListDraft> = read_json(&self.path)?.unwrap_or_default();
        info!(path = %self.path.display(), records = lists.len(), "Read suppression lists file");
        Ok(lists)
    }
}

#[derive(Debug, Default, Deserialize)]
struct BannerFile {
    #[serde(default)]
    banners: Vec<Banner>,
}

/// Banner configuration file.
#[derive(Debug, Clone)]
pub struct JsonFileBannerSource {
    path: PathBuf,
}

impl JsonFileBannerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BannerSource for JsonFileBannerSource {
    fn load_banners(&self) -> Result<Vec<Banner>, SourceError> {
        let file: BannerFile = read_json(&self.path)?.unwrap_or_default();
        info!(path = %self.path.display(), banners = file.banners.len(), "Read banner config");
        Ok(file.banners)
    }
}

/// `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SourceError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Seed file not found, starting empty");
            return Ok(None);
        }
        Err(source) => {
            return Err(SourceError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|err| SourceError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })
}
