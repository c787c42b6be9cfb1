//! Adding web content to datasets through git-annex
//!
//! This module provides:
//! - The [`Annexificator`], which adds a URL to a dataset file and skips URLs
//!   whose content did not change since the last run
//! - A persisted files database remembering the last seen URL status
//! - [`ActivityStats`] counters describing what happened

mod annexificator;
mod files_db;
mod probe;
mod stats;

pub use annexificator::{AnnexInput, Annexificator};
pub use files_db::{FilesDb, files_db_path};
pub use probe::{HttpUrlProbe, UrlProbe, UrlStatus};
pub use stats::ActivityStats;

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How `git annex addurl` treats content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnexMode {
    /// Download the content
    #[default]
    Full,
    /// Record the URL and its size without downloading
    Fast,
    /// Record the URL only; content changes go unnoticed
    Relaxed,
}

impl AnnexMode {
    pub const ALL: [AnnexMode; 3] = [AnnexMode::Full, AnnexMode::Fast, AnnexMode::Relaxed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Fast => "fast",
            Self::Relaxed => "relaxed",
        }
    }

    /// Flag passed to `git annex addurl`
    pub fn addurl_flag(self) -> Option<&'static str> {
        match self {
            Self::Full => None,
            Self::Fast => Some("--fast"),
            Self::Relaxed => Some("--relaxed"),
        }
    }

    /// Whether content is fetched
    pub fn downloads(self) -> bool {
        self == Self::Full
    }
}

impl fmt::Display for AnnexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnexMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_parameter("mode", "expected full, fast or relaxed")
            })
    }
}
