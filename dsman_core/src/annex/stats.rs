//! Activity statistics of annex operations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Counters accumulated while adding URLs to a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Files processed, skipped ones included
    pub files: u64,
    /// URLs processed
    pub urls: u64,
    /// Files whose content was downloaded
    pub downloaded: u64,
    /// Bytes downloaded
    pub downloaded_size: u64,
    /// Time spent downloading
    pub downloaded_time: Duration,
    /// Files that ended up directly in git
    pub add_git: u64,
    /// Files that ended up in the annex
    pub add_annex: u64,
    /// Files left alone because their source did not change
    pub skipped: u64,
    /// Existing files replaced by new content
    pub overwritten: u64,
}

impl ActivityStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with the timing reset, for comparisons that ignore it
    pub fn without_time(&self) -> Self {
        Self {
            downloaded_time: Duration::ZERO,
            ..self.clone()
        }
    }
}

impl Add for ActivityStats {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl AddAssign for ActivityStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.urls += other.urls;
        self.downloaded += other.downloaded;
        self.downloaded_size += other.downloaded_size;
        self.downloaded_time += other.downloaded_time;
        self.add_git += other.add_git;
        self.add_annex += other.add_annex;
        self.skipped += other.skipped;
        self.overwritten += other.overwritten;
    }
}

impl fmt::Display for ActivityStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files={} urls={} downloaded={} ({} bytes in {:.2}s) add_git={} add_annex={} skipped={} overwritten={}",
            self.files,
            self.urls,
            self.downloaded,
            self.downloaded_size,
            self.downloaded_time.as_secs_f64(),
            self.add_git,
            self.add_annex,
            self.skipped,
            self.overwritten
        )
    }
}
