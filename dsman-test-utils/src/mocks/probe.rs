//! Mock implementation of the UrlProbe trait

use async_trait::async_trait;
use dsman_core::annex::{UrlProbe, UrlStatus};
use dsman_core::error::RemoteError;
use dsman_core::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// URL probe answering from a fixed table
///
/// Unknown URLs fail like an unreachable server.
#[derive(Clone, Default)]
pub struct MockUrlProbe {
    statuses: Arc<Mutex<HashMap<String, UrlStatus>>>,
}

impl MockUrlProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, url: &str, status: UrlStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(url.to_string(), status);
    }

    /// Shorthand for a status with size and mtime
    pub fn set(&self, url: &str, size: u64, mtime: &str) {
        self.set_status(
            url,
            UrlStatus {
                size: Some(size),
                mtime: Some(mtime.to_string()),
            },
        );
    }
}

#[async_trait]
impl UrlProbe for MockUrlProbe {
    async fn status(&self, url: &str) -> Result<UrlStatus> {
        self.statuses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| RemoteError::other(format!("cannot reach {url}")).into())
    }
}
