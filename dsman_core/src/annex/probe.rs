//! Probing the status of a URL without downloading it

use crate::error::{IoError, RemoteError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use std::time::{Duration, UNIX_EPOCH};
use url::Url;

/// What is known about the content behind a URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlStatus {
    /// Content size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Modification stamp as reported by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
}

/// Source of [`UrlStatus`] information
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn status(&self, url: &str) -> Result<UrlStatus>;
}

/// Probe answering `http(s)://` URLs with a HEAD request and `file://` URLs
/// from file metadata
#[derive(Debug, Clone)]
pub struct HttpUrlProbe {
    http: Client,
}

impl HttpUrlProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dsman/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    async fn head(&self, url: &Url) -> Result<UrlStatus> {
        debug!("HEAD {url}");
        let response = self.http.head(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::server_error(status.as_u16(), url.as_str()).into());
        }

        let headers = response.headers();
        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        let mtime = headers
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(UrlStatus { size, mtime })
    }
}

#[async_trait]
impl UrlProbe for HttpUrlProbe {
    async fn status(&self, url: &str) -> Result<UrlStatus> {
        let parsed = Url::parse(url)
            .map_err(|e| RemoteError::other(format!("Invalid URL '{url}': {e}")))?;

        match parsed.scheme() {
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|()| RemoteError::other(format!("Invalid file URL '{url}'")))?;
                file_status(&path).await
            }
            "http" | "https" => self.head(&parsed).await,
            scheme => Err(RemoteError::other(format!("Unsupported URL scheme '{scheme}'")).into()),
        }
    }
}

async fn file_status(path: &std::path::Path) -> Result<UrlStatus> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| IoError::from_std(e).with_path(path))?;
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(|since| format!("{}.{:09}", since.as_secs(), since.subsec_nanos()));
    Ok(UrlStatus {
        size: Some(metadata.len()),
        mtime,
    })
}
