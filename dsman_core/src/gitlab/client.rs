//! GitLab REST API (v4) client

use super::{GitLabSite, ProjectAttributes};
use crate::error::{RemoteError, Result};
use crate::sibling::SiteConfig;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Request timeout used when the site configures none
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const API_PREFIX: &str = "/api/v4";

#[derive(Debug, Deserialize)]
struct Namespace {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Group {
    id: u64,
}

/// HTTP client for one GitLab instance
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GitLabClient {
    /// Create a client for the instance at `base_url`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = url::Url::parse(base_url)
            .map_err(|e| RemoteError::other(format!("Invalid site URL '{base_url}': {e}")))?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dsman/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create a client from the configuration of site `site`
    pub fn from_site_config(site: &str, config: &SiteConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| {
            RemoteError::not_configured(site, &format!("no 'gitlab.sites.{site}.url' configured"))
        })?;
        let timeout = config
            .timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self::new(url, config.token.clone(), timeout)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    /// GET a resource, `None` on 404
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.endpoint(path);
        debug!("GET {url}");
        let response = self.authorized(self.http.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::parse(response).await?))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let url = self.endpoint(path);
        debug!("POST {url}");
        let response = self
            .authorized(self.http.post(&url))
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::server_error(
                status.as_u16(),
                &body.chars().take(200).collect::<String>(),
            )
            .into());
        }
        Ok(response.json().await?)
    }

    async fn namespace_id(&self, path: &str) -> Result<Option<u64>> {
        let namespace: Option<Namespace> = self
            .get_optional(&format!("/namespaces/{}", urlencoding::encode(path)))
            .await?;
        Ok(namespace.map(|namespace| namespace.id))
    }

    /// Id of the group at `path`, creating it and any missing parent groups
    async fn ensure_namespace(&self, path: &str) -> Result<u64> {
        if let Some(id) = self.namespace_id(path).await? {
            return Ok(id);
        }

        let mut parent_id = None;
        let mut prefix = String::new();
        for segment in path.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            parent_id = match self.namespace_id(&prefix).await? {
                Some(id) => Some(id),
                None => {
                    info!("Creating group '{prefix}'");
                    let mut body = json!({ "name": segment, "path": segment });
                    if let Some(parent_id) = parent_id {
                        body["parent_id"] = json!(parent_id);
                    }
                    let group: Group = self.post("/groups", &body).await?;
                    Some(group.id)
                }
            };
        }

        parent_id.ok_or_else(|| RemoteError::other(format!("Empty namespace path '{path}'")).into())
    }
}

#[async_trait]
impl GitLabSite for GitLabClient {
    async fn get_project(&self, path: &str) -> Result<Option<ProjectAttributes>> {
        self.get_optional(&format!("/projects/{}", urlencoding::encode(path)))
            .await
    }

    async fn create_project(
        &self,
        path: &str,
        description: Option<&str>,
    ) -> Result<ProjectAttributes> {
        let (namespace, name) = split_project_path(path);

        let mut body = json!({ "name": name, "path": name });
        if let Some(namespace) = namespace {
            let namespace_id = self.ensure_namespace(namespace).await?;
            body["namespace_id"] = json!(namespace_id);
        }
        if let Some(description) = description {
            body["description"] = json!(description);
        }

        info!("Creating project '{path}'");
        self.post("/projects", &body).await
    }
}

/// Split `group/sub/name` into the namespace and the project name
fn split_project_path(path: &str) -> (Option<&str>, &str) {
    match path.trim_matches('/').rsplit_once('/') {
        Some((namespace, name)) => (Some(namespace), name),
        None => (None, path.trim_matches('/')),
    }
}
