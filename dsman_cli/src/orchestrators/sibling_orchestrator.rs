//! create-sibling-gitlab command orchestrator

use crate::config::AppConfig;
use anyhow::Result;
use dsman_core::sibling::SiteConfig;
use dsman_core::{
    CreateSiblingOrchestrator, CreateSiblingRequest, GitLabClient, GitLabSite, StatusRecord, Vcs,
};
use log::debug;
use std::sync::Arc;

/// Runs sibling creation with settings from the root dataset's configuration
pub struct SiblingCommandOrchestrator {
    config: AppConfig,
    orchestrator: CreateSiblingOrchestrator,
}

impl SiblingCommandOrchestrator {
    pub fn new(config: AppConfig, vcs: Arc<dyn Vcs>) -> Self {
        Self {
            config,
            orchestrator: CreateSiblingOrchestrator::new(vcs),
        }
    }

    /// Plan the request and execute it against the configured site
    ///
    /// A dry run never builds a site client, so it works without any site
    /// URL or token configured.
    pub async fn run(&self, request: &CreateSiblingRequest) -> Result<Vec<StatusRecord>> {
        let plan = self.orchestrator.plan(request, &self.config.gitlab)?;
        debug!(
            "Planned sibling creation for {} dataset(s) on site '{}'",
            plan.dataset_paths().len(),
            plan.settings().site
        );

        if plan.is_dry_run() {
            return Ok(self.orchestrator.execute(&plan, None).await?);
        }

        let client = self.site_client(&plan.settings().site)?;
        self.run_against(request, &client).await
    }

    /// Plan the request and execute it against `site`
    pub async fn run_against(
        &self,
        request: &CreateSiblingRequest,
        site: &dyn GitLabSite,
    ) -> Result<Vec<StatusRecord>> {
        Ok(self
            .orchestrator
            .run(request, &self.config.gitlab, site)
            .await?)
    }

    /// REST client for `site`, falling back to the general network timeout
    pub fn site_client(&self, site: &str) -> dsman_core::Result<GitLabClient> {
        let mut site_config: SiteConfig = self
            .config
            .gitlab
            .sites
            .get(site)
            .cloned()
            .unwrap_or_default();
        if site_config.timeout.is_none() {
            site_config.timeout = Some(self.config.network.timeout_seconds);
        }
        GitLabClient::from_site_config(site, &site_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsman_core::GitCli;
    use dsman_core::error::{Error, RemoteError};
    use std::collections::BTreeMap;

    fn config(url: Option<&str>) -> AppConfig {
        let mut sites = BTreeMap::new();
        sites.insert(
            "theone".to_string(),
            SiteConfig {
                url: url.map(str::to_string),
                project: Some("secret".to_string()),
                ..Default::default()
            },
        );
        let mut config = AppConfig::default();
        config.gitlab.default_site = Some("theone".to_string());
        config.gitlab.sites = sites;
        config
    }

    #[test]
    fn test_site_client_requires_url() {
        let orchestrator = SiblingCommandOrchestrator::new(config(None), Arc::new(GitCli::new()));
        let result = orchestrator.site_client("theone");
        assert!(matches!(
            result,
            Err(Error::Remote(RemoteError::NotConfigured { .. }))
        ));
    }

    #[test]
    fn test_site_client_for_unknown_site() {
        let orchestrator = SiblingCommandOrchestrator::new(
            config(Some("https://gitlab.example.com")),
            Arc::new(GitCli::new()),
        );
        assert!(orchestrator.site_client("theone").is_ok());
        assert!(orchestrator.site_client("other").is_err());
    }
}
