//! Per-site configuration and layered lookup
//!
//! Every setting of a sibling (site, sibling name, project root, layout,
//! access) is resolved from a fixed list of layers, highest precedence first:
//! the explicit invocation argument, the site-specific configuration, then the
//! general fallback. [`lookup`] is the single place that encodes this
//! precedence.

use super::layout::Layout;
use crate::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Configuration key naming the default site
pub const DEFAULT_SITE_KEY: &str = "gitlab.default_site";

/// GitLab section of the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Site used when none is given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_site: Option<String>,

    /// Settings per site name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sites: BTreeMap<String, SiteConfig>,
}

/// Settings of a single hosting site
///
/// Layout and access are kept as raw strings so that an invalid value is
/// reported when it is looked up, not when the configuration is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the site, e.g. `https://gitlab.example.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// API access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Remote name to register on datasets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_name: Option<String>,

    /// Project root under which sibling projects are created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Layout name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Access name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Which repository URL of a project gets registered as sibling URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Http,
    Ssh,
}

impl Access {
    /// Configuration name of the access mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Ssh => "ssh",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Access {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "ssh" => Ok(Self::Ssh),
            other => Err(ConfigError::invalid_access(other)),
        }
    }
}

/// Origin of a resolved setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Given on the invocation
    Explicit,
    /// Site-specific configuration key
    Site,
    /// General configuration key
    General,
    /// Built-in default
    Default,
}

/// First present value among `layers`, listed highest precedence first
pub fn lookup<T, const N: usize>(layers: [(Layer, Option<T>); N]) -> Option<(Layer, T)> {
    layers
        .into_iter()
        .find_map(|(layer, value)| value.map(|value| (layer, value)))
}

/// Configuration key of a site-specific setting
pub fn site_key(site: &str, field: &str) -> String {
    format!("gitlab.sites.{site}.{field}")
}

/// Settings explicitly requested on an invocation
#[derive(Debug, Clone, Default)]
pub struct SiteRequest {
    pub site: Option<String>,
    pub name: Option<String>,
    pub project: Option<String>,
    pub layout: Option<String>,
    pub access: Option<String>,
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub site: String,
    pub sibling_name: String,
    /// Project root, `None` when neither given nor configured
    pub project_root: Option<String>,
    pub layout: Layout,
    pub access: Access,
}

/// Resolves sibling settings against a [`GitLabConfig`]
///
/// The configuration must come from the root dataset of the operation; it is
/// authoritative for every subdataset below it.
#[derive(Debug, Clone, Copy)]
pub struct SiteLookup<'a> {
    config: &'a GitLabConfig,
}

impl<'a> SiteLookup<'a> {
    pub fn new(config: &'a GitLabConfig) -> Self {
        Self { config }
    }

    fn site_config(&self, site: &str) -> Option<&'a SiteConfig> {
        self.config.sites.get(site)
    }

    /// Site name: explicit, then the configured default site
    pub fn site(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        lookup([
            (Layer::Explicit, explicit.map(str::to_string)),
            (Layer::General, self.config.default_site.clone()),
        ])
        .map(|(layer, site)| {
            debug!("Using site '{site}' ({layer:?})");
            site
        })
        .ok_or_else(|| ConfigError::missing_site(DEFAULT_SITE_KEY))
    }

    /// Sibling name: explicit, then the site's configured name, then the site
    /// name itself
    pub fn sibling_name(&self, site: &str, explicit: Option<&str>) -> String {
        let (_, name) = lookup([
            (Layer::Explicit, explicit.map(str::to_string)),
            (
                Layer::Site,
                self.site_config(site).and_then(|c| c.sibling_name.clone()),
            ),
            (Layer::Default, Some(site.to_string())),
        ])
        .unwrap_or((Layer::Default, site.to_string()));
        name
    }

    /// Project root: explicit, then the site's configured project; no default
    pub fn project_root(&self, site: &str, explicit: Option<&str>) -> Result<String, ConfigError> {
        self.project_root_opt(site, explicit)
            .ok_or_else(|| ConfigError::missing_project_root(&site_key(site, "project")))
    }

    fn project_root_opt(&self, site: &str, explicit: Option<&str>) -> Option<String> {
        lookup([
            (Layer::Explicit, explicit.map(str::to_string)),
            (
                Layer::Site,
                self.site_config(site).and_then(|c| c.project.clone()),
            ),
        ])
        .map(|(_, project)| project)
    }

    /// Layout: explicit, then the site's configured layout, then `hierarchy`
    pub fn layout(&self, site: &str, explicit: Option<&str>) -> Result<Layout, ConfigError> {
        match lookup([
            (Layer::Explicit, explicit),
            (
                Layer::Site,
                self.site_config(site).and_then(|c| c.layout.as_deref()),
            ),
        ]) {
            Some((_, name)) => name.parse(),
            None => Ok(Layout::default()),
        }
    }

    /// Access: explicit, then the site's configured access, then `http`
    pub fn access(&self, site: &str, explicit: Option<&str>) -> Result<Access, ConfigError> {
        match lookup([
            (Layer::Explicit, explicit),
            (
                Layer::Site,
                self.site_config(site).and_then(|c| c.access.as_deref()),
            ),
        ]) {
            Some((_, name)) => name.parse(),
            None => Ok(Access::default()),
        }
    }

    /// Resolve every setting of a request at once
    ///
    /// Fails on a missing site or an invalid layout/access value. A missing
    /// project root is not an error here; it is reported per dataset.
    pub fn resolve(&self, request: &SiteRequest) -> Result<SiteSettings, ConfigError> {
        let site = self.site(request.site.as_deref())?;
        let layout = self.layout(&site, request.layout.as_deref())?;
        let access = self.access(&site, request.access.as_deref())?;
        let sibling_name = self.sibling_name(&site, request.name.as_deref());
        let project_root = self.project_root_opt(&site, request.project.as_deref());

        Ok(SiteSettings {
            site,
            sibling_name,
            project_root,
            layout,
            access,
        })
    }
}
