//! Configuration related error types

use thiserror::Error;

/// Errors raised while resolving site configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Layout name is not one of the known layouts
    #[error("Invalid configuration: unknown layout '{value}' (expected hierarchy, collection or flat)")]
    InvalidLayout { value: String },

    /// Access name is not one of the known access modes
    #[error("Invalid configuration: unknown access '{value}' (expected http or ssh)")]
    InvalidAccess { value: String },

    /// Existing-sibling policy is not one of the known policies
    #[error("Invalid configuration: unknown existing policy '{value}' (expected error, skip or reconfigure)")]
    InvalidExisting { value: String },

    /// No site given and no default site configured
    #[error("Invalid configuration: no site given and no '{key}' configured")]
    MissingSite { key: String },

    /// No project root given and none configured for the site
    #[error("Invalid configuration: no project given and no '{key}' configured")]
    MissingProjectRoot { key: String },
}

impl ConfigError {
    /// Create an invalid layout error
    pub fn invalid_layout(value: &str) -> Self {
        Self::InvalidLayout {
            value: value.to_string(),
        }
    }

    /// Create an invalid access error
    pub fn invalid_access(value: &str) -> Self {
        Self::InvalidAccess {
            value: value.to_string(),
        }
    }

    /// Create an invalid existing-policy error
    pub fn invalid_existing(value: &str) -> Self {
        Self::InvalidExisting {
            value: value.to_string(),
        }
    }

    /// Create a missing site error
    pub fn missing_site(key: &str) -> Self {
        Self::MissingSite {
            key: key.to_string(),
        }
    }

    /// Create a missing project root error
    pub fn missing_project_root(key: &str) -> Self {
        Self::MissingProjectRoot {
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_layout_error() {
        let error = ConfigError::invalid_layout("funny");
        assert!(error.to_string().contains("Invalid configuration"));
        assert!(error.to_string().contains("'funny'"));
    }

    #[test]
    fn test_missing_project_root_names_key() {
        let error = ConfigError::missing_project_root("gitlab.sites.theone.project");
        assert!(error.to_string().contains("gitlab.sites.theone.project"));
    }

    #[test]
    fn test_missing_site_names_key() {
        let error = ConfigError::missing_site("gitlab.default_site");
        assert!(error.to_string().contains("gitlab.default_site"));
    }
}
