//! Project naming layouts
//!
//! A layout turns the position of a dataset inside its hierarchy into a
//! project identifier on the hosting site.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Final path component of a project in the `hierarchy` layout
pub const REPO_SEGMENT: &str = "_repo_";

/// Separator joining path segments into a single project name
pub const SEGMENT_SEPARATOR: &str = "--";

/// Naming convention for sibling projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Directories become nested groups, each dataset is `<groups>/_repo_`
    ///
    /// `P/a/b/_repo_`
    #[default]
    Hierarchy,
    /// One group per root, subdatasets are flat names inside it
    ///
    /// `P/a--b`
    Collection,
    /// Everything flattened into a single name
    ///
    /// `P--a--b`
    Flat,
}

impl Layout {
    /// All layouts, in documentation order
    pub const ALL: [Layout; 3] = [Layout::Hierarchy, Layout::Collection, Layout::Flat];

    /// Configuration name of the layout
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hierarchy => "hierarchy",
            Self::Collection => "collection",
            Self::Flat => "flat",
        }
    }

    /// Project identifier for a dataset at `segments` below the root
    ///
    /// The root dataset (no segments) maps to the bare project root in every
    /// layout. In `hierarchy` this keeps the root project from colliding with
    /// the group holding its descendants' `_repo_` projects.
    pub fn project_path<S: AsRef<str>>(self, project_root: &str, segments: &[S]) -> String {
        if segments.is_empty() {
            return project_root.to_string();
        }

        match self {
            Self::Hierarchy => {
                let mut path = String::from(project_root);
                for segment in segments {
                    path.push('/');
                    path.push_str(segment.as_ref());
                }
                path.push('/');
                path.push_str(REPO_SEGMENT);
                path
            }
            Self::Collection => format!("{project_root}/{}", join_segments(segments)),
            Self::Flat => format!(
                "{project_root}{SEGMENT_SEPARATOR}{}",
                join_segments(segments)
            ),
        }
    }
}

fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hierarchy" => Ok(Self::Hierarchy),
            "collection" => Ok(Self::Collection),
            "flat" => Ok(Self::Flat),
            other => Err(ConfigError::invalid_layout(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const NO_SEGMENTS: [&str; 0] = [];

    #[test]
    fn test_root_is_bare_project_root() {
        for layout in Layout::ALL {
            assert_eq!(layout.project_path("P", &NO_SEGMENTS), "P");
        }
    }

    #[test]
    fn test_two_segment_paths() {
        let segments = ["a", "b"];
        assert_eq!(Layout::Hierarchy.project_path("P", &segments), "P/a/b/_repo_");
        assert_eq!(Layout::Collection.project_path("P", &segments), "P/a--b");
        assert_eq!(Layout::Flat.project_path("P", &segments), "P--a--b");
    }

    #[test]
    fn test_single_segment_paths() {
        let segments = ["collection2"];
        assert_eq!(
            Layout::Hierarchy.project_path("secret", &segments),
            "secret/collection2/_repo_"
        );
        assert_eq!(
            Layout::Collection.project_path("secret", &segments),
            "secret/collection2"
        );
        assert_eq!(
            Layout::Flat.project_path("secret", &segments),
            "secret--collection2"
        );
    }

    #[test]
    fn test_nested_project_root() {
        let segments = vec!["x".to_string()];
        assert_eq!(
            Layout::Collection.project_path("group/sub", &segments),
            "group/sub/x"
        );
    }

    #[test]
    fn test_parse_known_layouts() {
        for layout in Layout::ALL {
            assert_eq!(layout.as_str().parse::<Layout>(), Ok(layout));
            assert_eq!(layout.to_string(), layout.as_str());
        }
    }

    #[test]
    fn test_parse_unknown_layout_fails() {
        assert_eq!(
            "funny".parse::<Layout>(),
            Err(ConfigError::invalid_layout("funny"))
        );
        assert!("Hierarchy".parse::<Layout>().is_err());
        assert!("".parse::<Layout>().is_err());
    }

    #[test]
    fn test_default_layout_is_hierarchy() {
        assert_eq!(Layout::default(), Layout::Hierarchy);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Layout::Collection).unwrap();
        assert_eq!(json, "\"collection\"");
        let parsed: Layout = serde_json::from_str("\"flat\"").unwrap();
        assert_eq!(parsed, Layout::Flat);
    }

    fn segment() -> impl Strategy<Value = String> {
        // Dataset directory names: no separators, no double dashes
        "[a-z0-9_][a-z0-9_.]{0,7}"
    }

    proptest! {
        #[test]
        fn prop_distinct_paths_give_distinct_projects(
            paths in prop::collection::hash_set(prop::collection::vec(segment(), 0..4), 1..12)
        ) {
            for layout in Layout::ALL {
                let projects: HashSet<String> = paths
                    .iter()
                    .map(|segments| layout.project_path("root", segments))
                    .collect();
                prop_assert_eq!(projects.len(), paths.len());
            }
        }
    }
}
