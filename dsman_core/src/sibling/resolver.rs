//! Sibling path resolution
//!
//! Computes the project identifier of a dataset, and optionally of all
//! datasets below it, from a project root and a [`Layout`]. Pure computation:
//! nothing here touches the file system or a remote site.

use super::layout::Layout;
use crate::dataset::{DatasetId, DatasetTree};
use crate::error::ConfigError;
use std::path::PathBuf;

/// A dataset paired with the project it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTarget {
    pub dataset: DatasetId,
    /// Location of the dataset
    pub path: PathBuf,
    /// Location relative to the tree root
    pub relative: PathBuf,
    /// Project identifier on the hosting site
    pub project: String,
}

/// Maps datasets of one tree to project identifiers
#[derive(Debug, Clone)]
pub struct SiblingPathResolver<'t> {
    tree: &'t DatasetTree,
    layout: Layout,
    project_root: Option<String>,
}

impl<'t> SiblingPathResolver<'t> {
    pub fn new(tree: &'t DatasetTree, layout: Layout, project_root: Option<String>) -> Self {
        Self {
            tree,
            layout,
            project_root,
        }
    }

    /// Like [`SiblingPathResolver::new`], parsing the layout by name
    ///
    /// `None` selects the default layout.
    pub fn from_layout_name(
        tree: &'t DatasetTree,
        layout: Option<&str>,
        project_root: Option<String>,
    ) -> Result<Self, ConfigError> {
        let layout = match layout {
            Some(name) => name.parse()?,
            None => Layout::default(),
        };
        Ok(Self::new(tree, layout, project_root))
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Project identifier of a single dataset
    pub fn project_for(&self, dataset: DatasetId) -> Result<String, ConfigError> {
        let project_root = self
            .project_root
            .as_deref()
            .ok_or_else(|| ConfigError::missing_project_root("project"))?;
        let segments = self.tree.relative_segments(dataset);
        Ok(self.layout.project_path(project_root, &segments))
    }

    /// Project targets for `target`, followed by all its descendants when
    /// `recursive`
    ///
    /// Descendants come in the tree's depth-first pre-order. Their identifiers
    /// are derived from their location relative to the tree root.
    pub fn resolve(
        &self,
        target: DatasetId,
        recursive: bool,
    ) -> Result<Vec<ProjectTarget>, ConfigError> {
        let mut scope = vec![target];
        if recursive {
            scope.extend(self.tree.descendants(target));
        }

        scope
            .into_iter()
            .map(|dataset| {
                Ok(ProjectTarget {
                    dataset,
                    path: self.tree.path(dataset).to_path_buf(),
                    relative: self.tree.relative_path(dataset),
                    project: self.project_for(dataset)?,
                })
            })
            .collect()
    }
}
