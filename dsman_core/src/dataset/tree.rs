//! Arena-backed dataset tree

use crate::error::{Result, ValidationError};
use std::path::{Component, Path, PathBuf};

/// Index of a dataset node inside its [`DatasetTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(usize);

impl DatasetId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single dataset in the hierarchy
#[derive(Debug, Clone)]
pub struct DatasetNode {
    path: PathBuf,
    relative: PathBuf,
    parent: Option<DatasetId>,
    children: Vec<DatasetId>,
}

impl DatasetNode {
    /// Absolute (or root-anchored) location of the dataset
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location relative to the parent dataset, empty for the root
    pub fn relative_to_parent(&self) -> &Path {
        &self.relative
    }

    /// Parent dataset, `None` for the root
    pub fn parent(&self) -> Option<DatasetId> {
        self.parent
    }

    /// Direct subdatasets, ordered by their relative path
    pub fn children(&self) -> &[DatasetId] {
        &self.children
    }
}

/// Rooted tree of nested datasets
///
/// Nodes live in a flat arena and refer to each other by [`DatasetId`]. The
/// root always has id 0. Children of every node are kept sorted by their
/// relative path, which makes [`DatasetTree::descendants`] a total order that
/// is stable across runs.
#[derive(Debug, Clone)]
pub struct DatasetTree {
    nodes: Vec<DatasetNode>,
}

impl DatasetTree {
    /// Create a tree holding only the root dataset at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            nodes: vec![DatasetNode {
                path: super::normalize_path(&root.into()),
                relative: PathBuf::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Id of the root dataset
    pub fn root(&self) -> DatasetId {
        DatasetId(0)
    }

    /// Number of datasets in the tree, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Access a node
    ///
    /// # Panics
    ///
    /// Panics when `id` was issued by a different tree.
    pub fn node(&self, id: DatasetId) -> &DatasetNode {
        &self.nodes[id.0]
    }

    /// Location of a dataset
    pub fn path(&self, id: DatasetId) -> &Path {
        &self.node(id).path
    }

    /// Parent of a dataset
    pub fn parent(&self, id: DatasetId) -> Option<DatasetId> {
        self.node(id).parent
    }

    /// Direct subdatasets of a dataset
    pub fn children(&self, id: DatasetId) -> &[DatasetId] {
        &self.node(id).children
    }

    /// All dataset ids in arena order
    pub fn ids(&self) -> impl Iterator<Item = DatasetId> + '_ {
        (0..self.nodes.len()).map(DatasetId)
    }

    /// Register a subdataset of `parent` located at `relative` below it
    ///
    /// `relative` may span several path components (a subdataset does not need
    /// to sit directly inside its parent's top directory) but must stay below
    /// the parent.
    pub fn add_child(&mut self, parent: DatasetId, relative: impl AsRef<Path>) -> Result<DatasetId> {
        let relative = validate_relative(relative.as_ref())?;
        let path = self.path(parent).join(&relative);

        if self.find(&path).is_some() {
            return Err(ValidationError::invalid_relative_path(
                &relative,
                "a dataset is already registered at this location",
            )
            .into());
        }

        let id = DatasetId(self.nodes.len());
        self.nodes.push(DatasetNode {
            path,
            relative: relative.clone(),
            parent: Some(parent),
            children: Vec::new(),
        });

        let position = {
            let nodes = &self.nodes;
            nodes[parent.0]
                .children
                .partition_point(|child| nodes[child.0].relative < relative)
        };
        self.nodes[parent.0].children.insert(position, id);

        Ok(id)
    }

    /// Path segments leading from the root to `id`, empty for the root
    ///
    /// Segments are always relative to the tree root, never to the immediate
    /// parent.
    pub fn relative_segments(&self, id: DatasetId) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            chain.push(&node.relative);
            current = node.parent;
        }

        chain
            .into_iter()
            .rev()
            .flat_map(|relative| relative.components())
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect()
    }

    /// Location of `id` relative to the tree root
    pub fn relative_path(&self, id: DatasetId) -> PathBuf {
        self.relative_segments(id).iter().collect()
    }

    /// Dataset located exactly at `path`
    pub fn find(&self, path: &Path) -> Option<DatasetId> {
        let path = super::normalize_path(path);
        self.ids().find(|id| self.path(*id) == path.as_path())
    }

    /// Deepest dataset whose directory contains `path` (or is `path`)
    pub fn containing(&self, path: &Path) -> Option<DatasetId> {
        let path = super::normalize_path(path);
        self.ids()
            .filter(|id| path.starts_with(self.path(*id)))
            .max_by_key(|id| self.path(*id).components().count())
    }

    /// Datasets below `id` in depth-first pre-order, `id` itself excluded
    ///
    /// Siblings are visited in ascending order of their relative path.
    pub fn descendants(&self, id: DatasetId) -> Vec<DatasetId> {
        let mut ordered = Vec::new();
        let mut stack: Vec<DatasetId> = self.children(id).iter().rev().copied().collect();

        while let Some(next) = stack.pop() {
            ordered.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }

        ordered
    }
}

fn validate_relative(relative: &Path) -> Result<PathBuf> {
    let mut cleaned = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => cleaned.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(
                    ValidationError::invalid_relative_path(relative, "must not contain '..'")
                        .into(),
                );
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(
                    ValidationError::invalid_relative_path(relative, "must be relative").into(),
                );
            }
        }
    }

    if cleaned.as_os_str().is_empty() {
        return Err(ValidationError::invalid_relative_path(relative, "must not be empty").into());
    }

    Ok(cleaned)
}
