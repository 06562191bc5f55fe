//! # Directory Trees
//!
//! A declarative layout of named paths under a relocatable root.
//!
//! A [`TreeSchema`] is built once and never changes: leaf names map to
//! templates relative to the tree root, subtree names map to nested schemas.
//! [`TreeSchema::bind`] attaches a root and produces a [`Tree`].
//!
//! ```text
//! _root: s3://warehouse/daily
//! manifest ─▶ {root}/manifest.json
//! raw/     ─▶ {root}/raw          (subtree, folder = attribute name)
//!     events ─▶ {root}/raw/events/{date}.csv
//! out/     ─▶ {root}/published    (subtree, folder override)
//! ```
//!
//! Leaves are never stored. [`Tree::leaf`] joins the template onto the
//! current root on every call, so after [`Tree::set_root`] no leaf anywhere
//! in the tree can refer to the old root.
//!
//! ```rust
//! use schemefs::TreeSchema;
//!
//! let raw = TreeSchema::builder().leaf("events", "events/{date}.csv").build();
//! let schema = TreeSchema::builder()
//!     .leaf("manifest", "manifest.json")
//!     .subtree("raw", raw)
//!     .build();
//!
//! let mut tree = schema.bind("memory://warehouse/daily")?;
//! assert_eq!(
//!     tree.subtree("raw").unwrap().leaf("events").unwrap().to_string(),
//!     "memory://warehouse/daily/raw/events/{date}.csv"
//! );
//!
//! tree.set_root("memory://archive")?;
//! assert_eq!(
//!     tree.leaf("manifest").unwrap().to_string(),
//!     "memory://archive/manifest.json"
//! );
//! # Ok::<(), schemefs::FsError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{FsError, IntoPath, Path};

#[derive(Debug)]
struct SubtreeSpec {
    folder: Option<String>,
    schema: TreeSchema,
}

#[derive(Debug, Default)]
struct SchemaInner {
    leaves: BTreeMap<String, String>,
    subtrees: BTreeMap<String, SubtreeSpec>,
}

/// Immutable description of a directory tree.
///
/// Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct TreeSchema {
    inner: Arc<SchemaInner>,
}

/// Builder for [`TreeSchema`].
#[derive(Debug, Default)]
pub struct TreeSchemaBuilder {
    inner: SchemaInner,
}

impl TreeSchemaBuilder {
    /// Add a leaf at `template`, relative to the tree root.
    pub fn leaf(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.inner.leaves.insert(name.into(), template.into());
        self
    }

    /// Add a subtree rooted at `root/name`.
    pub fn subtree(mut self, name: impl Into<String>, schema: TreeSchema) -> Self {
        self.inner.subtrees.insert(
            name.into(),
            SubtreeSpec {
                folder: None,
                schema,
            },
        );
        self
    }

    /// Add a subtree rooted at `root/folder` instead of `root/name`.
    pub fn subtree_with_root(
        mut self,
        name: impl Into<String>,
        folder: impl Into<String>,
        schema: TreeSchema,
    ) -> Self {
        self.inner.subtrees.insert(
            name.into(),
            SubtreeSpec {
                folder: Some(folder.into()),
                schema,
            },
        );
        self
    }

    /// Finish the schema.
    pub fn build(self) -> TreeSchema {
        TreeSchema {
            inner: Arc::new(self.inner),
        }
    }
}

impl TreeSchema {
    /// Start a schema.
    pub fn builder() -> TreeSchemaBuilder {
        TreeSchemaBuilder::default()
    }

    /// Leaf names, sorted.
    pub fn leaf_names(&self) -> impl Iterator<Item = &str> {
        self.inner.leaves.keys().map(String::as_str)
    }

    /// Subtree names, sorted.
    pub fn subtree_names(&self) -> impl Iterator<Item = &str> {
        self.inner.subtrees.keys().map(String::as_str)
    }

    /// Materialize the tree under `root`.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] if `root` is a string with an unregistered scheme
    pub fn bind(&self, root: impl IntoPath) -> Result<Tree, FsError> {
        Ok(self.materialize(root.into_path()?))
    }

    fn materialize(&self, root: Path) -> Tree {
        let subtrees = self
            .inner
            .subtrees
            .iter()
            .map(|(name, sub)| {
                let folder = sub.folder.as_deref().unwrap_or(name);
                (name.clone(), sub.schema.materialize(root.join(folder)))
            })
            .collect();
        Tree {
            schema: self.clone(),
            root,
            subtrees,
        }
    }
}

/// A [`TreeSchema`] bound to a root.
#[derive(Debug, Clone)]
pub struct Tree {
    schema: TreeSchema,
    root: Path,
    subtrees: BTreeMap<String, Tree>,
}

impl Tree {
    /// Current root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The schema this tree was bound from.
    pub fn schema(&self) -> &TreeSchema {
        &self.schema
    }

    /// The leaf `name`, resolved against the current root.
    pub fn leaf(&self, name: &str) -> Option<Path> {
        self.schema
            .inner
            .leaves
            .get(name)
            .map(|template| self.root.join(template))
    }

    /// Every leaf with its resolved path, sorted by name.
    pub fn leaves(&self) -> Vec<(&str, Path)> {
        self.schema
            .inner
            .leaves
            .iter()
            .map(|(name, template)| (name.as_str(), self.root.join(template)))
            .collect()
    }

    /// The subtree `name`.
    pub fn subtree(&self, name: &str) -> Option<&Tree> {
        self.subtrees.get(name)
    }

    /// The subtree `name`, mutably. Re-rooting it leaves the parent alone.
    pub fn subtree_mut(&mut self, name: &str) -> Option<&mut Tree> {
        self.subtrees.get_mut(name)
    }

    /// Move the tree to `root`, cascading into every subtree depth-first.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] if `root` is a string with an unregistered
    ///   scheme; the tree is left unchanged
    pub fn set_root(&mut self, root: impl IntoPath) -> Result<(), FsError> {
        let root = root.into_path()?;
        self.reroot(root);
        Ok(())
    }

    fn reroot(&mut self, root: Path) {
        tracing::debug!(from = %self.root, to = %root, "re-rooting tree");
        for (name, subtree) in &mut self.subtrees {
            let folder = self
                .schema
                .inner
                .subtrees
                .get(name)
                .and_then(|sub| sub.folder.as_deref())
                .unwrap_or(name);
            subtree.reroot(root.join(folder));
        }
        self.root = root;
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "    ".repeat(depth);
        writeln!(f, "{indent}_root: {}", self.root)?;

        let mut names: Vec<&str> = self
            .schema
            .leaf_names()
            .chain(self.subtrees.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        for name in names {
            if let Some(subtree) = self.subtrees.get(name) {
                writeln!(f, "{indent}{name}:")?;
                subtree.render(f, depth + 1)?;
            } else if let Some(leaf) = self.leaf(name) {
                writeln!(f, "{indent}{name}: {leaf}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}
