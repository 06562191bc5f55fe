//! Paths on the local disk.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path as StdPath, PathBuf};

use crate::scheme::{protocol, strip_scheme, LOCAL_CONFIG_KEY};
use crate::StorageOptions;

/// A native path, served by the local backend.
///
/// `file://` URIs are accepted and stored without the scheme. Equality and
/// hashing ignore attached storage options.
#[derive(Clone, Default)]
pub struct LocalPath {
    path: PathBuf,
    storage_options: Option<StorageOptions>,
}

impl LocalPath {
    /// Wrap a native path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            storage_options: None,
        }
    }

    /// Parse a local path string, dropping a `file://` prefix.
    pub fn parse(s: &str) -> Self {
        if protocol(s) == LOCAL_CONFIG_KEY {
            Self::new(strip_scheme(s))
        } else {
            Self::new(s)
        }
    }

    /// Attach options to this path.
    pub fn with_storage_options(mut self, options: StorageOptions) -> Self {
        self.storage_options = Some(options);
        self
    }

    /// Explicitly attached options, if any.
    pub fn explicit_options(&self) -> Option<&StorageOptions> {
        self.storage_options.as_ref()
    }

    /// The native path.
    pub fn as_std_path(&self) -> &StdPath {
        &self.path
    }

    /// Consume into the native path.
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }

    /// Final component, or `""` for a root.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Final component without its suffix.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Extension including the leading dot, or `""`.
    pub fn suffix(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default()
    }

    /// The containing directory. A root is its own parent.
    pub fn parent(&self) -> LocalPath {
        let parent = self.path.parent().unwrap_or(&self.path).to_path_buf();
        self.derive(parent)
    }

    /// Child path. A leading `/` in `segment` does not make it absolute.
    pub fn join(&self, segment: &str) -> LocalPath {
        let segment = segment.trim_start_matches('/');
        if segment.is_empty() {
            return self.clone();
        }
        self.derive(self.path.join(segment))
    }

    /// Sibling with a different final component.
    pub fn with_name(&self, name: &str) -> LocalPath {
        self.derive(self.path.with_file_name(name))
    }

    /// Components, the root spelled `/`.
    pub fn parts(&self) -> Vec<String> {
        self.path
            .components()
            .map(|c| match c {
                Component::RootDir => "/".to_string(),
                other => other.as_os_str().to_string_lossy().into_owned(),
            })
            .collect()
    }

    fn derive(&self, path: PathBuf) -> LocalPath {
        Self {
            path,
            storage_options: self.storage_options.clone(),
        }
    }
}

impl PartialEq for LocalPath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for LocalPath {}

impl Hash for LocalPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl fmt::Debug for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalPath({:?})", self.path)
    }
}

impl From<PathBuf> for LocalPath {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&StdPath> for LocalPath {
    fn from(path: &StdPath) -> Self {
        Self::new(path)
    }
}

impl AsRef<StdPath> for LocalPath {
    fn as_ref(&self) -> &StdPath {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_uri_is_stripped() {
        assert_eq!(LocalPath::parse("file://user/x.txt").to_string(), "user/x.txt");
        assert_eq!(LocalPath::parse("/tmp/x").to_string(), "/tmp/x");
    }

    #[test]
    fn name_stem_suffix() {
        let p = LocalPath::new("/data/report.tar.gz");
        assert_eq!(p.name(), "report.tar.gz");
        assert_eq!(p.stem(), "report.tar");
        assert_eq!(p.suffix(), ".gz");
        assert_eq!(LocalPath::new("/data/noext").suffix(), "");
    }

    #[test]
    fn join_treats_segment_as_relative() {
        let p = LocalPath::new("/data");
        assert_eq!(p.join("/a/b.txt").to_string(), "/data/a/b.txt");
        assert_eq!(p.join("").to_string(), "/data");
    }

    #[test]
    fn parent_and_with_name() {
        let p = LocalPath::new("/data/a.txt");
        assert_eq!(p.parent().to_string(), "/data");
        assert_eq!(p.with_name("b.txt").to_string(), "/data/b.txt");
        assert_eq!(LocalPath::new("/").parent().to_string(), "/");
    }

    #[test]
    fn parts_split_components() {
        assert_eq!(LocalPath::new("/a/b").parts(), vec!["/", "a", "b"]);
    }

    #[test]
    fn equality_ignores_options() {
        let a = LocalPath::new("/x").with_storage_options(StorageOptions::new().with("k", 1));
        assert_eq!(a, LocalPath::new("/x"));
        assert!(a.join("y").explicit_options().is_some());
    }
}
