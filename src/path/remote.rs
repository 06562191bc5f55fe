//! URI-shaped paths owned by remote backends.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::scheme::{protocol, strip_scheme, SEPARATOR};
use crate::{FileSystem, FsError, StorageOptions};

/// A `scheme://host/segment/...` path.
///
/// Segments are kept literally, so `{name}` placeholders and `*` wildcards
/// survive until [`format`](crate::Path::format) or `glob` sees them.
///
/// A remote path caches the backend connection it first resolves to.
/// Paths derived through [`join`](Self::join), [`parent`](Self::parent) and
/// [`with_name`](Self::with_name) share that cache.
///
/// Equality and hashing use the string form only.
#[derive(Clone)]
pub struct RemotePath {
    scheme: String,
    host: String,
    segments: Vec<String>,
    storage_options: Option<StorageOptions>,
    connection: Arc<OnceCell<FileSystem>>,
}

impl RemotePath {
    /// Parse `scheme://host/seg/...`.
    ///
    /// Empty segments (doubled or trailing `/`) are dropped.
    ///
    /// # Errors
    ///
    /// - [`FsError::MalformedPath`] if `s` carries no scheme
    pub fn parse(s: &str) -> Result<Self, FsError> {
        let scheme = protocol(s);
        if scheme.is_empty() {
            return Err(FsError::MalformedPath {
                path: s.to_string(),
                reason: "remote paths need a scheme".into(),
            });
        }
        let mut parts = strip_scheme(s).split('/').filter(|p| !p.is_empty());
        let host = parts.next().unwrap_or_default().to_string();
        let segments = parts.map(str::to_string).collect();
        Ok(Self {
            scheme: scheme.to_string(),
            host,
            segments,
            storage_options: None,
            connection: Arc::default(),
        })
    }

    /// Attach explicit options. These take priority over the configuration
    /// when the path is resolved.
    ///
    /// The result starts with an empty connection cache, so it never reuses
    /// a connection made with other options.
    pub fn with_storage_options(mut self, options: StorageOptions) -> Self {
        self.storage_options = Some(options);
        self.connection = Arc::default();
        self
    }

    /// Explicitly attached options, if any.
    pub fn explicit_options(&self) -> Option<&StorageOptions> {
        self.storage_options.as_ref()
    }

    /// The scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Bucket, account or store: whatever comes right after `://`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Alias of [`host`](Self::host).
    pub fn hostname(&self) -> &str {
        &self.host
    }

    /// Segments after the host.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The part after the host, without a leading `/`.
    pub fn key(&self) -> String {
        self.segments.join("/")
    }

    /// Final segment, or the host when there are no segments.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or(self.host.as_str())
    }

    /// Final segment without its suffix.
    pub fn stem(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Suffix of the final segment including the dot, or `""`.
    pub fn suffix(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => "",
            Some(idx) => &name[idx..],
        }
    }

    /// `scheme://host` followed by each segment.
    pub fn parts(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(self.segments.len() + 1);
        parts.push(format!("{}{SEPARATOR}{}", self.scheme, self.host));
        parts.extend(self.segments.iter().cloned());
        parts
    }

    /// Child path. `segment` may contain several `/`-separated parts.
    pub fn join(&self, segment: &str) -> RemotePath {
        let mut child = self.clone();
        child.segments.extend(
            segment
                .split('/')
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );
        child
    }

    /// The containing directory. `scheme://host` is its own parent.
    pub fn parent(&self) -> RemotePath {
        let mut parent = self.clone();
        parent.segments.pop();
        parent
    }

    /// Sibling with a different final segment.
    pub fn with_name(&self, name: &str) -> RemotePath {
        let mut sibling = self.parent();
        if self.segments.is_empty() {
            sibling.host = name.to_string();
            return sibling;
        }
        sibling.segments.push(name.to_string());
        sibling
    }

    pub(crate) fn connection(&self) -> &OnceCell<FileSystem> {
        &self.connection
    }

    /// Pre-seed the connection cache. Ignored if already connected.
    pub(crate) fn with_connection(self, fs: FileSystem) -> RemotePath {
        let _ = self.connection.set(fs);
        self
    }

    /// Returns `true` once this path (or a relative) has connected.
    pub fn is_connected(&self) -> bool {
        self.connection.get().is_some()
    }
}

impl PartialEq for RemotePath {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.host == other.host && self.segments == other.segments
    }
}

impl Eq for RemotePath {}

impl Hash for RemotePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scheme.hash(state);
        self.host.hash(state);
        self.segments.hash(state);
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.scheme, self.host)?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemotePath({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_and_segments() {
        let p = RemotePath::parse("s3://bucket/dir/file.csv").unwrap();
        assert_eq!(p.scheme(), "s3");
        assert_eq!(p.host(), "bucket");
        assert_eq!(p.segments(), ["dir", "file.csv"]);
        assert_eq!(p.key(), "dir/file.csv");
        assert_eq!(p.to_string(), "s3://bucket/dir/file.csv");
    }

    #[test]
    fn trailing_and_double_slashes_are_dropped() {
        let p = RemotePath::parse("gs://bucket//a/").unwrap();
        assert_eq!(p.to_string(), "gs://bucket/a");
    }

    #[test]
    fn schemeless_string_is_rejected() {
        assert!(RemotePath::parse("bucket/key").is_err());
    }

    #[test]
    fn name_stem_suffix() {
        let p = RemotePath::parse("s3://bucket/a/data.parquet").unwrap();
        assert_eq!(p.name(), "data.parquet");
        assert_eq!(p.stem(), "data");
        assert_eq!(p.suffix(), ".parquet");

        let root = RemotePath::parse("s3://bucket").unwrap();
        assert_eq!(root.name(), "bucket");
        assert_eq!(root.parent(), root);
    }

    #[test]
    fn keeps_templates_and_wildcards_literal() {
        let p = RemotePath::parse("s3://bucket/{date}/*.csv").unwrap();
        assert_eq!(p.segments(), ["{date}", "*.csv"]);
    }

    #[test]
    fn derived_paths_share_the_connection_cache() {
        let p = RemotePath::parse("memory://root").unwrap();
        let child = p.join("a/b");
        assert_eq!(child.to_string(), "memory://root/a/b");
        assert!(Arc::ptr_eq(&p.connection, &child.connection));
        assert!(Arc::ptr_eq(&p.connection, &child.parent().connection));
    }

    #[test]
    fn new_options_get_a_fresh_connection_cache() {
        let p = RemotePath::parse("memory://root").unwrap();
        let q = p.clone().with_storage_options(StorageOptions::new().with("k", "v"));
        assert!(!Arc::ptr_eq(&p.connection, &q.connection));
        assert!(Arc::ptr_eq(&q.connection, &q.join("x").connection));
    }

    #[test]
    fn with_name_replaces_last_segment() {
        let p = RemotePath::parse("abfs://acct/cont/a.txt").unwrap();
        assert_eq!(p.with_name("b.txt").to_string(), "abfs://acct/cont/b.txt");
    }

    #[test]
    fn parts_lead_with_scheme_and_host() {
        let p = RemotePath::parse("adl://store/x/y").unwrap();
        assert_eq!(p.parts(), vec!["adl://store", "x", "y"]);
    }
}
