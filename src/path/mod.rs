//! # Path Value Types
//!
//! [`Path`] is a sum type over the two kinds of location:
//!
//! | Variant | Backed by | String form |
//! |---------|-----------|-------------|
//! | [`LocalPath`] | local disk | `/data/x.csv`, `file://data/x.csv` |
//! | [`RemotePath`] | any remote backend | `s3://bucket/x.csv`, `memory://root/x` |
//!
//! The variant is chosen once, by [`Path::parse`], from whether the
//! registered backend for the scheme is remote. It never changes afterwards.
//!
//! ```rust
//! use schemefs::Path;
//!
//! let local = Path::parse("/tmp/data.csv").unwrap();
//! assert!(!local.is_remote());
//!
//! let remote = Path::parse("memory://root/{date}/part-*.csv").unwrap();
//! assert!(remote.is_remote());
//! assert!(remote.is_template());
//! assert!(remote.is_wildcard());
//! assert_eq!((&remote / "x").to_string(), "memory://root/{date}/part-*.csv/x");
//! ```
//!
//! I/O methods (`open`, `exists`, `ls`, ...) resolve the backend through
//! [`Resolver::global`]; each has a `*_with` twin taking an explicit
//! [`Resolver`].

mod local;
mod remote;
mod template;

use std::borrow::Cow;
use std::fmt;
use std::io::Read;
use std::ops::Div;
use std::path::{Path as StdPath, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use local::LocalPath;
pub use remote::RemotePath;
pub use template::{is_template, is_wildcard, render};

use crate::scheme::protocol;
use crate::{
    FileHandle, FileInfo, FileSystem, FsConfig, FsError, FsExt, OpenMode, Registry, Resolver,
    StorageOptions,
};

/// Name of the marker file written when a job finishes.
pub const SUCCESS_FLAG: &str = "_SUCCESS";

// ============================================================================
// PathLike
// ============================================================================

/// Anything that can stand in for a path argument.
///
/// Strings are plain paths. Typed paths additionally tell the resolver their
/// scheme and any options attached to them.
pub trait PathLike {
    /// The plain string form.
    fn to_path_string(&self) -> Cow<'_, str>;

    /// The scheme, when already known without parsing.
    fn scheme_hint(&self) -> Option<&str> {
        None
    }

    /// Options attached to the path itself.
    fn attached_options(&self) -> Option<&StorageOptions> {
        None
    }
}

impl<T: PathLike + ?Sized> PathLike for &T {
    fn to_path_string(&self) -> Cow<'_, str> {
        (**self).to_path_string()
    }
    fn scheme_hint(&self) -> Option<&str> {
        (**self).scheme_hint()
    }
    fn attached_options(&self) -> Option<&StorageOptions> {
        (**self).attached_options()
    }
}

impl PathLike for str {
    fn to_path_string(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl PathLike for String {
    fn to_path_string(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl PathLike for StdPath {
    fn to_path_string(&self) -> Cow<'_, str> {
        self.to_string_lossy()
    }
    fn scheme_hint(&self) -> Option<&str> {
        Some("")
    }
}

impl PathLike for PathBuf {
    fn to_path_string(&self) -> Cow<'_, str> {
        self.to_string_lossy()
    }
    fn scheme_hint(&self) -> Option<&str> {
        Some("")
    }
}

impl PathLike for LocalPath {
    fn to_path_string(&self) -> Cow<'_, str> {
        self.as_std_path().to_string_lossy()
    }
    fn scheme_hint(&self) -> Option<&str> {
        Some("")
    }
    fn attached_options(&self) -> Option<&StorageOptions> {
        self.explicit_options()
    }
}

impl PathLike for RemotePath {
    fn to_path_string(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
    fn scheme_hint(&self) -> Option<&str> {
        Some(self.scheme())
    }
    fn attached_options(&self) -> Option<&StorageOptions> {
        self.explicit_options()
    }
}

impl PathLike for Path {
    fn to_path_string(&self) -> Cow<'_, str> {
        match self {
            Path::Local(p) => p.to_path_string(),
            Path::Remote(p) => p.to_path_string(),
        }
    }
    fn scheme_hint(&self) -> Option<&str> {
        Some(self.scheme())
    }
    fn attached_options(&self) -> Option<&StorageOptions> {
        self.explicit_options()
    }
}

// ============================================================================
// IntoPath
// ============================================================================

/// Conversion into a typed [`Path`], classifying strings through the global
/// registry.
pub trait IntoPath {
    /// Convert.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] for a string with an unregistered scheme
    fn into_path(self) -> Result<Path, FsError>;
}

impl IntoPath for Path {
    fn into_path(self) -> Result<Path, FsError> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Result<Path, FsError> {
        Ok(self.clone())
    }
}

impl IntoPath for LocalPath {
    fn into_path(self) -> Result<Path, FsError> {
        Ok(Path::Local(self))
    }
}

impl IntoPath for RemotePath {
    fn into_path(self) -> Result<Path, FsError> {
        Ok(Path::Remote(self))
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Result<Path, FsError> {
        Path::parse(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> Result<Path, FsError> {
        Path::parse(&self)
    }
}

impl IntoPath for &String {
    fn into_path(self) -> Result<Path, FsError> {
        Path::parse(self)
    }
}

impl IntoPath for PathBuf {
    fn into_path(self) -> Result<Path, FsError> {
        Ok(Path::Local(LocalPath::new(self)))
    }
}

impl IntoPath for &StdPath {
    fn into_path(self) -> Result<Path, FsError> {
        Ok(Path::Local(LocalPath::new(self)))
    }
}

/// Convert a value into a typed path.
///
/// ```rust
/// use schemefs::{aspath, Path};
///
/// let p = aspath("memory://root/a").unwrap();
/// assert_eq!(aspath(p.to_string()).unwrap(), p);
/// ```
pub fn aspath(value: impl IntoPath) -> Result<Path, FsError> {
    value.into_path()
}

/// Convert every value of an iterator into a typed path.
pub fn aspaths<I>(values: I) -> Result<Vec<Path>, FsError>
where
    I: IntoIterator,
    I::Item: IntoPath,
{
    values.into_iter().map(IntoPath::into_path).collect()
}

// ============================================================================
// Path
// ============================================================================

/// A location on any registered backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Path {
    /// A local-disk path.
    Local(LocalPath),
    /// A path on a remote backend.
    Remote(RemotePath),
}

impl Path {
    /// Classify and parse a path string with the global registry.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] if the scheme is not registered
    pub fn parse(s: &str) -> Result<Self, FsError> {
        Self::parse_in(s, Registry::global())
    }

    /// Classify and parse a path string with `registry`.
    pub fn parse_in(s: &str, registry: &Registry) -> Result<Self, FsError> {
        let kind = registry.lookup(protocol(s))?;
        if kind.is_remote() {
            RemotePath::parse(s).map(Path::Remote)
        } else {
            Ok(Path::Local(LocalPath::parse(s)))
        }
    }

    /// Returns `true` for the remote variant.
    pub fn is_remote(&self) -> bool {
        matches!(self, Path::Remote(_))
    }

    /// The local variant, if this is one.
    pub fn as_local(&self) -> Option<&LocalPath> {
        match self {
            Path::Local(p) => Some(p),
            Path::Remote(_) => None,
        }
    }

    /// The remote variant, if this is one.
    pub fn as_remote(&self) -> Option<&RemotePath> {
        match self {
            Path::Remote(p) => Some(p),
            Path::Local(_) => None,
        }
    }

    /// Scheme of the path; `""` for local paths.
    pub fn scheme(&self) -> &str {
        match self {
            Path::Local(_) => "",
            Path::Remote(p) => p.scheme(),
        }
    }

    /// Host of a remote path.
    pub fn host(&self) -> Option<&str> {
        self.as_remote().map(RemotePath::host)
    }

    /// Alias of [`host`](Self::host).
    pub fn hostname(&self) -> Option<&str> {
        self.host()
    }

    /// Final component.
    pub fn name(&self) -> &str {
        match self {
            Path::Local(p) => p.name(),
            Path::Remote(p) => p.name(),
        }
    }

    /// Final component without its suffix.
    pub fn stem(&self) -> &str {
        match self {
            Path::Local(p) => p.stem(),
            Path::Remote(p) => p.stem(),
        }
    }

    /// Suffix of the final component, including the dot.
    pub fn suffix(&self) -> String {
        match self {
            Path::Local(p) => p.suffix(),
            Path::Remote(p) => p.suffix().to_string(),
        }
    }

    /// Components of the path.
    pub fn parts(&self) -> Vec<String> {
        match self {
            Path::Local(p) => p.parts(),
            Path::Remote(p) => p.parts(),
        }
    }

    /// The containing directory.
    pub fn parent(&self) -> Path {
        match self {
            Path::Local(p) => Path::Local(p.parent()),
            Path::Remote(p) => Path::Remote(p.parent()),
        }
    }

    /// Child path. Options and the cached connection carry over.
    pub fn join(&self, segment: &str) -> Path {
        match self {
            Path::Local(p) => Path::Local(p.join(segment)),
            Path::Remote(p) => Path::Remote(p.join(segment)),
        }
    }

    /// Sibling with a different final component.
    pub fn with_name(&self, name: &str) -> Path {
        match self {
            Path::Local(p) => Path::Local(p.with_name(name)),
            Path::Remote(p) => Path::Remote(p.with_name(name)),
        }
    }

    /// The `_SUCCESS` marker inside this directory.
    pub fn flag(&self) -> Path {
        self.join(SUCCESS_FLAG)
    }

    /// Returns `true` if the path holds an unresolved `{...}` placeholder.
    pub fn is_template(&self) -> bool {
        is_template(&self.to_path_string())
    }

    /// Returns `true` if the path contains `*`.
    pub fn is_wildcard(&self) -> bool {
        is_wildcard(&self.to_path_string())
    }

    /// Attach explicit options.
    pub fn with_storage_options(self, options: StorageOptions) -> Path {
        match self {
            Path::Local(p) => Path::Local(p.with_storage_options(options)),
            Path::Remote(p) => Path::Remote(p.with_storage_options(options)),
        }
    }

    /// Explicitly attached options, if any.
    pub fn explicit_options(&self) -> Option<&StorageOptions> {
        match self {
            Path::Local(p) => p.explicit_options(),
            Path::Remote(p) => p.explicit_options(),
        }
    }

    /// Options for this path: the attached ones, else the global
    /// configuration for its scheme.
    pub fn storage_options(&self) -> StorageOptions {
        self.storage_options_in(FsConfig::global())
    }

    /// Like [`storage_options`](Self::storage_options), falling back to
    /// `config`.
    pub fn storage_options_in(&self, config: &FsConfig) -> StorageOptions {
        match self.explicit_options() {
            Some(options) => options.clone(),
            None => config.get(self.scheme()),
        }
    }

    /// Fill `{name}` placeholders, keeping the variant and options.
    ///
    /// ```rust
    /// use schemefs::Path;
    ///
    /// let t = Path::parse("memory://bucket/{date}/x.csv").unwrap();
    /// let p = t.format(&[("date", "2024-01-01")]).unwrap();
    /// assert_eq!(p.to_string(), "memory://bucket/2024-01-01/x.csv");
    /// assert!(!p.is_template());
    /// ```
    pub fn format(&self, values: &[(&str, &str)]) -> Result<Path, FsError> {
        self.rendered(render(&self.to_path_string(), values, &[])?)
    }

    /// Fill `{}` and `{N}` placeholders.
    pub fn format_positional(&self, values: &[&str]) -> Result<Path, FsError> {
        self.rendered(render(&self.to_path_string(), &[], values)?)
    }

    fn rendered(&self, s: String) -> Result<Path, FsError> {
        let options = self.explicit_options().cloned();
        let path = match self {
            Path::Local(_) => Path::Local(LocalPath::new(s)),
            Path::Remote(_) => Path::Remote(RemotePath::parse(&s)?),
        };
        Ok(match options {
            Some(options) => path.with_storage_options(options),
            None => path,
        })
    }

    // ------------------------------------------------------------------------
    // I/O
    // ------------------------------------------------------------------------

    /// The backend instance for this path, through the global resolver.
    ///
    /// A remote path connects once and reuses the instance, as do the paths
    /// derived from it. Paths returned by a [`FileSystem`] arrive already
    /// connected to it.
    pub fn fs(&self) -> Result<FileSystem, FsError> {
        let resolver = Resolver::global();
        match self {
            Path::Local(_) => resolver.resolve(self, None),
            Path::Remote(p) => p
                .connection()
                .get_or_try_init(|| resolver.resolve(self, None))
                .cloned(),
        }
    }

    /// The backend instance for this path, through `resolver`.
    ///
    /// The cached connection is reused only when `resolver` made it. Any
    /// other cached instance is left alone and `resolver` builds its own.
    pub fn fs_with(&self, resolver: &Resolver) -> Result<FileSystem, FsError> {
        match self {
            Path::Local(_) => resolver.resolve(self, None),
            Path::Remote(p) => {
                let fs = p
                    .connection()
                    .get_or_try_init(|| resolver.resolve(self, None))?;
                if fs.resolved_by(resolver) {
                    Ok(fs.clone())
                } else {
                    resolver.resolve(self, None)
                }
            }
        }
    }

    /// Open the file.
    pub fn open(&self, mode: OpenMode) -> Result<FileHandle, FsError> {
        self.fs()?.open(self, mode)
    }

    /// Open the file.
    pub fn open_with(&self, mode: OpenMode, resolver: &Resolver) -> Result<FileHandle, FsError> {
        self.fs_with(resolver)?.open(self, mode)
    }

    /// Returns `true` if the path exists.
    pub fn exists(&self) -> Result<bool, FsError> {
        self.fs()?.exists(self)
    }

    /// Returns `true` if the path exists.
    pub fn exists_with(&self, resolver: &Resolver) -> Result<bool, FsError> {
        self.fs_with(resolver)?.exists(self)
    }

    /// Immediate children.
    pub fn ls(&self) -> Result<Vec<Path>, FsError> {
        self.fs()?.ls(self)
    }

    /// Immediate children.
    pub fn ls_with(&self, resolver: &Resolver) -> Result<Vec<Path>, FsError> {
        self.fs_with(resolver)?.ls(self)
    }

    /// Expand this path as a glob pattern.
    pub fn glob(&self) -> Result<Vec<Path>, FsError> {
        self.fs()?.glob(self)
    }

    /// Expand this path as a glob pattern.
    pub fn glob_with(&self, resolver: &Resolver) -> Result<Vec<Path>, FsError> {
        self.fs_with(resolver)?.glob(self)
    }

    /// Every file below this path.
    pub fn walk(&self) -> Result<Vec<Path>, FsError> {
        self.fs()?.walk(self)
    }

    /// Every file below this path.
    pub fn walk_with(&self, resolver: &Resolver) -> Result<Vec<Path>, FsError> {
        self.fs_with(resolver)?.walk(self)
    }

    /// Remove the path.
    pub fn remove(&self, recursive: bool) -> Result<(), FsError> {
        self.fs()?.remove(self, recursive)
    }

    /// Remove the path.
    pub fn remove_with(&self, recursive: bool, resolver: &Resolver) -> Result<(), FsError> {
        self.fs_with(resolver)?.remove(self, recursive)
    }

    /// Remove a file.
    pub fn unlink(&self) -> Result<(), FsError> {
        self.remove(false)
    }

    /// Create the directory and its parents.
    pub fn makedirs(&self, exist_ok: bool) -> Result<(), FsError> {
        self.fs()?.makedirs(self, exist_ok)
    }

    /// Create the directory and its parents.
    pub fn makedirs_with(&self, exist_ok: bool, resolver: &Resolver) -> Result<(), FsError> {
        self.fs_with(resolver)?.makedirs(self, exist_ok)
    }

    /// Remove the empty directory.
    pub fn rmdir(&self) -> Result<(), FsError> {
        self.fs()?.rmdir(self)
    }

    /// Remove the empty directory.
    pub fn rmdir_with(&self, resolver: &Resolver) -> Result<(), FsError> {
        self.fs_with(resolver)?.rmdir(self)
    }

    /// Size, kind and modification time.
    pub fn info(&self) -> Result<FileInfo, FsError> {
        self.fs()?.info(self)
    }

    /// Size, kind and modification time.
    pub fn info_with(&self, resolver: &Resolver) -> Result<FileInfo, FsError> {
        self.fs_with(resolver)?.info(self)
    }

    /// Create the file if missing.
    pub fn touch(&self) -> Result<(), FsError> {
        self.fs()?.touch(self)
    }

    /// Create the file if missing.
    pub fn touch_with(&self, resolver: &Resolver) -> Result<(), FsError> {
        self.fs_with(resolver)?.touch(self)
    }

    /// Whole file as bytes.
    pub fn read_bytes(&self) -> Result<Vec<u8>, FsError> {
        self.read_all(&self.fs()?)
    }

    /// Whole file as bytes.
    pub fn read_bytes_with(&self, resolver: &Resolver) -> Result<Vec<u8>, FsError> {
        self.read_all(&self.fs_with(resolver)?)
    }

    fn read_all(&self, fs: &FileSystem) -> Result<Vec<u8>, FsError> {
        let mut handle = fs.open(self, OpenMode::Read)?;
        let mut buf = Vec::new();
        handle
            .read_to_end(&mut buf)
            .map_err(|e| FsError::io("read", self.to_string(), e))?;
        Ok(buf)
    }

    /// Whole file as UTF-8 text.
    pub fn read_text(&self) -> Result<String, FsError> {
        self.fs()?.driver().read_to_string(&self.to_path_string())
    }

    /// Whole file as UTF-8 text.
    pub fn read_text_with(&self, resolver: &Resolver) -> Result<String, FsError> {
        self.fs_with(resolver)?
            .driver()
            .read_to_string(&self.to_path_string())
    }

    /// Replace the file's contents.
    pub fn write_bytes(&self, data: &[u8]) -> Result<(), FsError> {
        self.fs()?.driver().write(&self.to_path_string(), data)
    }

    /// Replace the file's contents.
    pub fn write_bytes_with(&self, data: &[u8], resolver: &Resolver) -> Result<(), FsError> {
        self.fs_with(resolver)?
            .driver()
            .write(&self.to_path_string(), data)
    }

    /// Replace the file's contents with text.
    pub fn write_text(&self, text: &str) -> Result<(), FsError> {
        self.write_bytes(text.as_bytes())
    }

    /// Replace the file's contents with text.
    pub fn write_text_with(&self, text: &str, resolver: &Resolver) -> Result<(), FsError> {
        self.write_bytes_with(text.as_bytes(), resolver)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Local(p) => fmt::Display::fmt(p, f),
            Path::Remote(p) => fmt::Display::fmt(p, f),
        }
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Local(p) => fmt::Debug::fmt(p, f),
            Path::Remote(p) => fmt::Debug::fmt(p, f),
        }
    }
}

impl From<LocalPath> for Path {
    fn from(p: LocalPath) -> Self {
        Path::Local(p)
    }
}

impl From<RemotePath> for Path {
    fn from(p: RemotePath) -> Self {
        Path::Remote(p)
    }
}

impl From<PathBuf> for Path {
    fn from(p: PathBuf) -> Self {
        Path::Local(LocalPath::new(p))
    }
}

impl From<&StdPath> for Path {
    fn from(p: &StdPath) -> Self {
        Path::Local(LocalPath::new(p))
    }
}

impl Div<&str> for &Path {
    type Output = Path;

    fn div(self, segment: &str) -> Path {
        self.join(segment)
    }
}

impl Div<&str> for Path {
    type Output = Path;

    fn div(self, segment: &str) -> Path {
        self.join(segment)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_path_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Path::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_picks_variant_by_backend() {
        assert!(!Path::parse("/home/user").unwrap().is_remote());
        assert!(!Path::parse("relative/x.txt").unwrap().is_remote());
        assert!(Path::parse("memory://root/x").unwrap().is_remote());
    }

    #[test]
    fn file_uri_is_local() {
        let p = Path::parse("file://user/x.txt").unwrap();
        assert_eq!(p, Path::Local(LocalPath::new("user/x.txt")));
    }

    #[test]
    fn unknown_scheme_fails() {
        let err = Path::parse("ftp://host/x").unwrap_err();
        assert!(matches!(err, FsError::UnknownScheme { .. }));
    }

    #[test]
    fn string_round_trip_preserves_identity() {
        for s in ["/tmp/a/b.txt", "memory://root/a", "memory://root/{x}/*.csv"] {
            let p = Path::parse(s).unwrap();
            assert_eq!(aspath(p.to_string()).unwrap(), p, "{s}");
        }
    }

    #[test]
    fn template_and_wildcard_flags() {
        assert!(Path::parse("/home/abc{}").unwrap().is_template());
        assert!(!Path::parse("/home/abc{").unwrap().is_template());
        assert!(!Path::parse("/home/abc}{").unwrap().is_template());
        assert!(Path::parse("memory://bucket/*").unwrap().is_wildcard());
        assert!(!Path::parse("memory://bucket").unwrap().is_wildcard());
    }

    #[test]
    fn flag_is_success_child() {
        let p = Path::parse("memory://out/job").unwrap();
        assert_eq!(p.flag().to_string(), "memory://out/job/_SUCCESS");
    }

    #[test]
    fn explicit_options_win_over_config() {
        let config = FsConfig::new();
        config.set("memory", StorageOptions::new().with("k", "config"));
        let p = Path::parse("memory://a").unwrap();
        assert_eq!(p.storage_options_in(&config).get_str("k"), Some("config"));

        let p = p.with_storage_options(StorageOptions::new().with("k", "explicit"));
        assert_eq!(p.storage_options_in(&config).get_str("k"), Some("explicit"));
        assert_eq!(
            (&p / "child").storage_options_in(&config).get_str("k"),
            Some("explicit")
        );
    }

    #[test]
    fn format_keeps_variant_and_options() {
        let t = Path::parse("/data/{name}.csv")
            .unwrap()
            .with_storage_options(StorageOptions::new().with("a", 1));
        let p = t.format(&[("name", "x")]).unwrap();
        assert_eq!(p, Path::Local(LocalPath::new("/data/x.csv")));
        assert!(p.explicit_options().is_some());

        let r = Path::parse("memory://b/{}/{}").unwrap();
        assert_eq!(
            r.format_positional(&["1", "2"]).unwrap().to_string(),
            "memory://b/1/2"
        );
    }

    #[test]
    fn remote_accessors() {
        let p = Path::parse("memory://host/a/b.txt").unwrap();
        assert_eq!(p.host(), Some("host"));
        assert_eq!(p.name(), "b.txt");
        assert_eq!(p.suffix(), ".txt");
        assert_eq!(p.parent().to_string(), "memory://host/a");
        assert_eq!(Path::parse("/x").unwrap().host(), None);
    }

    #[test]
    fn aspaths_converts_all() {
        let paths = aspaths(["/a", "memory://b"]).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[1].is_remote());
    }

    #[test]
    fn serde_uses_string_form() {
        let p = Path::parse("memory://root/x").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"memory://root/x\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn reattached_options_reach_the_backend() {
        let p = Path::parse("memory://path-reattach/x").unwrap();
        assert_eq!(p.fs().unwrap().options().get_str("k"), None);

        let q = p.clone().with_storage_options(StorageOptions::new().with("k", "v"));
        assert_eq!(q.fs().unwrap().options().get_str("k"), Some("v"));
        assert_eq!(p.fs().unwrap().options().get_str("k"), None);
    }

    #[test]
    fn explicit_resolver_is_not_bypassed_by_the_cached_connection() {
        let p = Path::parse("memory://path-resolvers/x").unwrap();
        let global = p.fs().unwrap();

        let config = FsConfig::new();
        config.set("memory", StorageOptions::new().with("k", "other"));
        let other = Resolver::new(Registry::with_builtins(), config);
        let fs = p.fs_with(&other).unwrap();
        assert!(!fs.ptr_eq(&global));
        assert_eq!(fs.options().get_str("k"), Some("other"));

        assert!(p.fs().unwrap().ptr_eq(&global));
        assert!(p.fs_with(Resolver::global()).unwrap().ptr_eq(&global));
    }
}
