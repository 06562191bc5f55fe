//! # FileSystem
//!
//! A backend instance: one driver, wrapped in its [`SchemeAdapter`], plus the
//! options it was built with.
//!
//! Every method accepts any [`PathLike`] and returns typed [`Path`]s. The
//! adapter order is fixed:
//!
//! 1. the argument is turned into its string form
//! 2. the scheme is stripped (for drivers that reject it)
//! 3. the driver runs
//! 4. the scheme is re-attached to returned paths (remote backends)
//! 5. returned strings become [`Path`]s that carry this instance's options
//!    and reuse it as their connection
//!
//! | Method | Alias |
//! |--------|-------|
//! | [`remove`](FileSystem::remove) | [`rm`](FileSystem::rm) |
//! | [`copy`](FileSystem::copy) | [`cp`](FileSystem::cp) |
//! | [`mv`](FileSystem::mv) | [`move_`](FileSystem::move_) |

use std::fmt;
use std::path::Path as StdPath;
use std::sync::Arc;

use crate::layer::SchemeAdapter;
use crate::{
    BackendKind, Driver, FileHandle, FileInfo, FsError, LayerExt, OpenMode, Path, PathLike,
    Registry, Resolver, SchemeLayer, StorageOptions,
};

struct Inner {
    kind: BackendKind,
    scheme: String,
    options: StorageOptions,
    driver: SchemeAdapter<Box<dyn Driver>>,
    registry: Registry,
    // Id of the resolver that built the instance; 0 if none.
    origin: u64,
}

/// A ready-to-use backend instance.
///
/// Cheap to clone; clones share the driver.
#[derive(Clone)]
pub struct FileSystem {
    inner: Arc<Inner>,
}

impl FileSystem {
    /// Wrap a raw driver for `scheme`.
    ///
    /// `registry` types the paths this instance returns.
    pub fn new(
        kind: BackendKind,
        scheme: &str,
        options: StorageOptions,
        driver: Box<dyn Driver>,
        registry: Registry,
    ) -> Self {
        let driver = driver.layer(SchemeLayer::for_kind(&kind, scheme));
        Self {
            inner: Arc::new(Inner {
                kind,
                scheme: scheme.to_string(),
                options,
                driver,
                registry,
                origin: 0,
            }),
        }
    }

    pub(crate) fn resolved_through(mut self, resolver_id: u64) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.origin = resolver_id;
        }
        self
    }

    pub(crate) fn resolved_by(&self, resolver: &Resolver) -> bool {
        self.inner.origin == resolver.id()
    }

    /// The scheme this instance was resolved for.
    pub fn scheme(&self) -> &str {
        &self.inner.scheme
    }

    /// The backend kind.
    pub fn kind(&self) -> BackendKind {
        self.inner.kind
    }

    /// Returns `true` for remote backends.
    pub fn is_remote(&self) -> bool {
        self.inner.kind.is_remote()
    }

    /// Returns `true` if the driver takes scheme-qualified paths verbatim.
    pub fn supports_scheme(&self) -> bool {
        self.inner.kind.supports_scheme()
    }

    /// The merged options the instance was built with.
    pub fn options(&self) -> &StorageOptions {
        &self.inner.options
    }

    /// The adapted driver, for string-level access.
    pub fn driver(&self) -> &dyn Driver {
        &self.inner.driver
    }

    /// Returns `true` if both handles share one instance.
    pub fn ptr_eq(&self, other: &FileSystem) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn typed(&self, raw: String) -> Result<Path, FsError> {
        Ok(match Path::parse_in(&raw, &self.inner.registry)? {
            Path::Remote(p) => Path::Remote(
                p.with_storage_options(self.inner.options.clone())
                    .with_connection(self.clone()),
            ),
            local => local,
        })
    }

    fn typed_all(&self, raw: Vec<String>) -> Result<Vec<Path>, FsError> {
        raw.into_iter().map(|s| self.typed(s)).collect()
    }

    /// Open a file.
    pub fn open(&self, path: impl PathLike, mode: OpenMode) -> Result<FileHandle, FsError> {
        self.inner.driver.open(&path.to_path_string(), mode)
    }

    /// Returns `true` if the path exists.
    pub fn exists(&self, path: impl PathLike) -> Result<bool, FsError> {
        self.inner.driver.exists(&path.to_path_string())
    }

    /// Immediate children, sorted.
    pub fn ls(&self, path: impl PathLike) -> Result<Vec<Path>, FsError> {
        self.typed_all(self.inner.driver.ls(&path.to_path_string())?)
    }

    /// Remove a file or directory.
    pub fn remove(&self, path: impl PathLike, recursive: bool) -> Result<(), FsError> {
        self.inner.driver.remove(&path.to_path_string(), recursive)
    }

    /// Alias of [`remove`](Self::remove).
    pub fn rm(&self, path: impl PathLike, recursive: bool) -> Result<(), FsError> {
        self.remove(path, recursive)
    }

    /// Copy a file.
    pub fn copy(&self, from: impl PathLike, to: impl PathLike) -> Result<(), FsError> {
        self.inner
            .driver
            .copy(&from.to_path_string(), &to.to_path_string())
    }

    /// Alias of [`copy`](Self::copy).
    pub fn cp(&self, from: impl PathLike, to: impl PathLike) -> Result<(), FsError> {
        self.copy(from, to)
    }

    /// Move a file or directory.
    pub fn mv(&self, from: impl PathLike, to: impl PathLike) -> Result<(), FsError> {
        self.inner
            .driver
            .mv(&from.to_path_string(), &to.to_path_string())
    }

    /// Alias of [`mv`](Self::mv).
    pub fn move_(&self, from: impl PathLike, to: impl PathLike) -> Result<(), FsError> {
        self.mv(from, to)
    }

    /// Create a directory and its parents.
    pub fn makedirs(&self, path: impl PathLike, exist_ok: bool) -> Result<(), FsError> {
        self.inner.driver.makedirs(&path.to_path_string(), exist_ok)
    }

    /// Remove an empty directory.
    pub fn rmdir(&self, path: impl PathLike) -> Result<(), FsError> {
        self.inner.driver.rmdir(&path.to_path_string())
    }

    /// Size, kind and modification time.
    pub fn info(&self, path: impl PathLike) -> Result<FileInfo, FsError> {
        self.inner.driver.info(&path.to_path_string())
    }

    /// Every file below `path`.
    pub fn walk(&self, path: impl PathLike) -> Result<Vec<Path>, FsError> {
        self.typed_all(self.inner.driver.walk(&path.to_path_string())?)
    }

    /// Expand a glob pattern.
    pub fn glob(&self, pattern: impl PathLike) -> Result<Vec<Path>, FsError> {
        self.typed_all(self.inner.driver.glob(&pattern.to_path_string())?)
    }

    /// Create an empty file if missing.
    pub fn touch(&self, path: impl PathLike) -> Result<(), FsError> {
        self.inner.driver.touch(&path.to_path_string())
    }

    /// Upload a local file.
    pub fn put(&self, local: impl AsRef<StdPath>, remote: impl PathLike) -> Result<(), FsError> {
        self.inner
            .driver
            .put(local.as_ref(), &remote.to_path_string())
    }

    /// Download to a local file.
    pub fn get(&self, remote: impl PathLike, local: impl AsRef<StdPath>) -> Result<(), FsError> {
        self.inner
            .driver
            .get(&remote.to_path_string(), local.as_ref())
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("scheme", &self.inner.scheme)
            .field("backend", &self.inner.kind.name())
            .field("options", &self.inner.options.keys().collect::<Vec<_>>())
            .finish()
    }
}
