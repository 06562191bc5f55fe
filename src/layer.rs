//! # Layer Trait
//!
//! Tower-style wrapping of [`Driver`]s.
//!
//! ## How It Works
//!
//! ```text
//! Driver ──▶ Layer::layer() ──▶ Wrapped Driver
//! ```
//!
//! Every backend instance is wrapped in a [`SchemeAdapter`] before it reaches
//! a [`FileSystem`](crate::FileSystem). The full adapter chain for one call is:
//!
//! ```text
//! PathLike ─▶ string ─▶ strip scheme ─▶ driver ─▶ re-attach scheme ─▶ typed Path
//!  (FileSystem)         (SchemeAdapter)          (SchemeAdapter)      (FileSystem)
//! ```
//!
//! Typing must come after re-attachment: a path typed from a schemeless
//! string would carry the wrong scheme.
//!
//! ## Example
//!
//! ```rust
//! use schemefs::{Driver, Layer, LayerExt, SchemeLayer};
//! use schemefs::backends::memory::{MemoryDriver, MemoryStore};
//!
//! let driver = MemoryDriver::with_store(MemoryStore::new())
//!     .layer(SchemeLayer::new("memory"));
//! driver.touch("memory://demo/a.txt").unwrap();
//! assert_eq!(driver.ls("memory://demo").unwrap(), vec!["memory://demo/a.txt"]);
//! ```

use std::path::Path as StdPath;

use crate::scheme::{prepend_scheme, strip_scheme};
use crate::{BackendKind, Driver, FileHandle, FileInfo, FsError, OpenMode};

/// A layer that wraps a driver to add behavior.
///
/// `layer(self, driver)` consumes both the layer and the driver.
pub trait Layer<D> {
    /// The resulting driver type.
    type Driver;

    /// Wrap the given driver.
    fn layer(self, driver: D) -> Self::Driver;
}

/// Fluent `.layer()` on any driver.
pub trait LayerExt: Driver + Sized {
    /// Apply a layer to this driver.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Driver {
        layer.layer(self)
    }
}

impl<D: Driver> LayerExt for D {}

/// Configures scheme stripping and re-attachment around a driver.
#[derive(Debug, Clone)]
pub struct SchemeLayer {
    scheme: String,
    strip: bool,
    reattach: bool,
}

impl SchemeLayer {
    /// Strip `scheme://` from inputs and re-attach it to outputs.
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            strip: true,
            reattach: true,
        }
    }

    /// The adapter behavior a backend kind needs.
    ///
    /// Inputs are stripped when the kind rejects scheme-qualified paths.
    /// Outputs of remote kinds are always re-attached, since vendor
    /// listings come back without a scheme; local outputs never are.
    pub fn for_kind(kind: &BackendKind, scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            strip: !kind.supports_scheme(),
            reattach: kind.is_remote(),
        }
    }

    /// Set whether inputs are stripped.
    pub fn strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    /// Set whether outputs are re-attached.
    pub fn reattach(mut self, reattach: bool) -> Self {
        self.reattach = reattach;
        self
    }
}

impl<D: Driver> Layer<D> for SchemeLayer {
    type Driver = SchemeAdapter<D>;

    fn layer(self, driver: D) -> Self::Driver {
        SchemeAdapter {
            inner: driver,
            scheme: self.scheme,
            strip: self.strip,
            reattach: self.reattach,
        }
    }
}

/// Driver wrapper produced by [`SchemeLayer`].
pub struct SchemeAdapter<D> {
    inner: D,
    scheme: String,
    strip: bool,
    reattach: bool,
}

impl<D> SchemeAdapter<D> {
    /// The wrapped driver.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    fn input<'a>(&self, operation: &'static str, path: &'a str) -> &'a str {
        let path = if self.strip { strip_scheme(path) } else { path };
        tracing::trace!(scheme = %self.scheme, operation, path, "driver call");
        path
    }

    fn output(&self, path: String) -> String {
        if self.reattach {
            prepend_scheme(&self.scheme, &path)
        } else {
            path
        }
    }

    fn outputs(&self, paths: Vec<String>) -> Vec<String> {
        paths.into_iter().map(|p| self.output(p)).collect()
    }
}

impl<D: Driver> Driver for SchemeAdapter<D> {
    fn open(&self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError> {
        self.inner.open(self.input("open", path), mode)
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        self.inner.exists(self.input("exists", path))
    }

    fn ls(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.inner.ls(self.input("ls", path)).map(|v| self.outputs(v))
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        self.inner.remove(self.input("remove", path), recursive)
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.inner
            .copy(self.input("copy", from), self.input("copy", to))
    }

    fn mv(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.inner.mv(self.input("mv", from), self.input("mv", to))
    }

    fn makedirs(&self, path: &str, exist_ok: bool) -> Result<(), FsError> {
        self.inner.makedirs(self.input("makedirs", path), exist_ok)
    }

    fn rmdir(&self, path: &str) -> Result<(), FsError> {
        self.inner.rmdir(self.input("rmdir", path))
    }

    fn info(&self, path: &str) -> Result<FileInfo, FsError> {
        self.inner.info(self.input("info", path))
    }

    fn walk(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.inner.walk(self.input("walk", path)).map(|v| self.outputs(v))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, FsError> {
        self.inner
            .glob(self.input("glob", pattern))
            .map(|v| self.outputs(v))
    }

    fn touch(&self, path: &str) -> Result<(), FsError> {
        self.inner.touch(self.input("touch", path))
    }

    fn put(&self, local: &StdPath, remote: &str) -> Result<(), FsError> {
        self.inner.put(local, self.input("put", remote))
    }

    fn get(&self, remote: &str, local: &StdPath) -> Result<(), FsError> {
        self.inner.get(self.input("get", remote), local)
    }
}
