//! File target for workflow engines.
//!
//! A [`FileTarget`] is one output path plus the options to reach it. Task
//! runners check [`exists`](FileTarget::exists) to decide whether work is
//! done and [`open`](FileTarget::open) it to produce the output.

use crate::{FileHandle, FileSystem, FsError, IntoPath, OpenMode, Path, Resolver, StorageOptions};

/// A single output path on any backend.
///
/// The options are overrides, merged over the configured ones on every
/// resolve.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: Path,
    options: StorageOptions,
    resolver: Resolver,
}

impl FileTarget {
    /// A target resolved through [`Resolver::global`].
    pub fn new(path: impl IntoPath, options: StorageOptions) -> Result<Self, FsError> {
        Self::with_resolver(path, options, Resolver::global().clone())
    }

    /// A target resolved through `resolver`.
    pub fn with_resolver(
        path: impl IntoPath,
        options: StorageOptions,
        resolver: Resolver,
    ) -> Result<Self, FsError> {
        Ok(Self {
            path: path.into_path()?,
            options,
            resolver,
        })
    }

    /// The target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Per-target option overrides.
    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// The backend instance for the target.
    pub fn fs(&self) -> Result<FileSystem, FsError> {
        self.resolver.resolve(&self.path, Some(&self.options))
    }

    /// Open the target with a mode string such as `"w"` or `"rb"`.
    pub fn open(&self, mode: &str) -> Result<FileHandle, FsError> {
        let mode: OpenMode = mode.parse()?;
        self.fs()?.open(&self.path, mode)
    }

    /// Create the directory that will contain the target.
    pub fn makedirs(&self) -> Result<(), FsError> {
        self.fs()?.makedirs(self.path.parent(), true)
    }

    /// Returns `true` once the target has been written.
    pub fn exists(&self) -> Result<bool, FsError> {
        self.fs()?.exists(&self.path)
    }

    /// Delete the target.
    pub fn remove(&self) -> Result<(), FsError> {
        self.fs()?.remove(&self.path, false)
    }
}
