//! The fixed capability set every backend implements.

use std::io::{Read, Write};
use std::path::Path as StdPath;

use crate::{FileHandle, FileInfo, FsError, OpenMode};

/// Storage operations of one backend, on plain string paths.
///
/// Every backend implements the same set of methods; backends differ only in
/// how they carry them out. Vendor naming differences (`rm` vs `remove`,
/// `cp` vs `copy`) are settled once, when the driver is written, not per
/// call.
///
/// Paths returned by a driver are plain strings. Remote drivers return them
/// bucket-qualified and without a scheme; the adapter layer re-attaches the
/// scheme and types the result.
///
/// # Thread Safety
///
/// All methods take `&self`. Drivers keep no per-call mutable state, so one
/// instance can serve concurrent callers.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn Driver`.
pub trait Driver: Send + Sync {
    /// Open a file.
    ///
    /// Write handles may buffer; the data is committed on `flush` or drop.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] (or an `Io` error of kind `NotFound`) when
    ///   reading a missing file
    fn open(&self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError>;

    /// Check if a path exists, as a file or a directory.
    fn exists(&self, path: &str) -> Result<bool, FsError>;

    /// List the immediate children of a directory, sorted.
    ///
    /// A missing directory yields an empty list. Listing a file yields the
    /// file itself.
    fn ls(&self, path: &str) -> Result<Vec<String>, FsError>;

    /// Remove a file or directory.
    ///
    /// With `recursive`, everything under `path` goes too. Without it, a
    /// directory with children is an error and an empty directory is removed.
    fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError>;

    /// Copy a file (or, on object stores, every object under a prefix).
    fn copy(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Move a file or directory.
    fn mv(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Create a directory and its missing parents.
    ///
    /// # Errors
    ///
    /// - an "already exists" error when the directory exists and
    ///   `exist_ok` is false
    /// - [`FsError::Unsupported`] on backends that reject directory
    ///   operations
    fn makedirs(&self, path: &str, exist_ok: bool) -> Result<(), FsError>;

    /// Remove an empty directory.
    fn rmdir(&self, path: &str) -> Result<(), FsError>;

    /// Size, kind and modification time of a path.
    fn info(&self, path: &str) -> Result<FileInfo, FsError>;

    /// Every file below `path`, recursively, sorted. Directories are not
    /// listed.
    fn walk(&self, path: &str) -> Result<Vec<String>, FsError>;

    /// Paths matching a shell-style pattern (`*`, `**`, `?`, `[...]`).
    fn glob(&self, pattern: &str) -> Result<Vec<String>, FsError>;

    /// Create an empty file if `path` does not exist.
    fn touch(&self, path: &str) -> Result<(), FsError> {
        if self.exists(path)? {
            return Ok(());
        }
        let mut handle = self.open(path, OpenMode::Write)?;
        handle
            .flush()
            .map_err(|e| FsError::io("touch", path, e))
    }

    /// Upload a local file to `remote`.
    fn put(&self, local: &StdPath, remote: &str) -> Result<(), FsError> {
        let mut src =
            std::fs::File::open(local).map_err(|e| FsError::io("put", local, e))?;
        let mut dst = self.open(remote, OpenMode::Write)?;
        std::io::copy(&mut src, &mut dst).map_err(|e| FsError::io("put", local, e))?;
        dst.flush().map_err(|e| FsError::io("put", remote, e))
    }

    /// Download `remote` into a local file, creating its parent directories.
    fn get(&self, remote: &str, local: &StdPath) -> Result<(), FsError> {
        let mut src = self.open(remote, OpenMode::Read)?;
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FsError::io("get", parent, e))?;
        }
        let mut dst =
            std::fs::File::create(local).map_err(|e| FsError::io("get", local, e))?;
        let mut buf = Vec::new();
        src.read_to_end(&mut buf)
            .map_err(|e| FsError::io("get", remote, e))?;
        dst.write_all(&buf).map_err(|e| FsError::io("get", local, e))
    }
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn open(&self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError> {
        (**self).open(path, mode)
    }
    fn exists(&self, path: &str) -> Result<bool, FsError> {
        (**self).exists(path)
    }
    fn ls(&self, path: &str) -> Result<Vec<String>, FsError> {
        (**self).ls(path)
    }
    fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        (**self).remove(path, recursive)
    }
    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        (**self).copy(from, to)
    }
    fn mv(&self, from: &str, to: &str) -> Result<(), FsError> {
        (**self).mv(from, to)
    }
    fn makedirs(&self, path: &str, exist_ok: bool) -> Result<(), FsError> {
        (**self).makedirs(path, exist_ok)
    }
    fn rmdir(&self, path: &str) -> Result<(), FsError> {
        (**self).rmdir(path)
    }
    fn info(&self, path: &str) -> Result<FileInfo, FsError> {
        (**self).info(path)
    }
    fn walk(&self, path: &str) -> Result<Vec<String>, FsError> {
        (**self).walk(path)
    }
    fn glob(&self, pattern: &str) -> Result<Vec<String>, FsError> {
        (**self).glob(pattern)
    }
    fn touch(&self, path: &str) -> Result<(), FsError> {
        (**self).touch(path)
    }
    fn put(&self, local: &StdPath, remote: &str) -> Result<(), FsError> {
        (**self).put(local, remote)
    }
    fn get(&self, remote: &str, local: &StdPath) -> Result<(), FsError> {
        (**self).get(remote, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_is_object_safe() {
        fn _check(_: &dyn Driver) {}
    }

    #[test]
    fn boxed_driver_is_a_driver() {
        fn _takes<D: Driver>(_: &D) {}
        fn _check(d: &Box<dyn Driver>) {
            _takes(d);
        }
    }
}
