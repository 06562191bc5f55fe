//! Filesystem-agnostic free functions.
//!
//! Each call resolves its path through [`Resolver::global`], merging the
//! optional `options` over the configured ones, and runs one operation.
//!
//! ```rust
//! use schemefs::ops;
//!
//! let dir = std::env::temp_dir().join("schemefs-ops-doc");
//! let dir = dir.to_string_lossy();
//! ops::makedirs(&*dir, None)?;
//! assert!(ops::exists(&*dir, None)?);
//! ops::rmdir(&*dir, None)?;
//! # Ok::<(), schemefs::FsError>(())
//! ```

use crate::{
    BackendKind, FileHandle, FileSystem, FsError, OpenMode, Path, PathLike, Resolver,
    StorageOptions,
};

/// The backend instance for `path`.
pub fn get_fs(path: impl PathLike, options: Option<&StorageOptions>) -> Result<FileSystem, FsError> {
    Resolver::global().resolve(path, options)
}

/// The backend kind owning `path`, without connecting.
pub fn backend_kind(path: impl PathLike) -> Result<BackendKind, FsError> {
    Resolver::global().backend_kind(path)
}

/// Expand a glob pattern.
pub fn glob(pattern: impl PathLike, options: Option<&StorageOptions>) -> Result<Vec<Path>, FsError> {
    get_fs(&pattern, options)?.glob(&pattern)
}

/// Returns `true` if `path` exists.
pub fn exists(path: impl PathLike, options: Option<&StorageOptions>) -> Result<bool, FsError> {
    get_fs(&path, options)?.exists(&path)
}

/// Open `path` with a mode string such as `"rb"` or `"w"`.
///
/// # Errors
///
/// - [`FsError::InvalidMode`] if `mode` is not understood
pub fn open(
    path: impl PathLike,
    mode: &str,
    options: Option<&StorageOptions>,
) -> Result<FileHandle, FsError> {
    let mode: OpenMode = mode.parse()?;
    get_fs(&path, options)?.open(&path, mode)
}

/// Move `from` to `to`. Both must live on the backend owning `from`.
pub fn mv(
    from: impl PathLike,
    to: impl PathLike,
    options: Option<&StorageOptions>,
) -> Result<(), FsError> {
    get_fs(&from, options)?.mv(&from, &to)
}

/// Create `path` and its parents. Existing directories are fine.
pub fn makedirs(path: impl PathLike, options: Option<&StorageOptions>) -> Result<(), FsError> {
    get_fs(&path, options)?.makedirs(&path, true)
}

/// Remove the empty directory `path`.
pub fn rmdir(path: impl PathLike, options: Option<&StorageOptions>) -> Result<(), FsError> {
    get_fs(&path, options)?.rmdir(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn local_round_trip_through_free_functions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let file = format!("{root}/nested/out.txt");

        let mut w = open(file.as_str(), "wb", None).unwrap();
        w.write_all(b"payload").unwrap();
        w.flush().unwrap();
        drop(w);
        assert!(exists(file.as_str(), None).unwrap());

        let moved = format!("{root}/nested/moved.txt");
        mv(file.as_str(), moved.as_str(), None).unwrap();
        let mut text = String::new();
        open(moved.as_str(), "r", None)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "payload");

        let found = glob(format!("{root}/nested/*.txt"), None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "moved.txt");
    }

    #[test]
    fn bad_mode_is_rejected_before_resolving() {
        assert!(matches!(
            open("ftp://host/x", "rw+", None),
            Err(FsError::InvalidMode { .. })
        ));
    }

    #[test]
    fn backend_kind_classifies_without_connecting() {
        assert_eq!(backend_kind("/tmp/x").unwrap().name(), "local");
        assert!(backend_kind("ftp://host").is_err());
    }
}
