//! # Extension Traits
//!
//! Whole-file helpers built from the [`Driver`] primitives.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`read`](FsExt::read) | Whole file as bytes |
//! | [`read_to_string`](FsExt::read_to_string) | Whole file as UTF-8 |
//! | [`write`](FsExt::write) | Replace a file's contents |
//! | [`is_file`](FsExt::is_file) / [`is_dir`](FsExt::is_dir) | Kind checks, `false` when missing |
//! | [`file_size`](FsExt::file_size) | Size from [`info`](Driver::info) |
//! | [`read_json`](FsExt::read_json) / [`write_json`](FsExt::write_json) | Typed JSON files |
//!
//! A [`FileSystem`](crate::FileSystem) exposes its adapted driver through
//! [`driver()`](crate::FileSystem::driver), so these methods work on
//! scheme-qualified paths too.

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Driver, FsError, OpenMode};

/// Extension methods for any driver.
///
/// # Example
///
/// ```rust
/// use schemefs::{Driver, FsExt, FsError};
/// use schemefs::backends::memory::{MemoryDriver, MemoryStore};
///
/// let driver = MemoryDriver::with_store(MemoryStore::new());
/// driver.write("settings/app.json", br#"{"retries": 3}"#)?;
/// let value: serde_json::Value = driver.read_json("settings/app.json")?;
/// assert_eq!(value["retries"], 3);
/// assert!(driver.is_dir("settings")?);
/// # Ok::<(), FsError>(())
/// ```
pub trait FsExt: Driver {
    /// Read the whole file.
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let mut buf = Vec::new();
        self.open(path, OpenMode::Read)?
            .read_to_end(&mut buf)
            .map_err(|e| FsError::io("read", path, e))?;
        Ok(buf)
    }

    /// Read the whole file as UTF-8.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] with [`InvalidData`](std::io::ErrorKind::InvalidData)
    ///   if the file is not UTF-8
    fn read_to_string(&self, path: &str) -> Result<String, FsError> {
        let mut text = String::new();
        self.open(path, OpenMode::Read)?
            .read_to_string(&mut text)
            .map_err(|e| FsError::io("read", path, e))?;
        Ok(text)
    }

    /// Replace the file's contents, creating it if needed.
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let mut handle = self.open(path, OpenMode::Write)?;
        handle
            .write_all(data)
            .and_then(|()| handle.flush())
            .map_err(|e| FsError::io("write", path, e))
    }

    /// Returns `true` if `path` is a file. Missing paths are `false`.
    fn is_file(&self, path: &str) -> Result<bool, FsError> {
        match self.info(path) {
            Ok(info) => Ok(info.is_file()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Returns `true` if `path` is a directory. Missing paths are `false`.
    fn is_dir(&self, path: &str) -> Result<bool, FsError> {
        match self.info(path) {
            Ok(info) => Ok(info.is_dir()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Size of the file in bytes.
    fn file_size(&self, path: &str) -> Result<u64, FsError> {
        Ok(self.info(path)?.size)
    }

    /// Read a file and deserialize it as JSON.
    ///
    /// # Errors
    ///
    /// - [`FsError::Json`] if the contents do not decode into `T`
    fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FsError> {
        let data = self.read(path)?;
        serde_json::from_slice(&data).map_err(|source| FsError::Json {
            path: path.to_string(),
            source,
        })
    }

    /// Serialize a value as pretty-printed JSON and write it.
    fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<(), FsError> {
        let json = serde_json::to_vec_pretty(value).map_err(|source| FsError::Json {
            path: path.to_string(),
            source,
        })?;
        self.write(path, &json)
    }
}

impl<D: Driver + ?Sized> FsExt for D {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{MemoryDriver, MemoryStore};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Manifest {
        name: String,
        parts: u32,
    }

    fn driver() -> MemoryDriver {
        MemoryDriver::with_store(MemoryStore::new())
    }

    #[test]
    fn write_then_read() {
        let d = driver();
        d.write("a/b.txt", b"hello").unwrap();
        assert_eq!(d.read("a/b.txt").unwrap(), b"hello");
        assert_eq!(d.read_to_string("a/b.txt").unwrap(), "hello");
        assert_eq!(d.file_size("a/b.txt").unwrap(), 5);
    }

    #[test]
    fn kind_checks_are_false_for_missing() {
        let d = driver();
        d.write("dir/f", b"").unwrap();
        assert!(d.is_file("dir/f").unwrap());
        assert!(!d.is_dir("dir/f").unwrap());
        assert!(d.is_dir("dir").unwrap());
        assert!(!d.is_file("nope").unwrap());
        assert!(!d.is_dir("nope").unwrap());
    }

    #[test]
    fn json_round_trip_and_decode_error() {
        let d = driver();
        let manifest = Manifest {
            name: "daily".into(),
            parts: 4,
        };
        d.write_json("m.json", &manifest).unwrap();
        assert_eq!(d.read_json::<Manifest>("m.json").unwrap(), manifest);

        d.write("bad.json", b"{not json").unwrap();
        assert!(matches!(
            d.read_json::<Manifest>("bad.json"),
            Err(FsError::Json { .. })
        ));
    }

    #[test]
    fn available_on_dyn_driver() {
        let d = driver();
        let dyn_driver: &dyn Driver = &d;
        dyn_driver.write("x", b"1").unwrap();
        assert_eq!(dyn_driver.read("x").unwrap(), b"1");
    }
}
