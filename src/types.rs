//! Core value types shared by backends and the adapter layer.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::FsError;

/// How a file is opened.
///
/// Parsed from the familiar mode strings (`"r"`, `"rb"`, `"w"`, `"wb"`,
/// `"a"`, `"ab"`). Text and binary modes behave the same; handles are byte
/// streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Read an existing file.
    Read,
    /// Create or truncate, then write.
    Write,
    /// Create if missing, then write at the end.
    Append,
}

impl OpenMode {
    /// Returns `true` for modes that write.
    #[inline]
    pub fn is_write(&self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let base = s.trim_end_matches(['b', 't']);
        match base {
            "r" => Ok(OpenMode::Read),
            "w" => Ok(OpenMode::Write),
            "a" => Ok(OpenMode::Append),
            _ => Err(FsError::InvalidMode { mode: s.to_string() }),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpenMode::Read => "rb",
            OpenMode::Write => "wb",
            OpenMode::Append => "ab",
        };
        f.write_str(s)
    }
}

/// An open file returned by `open`.
///
/// Reading from a write handle (or writing to a read handle) fails with
/// [`std::io::ErrorKind::Unsupported`].
pub enum FileHandle {
    /// A readable byte stream.
    Reader(Box<dyn Read + Send>),
    /// A writable byte stream.
    Writer(Box<dyn Write + Send>),
}

impl FileHandle {
    /// Returns `true` if this handle was opened for writing.
    pub fn is_writer(&self) -> bool {
        matches!(self, FileHandle::Writer(_))
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileHandle::Reader(_) => f.write_str("FileHandle::Reader"),
            FileHandle::Writer(_) => f.write_str("FileHandle::Writer"),
        }
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            FileHandle::Reader(r) => r.read(buf),
            FileHandle::Writer(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "file was opened for writing",
            )),
        }
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            FileHandle::Writer(w) => w.write(buf),
            FileHandle::Reader(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "file was opened for reading",
            )),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            FileHandle::Writer(w) => w.flush(),
            FileHandle::Reader(_) => Ok(()),
        }
    }
}

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A file or object.
    File,
    /// A directory, pseudo-directory or key prefix.
    Directory,
}

/// Result of `info`.
///
/// Every backend reports at least a timezone-aware modification time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileInfo {
    /// Last modification time in UTC.
    pub last_modified: DateTime<Utc>,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Entry kind.
    pub kind: FileKind,
}

impl FileInfo {
    /// Returns `true` if this is a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Metadata of a single stored object, as reported by an object client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time in UTC.
    pub last_modified: DateTime<Utc>,
}

/// An entry of an object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectEntry {
    /// A stored object, with its key relative to the bucket.
    Object {
        /// Key within the bucket.
        key: String,
        /// Object metadata.
        meta: ObjectMeta,
    },
    /// A common prefix standing in for a directory (no trailing slash).
    Prefix(String),
}

impl ObjectEntry {
    /// The key or prefix of this entry.
    pub fn key(&self) -> &str {
        match self {
            ObjectEntry::Object { key, .. } => key,
            ObjectEntry::Prefix(p) => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_mode_parses_text_and_binary_variants() {
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("wt".parse::<OpenMode>().unwrap(), OpenMode::Write);
        assert_eq!("ab".parse::<OpenMode>().unwrap(), OpenMode::Append);
    }

    #[test]
    fn open_mode_rejects_unknown() {
        let err = "x".parse::<OpenMode>().unwrap_err();
        assert!(matches!(err, FsError::InvalidMode { .. }));
        assert!("".parse::<OpenMode>().is_err());
    }

    #[test]
    fn open_mode_write_flag() {
        assert!(!OpenMode::Read.is_write());
        assert!(OpenMode::Write.is_write());
        assert!(OpenMode::Append.is_write());
    }

    #[test]
    fn reader_refuses_writes() {
        let mut handle = FileHandle::Reader(Box::new(std::io::empty()));
        let err = handle.write(b"x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        assert!(!handle.is_writer());
    }

    #[test]
    fn writer_refuses_reads() {
        let mut handle = FileHandle::Writer(Box::new(std::io::sink()));
        let mut buf = [0u8; 4];
        assert!(handle.read(&mut buf).is_err());
        assert!(handle.write(b"ok").is_ok());
    }

    #[test]
    fn object_entry_key() {
        assert_eq!(ObjectEntry::Prefix("dir".into()).key(), "dir");
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpenMode>();
        assert_send_sync::<FileInfo>();
        assert_send_sync::<ObjectEntry>();
    }
}
