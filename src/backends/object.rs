//! # Object-Store Driver
//!
//! One [`Driver`] for every bucket-shaped backend, driving an
//! [`ObjectClient`]. Backends differ in path layout and in how they treat
//! directory operations:
//!
//! | Backend | Path layout | `makedirs` / `rmdir` |
//! |---------|-------------|----------------------|
//! | s3 | `bucket/key` | no-op |
//! | gs, gcs | `bucket/key` | [`FsError::Unsupported`] |
//! | abfs | `account/container/key` | no-op |
//! | adl | `store/key` | no-op |
//!
//! Object stores have no real directories. A "directory" exists only while
//! at least one object lives under its prefix, so callers must not rely on
//! `exists` after a no-op `makedirs`.
//!
//! ## Recursive Delete
//!
//! `remove(p, true)` deletes every object under `p/` and `p` itself if it is
//! an object. `remove(p, false)` deletes `p` if it is an object and fails
//! with [`FsError::DirectoryNotEmpty`] if `p` is a prefix with objects.
//!
//! Returned paths are qualified (`bucket/key`, `account/container/key`,
//! `store/key`) but schemeless; the adapter layer adds the scheme.

use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::Utc;

use crate::glob::{has_magic, implied_dirs, literal_base, Pattern};
use crate::scheme::strip_scheme;
use crate::{
    Driver, FileHandle, FileInfo, FileKind, FsError, ObjectClient, ObjectEntry, OpenMode,
};

use super::{azure_blob, ensure_outside};

/// How a path maps onto a bucket and key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `bucket/key`. Also used for Data Lake `store/key` paths.
    Bucket,
    /// `abfs://account/container/key`; the container is the bucket.
    AccountContainer,
}

/// Directory-operation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirOps {
    /// `makedirs` and `rmdir` succeed without doing anything.
    NoOp,
    /// `makedirs` and `rmdir` fail with [`FsError::Unsupported`].
    Unsupported,
}

/// A path split into its storage coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Location {
    /// What returned paths are qualified with (`bucket`, `account/container`).
    root: String,
    bucket: String,
    key: String,
}

impl Location {
    fn qualify(&self, key: &str) -> String {
        if key.is_empty() {
            self.root.clone()
        } else {
            format!("{}/{key}", self.root)
        }
    }

    fn entry_path(&self, entry: &ObjectEntry) -> String {
        self.qualify(entry.key())
    }
}

/// Driver for bucket-shaped object stores.
pub struct ObjectDriver {
    scheme: &'static str,
    layout: Layout,
    dir_ops: DirOps,
    client: Arc<dyn ObjectClient>,
}

impl ObjectDriver {
    /// A driver for `scheme` over `client`.
    pub fn new(
        scheme: &'static str,
        layout: Layout,
        dir_ops: DirOps,
        client: Arc<dyn ObjectClient>,
    ) -> Self {
        Self {
            scheme,
            layout,
            dir_ops,
            client,
        }
    }

    fn locate(&self, path: &str) -> Result<Location, FsError> {
        match self.layout {
            Layout::Bucket => {
                let rest = strip_scheme(path).trim_matches('/');
                let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(FsError::MalformedPath {
                        path: path.to_string(),
                        reason: format!("{} paths need a bucket", self.scheme),
                    });
                }
                Ok(Location {
                    root: bucket.to_string(),
                    bucket: bucket.to_string(),
                    key: key.trim_end_matches('/').to_string(),
                })
            }
            Layout::AccountContainer => {
                let (account, container, rest) = azure_blob::split_path(path)?;
                Ok(Location {
                    root: format!("{account}/{container}"),
                    bucket: container.to_string(),
                    key: rest.trim_matches('/').to_string(),
                })
            }
        }
    }

    fn is_object(&self, loc: &Location) -> Result<bool, FsError> {
        if loc.key.is_empty() {
            return Ok(false);
        }
        Ok(self.client.head_object(&loc.bucket, &loc.key)?.is_some())
    }

    fn objects_under(&self, loc: &Location) -> Result<Vec<String>, FsError> {
        Ok(self
            .client
            .list_objects(&loc.bucket, &loc.key, true)?
            .into_iter()
            .filter_map(|e| match e {
                ObjectEntry::Object { key, .. } if key != loc.key => Some(key),
                _ => None,
            })
            .collect())
    }

    /// Copy the object or every object under `src`, returning the
    /// `(source key, target key)` pairs.
    fn copy_tree(&self, src: &Location, dst: &Location) -> Result<Vec<(String, String)>, FsError> {
        if self.is_object(src)? {
            self.client
                .copy_object(&src.bucket, &src.key, &dst.bucket, &dst.key)?;
            return Ok(vec![(src.key.clone(), dst.key.clone())]);
        }
        let children = self.objects_under(src)?;
        if children.is_empty() {
            return Err(FsError::NotFound {
                path: src.qualify(&src.key),
            });
        }
        let strip = if src.key.is_empty() { 0 } else { src.key.len() + 1 };
        let mut copied = Vec::with_capacity(children.len());
        for key in children {
            let relative = &key[strip..];
            let target = if dst.key.is_empty() {
                relative.to_string()
            } else {
                format!("{}/{relative}", dst.key)
            };
            self.client
                .copy_object(&src.bucket, &key, &dst.bucket, &target)?;
            copied.push((key, target));
        }
        Ok(copied)
    }

    fn dir_op(&self, operation: &'static str) -> Result<(), FsError> {
        match self.dir_ops {
            DirOps::NoOp => Ok(()),
            DirOps::Unsupported => Err(FsError::Unsupported {
                scheme: self.scheme.to_string(),
                operation,
            }),
        }
    }
}

/// Buffers writes and uploads them on `flush` or drop.
struct ObjectWriter {
    client: Arc<dyn ObjectClient>,
    bucket: String,
    key: String,
    buf: Vec<u8>,
    dirty: bool,
}

impl Write for ObjectWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.dirty = true;
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.dirty {
            self.client
                .put_object(&self.bucket, &self.key, self.buf.clone())
                .map_err(std::io::Error::from)?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for ObjectWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(
                bucket = %self.bucket,
                key = %self.key,
                error = %e,
                "object upload on close failed"
            );
        }
    }
}

impl Driver for ObjectDriver {
    fn open(&self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError> {
        let loc = self.locate(path)?;
        if mode == OpenMode::Read {
            let data = self.client.get_object(&loc.bucket, &loc.key)?;
            return Ok(FileHandle::Reader(Box::new(Cursor::new(data))));
        }
        let buf = if mode == OpenMode::Append && self.is_object(&loc)? {
            self.client.get_object(&loc.bucket, &loc.key)?
        } else {
            Vec::new()
        };
        Ok(FileHandle::Writer(Box::new(ObjectWriter {
            client: Arc::clone(&self.client),
            bucket: loc.bucket,
            key: loc.key,
            buf,
            dirty: true,
        })))
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let loc = self.locate(path)?;
        if loc.key.is_empty() {
            return self.client.bucket_exists(&loc.bucket);
        }
        if self.is_object(&loc)? {
            return Ok(true);
        }
        Ok(!self
            .client
            .list_objects(&loc.bucket, &loc.key, false)?
            .is_empty())
    }

    fn ls(&self, path: &str) -> Result<Vec<String>, FsError> {
        let loc = self.locate(path)?;
        let entries = self.client.list_objects(&loc.bucket, &loc.key, false)?;
        if entries.is_empty() && self.is_object(&loc)? {
            return Ok(vec![loc.qualify(&loc.key)]);
        }
        let listed: BTreeSet<String> = entries.iter().map(|e| loc.entry_path(e)).collect();
        Ok(listed.into_iter().collect())
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        let loc = self.locate(path)?;
        let children = self.objects_under(&loc)?;
        let is_object = self.is_object(&loc)?;
        if !recursive && !children.is_empty() {
            return Err(FsError::DirectoryNotEmpty {
                path: loc.qualify(&loc.key),
            });
        }
        if children.is_empty() && !is_object {
            return Err(FsError::NotFound {
                path: loc.qualify(&loc.key),
            });
        }
        for key in &children {
            self.client.delete_object(&loc.bucket, key)?;
        }
        if is_object {
            self.client.delete_object(&loc.bucket, &loc.key)?;
        }
        Ok(())
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let src = self.locate(from)?;
        let dst = self.locate(to)?;
        self.copy_tree(&src, &dst).map(|_| ())
    }

    fn mv(&self, from: &str, to: &str) -> Result<(), FsError> {
        let src = self.locate(from)?;
        let dst = self.locate(to)?;
        ensure_outside(&src.qualify(&src.key), &dst.qualify(&dst.key))?;
        let copied = self.copy_tree(&src, &dst)?;
        let written: BTreeSet<&str> = if src.bucket == dst.bucket {
            copied.iter().map(|(_, target)| target.as_str()).collect()
        } else {
            BTreeSet::new()
        };
        for (key, _) in &copied {
            if !written.contains(key.as_str()) {
                self.client.delete_object(&src.bucket, key)?;
            }
        }
        Ok(())
    }

    fn makedirs(&self, path: &str, _exist_ok: bool) -> Result<(), FsError> {
        self.locate(path)?;
        self.dir_op("makedirs")
    }

    fn rmdir(&self, path: &str) -> Result<(), FsError> {
        self.locate(path)?;
        self.dir_op("rmdir")
    }

    fn info(&self, path: &str) -> Result<FileInfo, FsError> {
        let loc = self.locate(path)?;
        if !loc.key.is_empty() {
            if let Some(meta) = self.client.head_object(&loc.bucket, &loc.key)? {
                return Ok(FileInfo {
                    last_modified: meta.last_modified,
                    size: meta.size,
                    kind: FileKind::File,
                });
            }
        }
        let entries = self.client.list_objects(&loc.bucket, &loc.key, true)?;
        if entries.is_empty() && !(loc.key.is_empty() && self.client.bucket_exists(&loc.bucket)?)
        {
            return Err(FsError::NotFound {
                path: loc.qualify(&loc.key),
            });
        }
        let newest = entries
            .iter()
            .filter_map(|e| match e {
                ObjectEntry::Object { meta, .. } => Some(meta.last_modified),
                ObjectEntry::Prefix(_) => None,
            })
            .max();
        Ok(FileInfo {
            last_modified: newest.unwrap_or_else(Utc::now),
            size: 0,
            kind: FileKind::Directory,
        })
    }

    fn walk(&self, path: &str) -> Result<Vec<String>, FsError> {
        let loc = self.locate(path)?;
        let files: BTreeSet<String> = self
            .client
            .list_objects(&loc.bucket, &loc.key, true)?
            .iter()
            .filter(|e| matches!(e, ObjectEntry::Object { .. }))
            .map(|e| loc.entry_path(e))
            .collect();
        Ok(files.into_iter().collect())
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, FsError> {
        let loc = self.locate(pattern)?;
        if !has_magic(&loc.key) {
            return Ok(if self.exists(pattern)? {
                vec![loc.qualify(&loc.key)]
            } else {
                Vec::new()
            });
        }
        let compiled = Pattern::new(&loc.key)?;
        let base = literal_base(&loc.key);
        let keys: Vec<String> = self
            .client
            .list_objects(&loc.bucket, base, true)?
            .into_iter()
            .filter_map(|e| match e {
                ObjectEntry::Object { key, .. } => Some(key),
                ObjectEntry::Prefix(_) => None,
            })
            .collect();
        let dirs = implied_dirs(keys.iter().map(String::as_str));
        let matched = compiled.filter(keys.iter().chain(dirs.iter()));
        Ok(matched.iter().map(|k| loc.qualify(k)).collect())
    }
}
