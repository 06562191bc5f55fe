//! Local-disk backend over `std::fs`.
//!
//! Writes never need a pre-created directory: opening for write, `copy` and
//! `mv` create the destination's parents first.

use std::fs;
use std::io;
use std::path::Path as StdPath;

use chrono::{DateTime, Utc};

use crate::glob::{has_magic, literal_base, match_depth, Pattern};
use crate::registry::BuildContext;
use crate::{BackendKind, Driver, FileHandle, FileInfo, FileKind, FsError, OpenMode, Registry};

/// The local backend.
pub const LOCAL: BackendKind = BackendKind::new("local", "file", false, false, build);

fn build(_: BuildContext<'_>) -> Result<Box<dyn Driver>, FsError> {
    Ok(Box::new(LocalDriver::new()))
}

/// Register the local backend for `""` and `file`.
pub fn register(registry: &Registry) {
    registry.register("", LOCAL);
    registry.register("file", LOCAL);
}

/// Driver for the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDriver;

impl LocalDriver {
    /// Create a driver.
    pub fn new() -> Self {
        Self
    }
}

fn ensure_parent(operation: &'static str, path: &StdPath) -> Result<(), FsError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| FsError::io(operation, parent, e))
        }
        _ => Ok(()),
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Every entry below `dir` as `(path, is_dir)`, depth first.
/// Collect entries below `dir`, at most `depth` levels down when bounded.
fn descend(dir: &str, depth: Option<usize>, out: &mut Vec<(String, bool)>) -> Result<(), FsError> {
    if depth == Some(0) {
        return Ok(());
    }
    let read_dir = match fs::read_dir(if dir.is_empty() { "." } else { dir }) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FsError::io("walk", dir, e)),
    };
    for entry in read_dir {
        let entry = entry.map_err(|e| FsError::io("walk", dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = join(dir, &name);
        let is_dir = entry
            .file_type()
            .map_err(|e| FsError::io("walk", &path, e))?
            .is_dir();
        out.push((path.clone(), is_dir));
        if is_dir {
            descend(&path, depth.map(|d| d - 1), out)?;
        }
    }
    Ok(())
}

impl Driver for LocalDriver {
    fn open(&self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError> {
        let p = StdPath::new(path);
        match mode {
            OpenMode::Read => {
                let file = fs::File::open(p).map_err(|e| FsError::io("open", p, e))?;
                Ok(FileHandle::Reader(Box::new(file)))
            }
            OpenMode::Write | OpenMode::Append => {
                ensure_parent("open", p)?;
                let file = fs::OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(mode == OpenMode::Write)
                    .append(mode == OpenMode::Append)
                    .open(p)
                    .map_err(|e| FsError::io("open", p, e))?;
                Ok(FileHandle::Writer(Box::new(file)))
            }
        }
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        StdPath::new(path)
            .try_exists()
            .map_err(|e| FsError::io("exists", path, e))
    }

    fn ls(&self, path: &str) -> Result<Vec<String>, FsError> {
        let p = StdPath::new(path);
        if p.is_file() {
            return Ok(vec![path.to_string()]);
        }
        let read_dir = match fs::read_dir(p) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FsError::io("ls", p, e)),
        };
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| FsError::io("ls", p, e))?;
            entries.push(join(path, &entry.file_name().to_string_lossy()));
        }
        entries.sort();
        Ok(entries)
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        let p = StdPath::new(path);
        let meta = fs::symlink_metadata(p).map_err(|e| FsError::io("remove", p, e))?;
        let result = if !meta.is_dir() {
            fs::remove_file(p)
        } else if recursive {
            fs::remove_dir_all(p)
        } else {
            // fails with the OS "directory not empty" error unless empty
            fs::remove_dir(p)
        };
        result.map_err(|e| FsError::io("remove", p, e))
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let dst = StdPath::new(to);
        ensure_parent("copy", dst)?;
        fs::copy(from, dst)
            .map(|_| ())
            .map_err(|e| FsError::io("copy", from, e))
    }

    fn mv(&self, from: &str, to: &str) -> Result<(), FsError> {
        let dst = StdPath::new(to);
        ensure_parent("mv", dst)?;
        fs::rename(from, dst).map_err(|e| FsError::io("mv", from, e))
    }

    fn makedirs(&self, path: &str, exist_ok: bool) -> Result<(), FsError> {
        let p = StdPath::new(path);
        if !exist_ok && p.exists() {
            return Err(FsError::io(
                "makedirs",
                p,
                io::Error::from(io::ErrorKind::AlreadyExists),
            ));
        }
        fs::create_dir_all(p).map_err(|e| FsError::io("makedirs", p, e))
    }

    fn rmdir(&self, path: &str) -> Result<(), FsError> {
        fs::remove_dir(path).map_err(|e| FsError::io("rmdir", path, e))
    }

    fn info(&self, path: &str) -> Result<FileInfo, FsError> {
        let meta = fs::metadata(path).map_err(|e| FsError::io("info", path, e))?;
        let modified = meta.modified().map_err(|e| FsError::io("info", path, e))?;
        Ok(FileInfo {
            last_modified: DateTime::<Utc>::from(modified),
            size: if meta.is_dir() { 0 } else { meta.len() },
            kind: if meta.is_dir() {
                FileKind::Directory
            } else {
                FileKind::File
            },
        })
    }

    fn walk(&self, path: &str) -> Result<Vec<String>, FsError> {
        let mut entries = Vec::new();
        descend(path, None, &mut entries)?;
        let mut files: Vec<String> = entries
            .into_iter()
            .filter_map(|(p, is_dir)| (!is_dir).then_some(p))
            .collect();
        files.sort();
        Ok(files)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, FsError> {
        if !has_magic(pattern) {
            return Ok(if self.exists(pattern)? {
                vec![pattern.to_string()]
            } else {
                Vec::new()
            });
        }
        let compiled = Pattern::new(pattern)?;
        let base = literal_base(pattern);
        // `/x` has the literal base "" after trimming to the first segment
        let base = if base.is_empty() && pattern.starts_with('/') {
            "/"
        } else {
            base
        };
        let mut entries = Vec::new();
        descend(base, match_depth(pattern), &mut entries)?;
        Ok(compiled.filter(entries.into_iter().map(|(p, _)| p)))
    }

    fn touch(&self, path: &str) -> Result<(), FsError> {
        let p = StdPath::new(path);
        ensure_parent("touch", p)?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(p)
            .map(|_| ())
            .map_err(|e| FsError::io("touch", p, e))
    }
}
