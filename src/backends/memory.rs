//! In-memory backend for `memory://` paths.
//!
//! Files live in a flat key map; directories are simulated. A path exists if
//! it is a file, a pseudo-directory created by `makedirs`, or the prefix of
//! any stored key.
//!
//! By default every instance shares one process-wide [`MemoryStore`], so data
//! written through one `memory://` filesystem is visible through the next.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::ensure_outside;
use crate::glob::{has_magic, implied_dirs, literal_base, Pattern};
use crate::registry::BuildContext;
use crate::{BackendKind, Driver, FileHandle, FileInfo, FileKind, FsError, OpenMode, Registry};

/// The memory backend.
pub const MEMORY: BackendKind = BackendKind::new("memory", "memory", true, false, build);

fn build(_: BuildContext<'_>) -> Result<Box<dyn Driver>, FsError> {
    Ok(Box::new(MemoryDriver::new()))
}

/// Register the memory backend for `memory`.
pub fn register(registry: &Registry) {
    registry.register("memory", MEMORY);
}

#[derive(Debug, Clone)]
struct MemFile {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, MemFile>,
    pseudo_dirs: BTreeSet<String>,
}

impl State {
    fn children_prefix(key: &str) -> String {
        if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        }
    }

    fn has_children(&self, key: &str) -> bool {
        let prefix = Self::children_prefix(key);
        self.files.keys().any(|k| k.starts_with(&prefix) && k != key)
            || self
                .pseudo_dirs
                .iter()
                .any(|d| d.starts_with(&prefix) && d != key)
    }

    fn is_dir(&self, key: &str) -> bool {
        key.is_empty() || self.pseudo_dirs.contains(key) || self.has_children(key)
    }

    /// Copy the file or tree at `from` to `to`, pseudo-directories included.
    fn copy_tree(&mut self, from: &str, to: &str) -> Result<Copied, FsError> {
        let mut copied = Copied::default();
        if let Some(file) = self.files.get(from).cloned() {
            self.files.insert(to.to_string(), file);
            copied.files.push(from.to_string());
            copied.written.insert(to.to_string());
            return Ok(copied);
        }
        let prefix = Self::children_prefix(from);
        let retarget = |key: &str| -> Option<String> {
            if key == from {
                return Some(to.to_string());
            }
            let rest = key.strip_prefix(&prefix)?;
            Some(if to.is_empty() {
                rest.to_string()
            } else {
                format!("{to}/{rest}")
            })
        };
        let files: Vec<(String, String, MemFile)> = self
            .files
            .iter()
            .filter_map(|(k, f)| retarget(k).map(|t| (k.clone(), t, f.clone())))
            .collect();
        let dirs: Vec<(String, String)> = self
            .pseudo_dirs
            .iter()
            .filter_map(|d| retarget(d).map(|t| (d.clone(), t)))
            .collect();
        if files.is_empty() && dirs.is_empty() {
            return Err(MemoryDriver::not_found(from));
        }
        for (source, target, file) in files {
            copied.written.insert(target.clone());
            copied.files.push(source);
            self.files.insert(target, file);
        }
        for (source, target) in dirs {
            copied.written.insert(target.clone());
            copied.dirs.push(source);
            if !target.is_empty() {
                self.pseudo_dirs.insert(target);
            }
        }
        Ok(copied)
    }
}

/// Keys touched by [`State::copy_tree`].
#[derive(Default)]
struct Copied {
    files: Vec<String>,
    dirs: Vec<String>,
    written: BTreeSet<String>,
}

/// Storage behind the memory backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

static GLOBAL_STORE: Lazy<Arc<MemoryStore>> = Lazy::new(|| Arc::new(MemoryStore::new()));

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store.
    pub fn global() -> Arc<MemoryStore> {
        Arc::clone(&GLOBAL_STORE)
    }

    fn commit(&self, key: &str, data: Vec<u8>) {
        self.state.write().files.insert(
            key.to_string(),
            MemFile {
                data,
                modified: Utc::now(),
            },
        );
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Driver over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    store: Arc<MemoryStore>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    /// A driver over the process-wide store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::global())
    }

    /// A driver over a specific store.
    pub fn with_store(store: impl Into<Arc<MemoryStore>>) -> Self {
        Self {
            store: store.into(),
        }
    }

    fn not_found(key: &str) -> FsError {
        FsError::NotFound {
            path: key.to_string(),
        }
    }
}

/// Buffers writes and stores them on `flush` or drop.
struct MemWriter {
    store: Arc<MemoryStore>,
    key: String,
    buf: Vec<u8>,
    dirty: bool,
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.dirty = true;
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.dirty {
            self.store.commit(&self.key, self.buf.clone());
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(key = %self.key, error = %e, "memory write was not committed");
        }
    }
}

impl Driver for MemoryDriver {
    fn open(&self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError> {
        let key = normalize(path);
        let existing = self.store.state.read().files.get(key).map(|f| f.data.clone());
        match mode {
            OpenMode::Read => {
                let data = existing.ok_or_else(|| Self::not_found(key))?;
                Ok(FileHandle::Reader(Box::new(Cursor::new(data))))
            }
            OpenMode::Write | OpenMode::Append => {
                let buf = match mode {
                    OpenMode::Append => existing.unwrap_or_default(),
                    _ => Vec::new(),
                };
                Ok(FileHandle::Writer(Box::new(MemWriter {
                    store: Arc::clone(&self.store),
                    key: key.to_string(),
                    buf,
                    dirty: true,
                })))
            }
        }
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let key = normalize(path);
        let state = self.store.state.read();
        Ok(state.files.contains_key(key) || state.is_dir(key))
    }

    fn ls(&self, path: &str) -> Result<Vec<String>, FsError> {
        let key = normalize(path);
        let state = self.store.state.read();
        let prefix = State::children_prefix(key);
        let mut children = BTreeSet::new();
        let names = state.files.keys().chain(state.pseudo_dirs.iter());
        for k in names {
            if let Some(rest) = k.strip_prefix(&prefix).filter(|r| !r.is_empty()) {
                let first = rest.split('/').next().unwrap_or(rest);
                children.insert(format!("{prefix}{first}"));
            }
        }
        if children.is_empty() && state.files.contains_key(key) {
            return Ok(vec![key.to_string()]);
        }
        Ok(children.into_iter().collect())
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        let key = normalize(path);
        let mut state = self.store.state.write();
        let is_file = state.files.contains_key(key);
        if recursive {
            let prefix = State::children_prefix(key);
            let before = state.files.len() + state.pseudo_dirs.len();
            state.files.retain(|k, _| k != key && !k.starts_with(&prefix));
            state
                .pseudo_dirs
                .retain(|d| d != key && !d.starts_with(&prefix));
            if state.files.len() + state.pseudo_dirs.len() == before {
                return Err(Self::not_found(key));
            }
            return Ok(());
        }
        if is_file {
            state.files.remove(key);
        } else if state.has_children(key) {
            return Err(FsError::DirectoryNotEmpty {
                path: key.to_string(),
            });
        } else if !state.pseudo_dirs.remove(key) {
            return Err(Self::not_found(key));
        }
        Ok(())
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let (from, to) = (normalize(from), normalize(to));
        let mut state = self.store.state.write();
        state.copy_tree(from, to).map(|_| ())
    }

    fn mv(&self, from: &str, to: &str) -> Result<(), FsError> {
        let (from, to) = (normalize(from), normalize(to));
        ensure_outside(from, to)?;
        let mut state = self.store.state.write();
        let copied = state.copy_tree(from, to)?;
        for key in copied.files.iter().filter(|k| !copied.written.contains(*k)) {
            state.files.remove(key);
        }
        for dir in copied.dirs.iter().filter(|d| !copied.written.contains(*d)) {
            state.pseudo_dirs.remove(dir);
        }
        Ok(())
    }

    fn makedirs(&self, path: &str, exist_ok: bool) -> Result<(), FsError> {
        let key = normalize(path);
        let mut state = self.store.state.write();
        if state.files.contains_key(key) || (!exist_ok && state.is_dir(key)) {
            return Err(FsError::AlreadyExists {
                path: key.to_string(),
            });
        }
        let mut end = 0;
        while let Some(pos) = key[end..].find('/') {
            end += pos;
            state.pseudo_dirs.insert(key[..end].to_string());
            end += 1;
        }
        if !key.is_empty() {
            state.pseudo_dirs.insert(key.to_string());
        }
        Ok(())
    }

    fn rmdir(&self, path: &str) -> Result<(), FsError> {
        let key = normalize(path);
        let mut state = self.store.state.write();
        if state.has_children(key) {
            return Err(FsError::DirectoryNotEmpty {
                path: key.to_string(),
            });
        }
        if !state.pseudo_dirs.remove(key) {
            return Err(Self::not_found(key));
        }
        Ok(())
    }

    fn info(&self, path: &str) -> Result<FileInfo, FsError> {
        let key = normalize(path);
        let state = self.store.state.read();
        if let Some(file) = state.files.get(key) {
            return Ok(FileInfo {
                last_modified: file.modified,
                size: file.data.len() as u64,
                kind: FileKind::File,
            });
        }
        if !state.is_dir(key) {
            return Err(Self::not_found(key));
        }
        let prefix = State::children_prefix(key);
        let newest = state
            .files
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, f)| f.modified)
            .max();
        Ok(FileInfo {
            last_modified: newest.unwrap_or_else(Utc::now),
            size: 0,
            kind: FileKind::Directory,
        })
    }

    fn walk(&self, path: &str) -> Result<Vec<String>, FsError> {
        let prefix = State::children_prefix(normalize(path));
        let state = self.store.state.read();
        Ok(state
            .files
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect())
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, FsError> {
        let pattern = normalize(pattern);
        if !has_magic(pattern) {
            return Ok(if self.exists(pattern)? {
                vec![pattern.to_string()]
            } else {
                Vec::new()
            });
        }
        let compiled = Pattern::new(pattern)?;
        let prefix = State::children_prefix(literal_base(pattern));
        let state = self.store.state.read();
        let dirs = implied_dirs(state.files.keys().map(String::as_str));
        let candidates = state
            .files
            .keys()
            .chain(state.pseudo_dirs.iter())
            .chain(dirs.iter())
            .filter(|k| k.starts_with(&prefix));
        Ok(compiled.filter(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn driver() -> MemoryDriver {
        MemoryDriver::with_store(MemoryStore::new())
    }

    fn write(d: &MemoryDriver, path: &str, data: &[u8]) {
        let mut w = d.open(path, OpenMode::Write).unwrap();
        w.write_all(data).unwrap();
    }

    #[test]
    fn write_commits_on_drop() {
        let d = driver();
        write(&d, "/root/a.txt", b"abc");
        let mut out = Vec::new();
        d.open("root/a.txt", OpenMode::Read)
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn append_extends_existing_data() {
        let d = driver();
        write(&d, "f", b"12");
        let mut w = d.open("f", OpenMode::Append).unwrap();
        w.write_all(b"3").unwrap();
        w.flush().unwrap();
        assert_eq!(d.info("f").unwrap().size, 3);
    }

    #[test]
    fn missing_file_read_is_not_found() {
        let err = driver().open("nope", OpenMode::Read).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn exists_covers_files_pseudo_dirs_and_prefixes() {
        let d = driver();
        write(&d, "a/b/c.txt", b"");
        d.makedirs("empty/dir", false).unwrap();
        for path in ["a/b/c.txt", "a/b", "a", "/a/", "empty", "empty/dir", ""] {
            assert!(d.exists(path).unwrap(), "{path:?} should exist");
        }
        assert!(!d.exists("a/b/c").unwrap());
        assert!(!d.exists("a/bb").unwrap());
    }

    #[test]
    fn ls_lists_direct_children() {
        let d = driver();
        write(&d, "r/a.txt", b"");
        write(&d, "r/sub/b.txt", b"");
        d.makedirs("r/dir", true).unwrap();
        assert_eq!(d.ls("r").unwrap(), vec!["r/a.txt", "r/dir", "r/sub"]);
        assert_eq!(d.ls("r/a.txt").unwrap(), vec!["r/a.txt"]);
        assert!(d.ls("missing").unwrap().is_empty());
    }

    #[test]
    fn recursive_remove_walks_the_simulated_tree() {
        let d = driver();
        write(&d, "t/x/1", b"");
        write(&d, "t/x/y/2", b"");
        d.makedirs("t/x/z", true).unwrap();
        write(&d, "t/xx", b"");

        let err = d.remove("t/x", false).unwrap_err();
        assert!(matches!(err, FsError::DirectoryNotEmpty { .. }));

        d.remove("t/x", true).unwrap();
        assert!(!d.exists("t/x").unwrap());
        assert!(!d.exists("t/x/z").unwrap());
        assert!(d.exists("t/xx").unwrap());
        assert!(matches!(d.remove("t/x", true), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn remove_empty_pseudo_dir_without_recursive() {
        let d = driver();
        d.makedirs("p/q", false).unwrap();
        d.remove("p/q", false).unwrap();
        assert!(d.exists("p").unwrap());
        assert!(!d.exists("p/q").unwrap());
    }

    #[test]
    fn makedirs_and_rmdir() {
        let d = driver();
        d.makedirs("m/n", false).unwrap();
        assert!(matches!(
            d.makedirs("m/n", false),
            Err(FsError::AlreadyExists { .. })
        ));
        assert!(matches!(d.rmdir("m"), Err(FsError::DirectoryNotEmpty { .. })));
        d.rmdir("m/n").unwrap();
        d.rmdir("m").unwrap();
        assert!(matches!(d.rmdir("m"), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn copy_and_mv_directories() {
        let d = driver();
        write(&d, "src/a", b"1");
        write(&d, "src/b/c", b"2");
        d.copy("src", "dst").unwrap();
        assert_eq!(d.walk("dst").unwrap(), vec!["dst/a", "dst/b/c"]);
        d.mv("src/a", "moved").unwrap();
        assert!(!d.exists("src/a").unwrap());
        assert!(d.exists("moved").unwrap());
    }

    #[test]
    fn mv_into_own_subtree_is_rejected_and_keeps_data() {
        let d = driver();
        write(&d, "mv/d/f.txt", b"1");
        assert!(matches!(
            d.mv("mv/d", "mv/d/sub"),
            Err(FsError::MoveIntoItself { .. })
        ));
        assert!(matches!(
            d.mv("mv/d/f.txt", "/mv/d/f.txt/"),
            Err(FsError::MoveIntoItself { .. })
        ));
        assert_eq!(d.walk("mv").unwrap(), vec!["mv/d/f.txt"]);
    }

    #[test]
    fn copy_and_mv_carry_empty_pseudo_dirs() {
        let d = driver();
        write(&d, "c/src/f", b"1");
        d.makedirs("c/src/empty", false).unwrap();

        d.copy("c/src", "c/copy").unwrap();
        assert!(d.exists("c/copy/empty").unwrap());

        d.mv("c/src", "c/moved").unwrap();
        assert!(d.exists("c/moved/empty").unwrap());
        assert!(d.exists("c/moved/f").unwrap());
        assert!(!d.exists("c/src").unwrap());
        assert!(!d.exists("c/src/empty").unwrap());
    }

    #[test]
    fn mv_into_parent_keeps_keys_it_just_wrote() {
        let d = driver();
        write(&d, "p/a/a/x", b"inner");
        write(&d, "p/a/y", b"outer");
        d.mv("p/a", "p").unwrap();
        assert_eq!(d.walk("p").unwrap(), vec!["p/a/x", "p/y"]);
    }

    #[test]
    fn glob_includes_implied_directories() {
        let d = driver();
        write(&d, "g/a.csv", b"");
        write(&d, "g/b.csv", b"");
        write(&d, "g/sub/c.csv", b"");
        assert_eq!(d.glob("g/*").unwrap(), vec!["g/a.csv", "g/b.csv", "g/sub"]);
        assert_eq!(d.glob("g/*.csv").unwrap(), vec!["g/a.csv", "g/b.csv"]);
        assert_eq!(d.glob("g/**/*.csv").unwrap().len(), 3);
        assert_eq!(d.glob("g/a.csv").unwrap(), vec!["g/a.csv"]);
    }

    #[test]
    fn info_of_directory() {
        let d = driver();
        write(&d, "i/f", b"xyz");
        let info = d.info("i").unwrap();
        assert!(info.is_dir());
        assert_eq!(info.size, 0);
        assert!(d.info("none").is_err());
    }

    #[test]
    fn default_driver_shares_the_global_store() {
        let a = MemoryDriver::new();
        let b = MemoryDriver::new();
        write(&a, "memory-driver-shared-test/x", b"1");
        assert!(b.exists("memory-driver-shared-test/x").unwrap());
        b.remove("memory-driver-shared-test", true).unwrap();
    }
}
