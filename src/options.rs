//! # Storage Options and Configuration
//!
//! [`StorageOptions`] is the set of keyword arguments a backend is built
//! with. [`FsConfig`] holds the default options per scheme.
//!
//! ## Precedence
//!
//! ```text
//! FsConfig[scheme]  <  options attached to the path  <  call-site overrides
//! ```
//!
//! Merging is shallow: a key set at a higher level replaces the whole value
//! below it.
//!
//! ## Process-wide Default
//!
//! [`FsConfig::global`] is created on first use. When the `SCHEMEFS_CONFIG`
//! environment variable names a JSON file, it is loaded into the default:
//!
//! ```json
//! { "fs_opts": { "s3": { "key": "...", "secret": "..." } } }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path as StdPath;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scheme::config_key;
use crate::FsError;

/// Environment variable naming a JSON file to seed [`FsConfig::global`].
pub const CONFIG_ENV_VAR: &str = "SCHEMEFS_CONFIG";

/// Backend constructor options, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageOptions(BTreeMap<String, Value>);

impl StorageOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an option, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up an option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a string option.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Option names, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no option is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every key of `other` replaces the one in `self`.
    pub fn merge(&mut self, other: &StorageOptions) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Stable textual form, used to key connection caches.
    pub fn canonical_json(&self) -> String {
        // BTreeMap keeps keys sorted, so equal option sets serialize equally.
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StorageOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// On-disk configuration layout.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Wrapped { fs_opts: HashMap<String, StorageOptions> },
    Bare(HashMap<String, StorageOptions>),
}

/// Default backend options keyed by scheme.
///
/// Cheap to clone; clones share the same table. Reads return copies, so a
/// caller can never mutate the stored defaults through a returned value.
#[derive(Debug, Clone, Default)]
pub struct FsConfig {
    fs_opts: Arc<RwLock<HashMap<String, StorageOptions>>>,
}

static GLOBAL: Lazy<FsConfig> = Lazy::new(|| match std::env::var_os(CONFIG_ENV_VAR) {
    Some(path) => FsConfig::load(&path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring {}", CONFIG_ENV_VAR);
        FsConfig::new()
    }),
    None => FsConfig::new(),
});

impl FsConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default configuration.
    pub fn global() -> &'static FsConfig {
        &GLOBAL
    }

    /// Parse a configuration from JSON.
    ///
    /// Accepts `{"fs_opts": {scheme: {...}}}` or the bare `{scheme: {...}}`.
    pub fn from_json_str(json: &str) -> Result<Self, FsError> {
        let parsed: ConfigFile = serde_json::from_str(json).map_err(|e| FsError::Config {
            details: e.to_string(),
        })?;
        let table = match parsed {
            ConfigFile::Wrapped { fs_opts } => fs_opts,
            ConfigFile::Bare(map) => map,
        };
        let config = Self::new();
        for (scheme, opts) in table {
            config.set(&scheme, opts);
        }
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<StdPath>) -> Result<Self, FsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| FsError::io("load config", path, e))?;
        Self::from_json_str(&text)
    }

    /// Copy of the options for `scheme` (empty if none are configured).
    pub fn get(&self, scheme: &str) -> StorageOptions {
        self.fs_opts
            .read()
            .get(config_key(scheme))
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the options for `scheme`.
    pub fn set(&self, scheme: &str, options: StorageOptions) {
        self.fs_opts
            .write()
            .insert(config_key(scheme).to_string(), options);
    }

    /// Drop the options for `scheme`, returning them.
    pub fn remove(&self, scheme: &str) -> Option<StorageOptions> {
        self.fs_opts.write().remove(config_key(scheme))
    }

    /// Schemes with configured options, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.fs_opts.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_is_shallow_and_right_wins() {
        let mut base = StorageOptions::new()
            .with("key", "X")
            .with("config_kwargs", json!({"read_timeout": 60, "retries": 3}));
        let top = StorageOptions::new()
            .with("key", "Y")
            .with("config_kwargs", json!({"read_timeout": 600}));
        base.merge(&top);
        assert_eq!(base.get_str("key"), Some("Y"));
        assert_eq!(base.get("config_kwargs"), Some(&json!({"read_timeout": 600})));
    }

    #[test]
    fn canonical_json_ignores_insertion_order() {
        let a = StorageOptions::new().with("b", 1).with("a", 2);
        let b = StorageOptions::new().with("a", 2).with("b", 1);
        assert_eq!(a.canonical_json(), b.canonical_json());
    }

    #[test]
    fn absent_scheme_yields_empty_options() {
        let config = FsConfig::new();
        assert!(config.get("s3").is_empty());
    }

    #[test]
    fn local_scheme_is_stored_under_file() {
        let config = FsConfig::new();
        config.set("", StorageOptions::new().with("auto_mkdir", true));
        assert_eq!(config.get("file").get("auto_mkdir"), Some(&json!(true)));
        assert_eq!(config.schemes(), vec!["file".to_string()]);
    }

    #[test]
    fn get_returns_a_copy() {
        let config = FsConfig::new();
        config.set("s3", StorageOptions::new().with("key", "X"));
        let mut copy = config.get("s3");
        copy.insert("key", "mutated");
        assert_eq!(config.get("s3").get_str("key"), Some("X"));
    }

    #[test]
    fn clones_share_the_table() {
        let config = FsConfig::new();
        let clone = config.clone();
        clone.set("gs", StorageOptions::new().with("project", "p"));
        assert_eq!(config.get("gs").get_str("project"), Some("p"));
    }

    #[test]
    fn parses_wrapped_and_bare_json() {
        let wrapped = FsConfig::from_json_str(r#"{"fs_opts": {"s3": {"key": "A"}}}"#).unwrap();
        assert_eq!(wrapped.get("s3").get_str("key"), Some("A"));

        let bare = FsConfig::from_json_str(r#"{"memory": {}, "gs": {"token": "t"}}"#).unwrap();
        assert_eq!(bare.get("gs").get_str("token"), Some("t"));
        assert_eq!(bare.schemes(), vec!["gs".to_string(), "memory".to_string()]);
    }

    #[test]
    fn rejects_non_mapping_json() {
        let err = FsConfig::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, FsError::Config { .. }));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.json");
        std::fs::write(&file, r#"{"fs_opts": {"abfs": {"account_key": "k"}}}"#).unwrap();
        let config = FsConfig::load(&file).unwrap();
        assert_eq!(config.get("abfs").get_str("account_key"), Some("k"));
    }
}
