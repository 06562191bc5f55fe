//! # Dispatch Resolver
//!
//! Turns a path into a backend instance:
//!
//! 1. take the scheme from the path (typed paths know it, strings are parsed)
//! 2. look the scheme up in the [`Registry`]
//! 3. merge options: configuration, then the path's own, then call-site
//!    overrides
//! 4. for `abfs`, add the `account_name` taken from the path when missing
//! 5. build the driver and wrap it in a [`FileSystem`]
//!
//! Use [`Resolver::backend_kind`] to classify a path without connecting.
//!
//! ```rust
//! use schemefs::{FsConfig, Registry, Resolver, StorageOptions};
//!
//! let config = FsConfig::new();
//! config.set("memory", StorageOptions::new().with("key", "X"));
//! let resolver = Resolver::new(Registry::with_builtins(), config.clone());
//!
//! let fs = resolver.resolve("memory://bucket/x", None).unwrap();
//! assert_eq!(fs.options().get_str("key"), Some("X"));
//!
//! let overrides = StorageOptions::new().with("key", "Y");
//! let fs = resolver.resolve("memory://bucket/x", Some(&overrides)).unwrap();
//! assert_eq!(fs.options().get_str("key"), Some("Y"));
//! assert_eq!(config.get("memory").get_str("key"), Some("X"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::backends::azure_blob;
use crate::scheme::protocol;
use crate::{BackendKind, BuildContext, FileSystem, FsConfig, FsError, PathLike, Registry, StorageOptions};

type CacheKey = (String, String);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Resolves paths to backend instances.
///
/// Cheap to clone. Without a connection cache every `resolve` builds a fresh
/// instance. Clones count as the same resolver for connections cached on
/// paths.
#[derive(Clone)]
pub struct Resolver {
    id: u64,
    registry: Registry,
    config: FsConfig,
    cache: Option<Arc<DashMap<CacheKey, FileSystem>>>,
}

static GLOBAL: Lazy<Resolver> =
    Lazy::new(|| Resolver::new(Registry::global().clone(), FsConfig::global().clone()));

impl Resolver {
    /// A resolver over an explicit registry and configuration.
    pub fn new(registry: Registry, config: FsConfig) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            registry,
            config,
            cache: None,
        }
    }

    /// The resolver over [`Registry::global`] and [`FsConfig::global`].
    pub fn global() -> &'static Resolver {
        &GLOBAL
    }

    /// Reuse instances for identical `(scheme, merged options)` pairs.
    pub fn with_connection_cache(mut self) -> Self {
        self.cache = Some(Arc::default());
        self
    }

    /// The registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration.
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    fn scheme_of<'a>(path: &'a impl PathLike, raw: &'a str) -> &'a str {
        path.scheme_hint().unwrap_or_else(|| protocol(raw))
    }

    /// The backend kind owning `path`, without instantiating it.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] if the scheme is not registered
    pub fn backend_kind(&self, path: impl PathLike) -> Result<BackendKind, FsError> {
        let raw = path.to_path_string();
        self.registry.lookup(Self::scheme_of(&path, &raw))
    }

    /// The options an instance for `path` would be built with.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] if the scheme is not registered
    /// - [`FsError::MalformedPath`] for an `abfs` path that names no
    ///   account and container
    pub fn merged_options(
        &self,
        path: impl PathLike,
        overrides: Option<&StorageOptions>,
    ) -> Result<StorageOptions, FsError> {
        let raw = path.to_path_string();
        let kind = self.registry.lookup(Self::scheme_of(&path, &raw))?;
        self.merge(&kind, &path, &raw, overrides)
    }

    fn merge(
        &self,
        kind: &BackendKind,
        path: &impl PathLike,
        raw: &str,
        overrides: Option<&StorageOptions>,
    ) -> Result<StorageOptions, FsError> {
        let mut merged = self.config.get(Self::scheme_of(path, raw));
        if let Some(attached) = path.attached_options() {
            merged.merge(attached);
        }
        if let Some(overrides) = overrides {
            merged.merge(overrides);
        }
        if kind.name() == azure_blob::NAME && !merged.contains_key("account_name") {
            let (account, _, _) = azure_blob::split_path(raw)?;
            merged.insert("account_name", account);
        }
        Ok(merged)
    }

    /// A backend instance for `path`.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] if the scheme is not registered
    /// - [`FsError::Connect`] if the backend could not be built; the cause
    ///   is kept as the source
    pub fn resolve(
        &self,
        path: impl PathLike,
        overrides: Option<&StorageOptions>,
    ) -> Result<FileSystem, FsError> {
        let raw = path.to_path_string();
        let scheme = Self::scheme_of(&path, &raw);
        let kind = self.registry.lookup(scheme)?;
        let options = self.merge(&kind, &path, &raw, overrides)?;

        let key = (scheme.to_string(), options.canonical_json());
        if let Some(cache) = &self.cache {
            if let Some(fs) = cache.get(&key) {
                tracing::debug!(scheme, backend = kind.name(), "connection cache hit");
                return Ok(fs.clone());
            }
        }

        tracing::debug!(
            scheme,
            backend = kind.name(),
            options = ?options.keys().collect::<Vec<_>>(),
            "resolving filesystem"
        );
        let connector = self.registry.connector(&kind);
        let driver = kind
            .build(BuildContext {
                scheme,
                options: &options,
                connector: connector.as_deref(),
            })
            .map_err(|e| FsError::Connect {
                scheme: scheme.to_string(),
                option_keys: options.keys().map(str::to_string).collect(),
                source: Box::new(e),
            })?;
        let fs = FileSystem::new(kind, scheme, options, driver, self.registry.clone())
            .resolved_through(self.id);

        if let Some(cache) = &self.cache {
            cache.insert(key, fs.clone());
        }
        Ok(fs)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry)
            .field("cached", &self.cache.as_ref().map(|c| c.len()))
            .finish()
    }
}
