//! # Scheme Registry
//!
//! Maps a scheme to the kind of backend that owns it.
//!
//! | Scheme | Backend | Remote | Gated by |
//! |--------|---------|--------|----------|
//! | `""`, `file` | local | no | always |
//! | `memory` | memory | yes | always |
//! | `s3` | s3 | yes | `s3` feature |
//! | `gs`, `gcs` | gcs | yes | `gcs` feature |
//! | `abfs` | abfs | yes | `azure` feature |
//! | `adl` | adl | yes | `azure` feature |
//!
//! An alias is just a second registration of the same [`BackendKind`].
//! Object-store kinds build through a [`Connector`].
//! [`Registry::with_builtins`] installs the `object_store` connector for each
//! one it registers. In a registry assembled by hand, their paths still parse
//! and type correctly without one and only instantiation fails with
//! [`FsError::NoConnector`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{Connector, Driver, FsError, StorageOptions};

/// Everything a backend needs to build a driver.
pub struct BuildContext<'a> {
    /// The scheme the backend is being instantiated for.
    pub scheme: &'a str,
    /// Merged options.
    pub options: &'a StorageOptions,
    /// The connector installed for this kind, if any.
    pub connector: Option<&'a dyn Connector>,
}

impl BuildContext<'_> {
    /// Connect through the installed connector.
    ///
    /// # Errors
    ///
    /// - [`FsError::NoConnector`] if none is installed
    pub fn connect(&self) -> Result<Arc<dyn crate::ObjectClient>, FsError> {
        let connector = self.connector.ok_or_else(|| FsError::NoConnector {
            scheme: self.scheme.to_string(),
        })?;
        connector.connect(self.options)
    }
}

/// Constructor of a backend driver.
pub type BuildFn = fn(BuildContext<'_>) -> Result<Box<dyn Driver>, FsError>;

/// Static description of a backend type.
///
/// Two kinds are equal when they have the same name.
#[derive(Clone, Copy)]
pub struct BackendKind {
    name: &'static str,
    scheme: &'static str,
    is_remote: bool,
    supports_scheme: bool,
    build: BuildFn,
}

impl BackendKind {
    /// Describe a backend.
    pub const fn new(
        name: &'static str,
        scheme: &'static str,
        is_remote: bool,
        supports_scheme: bool,
        build: BuildFn,
    ) -> Self {
        Self {
            name,
            scheme,
            is_remote,
            supports_scheme,
            build,
        }
    }

    /// Backend name (`"local"`, `"s3"`, ...).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Canonical scheme. For the GCS backend this is `gs` even when reached
    /// through `gcs://`.
    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    /// Returns `true` for backends whose paths are [`RemotePath`](crate::RemotePath)s.
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// Returns `true` if the driver accepts scheme-qualified paths verbatim.
    pub fn supports_scheme(&self) -> bool {
        self.supports_scheme
    }

    /// Build a driver.
    pub fn build(&self, ctx: BuildContext<'_>) -> Result<Box<dyn Driver>, FsError> {
        (self.build)(ctx)
    }
}

impl PartialEq for BackendKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for BackendKind {}

impl fmt::Debug for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendKind")
            .field("name", &self.name)
            .field("scheme", &self.scheme)
            .field("is_remote", &self.is_remote)
            .field("supports_scheme", &self.supports_scheme)
            .finish()
    }
}

#[derive(Default)]
struct Tables {
    kinds: HashMap<String, BackendKind>,
    connectors: HashMap<&'static str, Arc<dyn Connector>>,
}

/// Scheme to backend-kind table, plus the connectors installed for remote
/// kinds.
///
/// Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct Registry {
    tables: Arc<RwLock<Tables>>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::with_builtins);

impl Registry {
    /// A registry with no backends.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with every backend compiled into this build.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        crate::backends::register_builtins(&registry);
        registry
    }

    /// The process-wide registry, built with [`with_builtins`](Self::with_builtins).
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Map `scheme` to `kind`. The last registration wins.
    pub fn register(&self, scheme: &str, kind: BackendKind) {
        tracing::debug!(scheme, backend = kind.name(), "registering backend");
        self.tables.write().kinds.insert(scheme.to_string(), kind);
    }

    /// Look up the backend kind for `scheme`.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`], listing every registered scheme
    pub fn lookup(&self, scheme: &str) -> Result<BackendKind, FsError> {
        let tables = self.tables.read();
        match tables.kinds.get(scheme) {
            Some(kind) => Ok(*kind),
            None => {
                let mut available: Vec<String> = tables.kinds.keys().cloned().collect();
                available.sort();
                Err(FsError::UnknownScheme {
                    scheme: scheme.to_string(),
                    available,
                })
            }
        }
    }

    /// Returns `true` if `scheme` is registered.
    pub fn contains(&self, scheme: &str) -> bool {
        self.tables.read().kinds.contains_key(scheme)
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.tables.read().kinds.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Install the connector for the backend that owns `scheme`.
    ///
    /// The connector serves every alias of that backend.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnknownScheme`] if `scheme` is not registered
    pub fn install_connector(
        &self,
        scheme: &str,
        connector: impl Connector + 'static,
    ) -> Result<(), FsError> {
        let kind = self.lookup(scheme)?;
        tracing::debug!(scheme, backend = kind.name(), "installing connector");
        self.set_connector(&kind, connector);
        Ok(())
    }

    pub(crate) fn set_connector(&self, kind: &BackendKind, connector: impl Connector + 'static) {
        self.tables
            .write()
            .connectors
            .insert(kind.name(), Arc::new(connector));
    }

    /// The connector installed for `kind`.
    pub fn connector(&self, kind: &BackendKind) -> Option<Arc<dyn Connector>> {
        self.tables.read().connectors.get(kind.name()).cloned()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("schemes", &self.schemes())
            .finish()
    }
}
