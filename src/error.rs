//! Error types for scheme dispatch, path handling and backend drivers.

use std::path::PathBuf;

/// Filesystem error type with contextual variants.
///
/// The core only adds context (scheme, path, operation) around failures. Errors
/// raised by a vendor client travel inside [`FsError::Backend`] untouched, and
/// local-disk errors keep their [`std::io::Error`] as the source.
///
/// # Examples
///
/// ```rust
/// use schemefs::FsError;
///
/// let err = FsError::MalformedPath {
///     path: "abfs://acct".into(),
///     reason: "missing container".into(),
/// };
/// assert_eq!(err.to_string(), "malformed path abfs://acct: missing container");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Dispatch errors
    /// No backend is registered for the scheme.
    #[error("no filesystem for scheme {scheme:?}, available schemes are: {}", available.join(", "))]
    UnknownScheme {
        /// The scheme that was looked up.
        scheme: String,
        /// Every scheme registered at the time of the lookup, sorted.
        available: Vec<String>,
    },

    /// The backend is registered but no vendor client connector was installed.
    #[error("no connector installed for scheme {scheme:?}")]
    NoConnector {
        /// The scheme of the backend missing a connector.
        scheme: String,
    },

    /// Constructing a backend instance failed.
    #[error("connecting {scheme:?} backend (options: [{}]) failed: {source}", option_keys.join(", "))]
    Connect {
        /// The scheme being connected.
        scheme: String,
        /// Keys of the merged options the connection was attempted with.
        option_keys: Vec<String>,
        /// The original failure.
        #[source]
        source: Box<FsError>,
    },

    // Path errors
    /// A backend-specific path grammar was violated.
    #[error("malformed path {path}: {reason}")]
    MalformedPath {
        /// The offending path.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A template placeholder had no value.
    #[error("template {path} has no value for placeholder {{{key}}}")]
    Template {
        /// The template path.
        path: String,
        /// The placeholder name (or position) that was missing.
        key: String,
    },

    /// An open mode string was not understood.
    #[error("invalid open mode: {mode:?}")]
    InvalidMode {
        /// The mode that was given.
        mode: String,
    },

    // Storage errors reported by simulated stores
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Path already exists when it shouldn't.
    #[error("already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: String,
    },

    /// Directory is not empty when it should be.
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty {
        /// The path to the non-empty directory.
        path: String,
    },

    /// A move whose destination is its source or lies inside it.
    #[error("cannot move {from} into itself ({to})")]
    MoveIntoItself {
        /// The source path.
        from: String,
        /// The rejected destination.
        to: String,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: String,
    },

    // Backend/operation errors
    /// The operation is structurally impossible for the backend.
    #[error("{operation} is not supported by the {scheme:?} backend")]
    Unsupported {
        /// The backend scheme.
        scheme: String,
        /// The rejected operation.
        operation: &'static str,
    },

    /// Error raised by a vendor client, passed through verbatim.
    #[error("{scheme} backend error: {source}")]
    Backend {
        /// The backend scheme.
        scheme: String,
        /// The vendor error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A JSON document could not be encoded or decoded.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// The file being read or written.
        path: String,
        /// The serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration could not be loaded.
    #[error("invalid configuration: {details}")]
    Config {
        /// What went wrong.
        details: String,
    },

    /// I/O error from the local disk, with context.
    #[error("{operation} failed for {}: {source}", path.display())]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap a local I/O error with operation and path context.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FsError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wrap an opaque vendor-client error.
    pub fn backend(
        scheme: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        FsError::Backend {
            scheme: scheme.into(),
            source: source.into(),
        }
    }

    /// The [`std::io::ErrorKind`] of a local I/O error, if this is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            FsError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Returns `true` if the error means the path does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            FsError::NotFound { .. } => true,
            FsError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            FsError::Connect { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<FsError> for std::io::Error {
    fn from(e: FsError) -> Self {
        match e {
            FsError::Io { source, .. } => source,
            FsError::NotFound { .. } => std::io::Error::new(std::io::ErrorKind::NotFound, e),
            FsError::AlreadyExists { .. } => {
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, e)
            }
            FsError::Json { .. } => std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            FsError::MoveIntoItself { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
            }
            other => std::io::Error::other(other),
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FsError>;
