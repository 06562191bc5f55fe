//! # schemefs
//!
//! One path and filesystem API over local disks, object stores and memory.
//!
//! Paths carry their own scheme (`s3://bucket/key`, `abfs://account/container/key`,
//! `/var/data/file`). The scheme picks the backend, configuration picks the
//! credentials, and every result comes back as a typed [`Path`] that knows
//! where it lives.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use schemefs::{Path, FsError};
//!
//! let dir = std::env::temp_dir().join("schemefs-quickstart");
//! let file = Path::from(dir.join("hello.txt"));
//! file.write_text("hello")?;
//! assert_eq!(file.read_text()?, "hello");
//!
//! let listed = file.parent().ls()?;
//! assert!(listed.contains(&file));
//! # file.remove(false)?;
//! # Ok::<(), FsError>(())
//! ```
//!
//! Remote and memory paths work the same way:
//!
//! ```rust
//! use schemefs::Path;
//!
//! let p = Path::parse("memory://scratch/run-1/out.csv")?;
//! p.write_bytes(b"a,b\n1,2\n")?;
//!
//! let found = Path::parse("memory://scratch/run-1/*.csv")?.glob()?;
//! assert_eq!(found, vec![p.clone()]);
//! assert!(found[0].is_remote());
//! # Ok::<(), schemefs::FsError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Path`] | Local or remote location, parsed from a scheme-qualified string |
//! | [`Registry`] | Scheme to [`BackendKind`] table |
//! | [`Resolver`] | Path to [`FileSystem`], with merged [`StorageOptions`] |
//! | [`FileSystem`] | A connected backend with typed inputs and outputs |
//! | [`Driver`] | The fixed operation set every backend implements |
//! | [`ObjectClient`] / [`Connector`] | Seam to a vendor object-store SDK |
//! | [`TreeSchema`] / [`Tree`] | Declarative, relocatable directory layouts |
//! | [`FsError`] | Error type with scheme and path context |
//!
//! ---
//!
//! ## Backends
//!
//! | Scheme | Backend | Directories | Feature |
//! |--------|---------|-------------|---------|
//! | `""`, `file` | local disk | real | always |
//! | `memory` | process-wide store | simulated | always |
//! | `s3` | Amazon S3 | no-op | `s3` |
//! | `gs`, `gcs` | Google Cloud Storage | unsupported | `gcs` |
//! | `abfs` | Azure Blob Storage | no-op | `azure` |
//! | `adl` | Azure Data Lake | no-op | `azure` |
//!
//! Each object-store feature compiles in an [`object_store`] client for its
//! provider, and [`Registry::with_builtins`] installs it as the backend's
//! [`Connector`]. Replace it with [`Registry::install_connector`] to point a
//! backend at another client, such as [`MemoryObjectClient`] in tests.
//!
//! [`object_store`]: https://docs.rs/object_store
//!
//! ---
//!
//! ## Adapter Chain
//!
//! ```text
//! PathLike ─▶ string ─▶ strip scheme? ─▶ Driver ─▶ re-attach scheme ─▶ Path
//!                       (SchemeLayer)              (SchemeLayer)      (FileSystem)
//! ```
//!
//! Backends that cannot take scheme-qualified paths get them stripped. Every
//! path a remote backend returns is re-qualified with its scheme and typed
//! with the instance's options, so results can be opened without another
//! resolve.
//!
//! ---
//!
//! ## Configuration
//!
//! [`FsConfig`] holds per-scheme options. [`FsConfig::global`] is seeded
//! from the JSON file named by `SCHEMEFS_CONFIG`:
//!
//! ```json
//! { "fs_opts": { "s3": { "key": "...", "secret": "..." } } }
//! ```
//!
//! Options merge as configuration, then options attached to the path, then
//! call-site overrides. Configuration is never modified by a resolve.
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`Driver`], [`ObjectClient`] and [`Connector`] require `Send + Sync` and
//! take `&self`. [`Registry`], [`FsConfig`], [`Resolver`] and [`FileSystem`]
//! are cheap handles over shared state.

mod error;
mod ext;
mod filesystem;
mod layer;
mod options;
mod registry;
mod resolver;
mod target;
mod traits;
mod tree;
mod types;

pub mod backends;
pub mod glob;
pub mod ops;
pub mod path;
pub mod scheme;

// Public re-exports - errors
pub use error::{FsError, Result};

// Public re-exports - core types
pub use types::{FileHandle, FileInfo, FileKind, ObjectEntry, ObjectMeta, OpenMode};

// Public re-exports - configuration and dispatch
pub use options::{CONFIG_ENV_VAR, FsConfig, StorageOptions};
pub use registry::{BackendKind, BuildContext, BuildFn, Registry};
pub use resolver::Resolver;

// Public re-exports - backend seams
pub use traits::{Connector, Driver, ObjectClient};

// Public re-exports - adapters
pub use filesystem::FileSystem;
pub use layer::{Layer, LayerExt, SchemeAdapter, SchemeLayer};

// Public re-exports - paths
pub use path::{IntoPath, LocalPath, Path, PathLike, RemotePath, aspath, aspaths};

// Public re-exports - conveniences
pub use backends::memory_client::{MemoryObjectClient, SharedConnector};
pub use ext::FsExt;
pub use target::FileTarget;
pub use tree::{Tree, TreeSchema, TreeSchemaBuilder};
