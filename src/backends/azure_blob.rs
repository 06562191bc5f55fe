//! Azure Blob Storage backend for `abfs://account/container/key` paths.
//!
//! Every operation first splits its path into account, container and the
//! rest. A path missing the account or container is rejected, never guessed.
//! Listings come back container-relative from the client and are
//! re-qualified with `account/container` before they are returned.
//!
//! The resolver adds `account_name` to the backend options from the path
//! when it is not configured.

use super::object::{DirOps, Layout, ObjectDriver};
use crate::registry::BuildContext;
use crate::{BackendKind, Driver, FsError, Registry};

/// Backend name.
pub const NAME: &str = "abfs";

/// The Azure Blob backend.
pub const ABFS: BackendKind = BackendKind::new(NAME, "abfs", true, true, build);

/// Split `abfs://account/container/rest` into its three parts.
///
/// ```rust
/// use schemefs::backends::azure_blob::split_path;
///
/// assert_eq!(split_path("abfs://acct/cont/dir/file").unwrap(), ("acct", "cont", "dir/file"));
/// assert_eq!(split_path("abfs://acct/cont").unwrap(), ("acct", "cont", ""));
/// assert!(split_path("abfas://acct/cont/file").is_err());
/// ```
///
/// # Errors
///
/// - [`FsError::MalformedPath`] if the path is not `abfs://` or lacks the
///   account or container
pub fn split_path(path: &str) -> Result<(&str, &str, &str), FsError> {
    let malformed = || FsError::MalformedPath {
        path: path.to_string(),
        reason: "doesn't match abfs://ACCOUNT/CONTAINER/PATH".into(),
    };
    let rest = path.strip_prefix("abfs://").ok_or_else(malformed)?;
    let (account, rest) = rest.split_once('/').ok_or_else(malformed)?;
    let (container, rest) = rest.split_once('/').unwrap_or((rest, ""));
    if account.is_empty() || container.is_empty() {
        return Err(malformed());
    }
    Ok((account, container, rest))
}

fn build(ctx: BuildContext<'_>) -> Result<Box<dyn Driver>, FsError> {
    Ok(Box::new(ObjectDriver::new(
        "abfs",
        Layout::AccountContainer,
        DirOps::NoOp,
        ctx.connect()?,
    )))
}

/// Register the backend for `abfs`.
pub fn register(registry: &Registry) {
    registry.register("abfs", ABFS);
}
