//! Google Cloud Storage backend for `gs://` and `gcs://` paths.
//!
//! Both schemes map to the same backend; `gs` is canonical. Directory
//! operations are rejected with [`FsError::Unsupported`].

use super::object::{DirOps, Layout, ObjectDriver};
use crate::registry::BuildContext;
use crate::{BackendKind, Driver, FsError, Registry};

/// The GCS backend.
pub const GCS: BackendKind = BackendKind::new("gcs", "gs", true, true, build);

fn build(ctx: BuildContext<'_>) -> Result<Box<dyn Driver>, FsError> {
    Ok(Box::new(ObjectDriver::new(
        "gs",
        Layout::Bucket,
        DirOps::Unsupported,
        ctx.connect()?,
    )))
}

/// Register the backend for `gs` and its alias `gcs`.
pub fn register(registry: &Registry) {
    registry.register("gs", GCS);
    registry.register("gcs", GCS);
}
