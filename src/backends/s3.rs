//! Amazon S3 backend for `s3://bucket/key` paths.
//!
//! `makedirs` and `rmdir` are no-ops: S3 has no directories, a prefix exists
//! only while objects live under it. Recursive `remove` deletes every object
//! under the prefix.

use super::object::{DirOps, Layout, ObjectDriver};
use crate::registry::BuildContext;
use crate::{BackendKind, Driver, FsError, Registry};

/// The S3 backend.
pub const S3: BackendKind = BackendKind::new("s3", "s3", true, true, build);

fn build(ctx: BuildContext<'_>) -> Result<Box<dyn Driver>, FsError> {
    Ok(Box::new(ObjectDriver::new(
        "s3",
        Layout::Bucket,
        DirOps::NoOp,
        ctx.connect()?,
    )))
}

/// Register the backend for `s3`.
pub fn register(registry: &Registry) {
    registry.register("s3", S3);
}
