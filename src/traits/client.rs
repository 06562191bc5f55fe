//! Vendor-client seam for object-store backends.
//!
//! The S3, GCS, Azure Blob and Azure Data Lake drivers never talk to a
//! cloud SDK directly. They drive an [`ObjectClient`], obtained from a
//! [`Connector`] installed on the [`Registry`](crate::Registry). The built-in
//! connectors wrap the `object_store` crate.
//!
//! ```text
//! Resolver ──▶ Connector::connect(options) ──▶ Arc<dyn ObjectClient>
//!                                                   │
//!                              ObjectDriver ◀───────┘
//! ```
//!
//! Every call names its bucket (or container, or store) explicitly. A client
//! carries no "current bucket" state, so one client can serve callers that
//! address different buckets at the same time.

use std::sync::Arc;

use crate::{FsError, ObjectEntry, ObjectMeta, StorageOptions};

/// Flat key/value object storage.
///
/// Keys are `/`-separated and never start with `/`. A *prefix* names a
/// directory: `list_objects(bucket, "a/b", ..)` lists keys under `a/b/`,
/// and the empty prefix lists the whole bucket.
///
/// Errors from the vendor are returned as [`FsError::Backend`] and reach the
/// caller untouched.
pub trait ObjectClient: Send + Sync {
    /// Fetch an object's bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] (or a vendor error) if the key is missing
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FsError>;

    /// Store an object, replacing any previous version.
    fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), FsError>;

    /// Metadata of an object, or `None` if the key does not exist.
    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, FsError>;

    /// List keys under `prefix`.
    ///
    /// Non-recursive listings return the direct child objects plus one
    /// [`ObjectEntry::Prefix`] per child "directory". Recursive listings
    /// return every object below the prefix and no prefixes.
    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, FsError>;

    /// Delete an object.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), FsError>;

    /// Server-side copy.
    fn copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<(), FsError>;

    /// Returns `true` if the bucket exists.
    fn bucket_exists(&self, bucket: &str) -> Result<bool, FsError>;
}

/// Builds an [`ObjectClient`] from merged backend options.
///
/// Credentials, endpoints and timeouts (`key`, `secret`, `account_name`,
/// `read_timeout`, ...) arrive in `options` exactly as the resolver merged
/// them. Closures with the matching signature are connectors too.
pub trait Connector: Send + Sync {
    /// Open a client.
    fn connect(&self, options: &StorageOptions) -> Result<Arc<dyn ObjectClient>, FsError>;
}

impl<F> Connector for F
where
    F: Fn(&StorageOptions) -> Result<Arc<dyn ObjectClient>, FsError> + Send + Sync,
{
    fn connect(&self, options: &StorageOptions) -> Result<Arc<dyn ObjectClient>, FsError> {
        self(options)
    }
}
