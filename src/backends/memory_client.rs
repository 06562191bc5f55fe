//! In-process [`ObjectClient`] and a [`Connector`] that hands it out.
//!
//! Stands in for a vendor SDK in tests and offline tooling. Any object-store
//! backend can run on it:
//!
//! ```rust
//! use schemefs::{MemoryObjectClient, Registry, Resolver, FsConfig, SharedConnector};
//!
//! let registry = Registry::with_builtins();
//! let connector = SharedConnector::new(MemoryObjectClient::new());
//! registry.install_connector("s3", connector.clone())?;
//!
//! let resolver = Resolver::new(registry, FsConfig::new());
//! let fs = resolver.resolve("s3://bucket/key", None)?;
//! assert_eq!(fs.scheme(), "s3");
//! assert_eq!(connector.connections(), 1);
//! # Ok::<(), schemefs::FsError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::{Connector, FsError, ObjectClient, ObjectEntry, ObjectMeta, StorageOptions};

#[derive(Clone)]
struct StoredObject {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

impl StoredObject {
    fn meta(&self) -> ObjectMeta {
        ObjectMeta {
            size: self.data.len() as u64,
            last_modified: self.modified,
        }
    }
}

type Bucket = BTreeMap<String, StoredObject>;

/// Object storage held in memory.
///
/// `put_object` creates missing buckets.
#[derive(Default)]
pub struct MemoryObjectClient {
    buckets: RwLock<BTreeMap<String, Bucket>>,
}

impl MemoryObjectClient {
    /// An empty client with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket. Existing buckets are left as they are.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_string()).or_default();
    }

    /// Number of objects in `bucket`.
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, BTreeMap::len)
    }

    fn not_found(bucket: &str, key: &str) -> FsError {
        FsError::NotFound {
            path: format!("{bucket}/{key}"),
        }
    }
}

impl ObjectClient for MemoryObjectClient {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FsError> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|o| o.data.clone())
            .ok_or_else(|| Self::not_found(bucket, key))
    }

    fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), FsError> {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    data,
                    modified: Utc::now(),
                },
            );
        Ok(())
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, FsError> {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(StoredObject::meta))
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, FsError> {
        let buckets = self.buckets.read();
        let Some(objects) = buckets.get(bucket) else {
            return Ok(Vec::new());
        };
        let dir = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}/")
        };

        let mut entries = Vec::new();
        let mut prefixes = BTreeSet::new();
        for (key, object) in objects
            .range(dir.clone()..)
            .take_while(|(k, _)| k.starts_with(&dir))
        {
            let rest = &key[dir.len()..];
            match rest.split_once('/') {
                Some((child, _)) if !recursive => {
                    prefixes.insert(format!("{dir}{child}"));
                }
                _ => entries.push(ObjectEntry::Object {
                    key: key.clone(),
                    meta: object.meta(),
                }),
            }
        }
        entries.extend(prefixes.into_iter().map(ObjectEntry::Prefix));
        Ok(entries)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), FsError> {
        if let Some(objects) = self.buckets.write().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    fn copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<(), FsError> {
        let data = self.get_object(from_bucket, from_key)?;
        self.put_object(to_bucket, to_key, data)
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, FsError> {
        Ok(self.buckets.read().contains_key(bucket))
    }
}

/// Connector that returns the same client on every connect.
///
/// Clones share the client and the record of connect calls, so a handle kept
/// after [`Registry::install_connector`](crate::Registry::install_connector)
/// can inspect the options each instantiation received.
#[derive(Clone)]
pub struct SharedConnector {
    client: Arc<dyn ObjectClient>,
    seen: Arc<Mutex<Vec<StorageOptions>>>,
}

impl SharedConnector {
    /// Serve `client`.
    pub fn new(client: impl ObjectClient + 'static) -> Self {
        Self::from_arc(Arc::new(client))
    }

    /// Serve an already shared client.
    pub fn from_arc(client: Arc<dyn ObjectClient>) -> Self {
        Self {
            client,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of connect calls so far.
    pub fn connections(&self) -> usize {
        self.seen.lock().len()
    }

    /// Options passed to the most recent connect call.
    pub fn last_options(&self) -> Option<StorageOptions> {
        self.seen.lock().last().cloned()
    }
}

impl Connector for SharedConnector {
    fn connect(&self, options: &StorageOptions) -> Result<Arc<dyn ObjectClient>, FsError> {
        tracing::trace!(keys = ?options.keys().collect::<Vec<_>>(), "memory client connect");
        self.seen.lock().push(options.clone());
        Ok(Arc::clone(&self.client))
    }
}
