//! # Cloud Clients
//!
//! [`ObjectClient`]s backed by the [`object_store`] crate, one
//! [`CloudConnector`] per provider. [`Registry::with_builtins`](crate::Registry::with_builtins)
//! installs them for every cloud backend compiled into the build:
//!
//! | Feature | Schemes | Store | Bucket argument |
//! |---------|---------|-------|-----------------|
//! | `s3` | `s3` | `AmazonS3` | bucket |
//! | `gcs` | `gs`, `gcs` | `GoogleCloudStorage` | bucket |
//! | `azure` | `abfs` | `MicrosoftAzure` | container of `account_name` |
//! | `azure` | `adl` | `MicrosoftAzure` | store, as a container of `account_name` |
//!
//! ## Options
//!
//! Each store starts from its builder's `from_env()` and then takes the
//! merged backend options. A nested object such as `client_kwargs` is
//! flattened one level. The short names below are renamed first; every key
//! is then parsed as the builder's own config key (`aws_region`,
//! `google_service_account`, `azure_storage_account_key`, ...). Keys the
//! builder does not know are skipped.
//!
//! | Provider | Option | Builder key |
//! |----------|--------|-------------|
//! | s3 | `key` / `secret` / `token` | `aws_access_key_id` / `aws_secret_access_key` / `aws_session_token` |
//! | s3 | `region_name`, `endpoint_url` | `aws_region`, `aws_endpoint` |
//! | gcs | `token` | `google_service_account` |
//! | azure | `tenant_id` | `azure_storage_tenant_id` |
//!
//! ## Blocking
//!
//! Calls run on a shared multi-threaded tokio runtime started on first use.
//! From inside a multi-threaded runtime the call blocks in place instead. A
//! current-thread runtime cannot block, so calls made from one fail with
//! [`FsError::Unsupported`].

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use futures::TryStreamExt;
use object_store::path::Path as StorePath;
use object_store::{ObjectMeta as StoreMeta, ObjectStore, PutPayload};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

use crate::{Connector, FsError, ObjectClient, ObjectEntry, ObjectMeta, StorageOptions};

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

fn runtime() -> Result<&'static Runtime, FsError> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("schemefs-cloud")
            .enable_all()
            .build()
            .map_err(|e| FsError::Config {
                details: format!("starting the object-store runtime: {e}"),
            })
    })
}

/// The object-store service behind a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Amazon S3 and S3-compatible endpoints.
    #[cfg(feature = "s3")]
    S3,
    /// Google Cloud Storage.
    #[cfg(feature = "gcs")]
    Gcs,
    /// Azure Blob Storage, including Data Lake Gen2 accounts.
    #[cfg(feature = "azure")]
    Azure,
}

impl Provider {
    fn aliases(self) -> &'static [(&'static str, &'static str)] {
        match self {
            #[cfg(feature = "s3")]
            Provider::S3 => &[
                ("key", "aws_access_key_id"),
                ("secret", "aws_secret_access_key"),
                ("token", "aws_session_token"),
                ("region_name", "aws_region"),
                ("endpoint_url", "aws_endpoint"),
            ],
            #[cfg(feature = "gcs")]
            Provider::Gcs => &[("token", "google_service_account")],
            #[cfg(feature = "azure")]
            Provider::Azure => &[("tenant_id", "azure_storage_tenant_id")],
        }
    }

    fn build(
        self,
        bucket: &str,
        config: &[(String, String)],
    ) -> object_store::Result<Arc<dyn ObjectStore>> {
        match self {
            #[cfg(feature = "s3")]
            Provider::S3 => {
                use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
                let mut builder = AmazonS3Builder::from_env();
                for (key, value) in parse_keys::<AmazonS3ConfigKey>(config) {
                    builder = builder.with_config(key, value);
                }
                Ok(Arc::new(builder.with_bucket_name(bucket).build()?))
            }
            #[cfg(feature = "gcs")]
            Provider::Gcs => {
                use object_store::gcp::{GoogleCloudStorageBuilder, GoogleConfigKey};
                let mut builder = GoogleCloudStorageBuilder::from_env();
                for (key, value) in parse_keys::<GoogleConfigKey>(config) {
                    builder = builder.with_config(key, value);
                }
                Ok(Arc::new(builder.with_bucket_name(bucket).build()?))
            }
            #[cfg(feature = "azure")]
            Provider::Azure => {
                use object_store::azure::{AzureConfigKey, MicrosoftAzureBuilder};
                let mut builder = MicrosoftAzureBuilder::from_env();
                for (key, value) in parse_keys::<AzureConfigKey>(config) {
                    builder = builder.with_config(key, value);
                }
                Ok(Arc::new(builder.with_container_name(bucket).build()?))
            }
        }
    }
}

fn parse_keys<K: FromStr>(config: &[(String, String)]) -> Vec<(K, String)> {
    config
        .iter()
        .filter_map(|(key, value)| match key.parse::<K>() {
            Ok(parsed) => Some((parsed, value.clone())),
            Err(_) => {
                tracing::trace!(key = %key, "option not understood by the store builder, skipped");
                None
            }
        })
        .collect()
}

/// Flatten merged options into builder `(key, value)` pairs.
///
/// Nested objects are flattened one level, `aliases` rename short keys and
/// `null` values are dropped.
pub(crate) fn builder_config(
    options: &StorageOptions,
    aliases: &[(&str, &str)],
) -> Vec<(String, String)> {
    let mut flat = Vec::new();
    for key in options.keys() {
        match options.get(key) {
            Some(Value::Object(nested)) => {
                for (inner, value) in nested {
                    push_scalar(&mut flat, inner, value);
                }
            }
            Some(value) => push_scalar(&mut flat, key, value),
            None => {}
        }
    }
    flat.into_iter()
        .map(|(key, value)| {
            let key = aliases
                .iter()
                .find(|(short, _)| *short == key)
                .map_or(key, |(_, long)| long.to_string());
            (key, value)
        })
        .collect()
}

fn push_scalar(out: &mut Vec<(String, String)>, key: &str, value: &Value) {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return,
    };
    out.push((key.to_string(), text));
}

/// Opens [`CloudClient`]s for one provider.
#[derive(Debug, Clone, Copy)]
pub struct CloudConnector {
    provider: Provider,
    scheme: &'static str,
}

impl CloudConnector {
    /// A connector for `provider`, reporting errors under `scheme`.
    pub fn new(provider: Provider, scheme: &'static str) -> Self {
        Self { provider, scheme }
    }
}

impl Connector for CloudConnector {
    fn connect(&self, options: &StorageOptions) -> Result<Arc<dyn ObjectClient>, FsError> {
        tracing::debug!(
            scheme = self.scheme,
            provider = ?self.provider,
            keys = ?options.keys().collect::<Vec<_>>(),
            "object_store connect"
        );
        Ok(Arc::new(CloudClient::new(self.provider, self.scheme, options)))
    }
}

/// An [`ObjectClient`] over `object_store` stores, one per bucket.
///
/// Stores are built lazily on the first call naming their bucket and reused
/// afterwards.
pub struct CloudClient {
    provider: Provider,
    scheme: &'static str,
    config: Vec<(String, String)>,
    stores: DashMap<String, Arc<dyn ObjectStore>>,
}

impl CloudClient {
    /// A client for `provider` configured from merged backend options.
    pub fn new(provider: Provider, scheme: &'static str, options: &StorageOptions) -> Self {
        Self {
            provider,
            scheme,
            config: builder_config(options, provider.aliases()),
            stores: DashMap::new(),
        }
    }

    /// Number of bucket stores built so far.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, FsError> {
        if let Some(store) = self.stores.get(bucket) {
            return Ok(Arc::clone(store.value()));
        }
        tracing::debug!(scheme = self.scheme, bucket, "building object store");
        let store = self
            .provider
            .build(bucket, &self.config)
            .map_err(|e| FsError::backend(self.scheme, e))?;
        Ok(Arc::clone(
            self.stores
                .entry(bucket.to_string())
                .or_insert(store)
                .value(),
        ))
    }

    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, FsError> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
            }
            Ok(_) => Err(FsError::Unsupported {
                scheme: self.scheme.to_string(),
                operation: "blocking I/O from a current-thread runtime",
            }),
            Err(_) => Ok(runtime()?.block_on(fut)),
        }
    }

    fn convert(&self, bucket: &str, key: &str, err: object_store::Error) -> FsError {
        match err {
            object_store::Error::NotFound { .. } => FsError::NotFound {
                path: format!("{bucket}/{key}"),
            },
            other => FsError::backend(self.scheme, other),
        }
    }
}

fn prefix_path(prefix: &str) -> Option<StorePath> {
    let prefix = prefix.trim_matches('/');
    (!prefix.is_empty()).then(|| StorePath::from(prefix))
}

fn meta(store_meta: &StoreMeta) -> ObjectMeta {
    ObjectMeta {
        size: store_meta.size,
        last_modified: store_meta.last_modified,
    }
}

impl ObjectClient for CloudClient {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FsError> {
        let store = self.store(bucket)?;
        let location = StorePath::from(key);
        self.block_on(async move {
            let result = store.get(&location).await?;
            result.bytes().await
        })?
        .map(|bytes| bytes.to_vec())
        .map_err(|e| self.convert(bucket, key, e))
    }

    fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), FsError> {
        let store = self.store(bucket)?;
        let location = StorePath::from(key);
        self.block_on(async move { store.put(&location, PutPayload::from(data)).await })?
            .map(|_| ())
            .map_err(|e| self.convert(bucket, key, e))
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, FsError> {
        let store = self.store(bucket)?;
        let location = StorePath::from(key);
        match self.block_on(async move { store.head(&location).await })? {
            Ok(found) => Ok(Some(meta(&found))),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(other) => Err(self.convert(bucket, key, other)),
        }
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, FsError> {
        let store = self.store(bucket)?;
        let location = prefix_path(prefix);
        let mut entries = if recursive {
            let listed = self.block_on(async move {
                store
                    .list(location.as_ref())
                    .try_collect::<Vec<StoreMeta>>()
                    .await
            })?;
            listed
                .map_err(|e| self.convert(bucket, prefix, e))?
                .iter()
                .map(|m| ObjectEntry::Object {
                    key: m.location.to_string(),
                    meta: meta(m),
                })
                .collect::<Vec<_>>()
        } else {
            let listed = self
                .block_on(async move { store.list_with_delimiter(location.as_ref()).await })?
                .map_err(|e| self.convert(bucket, prefix, e))?;
            let objects = listed.objects.iter().map(|m| ObjectEntry::Object {
                key: m.location.to_string(),
                meta: meta(m),
            });
            let prefixes = listed
                .common_prefixes
                .iter()
                .map(|p| ObjectEntry::Prefix(p.to_string()));
            objects.chain(prefixes).collect()
        };
        entries.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(entries)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), FsError> {
        let store = self.store(bucket)?;
        let location = StorePath::from(key);
        self.block_on(async move { store.delete(&location).await })?
            .map_err(|e| self.convert(bucket, key, e))
    }

    fn copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<(), FsError> {
        if from_bucket != to_bucket {
            let data = self.get_object(from_bucket, from_key)?;
            return self.put_object(to_bucket, to_key, data);
        }
        let store = self.store(from_bucket)?;
        let (from, to) = (StorePath::from(from_key), StorePath::from(to_key));
        self.block_on(async move { store.copy(&from, &to).await })?
            .map_err(|e| self.convert(from_bucket, from_key, e))
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, FsError> {
        let store = self.store(bucket)?;
        match self.block_on(async move { store.list_with_delimiter(None).await })? {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(other) => Err(self.convert(bucket, "", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_options_are_flattened_and_renamed() {
        let options = StorageOptions::new()
            .with("key", "AKIA")
            .with("anon", false)
            .with("retries", 3)
            .with("unset", Value::Null)
            .with(
                "client_kwargs",
                serde_json::json!({ "region_name": "eu-west-1", "endpoint_url": "http://minio:9000" }),
            );
        let aliases = [("key", "aws_access_key_id"), ("region_name", "aws_region")];
        let mut config = builder_config(&options, &aliases);
        config.sort();
        assert_eq!(
            config,
            vec![
                ("anon".to_string(), "false".to_string()),
                ("aws_access_key_id".to_string(), "AKIA".to_string()),
                ("aws_region".to_string(), "eu-west-1".to_string()),
                ("endpoint_url".to_string(), "http://minio:9000".to_string()),
                ("retries".to_string(), "3".to_string()),
            ]
        );
    }

    #[cfg(feature = "s3")]
    #[test]
    fn s3_aliases_name_real_builder_keys() {
        use object_store::aws::AmazonS3ConfigKey;
        for (_, long) in Provider::S3.aliases() {
            assert!(long.parse::<AmazonS3ConfigKey>().is_ok(), "{long}");
        }
        let parsed = parse_keys::<AmazonS3ConfigKey>(&[
            ("aws_region".to_string(), "eu-west-1".to_string()),
            ("auto_mkdir".to_string(), "true".to_string()),
        ]);
        assert_eq!(parsed.len(), 1);
    }

    #[cfg(feature = "gcs")]
    #[test]
    fn gcs_aliases_name_real_builder_keys() {
        use object_store::gcp::GoogleConfigKey;
        for (_, long) in Provider::Gcs.aliases() {
            assert!(long.parse::<GoogleConfigKey>().is_ok(), "{long}");
        }
    }

    #[cfg(feature = "azure")]
    #[test]
    fn azure_accepts_drfs_style_option_names() {
        use object_store::azure::AzureConfigKey;
        for (_, long) in Provider::Azure.aliases() {
            assert!(long.parse::<AzureConfigKey>().is_ok(), "{long}");
        }
        for key in ["account_name", "account_key", "client_id", "client_secret"] {
            assert!(key.parse::<AzureConfigKey>().is_ok(), "{key}");
        }
    }

    #[cfg(feature = "s3")]
    #[test]
    fn s3_stores_are_built_once_per_bucket() {
        let options = StorageOptions::new()
            .with("key", "AKIA")
            .with("secret", "shh")
            .with("region_name", "eu-west-1");
        let client = CloudClient::new(Provider::S3, "s3", &options);
        assert_eq!(client.store_count(), 0);
        client.store("alpha").unwrap();
        client.store("alpha").unwrap();
        client.store("beta").unwrap();
        assert_eq!(client.store_count(), 2);
    }

    #[cfg(feature = "s3")]
    #[test]
    fn connecting_does_not_touch_the_network() {
        let connector = CloudConnector::new(Provider::S3, "s3");
        assert!(connector.connect(&StorageOptions::new()).is_ok());
    }
}
