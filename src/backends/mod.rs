//! Built-in backends.
//!
//! The driver modules always compile, so any object-store backend can run on
//! a custom [`Connector`](crate::Connector). The `s3`, `gcs` and `azure`
//! features decide which backends
//! [`Registry::with_builtins`](crate::Registry::with_builtins) registers, each
//! with the [`cloud`] connector for its provider installed.

pub mod azure_blob;
pub mod azure_datalake;
#[cfg(feature = "cloud")]
pub mod cloud;
pub mod gcs;
pub mod local;
pub mod memory;
pub mod memory_client;
pub mod object;
pub mod s3;

use crate::{FsError, Registry};

/// Reject moving `from` onto itself or into its own subtree.
///
/// Both paths are normalized keys without surrounding `/`; the empty key is
/// the root and contains everything.
pub(crate) fn ensure_outside(from: &str, to: &str) -> Result<(), FsError> {
    let nested = from.is_empty()
        || to == from
        || to
            .strip_prefix(from)
            .is_some_and(|rest| rest.starts_with('/'));
    if nested {
        return Err(FsError::MoveIntoItself {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn register_builtins(registry: &Registry) {
    local::register(registry);
    memory::register(registry);
    #[cfg(feature = "s3")]
    {
        use cloud::{CloudConnector, Provider};
        s3::register(registry);
        registry.set_connector(&s3::S3, CloudConnector::new(Provider::S3, "s3"));
    }
    #[cfg(feature = "gcs")]
    {
        use cloud::{CloudConnector, Provider};
        gcs::register(registry);
        registry.set_connector(&gcs::GCS, CloudConnector::new(Provider::Gcs, "gs"));
    }
    #[cfg(feature = "azure")]
    {
        use cloud::{CloudConnector, Provider};
        azure_blob::register(registry);
        azure_datalake::register(registry);
        registry.set_connector(&azure_blob::ABFS, CloudConnector::new(Provider::Azure, "abfs"));
        registry.set_connector(
            &azure_datalake::ADL,
            CloudConnector::new(Provider::Azure, "adl"),
        );
    }
}
