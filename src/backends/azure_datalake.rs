//! Azure Data Lake backend for `adl://store/path` paths.
//!
//! The store name is the first path segment. It is passed to the client on
//! every call, never held as a "current store" on the instance, so one
//! instance can serve callers addressing different stores concurrently.
//! Returned paths are re-qualified with their store.
//!
//! The client rejects scheme-qualified paths, so the adapter strips `adl://`
//! before each call and restores it on the results.
//!
//! With the built-in connector each store is a Data Lake Gen2 filesystem (a
//! container) of the account named by the `account_name` option.

use super::object::{DirOps, Layout, ObjectDriver};
use crate::registry::BuildContext;
use crate::{BackendKind, Driver, FsError, Registry};

/// The Data Lake backend.
pub const ADL: BackendKind = BackendKind::new("adl", "adl", true, false, build);

fn build(ctx: BuildContext<'_>) -> Result<Box<dyn Driver>, FsError> {
    Ok(Box::new(ObjectDriver::new(
        "adl",
        Layout::Bucket,
        DirOps::NoOp,
        ctx.connect()?,
    )))
}

/// Register the backend for `adl`.
pub fn register(registry: &Registry) {
    registry.register("adl", ADL);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FsConfig, MemoryObjectClient, Resolver, SharedConnector};
    use crate::ObjectClient;

    #[test]
    fn stores_are_scoped_per_call() {
        let client = MemoryObjectClient::new();
        client.put_object("alpha", "data/a", b"1".to_vec()).unwrap();
        client.put_object("beta", "data/b", b"2".to_vec()).unwrap();

        let registry = Registry::empty();
        register(&registry);
        registry
            .install_connector("adl", SharedConnector::new(client))
            .unwrap();
        let resolver = Resolver::new(registry, FsConfig::new()).with_connection_cache();

        let fs = resolver.resolve("adl://alpha/data", None).unwrap();
        let alpha: Vec<String> = fs.ls("adl://alpha/data").unwrap().iter().map(ToString::to_string).collect();
        let beta: Vec<String> = fs.ls("adl://beta/data").unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(alpha, vec!["adl://alpha/data/a"]);
        assert_eq!(beta, vec!["adl://beta/data/b"]);
    }
}
