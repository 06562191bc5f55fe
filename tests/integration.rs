//! End-to-end tests through the public API.
//!
//! Object-store backends run on the in-process `MemoryObjectClient`; local
//! tests use temporary directories.

use schemefs::*;
use std::io::{Read, Write};
use std::sync::Arc;

// =============================================================================
// Fixtures
// =============================================================================

/// A registry with every builtin plus one shared in-memory client installed
/// for each object-store backend compiled in.
struct Cloud {
    client: Arc<MemoryObjectClient>,
    connector: SharedConnector,
    config: FsConfig,
    resolver: Resolver,
}

impl Cloud {
    fn new() -> Self {
        Self::with_config(FsConfig::new())
    }

    fn with_config(config: FsConfig) -> Self {
        let client = Arc::new(MemoryObjectClient::new());
        let connector = SharedConnector::from_arc(client.clone());
        let registry = Registry::with_builtins();
        for scheme in ["s3", "gs", "abfs", "adl"] {
            if registry.contains(scheme) {
                registry
                    .install_connector(scheme, connector.clone())
                    .unwrap();
            }
        }
        let resolver = Resolver::new(registry, config.clone());
        Self {
            client,
            connector,
            config,
            resolver,
        }
    }

    fn put(&self, bucket: &str, key: &str, data: &[u8]) {
        self.client.put_object(bucket, key, data.to_vec()).unwrap();
    }
}

fn strings(paths: &[Path]) -> Vec<String> {
    paths.iter().map(ToString::to_string).collect()
}

// =============================================================================
// Local Disk
// =============================================================================

#[test]
fn local_only_registry_resolves_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::empty();
    backends::local::register(&registry);
    let resolver = Resolver::new(registry.clone(), FsConfig::new());

    let file = Path::parse_in(&format!("{}/data/out.txt", dir.path().display()), &registry).unwrap();
    assert!(!file.is_remote());

    let fs = resolver.resolve(&file, None).unwrap();
    assert!(!fs.is_remote());
    let mut w = fs.open(&file, OpenMode::Write).unwrap();
    w.write_all(b"hello").unwrap();
    w.flush().unwrap();
    drop(w);

    let mut text = String::new();
    fs.open(&file, OpenMode::Read)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "hello");

    match resolver.resolve("memory://x", None) {
        Err(FsError::UnknownScheme { available, .. }) => {
            assert_eq!(available, vec!["".to_string(), "file".to_string()]);
        }
        other => panic!("expected UnknownScheme, got {other:?}"),
    }
}

#[test]
fn local_outputs_never_carry_a_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let root = Path::from(dir.path());
    (&root / "a.csv").touch().unwrap();
    (&root / "b.txt").touch().unwrap();

    let listed = root.ls().unwrap();
    assert_eq!(listed.len(), 2);
    for p in &listed {
        assert!(!p.is_remote());
        assert!(!p.to_string().contains("://"));
    }
    let csv = (&root / "*.csv").glob().unwrap();
    assert_eq!(csv, vec![&root / "a.csv"]);
}

#[test]
fn local_remove_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let root = Path::from(dir.path());
    let nested = &root / "d";
    (&nested / "sub/f.txt").write_text("x").unwrap();

    let err = nested.remove(false).unwrap_err();
    assert!(err.io_kind().is_some());
    assert!(nested.exists().unwrap());

    nested.remove(true).unwrap();
    assert!(!nested.exists().unwrap());
    assert!(root.ls().unwrap().is_empty());
    assert!((&root / "missing").ls().unwrap().is_empty());
}

#[test]
fn put_and_get_move_bytes_between_backends() {
    let cloud = Cloud::new();
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("in.bin");
    std::fs::write(&local, b"bytes").unwrap();

    let fs = cloud.resolver.resolve("memory://transfer", None).unwrap();
    fs.put(&local, "memory://transfer/in.bin").unwrap();
    let back = dir.path().join("nested").join("out.bin");
    fs.get("memory://transfer/in.bin", &back).unwrap();
    assert_eq!(std::fs::read(back).unwrap(), b"bytes");
}

// =============================================================================
// Object Stores
// =============================================================================

#[cfg(feature = "s3")]
#[test]
fn s3_star_glob_matches_direct_children_only() {
    let cloud = Cloud::new();
    cloud.put("bucket", "a.csv", b"1");
    cloud.put("bucket", "b.csv", b"2");
    cloud.put("bucket", "c.txt", b"3");
    cloud.put("bucket", "nested/d.csv", b"4");

    let pattern = Path::parse("s3://bucket/*.csv").unwrap();
    let found = pattern.glob_with(&cloud.resolver).unwrap();
    assert_eq!(strings(&found), vec!["s3://bucket/a.csv", "s3://bucket/b.csv"]);
    assert!(found.iter().all(Path::is_remote));

    let deep = Path::parse("s3://bucket/**/*.csv").unwrap();
    assert_eq!(deep.glob_with(&cloud.resolver).unwrap().len(), 3);
}

#[cfg(feature = "s3")]
#[test]
fn config_is_overridden_without_mutation() {
    let config = FsConfig::new();
    config.set("s3", StorageOptions::new().with("key", "X").with("region", "eu"));
    let cloud = Cloud::with_config(config);

    let overrides = StorageOptions::new().with("key", "Y");
    let fs = cloud
        .resolver
        .resolve("s3://bucket/k", Some(&overrides))
        .unwrap();
    assert_eq!(fs.options().get_str("key"), Some("Y"));

    let seen = cloud.connector.last_options().unwrap();
    assert_eq!(seen.get_str("key"), Some("Y"));
    assert_eq!(seen.get_str("region"), Some("eu"));
    assert_eq!(cloud.config.get("s3").get_str("key"), Some("X"));
}

#[cfg(feature = "s3")]
#[test]
fn missing_connector_fails_only_on_instantiation() {
    let registry = Registry::empty();
    schemefs::backends::s3::register(&registry);
    let resolver = Resolver::new(registry, FsConfig::new());
    let p = Path::parse("s3://bucket/key").unwrap();
    assert!(p.is_remote());
    assert_eq!(resolver.backend_kind(&p).unwrap().name(), "s3");

    match resolver.resolve(&p, None) {
        Err(FsError::Connect { scheme, source, .. }) => {
            assert_eq!(scheme, "s3");
            assert!(matches!(*source, FsError::NoConnector { .. }));
        }
        other => panic!("expected Connect error, got {other:?}"),
    }
}

#[cfg(feature = "s3")]
#[test]
fn builtin_registry_connects_s3_through_object_store() {
    let resolver = Resolver::new(Registry::with_builtins(), FsConfig::new());
    let overrides = StorageOptions::new()
        .with("key", "AKIA")
        .with("secret", "shh")
        .with("region_name", "eu-west-1");
    let fs = resolver
        .resolve("s3://bucket/key", Some(&overrides))
        .unwrap();
    assert_eq!(fs.scheme(), "s3");
    assert_eq!(fs.options().get_str("region_name"), Some("eu-west-1"));
}

#[cfg(feature = "s3")]
#[test]
fn object_store_recursive_remove() {
    let cloud = Cloud::new();
    cloud.put("bk", "run/a", b"");
    cloud.put("bk", "run/b/c", b"");
    cloud.put("bk", "runs", b"");

    let run = Path::parse("s3://bk/run").unwrap();
    assert!(matches!(
        run.remove_with(false, &cloud.resolver),
        Err(FsError::DirectoryNotEmpty { .. })
    ));
    run.remove_with(true, &cloud.resolver).unwrap();
    assert!(!run.exists_with(&cloud.resolver).unwrap());
    assert_eq!(cloud.client.object_count("bk"), 1);
}

#[cfg(feature = "gcs")]
#[test]
fn gcs_alias_and_directory_policy() {
    let cloud = Cloud::new();
    cloud.put("bk", "x/y", b"z");

    let fs = cloud.resolver.resolve("gcs://bk/x", None).unwrap();
    assert_eq!(fs.scheme(), "gcs");
    assert_eq!(fs.kind().scheme(), "gs");
    assert!(fs.exists("gcs://bk/x/y").unwrap());
    assert!(matches!(
        fs.makedirs("gcs://bk/new", true),
        Err(FsError::Unsupported { operation: "makedirs", .. })
    ));
}

#[cfg(feature = "azure")]
#[test]
fn abfs_infers_account_and_requalifies_listings() {
    let cloud = Cloud::new();
    cloud.put("cont", "dir/f.parquet", b"");

    let fs = cloud
        .resolver
        .resolve("abfs://acct/cont/dir", None)
        .unwrap();
    assert_eq!(fs.options().get_str("account_name"), Some("acct"));
    assert_eq!(
        strings(&fs.ls("abfs://acct/cont/dir").unwrap()),
        vec!["abfs://acct/cont/dir/f.parquet"]
    );
}

#[cfg(feature = "azure")]
#[test]
fn abfs_malformed_paths_are_rejected() {
    let cloud = Cloud::new();
    assert!(matches!(
        cloud.resolver.resolve("abfs://acct", None),
        Err(FsError::MalformedPath { .. })
    ));

    let configured = FsConfig::new();
    configured.set("abfs", StorageOptions::new().with("account_name", "acct"));
    let cloud = Cloud::with_config(configured);
    let fs = cloud.resolver.resolve("abfs://acct/cont", None).unwrap();
    assert!(matches!(
        fs.ls("abfs://acct"),
        Err(FsError::MalformedPath { .. })
    ));
}

#[cfg(feature = "azure")]
#[test]
fn adl_paths_round_trip_through_strip_and_reattach() {
    let cloud = Cloud::new();
    let p = Path::parse("adl://store/dir/file.txt").unwrap();
    p.write_bytes_with(b"lake", &cloud.resolver).unwrap();
    assert_eq!(cloud.client.get_object("store", "dir/file.txt").unwrap(), b"lake");

    let listed = p.parent().ls_with(&cloud.resolver).unwrap();
    assert_eq!(listed, vec![p.clone()]);
    assert_eq!(listed[0].read_bytes_with(&cloud.resolver).unwrap(), b"lake");
}

// =============================================================================
// Memory Backend
// =============================================================================

#[test]
fn memory_prefix_exists_and_recursive_remove() {
    let root = Path::parse("memory://it-prefix").unwrap();
    (&root / "a/b/c.txt").write_text("c").unwrap();
    (&root / "a/d.txt").write_text("d").unwrap();

    assert!((&root / "a").exists().unwrap());
    assert!((&root / "a/b").exists().unwrap());
    assert!(!(&root / "a/b/c").exists().unwrap());

    (&root / "a").remove(true).unwrap();
    assert!(!(&root / "a").exists().unwrap());
    assert!((&root / "a").remove(true).unwrap_err().is_not_found());
}

#[test]
fn memory_outputs_keep_scheme_and_options() {
    let root = Path::parse("memory://it-opts")
        .unwrap()
        .with_storage_options(StorageOptions::new().with("tag", "blue"));
    (&root / "x").touch().unwrap();
    let listed = root.ls().unwrap();
    assert_eq!(strings(&listed), vec!["memory://it-opts/x"]);
    assert_eq!(
        listed[0].explicit_options().unwrap().get_str("tag"),
        Some("blue")
    );
}

// =============================================================================
// Resolver
// =============================================================================

#[cfg(feature = "s3")]
#[test]
fn connection_cache_reuses_instances_per_options() {
    let cloud = Cloud::new();
    let cached = cloud.resolver.clone().with_connection_cache();

    let a = cached.resolve("s3://bk/a", None).unwrap();
    let b = cached.resolve("s3://bk/b", None).unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(cloud.connector.connections(), 1);

    let other = StorageOptions::new().with("key", "other");
    let c = cached.resolve("s3://bk/a", Some(&other)).unwrap();
    assert!(!a.ptr_eq(&c));
    assert_eq!(cloud.connector.connections(), 2);

    let uncached = cloud.resolver.resolve("s3://bk/a", None).unwrap();
    assert!(!a.ptr_eq(&uncached));
}

#[test]
fn aspath_round_trips_every_builtin_kind() {
    let mut samples = vec!["/tmp/x/y.csv", "relative/z", "memory://root/k"];
    if Registry::global().contains("s3") {
        samples.push("s3://bucket/key/file.parquet");
    }
    if Registry::global().contains("adl") {
        samples.push("adl://store/a/b");
    }
    for s in samples {
        let p = aspath(s).unwrap();
        assert_eq!(aspath(p.to_string()).unwrap(), p, "{s}");
    }
}

// =============================================================================
// Directory Trees
// =============================================================================

#[test]
fn tree_set_root_cascades_to_nested_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let partitions = TreeSchema::builder().leaf("day", "{date}/part.csv").build();
    let schema = TreeSchema::builder()
        .leaf("flag", "_SUCCESS")
        .subtree_with_root("raw", "landing", partitions)
        .build();

    let mut tree = schema.bind("memory://it-tree/v1").unwrap();
    tree.set_root(dir.path()).unwrap();

    let day = tree.subtree("raw").unwrap().leaf("day").unwrap();
    assert!(!day.is_remote());
    let concrete = day.format(&[("date", "2024-01-01")]).unwrap();
    concrete.write_text("a,b").unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("landing/2024-01-01/part.csv")).unwrap(),
        "a,b"
    );
    assert_eq!(
        tree.leaf("flag").unwrap(),
        Path::from(dir.path().join("_SUCCESS"))
    );
}

// =============================================================================
// File Targets
// =============================================================================

#[cfg(feature = "s3")]
#[test]
fn file_target_writes_through_its_options() {
    let cloud = Cloud::new();
    let target = FileTarget::with_resolver(
        "s3://out/job/result.json",
        StorageOptions::new().with("key", "t"),
        cloud.resolver.clone(),
    )
    .unwrap();

    target.makedirs().unwrap();
    assert!(!target.exists().unwrap());
    target.fs().unwrap().driver().write_json(
        "s3://out/job/result.json",
        &serde_json::json!({"rows": 3}),
    )
    .unwrap();
    assert!(target.exists().unwrap());
    assert_eq!(cloud.connector.last_options().unwrap().get_str("key"), Some("t"));
}
