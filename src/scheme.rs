//! Scheme parsing helpers.
//!
//! A scheme is the short lowercase token in front of `://`. Paths without
//! `://` (POSIX paths, Windows drive paths) are local and carry the empty
//! scheme.

/// Separator between a scheme and the rest of a URI.
pub const SEPARATOR: &str = "://";

/// Scheme under which local-disk options are configured.
pub const LOCAL_CONFIG_KEY: &str = "file";

/// Extract the scheme of a path string.
///
/// Returns `""` when the string has no `://`, so a Windows path such as
/// `C:\data` is treated as local.
///
/// ```rust
/// assert_eq!(schemefs::scheme::protocol("s3://bucket/key"), "s3");
/// assert_eq!(schemefs::scheme::protocol("/home/user"), "");
/// assert_eq!(schemefs::scheme::protocol("C:\\data"), "");
/// ```
pub fn protocol(path: &str) -> &str {
    match path.find(SEPARATOR) {
        Some(idx) if is_scheme_token(&path[..idx]) => &path[..idx],
        _ => "",
    }
}

/// URI schemes are an ASCII letter followed by letters, digits, `+`, `-` or `.`.
fn is_scheme_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Remove a leading `scheme://` from a path, if present.
///
/// ```rust
/// use schemefs::scheme::strip_scheme;
///
/// assert_eq!(strip_scheme("/home"), "/home");
/// assert_eq!(strip_scheme("s3://home"), "home");
/// assert_eq!(strip_scheme("abfs://home/dir"), "home/dir");
/// ```
pub fn strip_scheme(path: &str) -> &str {
    let scheme = protocol(path);
    if scheme.is_empty() {
        path
    } else {
        &path[scheme.len() + SEPARATOR.len()..]
    }
}

/// Prefix a path with `scheme://` unless it already carries that scheme.
///
/// For remote schemes a leading `/` is dropped before prefixing. The empty
/// scheme is spelled `file` and keeps the path whole, root included.
///
/// ```rust
/// use schemefs::scheme::prepend_scheme;
///
/// assert_eq!(prepend_scheme("s3", "bucket/key"), "s3://bucket/key");
/// assert_eq!(prepend_scheme("s3", "/bucket/key"), "s3://bucket/key");
/// assert_eq!(prepend_scheme("s3", "s3://bucket/key"), "s3://bucket/key");
/// assert_eq!(prepend_scheme("", "/tmp/x"), "file:///tmp/x");
/// ```
pub fn prepend_scheme(scheme: &str, path: &str) -> String {
    let scheme = if scheme.is_empty() {
        LOCAL_CONFIG_KEY
    } else {
        scheme
    };
    if protocol(path) == scheme {
        return path.to_string();
    }
    if scheme == LOCAL_CONFIG_KEY {
        return format!("{scheme}{SEPARATOR}{path}");
    }
    let rest = path.strip_prefix('/').unwrap_or(path);
    format!("{scheme}{SEPARATOR}{rest}")
}

/// Key under which options for `scheme` live in the configuration.
pub fn config_key(scheme: &str) -> &str {
    if scheme.is_empty() {
        LOCAL_CONFIG_KEY
    } else {
        scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_of_remote_paths() {
        assert_eq!(protocol("gs://bucket"), "gs");
        assert_eq!(protocol("abfs://acct/cont/file"), "abfs");
        assert_eq!(protocol("memory://root/x"), "memory");
        assert_eq!(protocol("file://user/x.txt"), "file");
    }

    #[test]
    fn protocol_of_local_paths_is_empty() {
        assert_eq!(protocol("user/some_file.txt"), "");
        assert_eq!(protocol("/home/user"), "");
        assert_eq!(protocol(""), "");
    }

    #[test]
    fn protocol_ignores_separator_inside_path() {
        assert_eq!(protocol("/tmp/odd://name"), "");
        assert_eq!(protocol("://nothing"), "");
    }

    #[test]
    fn strip_keeps_local_paths() {
        assert_eq!(strip_scheme("relative/dir"), "relative/dir");
        assert_eq!(strip_scheme("memory://a/b"), "a/b");
    }

    #[test]
    fn prepend_handles_lookalike_bucket_names() {
        // A bucket named after the scheme must still get the prefix.
        assert_eq!(
            prepend_scheme("s3", "s3-test-bucket/dump/a.csv"),
            "s3://s3-test-bucket/dump/a.csv"
        );
    }

    #[test]
    fn prepend_empty_scheme_uses_file() {
        assert_eq!(prepend_scheme("", "/tmp/x"), "file:///tmp/x");
        assert_eq!(prepend_scheme("file", "rel/x"), "file://rel/x");
        assert_eq!(strip_scheme(&prepend_scheme("", "/tmp/x")), "/tmp/x");
    }

    #[test]
    fn config_key_normalizes_local() {
        assert_eq!(config_key(""), "file");
        assert_eq!(config_key("s3"), "s3");
    }
}
