//! Placeholder detection and substitution.
//!
//! Placeholders follow the familiar format-string grammar: `{name}`, `{0}`
//! and the auto-numbered `{}`. `{{` and `}}` are literal braces. A format
//! specifier after `:` (as in `{n:03}`) is accepted and ignored.

use crate::FsError;

/// Returns `true` if `s` has a `{` followed later by a `}`.
///
/// ```rust
/// use schemefs::path::is_template;
///
/// assert!(is_template("/home/abc{}"));
/// assert!(!is_template("/home/abc{"));
/// assert!(!is_template("/home/abc}{"));
/// ```
pub fn is_template(s: &str) -> bool {
    match s.find('{') {
        Some(open) => s[open + 1..].contains('}'),
        None => false,
    }
}

/// Returns `true` if `s` contains `*` anywhere.
pub fn is_wildcard(s: &str) -> bool {
    s.contains('*')
}

/// Substitute placeholders in `template`.
///
/// Named placeholders are looked up in `named`; `{}` and `{N}` index into
/// `positional`.
///
/// # Errors
///
/// - [`FsError::Template`] if a placeholder has no value or a brace is
///   unbalanced
pub fn render(
    template: &str,
    named: &[(&str, &str)],
    positional: &[&str],
) -> Result<String, FsError> {
    let missing = |key: &str| FsError::Template {
        path: template.to_string(),
        key: key.to_string(),
    };

    let mut out = String::with_capacity(template.len());
    let mut auto_index = 0;
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            return Err(missing("}"));
        }
        let close = tail.find('}').ok_or_else(|| missing("{"))?;
        let field = &tail[1..close];
        let key = field.split(':').next().unwrap_or_default();
        let value = if key.is_empty() {
            let value = positional.get(auto_index).ok_or_else(|| missing(&auto_index.to_string()))?;
            auto_index += 1;
            *value
        } else if let Ok(idx) = key.parse::<usize>() {
            *positional.get(idx).ok_or_else(|| missing(key))?
        } else {
            named
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(|| missing(key))?
        };
        out.push_str(value);
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_detection() {
        assert!(is_template("s3://bucket/{date}/x.csv"));
        assert!(is_template("{}"));
        assert!(!is_template("s3://bucket/plain"));
    }

    #[test]
    fn wildcard_detection() {
        assert!(is_wildcard("s3://bucket/*"));
        assert!(is_wildcard("/data/**/x"));
        assert!(!is_wildcard("s3://bucket"));
    }

    #[test]
    fn renders_named_placeholders() {
        let out = render("s3://b/{date}/{name}.csv", &[("name", "x"), ("date", "2024")], &[])
            .unwrap();
        assert_eq!(out, "s3://b/2024/x.csv");
    }

    #[test]
    fn renders_positional_placeholders() {
        assert_eq!(render("/a/{}/{}", &[], &["1", "2"]).unwrap(), "/a/1/2");
        assert_eq!(render("/a/{1}/{0}", &[], &["x", "y"]).unwrap(), "/a/y/x");
    }

    #[test]
    fn format_specifier_is_ignored() {
        assert_eq!(render("/p/{n:03}", &[("n", "7")], &[]).unwrap(), "/p/7");
    }

    #[test]
    fn escaped_braces_are_literal() {
        assert_eq!(render("/a/{{x}}", &[], &[]).unwrap(), "/a/{x}");
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = render("/a/{who}", &[("other", "x")], &[]).unwrap_err();
        match err {
            FsError::Template { path, key } => {
                assert_eq!(path, "/a/{who}");
                assert_eq!(key, "who");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(render("/a/{}", &[], &[]).is_err());
        assert!(render("/a/{open", &[], &[]).is_err());
    }
}
