//! Shell-style pattern matching over `/`-separated keys.
//!
//! | Token | Matches |
//! |-------|---------|
//! | `*` | any run of characters within one segment |
//! | `**` | any run of characters, across segments |
//! | `?` | one character other than `/` |
//! | `[abc]`, `[!abc]` | one character from (or not from) the set |
//!
//! Backends expand a pattern by listing from its [`literal_base`] and
//! filtering the candidates through a compiled [`Pattern`].

use std::collections::BTreeSet;

use regex::Regex;

use crate::FsError;

/// Returns `true` if `s` contains a glob metacharacter.
pub fn has_magic(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// The longest leading run of segments without metacharacters.
///
/// ```rust
/// use schemefs::glob::literal_base;
///
/// assert_eq!(literal_base("bucket/dir/*.csv"), "bucket/dir");
/// assert_eq!(literal_base("bucket/**/x"), "bucket");
/// assert_eq!(literal_base("*.csv"), "");
/// ```
pub fn literal_base(pattern: &str) -> &str {
    let mut end = 0;
    for (idx, segment) in segment_bounds(pattern) {
        if has_magic(segment) {
            break;
        }
        end = idx + segment.len();
    }
    &pattern[..end]
}

/// How many segments below its [`literal_base`] a pattern can reach, or
/// `None` if a `**` lets it match at any depth.
///
/// ```rust
/// use schemefs::glob::match_depth;
///
/// assert_eq!(match_depth("/data/*.csv"), Some(1));
/// assert_eq!(match_depth("/data/*/x.csv"), Some(2));
/// assert_eq!(match_depth("/data/**/x.csv"), None);
/// ```
pub fn match_depth(pattern: &str) -> Option<usize> {
    let rest = pattern[literal_base(pattern).len()..].trim_start_matches('/');
    if rest.contains("**") {
        return None;
    }
    Some(rest.split('/').filter(|s| !s.is_empty()).count())
}

fn segment_bounds(s: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    s.split('/').map(move |seg| {
        let start = offset;
        offset += seg.len() + 1;
        (start, seg)
    })
}

/// Every directory implied by a set of keys, excluding the empty root.
///
/// `a/b/c.txt` implies `a` and `a/b`.
pub fn implied_dirs<'a>(keys: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let mut dirs = BTreeSet::new();
    for key in keys {
        let mut end = 0;
        while let Some(pos) = key[end..].find('/') {
            end += pos;
            if end > 0 {
                dirs.insert(key[..end].to_string());
            }
            end += 1;
        }
    }
    dirs
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// - [`FsError::MalformedPath`] for an unterminated `[` set
    pub fn new(pattern: &str) -> Result<Self, FsError> {
        let translated = translate(pattern).ok_or_else(|| FsError::MalformedPath {
            path: pattern.to_string(),
            reason: "unterminated character set".into(),
        })?;
        let regex = Regex::new(&translated).map_err(|e| FsError::MalformedPath {
            path: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the whole of `candidate` matches.
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Keep the matching candidates, sorted and deduplicated.
    pub fn filter<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matched: BTreeSet<String> = candidates
            .into_iter()
            .filter(|c| self.matches(c.as_ref()))
            .map(|c| c.as_ref().to_string())
            .collect();
        matched.into_iter().collect()
    }
}

fn translate(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    out.push('^');
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                if chars.get(i) == Some(&'/') {
                    // `a/**/b` also matches `a/b`
                    out.push_str("(?:.*/)?");
                    i += 1;
                } else {
                    out.push_str(".*");
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let close = chars[i + 1..].iter().position(|&c| c == ']')? + i + 1;
                let body: String = chars[i + 1..close].iter().collect();
                out.push('[');
                match body.strip_prefix('!') {
                    Some(rest) => {
                        out.push('^');
                        out.push_str(&escape_class(rest));
                    }
                    None => out.push_str(&escape_class(&body)),
                }
                out.push(']');
                i = close;
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push('$');
    Some(out)
}

fn escape_class(body: &str) -> String {
    body.chars()
        .flat_map(|c| match c {
            '\\' | '[' | ']' | '^' | '&' | '~' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}
