//! Path matcher: one compiled pattern per route.
//!
//! A pattern is a sequence of `/`-separated segments. Each segment is either
//! a literal that must match exactly or a named placeholder that matches any
//! single non-empty segment. Three placeholder spellings are accepted and
//! normalised to matchit's `{name}` form:
//!
//! ```text
//! /comments/{docid}      matchit style
//! /comments/:docid       colon style
//! /comments/(:docid)     parenthesised colon style
//! ```
//!
//! Each matcher owns a single-entry [`matchit`] tree, so a route's lookup is
//! O(path-length) and the router keeps full control over ordering.
//!
//! Matching runs on the raw path. Bound values are percent-decoded afterwards,
//! so `/comments/doc%2F1` binds `docid = "doc/1"` and never an extra segment.
//! A value with a malformed escape or non-UTF-8 bytes is bound raw.

use std::collections::HashMap;

use matchit::Router as MatchitRouter;

use crate::error::Error;
use crate::method::Method;

/// Variables extracted from a matched path, keyed by placeholder name.
pub type PathVariables = HashMap<String, String>;

/// A compiled `(method, pattern)` pair.
pub struct PathMatcher {
    method: Method,
    pattern: String,
    tree: MatchitRouter<()>,
}

impl PathMatcher {
    /// Compiles `pattern` for `method`.
    ///
    /// Fails on patterns that do not start with `/`, contain empty segments,
    /// mix literals and placeholders within one segment, use catch-all
    /// placeholders, or repeat a placeholder name.
    pub fn new(method: Method, pattern: &str) -> Result<Self, Error> {
        let normalised = normalise(pattern)?;
        let mut tree = MatchitRouter::new();
        tree.insert(normalised.as_str(), ()).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { method, pattern: normalised, tree })
    }

    pub fn method(&self) -> Method { self.method }

    /// The pattern in normalised `{name}` form.
    pub fn pattern(&self) -> &str { &self.pattern }

    /// Matches a request line.
    ///
    /// Returns `None` when the method differs, the segment count differs, a
    /// literal differs, or a placeholder would bind an empty segment. Total
    /// over all inputs. Bound values are percent-decoded.
    pub fn match_path(&self, method: Method, path: &str) -> Option<PathVariables> {
        if method != self.method {
            return None;
        }
        let matched = self.tree.at(path).ok()?;
        let mut variables = PathVariables::new();
        for (name, value) in matched.params.iter() {
            if value.is_empty() {
                return None;
            }
            variables.insert(name.to_owned(), percent_decode(value));
        }
        Some(variables)
    }
}

impl std::fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathMatcher")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish()
    }
}

fn normalise(pattern: &str) -> Result<String, Error> {
    let invalid = |reason: &str| Error::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: reason.to_owned(),
    };

    let Some(rest) = pattern.strip_prefix('/') else {
        return Err(invalid("must start with `/`"));
    };
    if rest.is_empty() {
        return Ok("/".to_owned());
    }

    let mut out = String::with_capacity(pattern.len());
    let mut names: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        if segment.is_empty() {
            return Err(invalid("empty segment"));
        }
        out.push('/');
        match placeholder_name(segment) {
            Some(name) => {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                    return Err(invalid("placeholder names must be non-empty identifiers"));
                }
                if names.contains(&name) {
                    return Err(invalid("duplicate placeholder name"));
                }
                names.push(name);
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            None => {
                if segment.contains(['{', '}', '(', ')', ':', '*']) {
                    return Err(invalid("placeholders must span a whole segment"));
                }
                out.push_str(segment);
            }
        }
    }
    Ok(out)
}

/// Decodes `%XX` escapes. Falls back to `raw` on a malformed escape or
/// when the decoded bytes are not UTF-8.
fn percent_decode(raw: &str) -> String {
    if !raw.contains('%') {
        return raw.to_owned();
    }
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)
                .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            let Some(byte) = hex else {
                return raw.to_owned();
            };
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).unwrap_or_else(|_| raw.to_owned())
}

fn placeholder_name(segment: &str) -> Option<&str> {
    if let Some(inner) = segment.strip_prefix("(:").and_then(|s| s.strip_suffix(')')) {
        return Some(inner);
    }
    if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return Some(inner);
    }
    segment.strip_prefix(':')
}
