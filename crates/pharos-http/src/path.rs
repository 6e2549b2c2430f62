//! Single-segment path dispatch.
//!
//! [`shift_path`] is the routing primitive: it peels the first segment off a
//! URL path and re-roots the remainder, so each routing layer consumes
//! exactly one segment and hands the tail to the next. Services reuse it for
//! their own sub-routing.

/// Normalizes a URL path by purely lexical processing.
///
/// Collapses repeated separators, eliminates `.` segments, and resolves `..`
/// against the preceding segment (`..` above the root of a rooted path is
/// dropped; a relative path keeps leading `..` segments). The result has no
/// trailing separator and an empty result becomes `.`.
///
/// # Example
///
/// ```
/// use pharos_http::clean_path;
///
/// assert_eq!(clean_path("/a//b/./c"), "/a/b/c");
/// assert_eq!(clean_path("/a/../.."), "/");
/// assert_eq!(clean_path("a/../../b"), "../b");
/// ```
#[must_use]
pub fn clean_path(p: &str) -> String {
    if p.is_empty() {
        return ".".to_string();
    }
    let rooted = p.starts_with('/');

    let mut out: Vec<&str> = Vec::new();
    for segment in p.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|s| *s != "..") {
                    out.pop();
                } else if !rooted {
                    out.push("..");
                }
            }
            s => out.push(s),
        }
    }

    let joined = out.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Splits off the first component of `p`.
///
/// The path is cleaned of relative components first. `head` never contains a
/// separator and `tail` is always a rooted path without trailing separator.
/// Any string is valid input; there is no error path.
///
/// # Example
///
/// ```
/// use pharos_http::shift_path;
///
/// assert_eq!(shift_path("/a/b/c"), ("a".to_string(), "/b/c".to_string()));
/// assert_eq!(shift_path("/a"), ("a".to_string(), "/".to_string()));
/// assert_eq!(shift_path("/"), (String::new(), "/".to_string()));
/// ```
#[must_use]
pub fn shift_path(p: &str) -> (String, String) {
    if p.is_empty() {
        return (String::new(), "/".to_string());
    }
    let cleaned = clean_path(p);
    let trimmed = cleaned.strip_prefix('/').unwrap_or(&cleaned);
    match trimmed.find('/') {
        None => (trimmed.to_string(), "/".to_string()),
        Some(i) => (trimmed[..i].to_string(), trimmed[i..].to_string()),
    }
}
