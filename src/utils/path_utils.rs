//! Path utilities for turning `src` attributes into build-root relative paths
//!
//! Source references found in HTML are URL paths, not file system paths:
//! they may carry a query string, a fragment, or percent-encoded bytes.
//! These helpers normalise them once so identity and file lookup agree.

use std::path::{Path, PathBuf};

/// Strip any `?query` and `#fragment` suffix from a source reference
#[must_use]
pub fn strip_query_and_fragment(src: &str) -> &str {
    let end = src.find(['?', '#']).unwrap_or(src.len());
    &src[..end]
}

/// Normalise a local source reference into a `/`-separated path relative to the build root
///
/// One leading `/` is stripped, `.` segments are dropped and `..` segments are
/// folded. Returns `None` when the reference is empty, is not valid
/// percent-encoded UTF-8, or climbs above the root.
///
/// # Examples
/// ```
/// use kodegen_tools_inline_scripts::utils::normalize_source_reference;
///
/// assert_eq!(normalize_source_reference("/js/app.js?v=2").as_deref(), Some("js/app.js"));
/// assert_eq!(normalize_source_reference("./lib/../a%20b.js").as_deref(), Some("a b.js"));
/// assert_eq!(normalize_source_reference("../outside.js"), None);
/// ```
#[must_use]
pub fn normalize_source_reference(src: &str) -> Option<String> {
    let path = strip_query_and_fragment(src.trim());
    let path = path.strip_prefix('/').unwrap_or(path);
    let decoded = urlencoding::decode(path).ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Join a normalised relative reference onto the build root
#[must_use]
pub fn resolve_under_root(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
