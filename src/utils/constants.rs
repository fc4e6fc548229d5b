//! Shared configuration constants for script inlining
//!
//! This module contains default values and naming conventions used
//! throughout the codebase to ensure consistency and avoid magic strings.

/// Default entry HTML document, relative to the build root
pub const DEFAULT_HTML_PATH: &str = "index.html";

/// Prefix that namespaces every virtual unit handed to the host bundler.
///
/// The leading NUL byte is the bundler convention for ids that must never
/// be resolved against the file system by other plugins.
pub const VIRTUAL_ID_PREFIX: &str = "\0inline-script:";

/// Suffix appended to virtual ids so the host treats the unit as JavaScript
pub const VIRTUAL_ID_SUFFIX: &str = ".js";

/// Identity prefix for scripts loaded from a file under the build root
pub const FILE_IDENTITY_PREFIX: &str = "file:";

/// Identity prefix for scripts written directly inside the document
pub const INLINE_IDENTITY_PREFIX: &str = "inline:";

/// Extensions accepted for external-file scripts
///
/// Compared case-insensitively after any `?query` or `#fragment` is removed.
pub const DEFAULT_SCRIPT_EXTENSIONS: &[&str] = &[".js", ".cjs"];

/// Attributes whose semantics break when the script is inlined
///
/// - `async` / `defer`: loading order differs from an inline body
/// - `integrity`: the hash covers the external file, not the inlined text
/// - `crossorigin`: only meaningful for fetched resources
pub const DEFAULT_DISALLOWED_ATTRIBUTES: &[&str] = &["async", "defer", "integrity", "crossorigin"];

/// Source reference prefixes that mark a script as remote
pub const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "//"];

/// Manifest files pruned after emitted units are removed, relative to the output directory
pub const DEFAULT_MANIFEST_PATHS: &[&str] = &[".vite/manifest.json", "manifest.json"];
