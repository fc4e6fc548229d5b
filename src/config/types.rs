//! Core configuration types for script inlining
//!
//! This module contains the `InlineScriptsConfig` struct that defines which
//! scripts are in scope, where the entry document lives and how script
//! content is minified.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::minify::Minify;

/// Main configuration struct for script inlining
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineScriptsConfig {
    /// Build root that local `src` references resolve against.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) root: PathBuf,

    /// Entry HTML document, relative to the build root and to the output directory
    pub(crate) html_path: PathBuf,

    /// `false`, `true`, or a custom function (not serialized)
    #[serde(default)]
    pub(crate) minify: Minify,

    /// Accepted script extensions, lowercase with a leading dot
    pub(crate) script_extensions: Vec<String>,

    /// Attributes that exclude a tag from inlining, lowercase
    pub(crate) disallowed_attributes: Vec<String>,

    /// Manifest files pruned after emitted units are deleted,
    /// relative to the output directory
    pub(crate) manifest_paths: Vec<PathBuf>,
}
