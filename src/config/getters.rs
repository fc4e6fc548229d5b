//! Getter methods for `InlineScriptsConfig`

use std::path::{Path, PathBuf};

use super::minify::Minify;
use super::types::InlineScriptsConfig;

impl InlineScriptsConfig {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn html_path(&self) -> &Path {
        &self.html_path
    }

    /// Absolute path of the entry document inside the build root
    #[must_use]
    pub fn entry_html(&self) -> PathBuf {
        self.root.join(&self.html_path)
    }

    #[must_use]
    pub fn minify(&self) -> &Minify {
        &self.minify
    }

    #[must_use]
    pub fn script_extensions(&self) -> &[String] {
        &self.script_extensions
    }

    #[must_use]
    pub fn disallowed_attributes(&self) -> &[String] {
        &self.disallowed_attributes
    }

    #[must_use]
    pub fn manifest_paths(&self) -> &[PathBuf] {
        &self.manifest_paths
    }

    /// Copy of this configuration rooted elsewhere with minification off
    ///
    /// Used when post-processing an already-built output directory, where
    /// `src` references resolve against the output tree itself.
    #[must_use]
    pub fn direct_at(&self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            minify: Minify::Off,
            ..self.clone()
        }
    }
}
