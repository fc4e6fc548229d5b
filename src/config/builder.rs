//! Type-safe builder for `InlineScriptsConfig` using the typestate pattern
//!
//! The build root is the only required field; `build()` is not available
//! until it has been provided.

use anyhow::{Context, Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::minify::{BoxError, Minify};
use super::types::InlineScriptsConfig;
use crate::utils::constants::{
    DEFAULT_DISALLOWED_ATTRIBUTES, DEFAULT_HTML_PATH, DEFAULT_MANIFEST_PATHS,
    DEFAULT_SCRIPT_EXTENSIONS,
};

/// Normalise an extension to lowercase with a single leading dot
fn normalize_extension(extension: &str) -> Result<String> {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() || trimmed.contains(['/', '\\', '.']) {
        return Err(anyhow!("Invalid script extension '{extension}'"));
    }
    Ok(format!(".{}", trimmed.to_ascii_lowercase()))
}

// Type states for the builder
pub struct WithRoot;

pub struct InlineScriptsConfigBuilder<State = ()> {
    pub(crate) root: Option<PathBuf>,
    pub(crate) html_path: PathBuf,
    pub(crate) minify: Minify,
    pub(crate) script_extensions: Vec<String>,
    pub(crate) disallowed_attributes: Vec<String>,
    pub(crate) manifest_paths: Vec<PathBuf>,
    _state: PhantomData<State>,
}

impl Default for InlineScriptsConfigBuilder<()> {
    fn default() -> Self {
        Self {
            root: None,
            html_path: PathBuf::from(DEFAULT_HTML_PATH),
            minify: Minify::Off,
            script_extensions: DEFAULT_SCRIPT_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            disallowed_attributes: DEFAULT_DISALLOWED_ATTRIBUTES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            manifest_paths: DEFAULT_MANIFEST_PATHS.iter().map(PathBuf::from).collect(),
            _state: PhantomData,
        }
    }
}

impl InlineScriptsConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> InlineScriptsConfigBuilder<()> {
        InlineScriptsConfigBuilder::default()
    }
}

impl InlineScriptsConfigBuilder<()> {
    /// Set the build root that local `src` references resolve against
    pub fn root(self, dir: impl Into<PathBuf>) -> InlineScriptsConfigBuilder<WithRoot> {
        InlineScriptsConfigBuilder {
            root: Some(dir.into()),
            html_path: self.html_path,
            minify: self.minify,
            script_extensions: self.script_extensions,
            disallowed_attributes: self.disallowed_attributes,
            manifest_paths: self.manifest_paths,
            _state: PhantomData,
        }
    }
}

impl InlineScriptsConfigBuilder<WithRoot> {
    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be made absolute, the HTML path is
    /// empty or absolute, or an extension is malformed.
    pub fn build(self) -> Result<InlineScriptsConfig> {
        let root = self
            .root
            .ok_or_else(|| anyhow!("Build root is required"))?;
        let root = std::path::absolute(&root)
            .with_context(|| format!("Failed to resolve build root {}", root.display()))?;

        if self.html_path.as_os_str().is_empty() {
            return Err(anyhow!("HTML path must not be empty"));
        }
        if self.html_path.is_absolute() {
            return Err(anyhow!(
                "HTML path must be relative to the build root: {}",
                self.html_path.display()
            ));
        }

        let script_extensions = self
            .script_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .collect::<Result<Vec<_>>>()?;
        if script_extensions.is_empty() {
            return Err(anyhow!("At least one script extension is required"));
        }

        let disallowed_attributes = self
            .disallowed_attributes
            .iter()
            .map(|attr| attr.trim().to_ascii_lowercase())
            .filter(|attr| !attr.is_empty())
            .collect();

        Ok(InlineScriptsConfig {
            root,
            html_path: self.html_path,
            minify: self.minify,
            script_extensions,
            disallowed_attributes,
            manifest_paths: self.manifest_paths,
        })
    }
}

// Builder methods available at any state
impl<State> InlineScriptsConfigBuilder<State> {
    /// Location of the entry HTML document relative to the build root
    ///
    /// Default: `index.html`
    #[must_use]
    pub fn html_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.html_path = path.into();
        self
    }

    /// Enable or disable delegation to the host bundler's minifier
    #[must_use]
    pub fn minify(mut self, enabled: bool) -> Self {
        self.minify = Minify::from(enabled);
        self
    }

    /// Minify each script with a custom, possibly asynchronous, function
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_inline_scripts::config::{BoxError, InlineScriptsConfig};
    /// # fn main() -> anyhow::Result<()> {
    /// let config = InlineScriptsConfig::builder()
    ///     .root("./site")
    ///     .minify_with(|code: String| async move { Ok::<_, BoxError>(code.trim().to_string()) })
    ///     .build()?;
    /// assert!(config.minify().is_delegated());
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn minify_with<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = std::result::Result<String, BoxError>> + Send + 'static,
    {
        self.minify = Minify::custom(f);
        self
    }

    /// Replace the accepted script extensions
    ///
    /// Default: `.js`, `.cjs`
    #[must_use]
    pub fn script_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the attributes that exclude a tag from inlining
    ///
    /// Default: `async`, `defer`, `integrity`, `crossorigin`
    #[must_use]
    pub fn disallowed_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disallowed_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the manifest files pruned after cleanup
    ///
    /// Default: `.vite/manifest.json`, `manifest.json`
    #[must_use]
    pub fn manifest_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.manifest_paths = paths.into_iter().map(Into::into).collect();
        self
    }
}
