//! Minification strategy for inlined scripts
//!
//! `Off` inlines file and body content verbatim. `Host` hands every script to
//! the host bundler as a virtual unit so its configured minifier runs.
//! `Custom` also goes through the host, but the plugin applies the supplied
//! function when the host loads the unit.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error type returned by custom minify functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a custom minify function
pub type MinifyFuture = Pin<Box<dyn Future<Output = Result<String, BoxError>> + Send>>;

/// Shared custom minify function
pub type MinifyFn = Arc<dyn Fn(String) -> MinifyFuture + Send + Sync>;

#[derive(Clone, Default)]
pub enum Minify {
    /// Inline raw content
    #[default]
    Off,
    /// Delegate to the host bundler's minifier
    Host,
    /// Apply a custom function to each script when the host loads it
    Custom(MinifyFn),
}

impl Minify {
    /// Wrap a (possibly asynchronous) function as a custom minifier
    ///
    /// # Example
    /// ```rust
    /// use kodegen_tools_inline_scripts::config::{BoxError, Minify};
    ///
    /// let minify = Minify::custom(|code: String| async move {
    ///     Ok::<_, BoxError>(code.lines().map(str::trim).collect::<Vec<_>>().join(""))
    /// });
    /// assert!(minify.is_delegated());
    /// ```
    pub fn custom<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, BoxError>> + Send + 'static,
    {
        Minify::Custom(Arc::new(move |code| Box::pin(f(code))))
    }

    /// Whether scripts are routed through the host bundler as virtual units
    #[must_use]
    pub fn is_delegated(&self) -> bool {
        !matches!(self, Minify::Off)
    }
}

impl From<bool> for Minify {
    fn from(enabled: bool) -> Self {
        if enabled { Minify::Host } else { Minify::Off }
    }
}

impl std::fmt::Debug for Minify {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Minify::Off => write!(f, "Off"),
            Minify::Host => write!(f, "Host"),
            Minify::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

// Serialized as the boolean option users write in configuration files.
// A custom function has no serialized form and is written as `true`.
impl Serialize for Minify {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_delegated())
    }
}

impl<'de> Deserialize<'de> for Minify {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bool::deserialize(deserializer).map(Minify::from)
    }
}
