//! Error types for script inlining
//!
//! None of these abort a build. Each is attached to the script it concerns
//! and that script is left untouched in the output.

use std::path::PathBuf;
use thiserror::Error;

use crate::host::HostError;

/// Result type alias for inlining operations
pub type InlineResult<T> = Result<T, InlineScriptError>;

/// Error types for inlining operations
#[derive(Debug, Error)]
pub enum InlineScriptError {
    /// Entry HTML document could not be read
    #[error("Failed to read entry HTML {path}: {source}")]
    EntryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// External-file script could not be read
    #[error("Failed to read script {path}: {source}")]
    ScriptUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Script file is not valid UTF-8 text
    #[error("Script {0} is not valid UTF-8")]
    ScriptNotUtf8(PathBuf),

    /// Custom minify function returned an error
    #[error("Custom minifier failed for {identity}: {message}")]
    MinifyFailed { identity: String, message: String },

    /// Delegated mode was requested without a host plugin context
    #[error("Minification requires a host plugin context")]
    MissingHostContext,

    /// Host bundler rejected a request
    #[error("Host bundler error: {0}")]
    Host(#[from] HostError),

    /// Host reported a file name that is not in its output bundle
    #[error("Output bundle has no file named {0}")]
    MissingOutput(String),

    /// Built HTML artifact could not be read or written
    #[error("Failed to rewrite HTML {path}: {source}")]
    HtmlArtifact {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Emitted file could not be deleted
    #[error("Failed to remove emitted file {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Manifest could not be read, parsed or written
    #[error("Failed to prune manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
