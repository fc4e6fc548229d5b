//! Script inlining functionality
//!
//! This module discovers classic `<script>` elements in a build's entry HTML,
//! obtains their final content (verbatim or through the host bundler's
//! minifier) and rewrites the document so each script is embedded inline.

// Sub-modules
pub mod classifier;
pub mod cleaner;
pub mod collector;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod rewriter;
pub mod tag_scanner;
pub mod types;

// Re-exports for public API
pub use classifier::{ScriptClass, ScriptClassifier};
pub use cleaner::{CleanReport, clean_artifacts};
pub use collector::collect;
pub use discovery::discover_scripts;
pub use error::{InlineResult, InlineScriptError};
pub use orchestrator::ScriptInliner;
pub use registry::{Registry, RegistryMode};
pub use rewriter::{RewriteOutcome, rewrite_html, rewrite_html_file};
pub use tag_scanner::{ScriptTag, TagAttribute, scan_script_tags};
pub use types::{
    InlineFailure, InlineReport, InlineStage, ResolvedScript, ScriptDescriptor, ScriptKind,
    ScriptOccurrence, ScriptState,
};
