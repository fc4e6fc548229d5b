pub mod config;
pub mod host;
pub mod inline_js;
pub mod utils;

pub use config::{InlineScriptsConfig, Minify};
pub use host::{ChunkHandle, EmitChunk, HostError, OutputBundle, OutputChunk, PluginContext};
pub use inline_js::{
    InlineFailure, InlineReport, InlineScriptError, InlineStage, Registry, RegistryMode,
    ScriptDescriptor, ScriptInliner, ScriptKind,
};

/// Inline every eligible script into an already-built output directory
///
/// Scripts are inlined verbatim; `src` references resolve against `out_dir`.
pub async fn inline_scripts(config: InlineScriptsConfig, out_dir: &std::path::Path) -> InlineReport {
    ScriptInliner::new(config).inline_directory(out_dir).await
}
