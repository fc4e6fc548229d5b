//! Bundle collector
//!
//! Runs once the host has produced its output description. Every pending
//! descriptor is looked up by handle and receives the emitted chunk's code.

use super::error::InlineScriptError;
use super::registry::Registry;
use super::types::{InlineFailure, InlineStage, ResolvedScript};
use crate::host::{OutputBundle, PluginContext};

/// Resolve every pending descriptor from the host's output bundle
///
/// A handle the host does not know, or a file name missing from the bundle,
/// leaves the descriptor unresolved and is reported.
#[must_use]
pub fn collect(mut registry: Registry, ctx: &dyn PluginContext, bundle: &OutputBundle) -> Registry {
    let mut failures = Vec::new();

    for descriptor in registry.descriptors_mut() {
        let Some(handle) = descriptor.pending_handle().cloned() else {
            continue;
        };

        let lookup = ctx
            .file_name(&handle)
            .map_err(InlineScriptError::from)
            .and_then(|file_name| {
                bundle
                    .get(&file_name)
                    .map(|chunk| chunk.code.clone())
                    .ok_or(InlineScriptError::MissingOutput(file_name.clone()))
                    .map(|code| (file_name, code))
            });

        match lookup {
            Ok((file_name, code)) => {
                log::debug!("Collected {} from {file_name}", descriptor.identity());
                descriptor.mark_ready(ResolvedScript {
                    content: code,
                    emitted_file: Some(file_name),
                });
            }
            Err(e) => {
                log::warn!("Failed to collect {}: {e}", descriptor.identity());
                failures.push(InlineFailure::new(descriptor.identity(), InlineStage::Collect, &e));
                descriptor.mark_unresolved(e.to_string());
            }
        }
    }

    for failure in failures {
        registry.report(failure);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InlineScriptsConfig, Minify};
    use crate::host::{ChunkHandle, EmitChunk, HostError, OutputChunk};
    use crate::inline_js::classifier::ScriptClassifier;
    use crate::inline_js::discovery::discover_scripts;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Host that names chunk `n` as `assets/chunk-n.js`
    #[derive(Default)]
    struct NamingHost {
        names: Mutex<HashMap<String, String>>,
    }

    impl PluginContext for NamingHost {
        fn emit_chunk(&self, _chunk: EmitChunk) -> Result<ChunkHandle, HostError> {
            let mut names = self.names.lock();
            let n = names.len();
            let handle = format!("ref-{n}");
            names.insert(handle.clone(), format!("assets/chunk-{n}.js"));
            Ok(ChunkHandle::new(handle))
        }

        fn file_name(&self, handle: &ChunkHandle) -> Result<String, HostError> {
            self.names
                .lock()
                .get(handle.as_str())
                .cloned()
                .ok_or_else(|| HostError::UnknownHandle(handle.to_string()))
        }
    }

    async fn pending_registry(host: &NamingHost, html: &str) -> Registry {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = InlineScriptsConfig::builder().root(dir.path()).build().unwrap();
        config.minify = Minify::Host;
        let descriptors = discover_scripts(html, dir.path(), &ScriptClassifier::default());
        Registry::prepare(descriptors, &config, Some(host)).await
    }

    #[tokio::test]
    async fn test_collects_code_and_file_name() {
        let host = NamingHost::default();
        let registry = pending_registry(&host, "<script>a( 1 )</script>").await;
        let bundle: OutputBundle = [OutputChunk {
            file_name: "assets/chunk-0.js".to_string(),
            code: "a(1)".to_string(),
            facade_module_id: None,
        }]
        .into_iter()
        .collect();

        let registry = collect(registry, &host, &bundle);

        let d = &registry.descriptors()[0];
        assert_eq!(d.resolved_content(), Some("a(1)"));
        assert_eq!(d.emitted_file(), Some("assets/chunk-0.js"));
        assert!(registry.failures().is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_leaves_descriptor_unresolved() {
        let host = NamingHost::default();
        let registry = pending_registry(&host, "<script>a()</script><script>b()</script>").await;
        let bundle: OutputBundle = [OutputChunk {
            file_name: "assets/chunk-1.js".to_string(),
            code: "b()".to_string(),
            facade_module_id: None,
        }]
        .into_iter()
        .collect();

        let registry = collect(registry, &host, &bundle);

        assert!(registry.descriptors()[0].is_unresolved());
        assert_eq!(registry.descriptors()[1].resolved_content(), Some("b()"));
        let failures = registry.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, InlineStage::Collect);
    }
}
