//! Virtual resource registry
//!
//! Owns the descriptors of one build. In direct mode it resolves every
//! descriptor itself by reading files concurrently. In delegated mode it
//! registers each descriptor with the host as a virtual unit and answers the
//! host's `resolve_id` / `load` queries for those units.

use std::collections::HashMap;

use futures::future::join_all;
use parking_lot::Mutex;

use super::error::{InlineResult, InlineScriptError};
use super::types::{
    InlineFailure, InlineStage, ResolvedScript, ScriptDescriptor, ScriptKind,
};
use crate::config::{InlineScriptsConfig, Minify};
use crate::host::{EmitChunk, PluginContext};
use crate::utils::constants::VIRTUAL_ID_PREFIX;

/// How descriptors obtain their final content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMode {
    /// Raw content read by the registry
    Direct,
    /// Content produced by the host bundler
    Delegated,
}

/// Descriptor registry for one build
#[derive(Debug)]
pub struct Registry {
    mode: RegistryMode,
    minify: Minify,
    descriptors: Vec<ScriptDescriptor>,
    by_virtual_id: HashMap<String, usize>,
    /// Failures reported so far; extended by host-initiated `load` calls
    failures: Mutex<Vec<InlineFailure>>,
}

/// Read an external-file descriptor's source as UTF-8 text
async fn read_source(descriptor: &ScriptDescriptor) -> InlineResult<String> {
    if let Some(body) = descriptor.raw_content() {
        return Ok(body.to_string());
    }
    let Some(path) = descriptor.source_location() else {
        return Err(InlineScriptError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} has no source location", descriptor.identity()),
        )));
    };
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| InlineScriptError::ScriptUnreadable {
            path: path.clone(),
            source,
        })?;
    String::from_utf8(bytes).map_err(|_| InlineScriptError::ScriptNotUtf8(path.clone()))
}

/// Base name offered to the host for the emitted chunk
fn chunk_name(descriptor: &ScriptDescriptor) -> String {
    match descriptor.kind() {
        ScriptKind::ExternalFile => descriptor
            .source_location()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string()),
        ScriptKind::Inline => "inline-script".to_string(),
    }
}

impl Registry {
    /// Registry with no descriptors
    #[must_use]
    pub fn empty(minify: Minify) -> Self {
        let mode = if minify.is_delegated() {
            RegistryMode::Delegated
        } else {
            RegistryMode::Direct
        };
        Self {
            mode,
            minify,
            descriptors: Vec::new(),
            by_virtual_id: HashMap::new(),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Build the registry for one build and bring every descriptor out of `Discovered`
    ///
    /// Direct mode awaits all file reads before returning. Delegated mode
    /// emits one virtual unit per descriptor through `ctx`; without a context
    /// every descriptor is marked unresolved.
    pub async fn prepare(
        descriptors: Vec<ScriptDescriptor>,
        config: &InlineScriptsConfig,
        ctx: Option<&dyn PluginContext>,
    ) -> Self {
        let mut registry = Self::empty(config.minify().clone());
        registry.by_virtual_id = descriptors
            .iter()
            .enumerate()
            .map(|(index, d)| (d.virtual_id(), index))
            .collect();
        registry.descriptors = descriptors;

        match (registry.mode, ctx) {
            (RegistryMode::Direct, _) => registry.resolve_direct().await,
            (RegistryMode::Delegated, Some(ctx)) => registry.register_delegated(ctx),
            (RegistryMode::Delegated, None) => {
                for descriptor in &mut registry.descriptors {
                    let error = InlineScriptError::MissingHostContext;
                    log::warn!("Cannot inline {}: {error}", descriptor.identity());
                    registry
                        .failures
                        .get_mut()
                        .push(InlineFailure::new(descriptor.identity(), InlineStage::Register, &error));
                    descriptor.mark_unresolved(error.to_string());
                }
            }
        }

        log::debug!(
            "Registry prepared in {:?} mode with {} scripts",
            registry.mode,
            registry.descriptors.len()
        );
        registry
    }

    async fn resolve_direct(&mut self) {
        let reads = join_all(self.descriptors.iter().map(read_source)).await;

        let failures = self.failures.get_mut();
        for (descriptor, read) in self.descriptors.iter_mut().zip(reads) {
            match read {
                Ok(content) => {
                    descriptor.mark_ready(ResolvedScript {
                        content,
                        emitted_file: None,
                    });
                }
                Err(e) => {
                    log::warn!("Failed to read script {}: {e}", descriptor.identity());
                    failures.push(InlineFailure::new(descriptor.identity(), InlineStage::Read, &e));
                    descriptor.mark_unresolved(e.to_string());
                }
            }
        }
    }

    fn register_delegated(&mut self, ctx: &dyn PluginContext) {
        // A custom function already minified what `load` serves
        let host_minify = matches!(self.minify, Minify::Host);
        let failures = self.failures.get_mut();
        for descriptor in &mut self.descriptors {
            let chunk = EmitChunk {
                id: descriptor.virtual_id(),
                name: Some(chunk_name(descriptor)),
                minify: host_minify,
            };
            match ctx.emit_chunk(chunk) {
                Ok(handle) => {
                    log::debug!("Registered {} as chunk {handle}", descriptor.identity());
                    descriptor.mark_pending(handle);
                }
                Err(e) => {
                    log::warn!("Host refused to emit {}: {e}", descriptor.identity());
                    failures.push(InlineFailure::new(
                        descriptor.identity(),
                        InlineStage::Register,
                        &e,
                    ));
                    descriptor.mark_unresolved(e.to_string());
                }
            }
        }
    }

    /// Confirm that a virtual id belongs to this registry
    ///
    /// Returns the id to use for the subsequent `load` call.
    #[must_use]
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        if !id.starts_with(VIRTUAL_ID_PREFIX) {
            return None;
        }
        self.by_virtual_id.contains_key(id).then(|| id.to_string())
    }

    /// Serve a virtual unit's content to the host
    ///
    /// Returns `None` for ids this registry does not own. File content is read
    /// at load time; a read error is returned to the host so it never emits
    /// the unit. A failing custom minifier falls back to the raw content.
    pub async fn load(&self, id: &str) -> Option<InlineResult<String>> {
        let index = *self.by_virtual_id.get(id)?;
        let descriptor = &self.descriptors[index];

        let raw = match read_source(descriptor).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to load {}: {e}", descriptor.identity());
                self.report(InlineFailure::new(descriptor.identity(), InlineStage::Read, &e));
                return Some(Err(e));
            }
        };

        let Minify::Custom(minify) = &self.minify else {
            return Some(Ok(raw));
        };

        match minify(raw.clone()).await {
            Ok(minified) => Some(Ok(minified)),
            Err(e) => {
                let error = InlineScriptError::MinifyFailed {
                    identity: descriptor.identity().to_string(),
                    message: e.to_string(),
                };
                log::warn!("{error}; using unminified content");
                self.report(InlineFailure::new(descriptor.identity(), InlineStage::Minify, &error));
                Some(Ok(raw))
            }
        }
    }

    pub(crate) fn report(&self, failure: InlineFailure) {
        self.failures.lock().push(failure);
    }

    #[must_use]
    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    #[must_use]
    pub fn descriptors(&self) -> &[ScriptDescriptor] {
        &self.descriptors
    }

    pub(crate) fn descriptors_mut(&mut self) -> &mut [ScriptDescriptor] {
        &mut self.descriptors
    }

    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&ScriptDescriptor> {
        self.descriptors.iter().find(|d| d.identity() == identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Snapshot of failures reported so far
    #[must_use]
    pub fn failures(&self) -> Vec<InlineFailure> {
        self.failures.lock().clone()
    }

    pub(crate) fn take_failures(&mut self) -> Vec<InlineFailure> {
        std::mem::take(self.failures.get_mut())
    }

    /// Move `Ready` descriptors with the given identities to `Rewritten`
    pub(crate) fn mark_rewritten(&mut self, identities: &[String]) {
        for descriptor in &mut self.descriptors {
            if identities.iter().any(|id| id == descriptor.identity()) {
                descriptor.mark_rewritten();
            }
        }
    }
}
