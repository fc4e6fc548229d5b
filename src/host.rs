//! Host bundler contract
//!
//! The inliner never bundles, minifies or names output files itself. It asks
//! the host build pipeline to do so through [`PluginContext`], and reads the
//! results back from the [`OutputBundle`] the host produced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque reference issued by the host when a virtual unit is emitted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkHandle(String);

impl ChunkHandle {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChunkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request to compile a virtual unit as its own chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitChunk {
    /// Virtual id the host will pass back to `resolve_id` / `load`
    pub id: String,
    /// Preferred base name for the emitted file
    pub name: Option<String>,
    /// Whether the host should run its own minifier on this unit
    ///
    /// `false` when the content served by `load` is already minified by a
    /// custom function.
    pub minify: bool,
}

/// Errors reported by the host bundler
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    /// The handle was never issued, or the host dropped the unit
    #[error("unknown chunk handle: {0}")]
    UnknownHandle(String),

    /// The host refused to emit a unit
    #[error("host rejected chunk {id}: {reason}")]
    Rejected { id: String, reason: String },
}

/// Lifecycle services the host bundler exposes to plugins
///
/// Implementations are shared across phases and may be called from several
/// tasks, so they must be `Send + Sync`.
pub trait PluginContext: Send + Sync {
    /// Declare a virtual compilable unit and return a handle for it
    fn emit_chunk(&self, chunk: EmitChunk) -> Result<ChunkHandle, HostError>;

    /// Final output file name (relative to the output directory) for a handle
    ///
    /// Only meaningful once the host has finished producing its output.
    fn file_name(&self, handle: &ChunkHandle) -> Result<String, HostError>;
}

/// One file in the host's output description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChunk {
    pub file_name: String,
    pub code: String,
    /// Module id the chunk was built from, if any
    pub facade_module_id: Option<String>,
}

/// Output description produced by the host before it is written to disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBundle {
    chunks: BTreeMap<String, OutputChunk>,
}

impl OutputBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk keyed by its file name, replacing any previous entry
    pub fn insert(&mut self, chunk: OutputChunk) -> Option<OutputChunk> {
        self.chunks.insert(chunk.file_name.clone(), chunk)
    }

    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&OutputChunk> {
        self.chunks.get(file_name)
    }

    pub fn remove(&mut self, file_name: &str) -> Option<OutputChunk> {
        self.chunks.remove(file_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputChunk> {
        self.chunks.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl FromIterator<OutputChunk> for OutputBundle {
    fn from_iter<I: IntoIterator<Item = OutputChunk>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for chunk in iter {
            bundle.insert(chunk);
        }
        bundle
    }
}
