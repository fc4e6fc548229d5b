//! Type definitions for script inlining

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use super::tag_scanner::TagAttribute;
use crate::host::ChunkHandle;
use crate::utils::constants::{VIRTUAL_ID_PREFIX, VIRTUAL_ID_SUFFIX};

/// Where a script's content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptKind {
    ExternalFile,
    Inline,
}

impl std::fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptKind::ExternalFile => write!(f, "external file"),
            ScriptKind::Inline => write!(f, "inline"),
        }
    }
}

/// One tag in the document that refers to a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOccurrence {
    /// Verbatim `<script ...>...</script>` markup as found in the document
    pub markup: String,
    /// Attributes re-emitted on the inline tag (everything except `src`)
    pub attributes: Vec<TagAttribute>,
}

/// Final text of a script and, for delegated builds, the file the host emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScript {
    pub content: String,
    /// Output file name relative to the output directory
    pub emitted_file: Option<String>,
}

/// Lifecycle of a descriptor within one build
///
/// `Discovered → Pending | Ready | Unresolved`, `Pending → Ready | Unresolved`,
/// `Ready → Rewritten`. Nothing moves backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptState {
    Discovered,
    Pending(ChunkHandle),
    Ready(ResolvedScript),
    Unresolved(String),
    Rewritten(ResolvedScript),
}

/// One discovered script, deduplicated by identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub(crate) identity: String,
    pub(crate) kind: ScriptKind,
    pub(crate) source_location: Option<PathBuf>,
    pub(crate) raw_content: Option<String>,
    pub(crate) occurrences: Vec<ScriptOccurrence>,
    pub(crate) state: ScriptState,
}

impl ScriptDescriptor {
    pub(crate) fn external(identity: String, source_location: PathBuf) -> Self {
        Self {
            identity,
            kind: ScriptKind::ExternalFile,
            source_location: Some(source_location),
            raw_content: None,
            occurrences: Vec::new(),
            state: ScriptState::Discovered,
        }
    }

    pub(crate) fn inline(identity: String, body: String) -> Self {
        Self {
            identity,
            kind: ScriptKind::Inline,
            source_location: None,
            raw_content: Some(body),
            occurrences: Vec::new(),
            state: ScriptState::Discovered,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    #[must_use]
    pub fn source_location(&self) -> Option<&PathBuf> {
        self.source_location.as_ref()
    }

    #[must_use]
    pub fn raw_content(&self) -> Option<&str> {
        self.raw_content.as_deref()
    }

    #[must_use]
    pub fn occurrences(&self) -> &[ScriptOccurrence] {
        &self.occurrences
    }

    #[must_use]
    pub fn state(&self) -> &ScriptState {
        &self.state
    }

    /// Namespaced id under which this descriptor is offered to the host
    #[must_use]
    pub fn virtual_id(&self) -> String {
        format!("{VIRTUAL_ID_PREFIX}{}{VIRTUAL_ID_SUFFIX}", self.identity)
    }

    #[must_use]
    pub fn pending_handle(&self) -> Option<&ChunkHandle> {
        match &self.state {
            ScriptState::Pending(handle) => Some(handle),
            _ => None,
        }
    }

    /// Final content, available once the descriptor is ready or rewritten
    #[must_use]
    pub fn resolved_content(&self) -> Option<&str> {
        self.resolved().map(|r| r.content.as_str())
    }

    /// Output file emitted by the host for this descriptor, if any
    #[must_use]
    pub fn emitted_file(&self) -> Option<&str> {
        self.resolved().and_then(|r| r.emitted_file.as_deref())
    }

    fn resolved(&self) -> Option<&ResolvedScript> {
        match &self.state {
            ScriptState::Ready(resolved) | ScriptState::Rewritten(resolved) => Some(resolved),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self.state, ScriptState::Unresolved(_))
    }

    pub(crate) fn mark_pending(&mut self, handle: ChunkHandle) -> bool {
        if matches!(self.state, ScriptState::Discovered) {
            self.state = ScriptState::Pending(handle);
            true
        } else {
            false
        }
    }

    pub(crate) fn mark_ready(&mut self, resolved: ResolvedScript) -> bool {
        if matches!(self.state, ScriptState::Discovered | ScriptState::Pending(_)) {
            self.state = ScriptState::Ready(resolved);
            true
        } else {
            false
        }
    }

    pub(crate) fn mark_unresolved(&mut self, reason: impl Into<String>) -> bool {
        if matches!(self.state, ScriptState::Discovered | ScriptState::Pending(_)) {
            self.state = ScriptState::Unresolved(reason.into());
            true
        } else {
            false
        }
    }

    pub(crate) fn mark_rewritten(&mut self) -> bool {
        match std::mem::replace(&mut self.state, ScriptState::Discovered) {
            ScriptState::Ready(resolved) => {
                self.state = ScriptState::Rewritten(resolved);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }
}

/// Pipeline stage at which a script failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineStage {
    Entry,
    Read,
    Register,
    Minify,
    Collect,
    Rewrite,
    Cleanup,
    Manifest,
}

impl std::fmt::Display for InlineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InlineStage::Entry => "entry",
            InlineStage::Read => "read",
            InlineStage::Register => "register",
            InlineStage::Minify => "minify",
            InlineStage::Collect => "collect",
            InlineStage::Rewrite => "rewrite",
            InlineStage::Cleanup => "cleanup",
            InlineStage::Manifest => "manifest",
        };
        f.write_str(name)
    }
}

/// Error information for a script that could not be fully processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineFailure {
    /// Descriptor identity, or the path concerned for document-level failures
    pub identity: String,
    pub stage: InlineStage,
    pub error: String,
}

impl InlineFailure {
    pub(crate) fn new(identity: impl Into<String>, stage: InlineStage, error: impl ToString) -> Self {
        Self {
            identity: identity.into(),
            stage,
            error: error.to_string(),
        }
    }
}

/// Result of one build's inlining with success and failure tracking
///
/// `failures` holds one record per problem, so a script that fails at two
/// stages appears twice. The counts below are per script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineReport {
    /// Built HTML artifact that was rewritten
    pub html_path: PathBuf,
    /// Number of descriptors inlined into the document
    pub successes: usize,
    /// Identities of the inlined descriptors, in document order
    pub inlined: Vec<String>,
    pub failures: Vec<InlineFailure>,
    /// Emitted files deleted from the output directory
    pub removed_files: Vec<String>,
}

impl InlineReport {
    /// Number of distinct scripts (or documents) that were not inlined because of a failure
    ///
    /// A script that was inlined despite a failure (minifier fallback,
    /// leftover emitted file) is not counted.
    #[must_use]
    pub fn failed_scripts(&self) -> usize {
        self.failures
            .iter()
            .map(|f| f.identity.as_str())
            .filter(|identity| !self.inlined.iter().any(|id| id == identity))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Total number of scripts with an outcome
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes + self.failed_scripts()
    }

    /// Check if any failures occurred
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Share of scripts that were not inlined, between 0.0 and 1.0
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.failed_scripts() as f64 / total as f64
        }
    }

    /// Failures recorded at the given stage
    pub fn failures_at(&self, stage: InlineStage) -> impl Iterator<Item = &InlineFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ScriptDescriptor {
        ScriptDescriptor::inline("inline:0".to_string(), "a()".to_string())
    }

    fn resolved(content: &str) -> ResolvedScript {
        ResolvedScript {
            content: content.to_string(),
            emitted_file: None,
        }
    }

    #[test]
    fn test_state_never_regresses() {
        let mut d = descriptor();
        assert!(d.mark_pending(ChunkHandle::new("h1")));
        assert!(!d.mark_pending(ChunkHandle::new("h2")));
        assert!(d.mark_ready(resolved("a()")));
        assert!(!d.mark_ready(resolved("b()")));
        assert!(!d.mark_unresolved("late"));
        assert!(d.mark_rewritten());
        assert!(!d.mark_rewritten());
        assert_eq!(d.resolved_content(), Some("a()"));
    }

    #[test]
    fn test_unresolved_cannot_be_rewritten() {
        let mut d = descriptor();
        assert!(d.mark_unresolved("gone"));
        assert!(!d.mark_rewritten());
        assert!(d.is_unresolved());
        assert_eq!(d.resolved_content(), None);
    }

    #[test]
    fn test_virtual_id_is_namespaced() {
        assert_eq!(descriptor().virtual_id(), "\0inline-script:inline:0.js");
    }

    #[test]
    fn test_report_failure_rate() {
        let report = InlineReport {
            successes: 3,
            inlined: vec!["file:b.js".into(), "file:c.js".into(), "file:d.js".into()],
            failures: vec![InlineFailure::new("file:a.js", InlineStage::Read, "missing")],
            ..InlineReport::default()
        };
        assert_eq!(report.total(), 4);
        assert!(report.has_failures());
        assert!((report.failure_rate() - 0.25).abs() < f64::EPSILON);
        assert_eq!(report.failures_at(InlineStage::Read).count(), 1);
    }

    #[test]
    fn test_report_counts_each_script_once() {
        let report = InlineReport {
            successes: 2,
            inlined: vec!["file:b.js".into(), "inline:0".into()],
            failures: vec![
                InlineFailure::new("file:a.js", InlineStage::Read, "missing"),
                InlineFailure::new("file:a.js", InlineStage::Collect, "unknown handle"),
                // Inlined with raw content after the minifier failed
                InlineFailure::new("inline:0", InlineStage::Minify, "crashed"),
            ],
            ..InlineReport::default()
        };
        assert_eq!(report.failed_scripts(), 1);
        assert_eq!(report.total(), 3);
        assert!((report.failure_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
    }
}
