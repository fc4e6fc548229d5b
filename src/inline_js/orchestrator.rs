//! Phase orchestration for script inlining
//!
//! A build runs the phases in a fixed order, passing the registry from one
//! to the next by value:
//!
//! 1. [`ScriptInliner::build_start`] discovers scripts in the entry HTML and
//!    prepares the registry (direct reads or virtual unit registration).
//! 2. The host calls [`Registry::resolve_id`] and [`Registry::load`] while it
//!    processes the virtual units.
//! 3. [`ScriptInliner::generate_bundle`] collects emitted code from the
//!    host's output description.
//! 4. [`ScriptInliner::write_bundle`] rewrites the built HTML and deletes the
//!    emitted files.
//!
//! No phase can fail the build. Every problem ends up in the
//! [`InlineReport`] and the affected tag stays as it was.

use std::path::Path;

use super::classifier::ScriptClassifier;
use super::cleaner::clean_artifacts;
use super::discovery::discover_scripts;
use super::error::InlineScriptError;
use super::registry::{Registry, RegistryMode};
use super::rewriter::rewrite_html_file;
use super::types::{InlineFailure, InlineReport, InlineStage, ScriptDescriptor};
use crate::config::InlineScriptsConfig;
use crate::host::{OutputBundle, PluginContext};

/// Script inlining plugin
#[derive(Debug, Clone)]
pub struct ScriptInliner {
    config: InlineScriptsConfig,
    classifier: ScriptClassifier,
}

impl ScriptInliner {
    #[must_use]
    pub fn new(config: InlineScriptsConfig) -> Self {
        let classifier = ScriptClassifier::from_config(&config);
        Self { config, classifier }
    }

    #[must_use]
    pub fn config(&self) -> &InlineScriptsConfig {
        &self.config
    }

    /// Discover eligible scripts in a document, resolving files under the build root
    #[must_use]
    pub fn discover(&self, html: &str) -> Vec<ScriptDescriptor> {
        discover_scripts(html, self.config.root(), &self.classifier)
    }

    /// Phase 1: read the entry document, discover and prepare the registry
    ///
    /// An unreadable entry document yields an empty registry carrying one
    /// failure, so the rest of the build inlines nothing.
    pub async fn build_start(&self, ctx: Option<&dyn PluginContext>) -> Registry {
        let entry = self.config.entry_html();

        let html = match tokio::fs::read_to_string(&entry).await {
            Ok(html) => html,
            Err(source) => {
                let error = InlineScriptError::EntryUnreadable {
                    path: entry.clone(),
                    source,
                };
                log::warn!("{error}");
                let registry = Registry::empty(self.config.minify().clone());
                registry.report(InlineFailure::new(
                    entry.display().to_string(),
                    InlineStage::Entry,
                    &error,
                ));
                return registry;
            }
        };

        let descriptors = self.discover(&html);
        log::info!(
            "Found {} inlinable scripts in {}",
            descriptors.len(),
            entry.display()
        );
        Registry::prepare(descriptors, &self.config, ctx).await
    }

    /// Phase 3: collect emitted code once the host has produced its output
    #[must_use]
    pub fn generate_bundle(
        &self,
        registry: Registry,
        ctx: &dyn PluginContext,
        bundle: &OutputBundle,
    ) -> Registry {
        super::collector::collect(registry, ctx, bundle)
    }

    /// Phase 4: rewrite the built HTML in `out_dir`, then remove emitted files
    ///
    /// Cleanup runs even when the HTML cannot be rewritten, so no emitted
    /// file survives in the output tree.
    pub async fn write_bundle(&self, mut registry: Registry, out_dir: &Path) -> InlineReport {
        let html_path = out_dir.join(self.config.html_path());
        let mut report = InlineReport {
            html_path: html_path.clone(),
            ..InlineReport::default()
        };

        if !registry.is_empty() {
            match rewrite_html_file(&html_path, &registry).await {
                Ok(outcome) => {
                    report.successes = outcome.rewritten.len();
                    registry.mark_rewritten(&outcome.rewritten);
                    report.inlined = outcome.rewritten;
                }
                Err(e) => {
                    log::warn!("{e}");
                    registry.report(InlineFailure::new(
                        html_path.display().to_string(),
                        InlineStage::Rewrite,
                        &e,
                    ));
                }
            }
        }

        if registry.mode() == RegistryMode::Delegated {
            let cleaned = clean_artifacts(&registry, out_dir, self.config.manifest_paths()).await;
            report.removed_files = cleaned.removed;
            for failure in cleaned.failures {
                registry.report(failure);
            }
        }

        report.failures = registry.take_failures();
        if report.has_failures() {
            log::warn!(
                "Script inlining finished with {} of {} scripts failing",
                report.failed_scripts(),
                report.total()
            );
        }
        report
    }

    /// Inline scripts into an already-built output directory without a host
    ///
    /// `src` references resolve against `out_dir` and content is inlined
    /// verbatim.
    pub async fn inline_directory(&self, out_dir: &Path) -> InlineReport {
        let direct = ScriptInliner::new(self.config.direct_at(out_dir));
        let registry = direct.build_start(None).await;
        direct.write_bundle(registry, out_dir).await
    }
}
