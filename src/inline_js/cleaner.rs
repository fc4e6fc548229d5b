//! Artifact cleaner
//!
//! Deletes the files the host emitted for virtual units once their content
//! has been collected, and prunes manifest entries that reference them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use futures::future::join_all;
use serde_json::Value;

use super::error::InlineScriptError;
use super::registry::Registry;
use super::types::{InlineFailure, InlineStage};
use crate::utils::constants::VIRTUAL_ID_PREFIX;
use crate::utils::path_utils::resolve_under_root;

/// Outcome of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Emitted files deleted, relative to the output directory
    pub removed: Vec<String>,
    /// Manifest files that were rewritten
    pub pruned_manifests: Vec<PathBuf>,
    pub failures: Vec<InlineFailure>,
}

/// Delete every emitted file recorded in the registry, then prune manifests
///
/// Deletions run concurrently. Nothing here is fatal: each failure is
/// logged and returned in the report.
pub async fn clean_artifacts(
    registry: &Registry,
    out_dir: &Path,
    manifest_paths: &[PathBuf],
) -> CleanReport {
    let mut report = CleanReport::default();

    let mut seen = HashSet::new();
    let emitted: Vec<(String, String)> = registry
        .descriptors()
        .iter()
        .filter_map(|d| {
            d.emitted_file()
                .map(|file| (d.identity().to_string(), file.to_string()))
        })
        .filter(|(_, file)| seen.insert(file.clone()))
        .collect();

    if emitted.is_empty() {
        return report;
    }

    let deletions = join_all(emitted.iter().map(|(identity, file)| async move {
        let path = resolve_under_root(out_dir, file);
        let result = tokio::fs::remove_file(&path)
            .await
            .map_err(|source| InlineScriptError::Cleanup { path, source });
        (identity, file, result)
    }))
    .await;

    for (identity, file, result) in deletions {
        match result {
            Ok(()) => {
                log::debug!("Removed emitted file {file}");
                report.removed.push(file.clone());
            }
            Err(e) => {
                log::warn!("{e}");
                report
                    .failures
                    .push(InlineFailure::new(identity.as_str(), InlineStage::Cleanup, &e));
            }
        }
    }

    // Manifest entries go regardless of whether the physical delete succeeded
    let emitted_files: HashSet<&str> = emitted.iter().map(|(_, file)| file.as_str()).collect();
    for relative in manifest_paths {
        let path = out_dir.join(relative);
        match prune_manifest(&path, &emitted_files).await {
            Ok(true) => {
                log::debug!("Pruned inlined scripts from {}", path.display());
                report.pruned_manifests.push(path);
            }
            Ok(false) => {}
            Err(e) => {
                let error = InlineScriptError::Manifest {
                    path: path.clone(),
                    message: format!("{e:#}"),
                };
                log::warn!("{error}");
                report.failures.push(InlineFailure::new(
                    path.display().to_string(),
                    InlineStage::Manifest,
                    &error,
                ));
            }
        }
    }

    report
}

/// Remove manifest entries for emitted files; returns whether the manifest changed
///
/// A manifest that does not exist is not an error.
async fn prune_manifest(path: &Path, emitted_files: &HashSet<&str>) -> Result<bool> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e).context("Failed to read manifest"),
    };

    let mut manifest: Value = serde_json::from_str(&text).context("Manifest is not valid JSON")?;
    if !prune_manifest_value(&mut manifest, emitted_files)? {
        return Ok(false);
    }

    let serialized =
        serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    tokio::fs::write(path, serialized)
        .await
        .context("Failed to write manifest")?;
    Ok(true)
}

/// Prune an asset manifest object in place
///
/// Entries whose key is a virtual id, whose key names an emitted file, or
/// whose `file` field names an emitted file are removed, along with any
/// `imports` / `dynamicImports` references to the removed keys.
pub fn prune_manifest_value(manifest: &mut Value, emitted_files: &HashSet<&str>) -> Result<bool> {
    let entries = manifest
        .as_object_mut()
        .ok_or_else(|| anyhow!("Manifest root is not an object"))?;

    let removed_keys: Vec<String> = entries
        .iter()
        .filter(|(key, entry)| {
            key.starts_with(VIRTUAL_ID_PREFIX)
                || emitted_files.contains(key.as_str())
                || entry
                    .get("file")
                    .and_then(Value::as_str)
                    .is_some_and(|file| emitted_files.contains(file))
        })
        .map(|(key, _)| key.clone())
        .collect();

    if removed_keys.is_empty() {
        return Ok(false);
    }

    for key in &removed_keys {
        entries.remove(key);
    }

    for entry in entries.values_mut() {
        for field in ["imports", "dynamicImports"] {
            if let Some(list) = entry.get_mut(field).and_then(Value::as_array_mut) {
                list.retain(|item| {
                    item.as_str()
                        .is_none_or(|key| !removed_keys.iter().any(|removed| removed == key))
                });
            }
        }
    }

    Ok(true)
}
