//! Script discovery
//!
//! Turns an HTML document into the ordered list of scripts eligible for
//! inlining. Discovery is pure: it never reads script files, so running it
//! twice on the same document yields the same descriptors.

use std::collections::HashMap;
use std::path::Path;

use xxhash_rust::xxh3::xxh3_64;

use super::classifier::{ScriptClass, ScriptClassifier, has_inline_body};
use super::tag_scanner::{ScriptTag, scan_script_tags};
use super::types::{ScriptDescriptor, ScriptOccurrence};
use crate::utils::constants::{FILE_IDENTITY_PREFIX, INLINE_IDENTITY_PREFIX};
use crate::utils::path_utils::{normalize_source_reference, resolve_under_root};

/// Identity for an inline script, derived from its body
#[must_use]
pub fn inline_identity(body: &str) -> String {
    format!("{INLINE_IDENTITY_PREFIX}{:016x}", xxh3_64(body.as_bytes()))
}

/// Identity for an external-file script, derived from its root-relative path
#[must_use]
pub fn file_identity(relative: &str) -> String {
    format!("{FILE_IDENTITY_PREFIX}{relative}")
}

/// Descriptor to create (or extend) for one eligible tag
enum Candidate {
    File { relative: String },
    Inline,
}

fn candidate_for(tag: &ScriptTag) -> Option<Candidate> {
    match tag.source() {
        Some(src) => match normalize_source_reference(src) {
            Some(relative) => Some(Candidate::File { relative }),
            None => {
                log::warn!("Skipping script with malformed source reference: {src:?}");
                None
            }
        },
        None if has_inline_body(tag) => Some(Candidate::Inline),
        None => None,
    }
}

/// Discover every eligible script in document order, deduplicated by identity
///
/// Tags referencing the same file, or inline tags with identical bodies,
/// collapse into one descriptor with one occurrence per tag.
#[must_use]
pub fn discover_scripts(
    html: &str,
    root: &Path,
    classifier: &ScriptClassifier,
) -> Vec<ScriptDescriptor> {
    let mut descriptors: Vec<ScriptDescriptor> = Vec::new();
    let mut by_identity: HashMap<String, usize> = HashMap::new();

    for tag in scan_script_tags(html) {
        let class = classifier.classify(&tag);
        if class != ScriptClass::Eligible {
            log::debug!("Leaving {class} script untouched: {}", tag.markup);
            continue;
        }

        let Some(candidate) = candidate_for(&tag) else {
            continue;
        };

        let occurrence = ScriptOccurrence {
            attributes: tag.preserved_attributes(),
            markup: tag.markup,
        };

        let identity = match &candidate {
            Candidate::File { relative } => file_identity(relative),
            Candidate::Inline => inline_identity(&tag.body),
        };

        let index = match by_identity.get(&identity) {
            Some(&index) => index,
            None => {
                let descriptor = match candidate {
                    Candidate::File { relative } => ScriptDescriptor::external(
                        identity.clone(),
                        resolve_under_root(root, &relative),
                    ),
                    Candidate::Inline => ScriptDescriptor::inline(identity.clone(), tag.body),
                };
                descriptors.push(descriptor);
                by_identity.insert(identity, descriptors.len() - 1);
                descriptors.len() - 1
            }
        };
        descriptors[index].occurrences.push(occurrence);
    }

    log::debug!("Discovered {} inlinable scripts", descriptors.len());
    descriptors
}
