//! HTML rewriter
//!
//! Replaces each discovered script tag with an inline equivalent. The
//! rewrite is a pure function of the document and the registry; the async
//! wrapper only adds reading and writing of the built HTML artifact.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use super::error::{InlineResult, InlineScriptError};
use super::registry::Registry;
use super::tag_scanner::{TagAttribute, scan_script_tags};
use super::types::{ScriptDescriptor, ScriptOccurrence};

/// Result of rewriting one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub html: String,
    /// Identities of descriptors substituted at least once, in document order
    pub rewritten: Vec<String>,
    /// Number of tag locations substituted
    pub substitutions: usize,
}

/// Sequences after `<` that can end or re-nest a script element's raw text
const UNSAFE_AFTER_LT: [&str; 3] = ["/script", "script", "!--"];

/// Make script content safe to place between `<script>` and `</script>`
///
/// `</script`, `<script` and `<!--` (tag names in any case) get a backslash
/// after the `<`. Without it the HTML tokenizer could close the element early
/// or enter its escaped states and swallow the rest of the document.
#[must_use]
pub fn escape_script_content(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    let mut cursor = 0;
    for (pos, _) in content.match_indices('<') {
        let after = &content.as_bytes()[pos + 1..];
        let unsafe_sequence = UNSAFE_AFTER_LT.iter().any(|seq| {
            after
                .get(..seq.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(seq.as_bytes()))
        });
        if unsafe_sequence {
            escaped.push_str(&content[cursor..=pos]);
            escaped.push('\\');
            cursor = pos + 1;
        }
    }
    escaped.push_str(&content[cursor..]);
    escaped
}

/// Build the inline tag that replaces an occurrence
#[must_use]
pub fn build_inline_tag(attributes: &[TagAttribute], content: &str) -> String {
    let mut tag = String::with_capacity(content.len() + 32);
    tag.push_str("<script");
    for attribute in attributes {
        tag.push(' ');
        tag.push_str(&attribute.raw);
    }
    tag.push('>');
    tag.push_str(&escape_script_content(content));
    tag.push_str("</script>");
    tag
}

/// Rewrite every resolved script in `html`
///
/// Tags are matched by their verbatim markup against a queue of occurrences
/// in document order. Each occurrence consumes the first remaining tag with
/// identical markup, so no location is substituted twice. Occurrences of
/// unresolved descriptors consume their tag without changing it.
#[must_use]
pub fn rewrite_html(html: &str, registry: &Registry) -> RewriteOutcome {
    let mut pending: HashMap<&str, VecDeque<(&ScriptDescriptor, &ScriptOccurrence)>> =
        HashMap::new();
    for descriptor in registry.descriptors() {
        for occurrence in descriptor.occurrences() {
            pending
                .entry(occurrence.markup.as_str())
                .or_default()
                .push_back((descriptor, occurrence));
        }
    }

    let mut output = String::with_capacity(html.len());
    let mut cursor = 0;
    let mut rewritten: Vec<String> = Vec::new();
    let mut substitutions = 0;

    for tag in scan_script_tags(html) {
        let Some(queue) = pending.get_mut(tag.markup.as_str()) else {
            continue;
        };
        let Some((descriptor, occurrence)) = queue.pop_front() else {
            continue;
        };
        let Some(content) = descriptor.resolved_content() else {
            log::debug!("Leaving unresolved script in place: {}", tag.markup);
            continue;
        };

        output.push_str(&html[cursor..tag.span.start]);
        output.push_str(&build_inline_tag(&occurrence.attributes, content));
        cursor = tag.span.end;
        substitutions += 1;

        if !rewritten.iter().any(|id| id == descriptor.identity()) {
            rewritten.push(descriptor.identity().to_string());
        }
    }
    output.push_str(&html[cursor..]);

    let unmatched: usize = pending.values().map(VecDeque::len).sum();
    if unmatched > 0 {
        log::warn!("{unmatched} discovered script tags were not found in the built HTML");
    }

    RewriteOutcome {
        html: output,
        rewritten,
        substitutions,
    }
}

/// Rewrite the built HTML artifact in place
///
/// The file is only written when at least one tag was substituted.
pub async fn rewrite_html_file(path: &Path, registry: &Registry) -> InlineResult<RewriteOutcome> {
    let html = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InlineScriptError::HtmlArtifact {
            path: path.to_path_buf(),
            source,
        })?;

    let outcome = rewrite_html(&html, registry);

    if outcome.substitutions > 0 {
        tokio::fs::write(path, &outcome.html)
            .await
            .map_err(|source| InlineScriptError::HtmlArtifact {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "Inlined {} script tags into {}",
            outcome.substitutions,
            path.display()
        );
    }

    Ok(outcome)
}
