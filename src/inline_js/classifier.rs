//! Script classification
//!
//! Pure predicates deciding whether a `<script>` element may be inlined.

use super::tag_scanner::ScriptTag;
use crate::config::InlineScriptsConfig;
use crate::utils::constants::{
    DEFAULT_DISALLOWED_ATTRIBUTES, DEFAULT_SCRIPT_EXTENSIONS, REMOTE_PREFIXES,
};
use crate::utils::path_utils::strip_query_and_fragment;

/// Classification of a script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    /// `type="module"`; never handled here
    Module,
    /// Remote source reference (`http://`, `https://`, `//`)
    External,
    /// Carries an attribute that inlining would break
    DisallowedAttributes,
    /// Local source reference without an accepted script extension
    InvalidExtension,
    Eligible,
}

impl std::fmt::Display for ScriptClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptClass::Module => write!(f, "module"),
            ScriptClass::External => write!(f, "external"),
            ScriptClass::DisallowedAttributes => write!(f, "disallowed-attributes"),
            ScriptClass::InvalidExtension => write!(f, "invalid-extension"),
            ScriptClass::Eligible => write!(f, "eligible"),
        }
    }
}

/// Classifier holding the configured extension and attribute rules
#[derive(Debug, Clone)]
pub struct ScriptClassifier {
    script_extensions: Vec<String>,
    disallowed_attributes: Vec<String>,
}

impl Default for ScriptClassifier {
    fn default() -> Self {
        Self {
            script_extensions: DEFAULT_SCRIPT_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            disallowed_attributes: DEFAULT_DISALLOWED_ATTRIBUTES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl ScriptClassifier {
    #[must_use]
    pub fn from_config(config: &InlineScriptsConfig) -> Self {
        Self {
            script_extensions: config.script_extensions().to_vec(),
            disallowed_attributes: config.disallowed_attributes().to_vec(),
        }
    }

    /// Classify a tag
    ///
    /// Checks run in order: module, external, disallowed attributes,
    /// extension. The first match wins.
    #[must_use]
    pub fn classify(&self, tag: &ScriptTag) -> ScriptClass {
        if is_module(tag) {
            return ScriptClass::Module;
        }

        let source = tag.source();
        if source.is_some_and(is_remote) {
            return ScriptClass::External;
        }

        if self.disallowed_attribute(tag).is_some() {
            return ScriptClass::DisallowedAttributes;
        }

        match source {
            Some(src) if !self.has_accepted_extension(src) => ScriptClass::InvalidExtension,
            _ => ScriptClass::Eligible,
        }
    }

    /// First attribute on the tag that belongs to the exclusion set
    #[must_use]
    pub fn disallowed_attribute<'a>(&self, tag: &'a ScriptTag) -> Option<&'a str> {
        tag.attributes
            .iter()
            .find(|attr| self.disallowed_attributes.iter().any(|d| *d == attr.name))
            .map(|attr| attr.name.as_str())
    }

    /// Whether a source reference ends in an accepted script extension
    #[must_use]
    pub fn has_accepted_extension(&self, src: &str) -> bool {
        let path = strip_query_and_fragment(src).to_ascii_lowercase();
        let file_name = path.rsplit('/').next().unwrap_or("");
        self.script_extensions
            .iter()
            .any(|ext| file_name.len() > ext.len() && file_name.ends_with(ext.as_str()))
    }
}

/// `type="module"`, compared case-insensitively and ignoring surrounding whitespace
#[must_use]
pub fn is_module(tag: &ScriptTag) -> bool {
    tag.attribute("type")
        .and_then(|attr| attr.value.as_deref())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("module"))
}

/// Source reference points at another origin
#[must_use]
pub fn is_remote(src: &str) -> bool {
    let src = src.trim();
    REMOTE_PREFIXES.iter().any(|prefix| {
        src.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Inline script with something other than whitespace between its tags
#[must_use]
pub fn has_inline_body(tag: &ScriptTag) -> bool {
    tag.source().is_none() && !tag.body.trim().is_empty()
}
