//! `<script>` element scanner
//!
//! Locates script elements with their exact byte spans so the rewriter can
//! splice replacements into the document without re-serializing anything
//! else. Markup outside the matched elements is never touched.

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

lazy_static! {
    // These patterns are hardcoded and syntactically valid.
    // If they fail to compile, it indicates a compile-time bug in the pattern strings.
    static ref SCRIPT_ELEMENT: Regex = Regex::new(
        r#"(?is)<script((?:\s(?:[^>"']|"[^"]*"|'[^']*')*)?)>(.*?)</script\s*>"#
    )
    .expect("BUG: hardcoded script element pattern is invalid - this is a compile-time bug");

    static ref ATTRIBUTE: Regex = Regex::new(
        r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
    )
    .expect("BUG: hardcoded attribute pattern is invalid - this is a compile-time bug");
}

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// One attribute of an opening tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAttribute {
    /// Lowercased attribute name
    pub name: String,
    /// Entity-decoded value; `None` for boolean attributes
    pub value: Option<String>,
    /// Source text of the attribute, re-emitted verbatim
    pub raw: String,
}

/// A `<script>` element found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    /// Byte range of the whole element in the scanned document
    pub span: Range<usize>,
    /// Verbatim element markup, opening tag through closing tag
    pub markup: String,
    pub attributes: Vec<TagAttribute>,
    /// Text between the opening and closing tags
    pub body: String,
}

impl ScriptTag {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&TagAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Value of the `src` attribute, if present
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.attribute("src").map(|attr| attr.value.as_deref().unwrap_or(""))
    }

    /// All attributes except the source reference, in source order
    #[must_use]
    pub fn preserved_attributes(&self) -> Vec<TagAttribute> {
        self.attributes
            .iter()
            .filter(|attr| attr.name != "src")
            .cloned()
            .collect()
    }
}

/// Parse the attribute section of an opening tag
#[must_use]
pub fn parse_attributes(section: &str) -> Vec<TagAttribute> {
    ATTRIBUTE
        .captures_iter(section)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned());
            Some(TagAttribute {
                name,
                value,
                raw: whole.as_str().to_string(),
            })
        })
        .collect()
}

/// Find every `<script>` element in document order
///
/// Elements inside HTML comments are skipped. An opening tag without a
/// closing `</script>` is not reported.
#[must_use]
pub fn scan_script_tags(html: &str) -> Vec<ScriptTag> {
    let mut tags = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let next_script = SCRIPT_ELEMENT.captures_at(html, pos);
        let next_comment = html[pos..].find(COMMENT_OPEN).map(|i| pos + i);

        let Some(caps) = next_script else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };

        // A comment that opens before the next script hides everything up to its close
        if let Some(comment_start) = next_comment
            && comment_start < whole.start()
        {
            let body_start = comment_start + COMMENT_OPEN.len();
            pos = match html[body_start..].find(COMMENT_CLOSE) {
                Some(i) => body_start + i + COMMENT_CLOSE.len(),
                None => html.len(),
            };
            continue;
        }

        let attributes = caps
            .get(1)
            .map(|m| parse_attributes(m.as_str()))
            .unwrap_or_default();
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        tags.push(ScriptTag {
            span: whole.range(),
            markup: whole.as_str().to_string(),
            attributes,
            body: body.to_string(),
        });
        pos = whole.end();
    }

    tags
}
