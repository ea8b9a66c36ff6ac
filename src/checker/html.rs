// src/checker/html.rs
// =============================================================================
// This module turns an HTML page into what the relevance checks need:
// - the visible text (script/style/noscript content dropped)
// - every anchor a `#fragment` could point at (`id` and legacy `name`)
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever, which recovers from malformed markup the way a
//   browser does - it never refuses a document
//
// Rust concepts:
// - HashSet: Unordered collection of unique anchors
// - Iterators: Walking every node of the parsed tree
// =============================================================================

use scraper::{Html, Node};
use std::collections::HashSet;

/// Elements whose content is never visible text
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Text and anchors extracted from one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    /// Character data joined with single spaces (original case)
    pub text: String,
    /// Values of every `id` / `name` attribute
    pub anchors: HashSet<String>,
}

// Extracts text and anchors from HTML content
//
// Parameters:
//   body: the HTML content to parse (borrowed as &str)
//
// Returns: Extracted { text, anchors }
//
// Example:
//   body = "<h2 id='setup'>Setup</h2><script>x()</script>"
//   text = "Setup", anchors = {"setup"}
//
// Never fails: broken markup gives whatever html5ever could recover.
pub fn extract(body: &str) -> Extracted {
    let document = Html::parse_document(body);
    let mut extracted = Extracted::default();
    let mut parts: Vec<&str> = Vec::new();

    // Nodes come out in document order, like a stream of parse events
    for node in document.tree.root().descendants() {
        match node.value() {
            Node::Element(element) => {
                for attr in ["id", "name"] {
                    if let Some(value) = element.attr(attr) {
                        if !value.is_empty() {
                            extracted.anchors.insert(value.to_string());
                        }
                    }
                }
            }
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .map_or(false, |el| SKIPPED_ELEMENTS.contains(&el.name()))
                });
                if !hidden {
                    parts.push(&text.text);
                }
            }
            _ => {}
        }
    }

    extracted.text = parts.join(" ");
    extracted
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why walk the tree instead of using CSS selectors?
//    - Selectors find elements; we need the text BETWEEN elements too
//    - descendants() visits every node once, in the order it appeared
//
// 2. What is Node?
//    - scraper's enum for "things in the tree": elements, text, comments...
//    - Comments and doctypes fall into the `_ => {}` arm and are ignored
//
// 3. Why check ancestors for script/style?
//    - Text inside <script> is a child of the script element
//    - If any ancestor is one of the skipped elements, the text is hidden
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_text_and_ids() {
        let html = r#"<html><body><h2 id="setup">Setup</h2><p>Run the installer.</p></body></html>"#;
        let extracted = extract(html);
        assert!(extracted.text.contains("Setup"));
        assert!(extracted.text.contains("Run the installer."));
        assert!(extracted.anchors.contains("setup"));
    }

    #[test]
    fn test_skips_script_style_and_noscript() {
        let html = r#"
            <head><style>.hidden { display: none }</style></head>
            <body>
              <script>var secret = "do not index";</script>
              <noscript>Enable JavaScript</noscript>
              <p>Visible</p>
            </body>
        "#;
        let extracted = extract(html);
        assert!(extracted.text.contains("Visible"));
        assert!(!extracted.text.contains("secret"));
        assert!(!extracted.text.contains("display"));
        assert!(!extracted.text.contains("Enable JavaScript"));
    }

    #[test]
    fn test_legacy_name_anchors() {
        let html = r#"<a name="old_anchor"></a><div id="new-anchor">x</div>"#;
        let extracted = extract(html);
        assert!(extracted.anchors.contains("old_anchor"));
        assert!(extracted.anchors.contains("new-anchor"));
    }

    #[test]
    fn test_malformed_markup_is_best_effort() {
        let html = r#"<div id="open"><p>Unclosed <b>bold <section id=broken>tail"#;
        let extracted = extract(html);
        assert!(extracted.anchors.contains("open"));
        assert!(extracted.anchors.contains("broken"));
        assert!(extracted.text.contains("tail"));
    }

    #[test]
    fn test_plain_text_body() {
        let extracted = extract("just some text");
        assert_eq!(extracted.text, "just some text");
        assert!(extracted.anchors.is_empty());
    }
}
