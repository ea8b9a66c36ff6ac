// src/domain/mod.rs
// =============================================================================
// The data model of a capability record: subjects own capabilities, and
// capabilities carry source citations.
//
// The record files are owned by other tools, so we only model the fields we
// read or patch. Everything else rides along in `extra` maps and is written
// back untouched (serde_json's preserve_order keeps the field order too).
//
// Rust concepts:
// - #[serde(flatten)]: Collect unknown JSON fields into a map
// - #[serde(from/into)]: Convert through another type while (de)serializing
// =============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One subject's capability record (`capabilities/current.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityDocument {
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named claim about a subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    /// Free text, not guaranteed to be unique
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A field that may be absent, explicitly `null`, or set.
///
/// `None` = absent (not written back), `Some(None)` = `null`,
/// `Some(Some(v))` = a value. Rewriting a record must not turn one of these
/// into another for sources nobody touched.
pub type Field<T> = Option<Option<T>>;

/// A citation backing a capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub url: String,
    #[serde(
        rename = "sourceGranularity",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub granularity: Field<Granularity>,
    /// Literal text quoted from the page (required for excerpt sources)
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub excerpt: Field<String>,
    /// Date the citation was last confirmed, `YYYY-MM-DD`
    #[serde(
        rename = "verifiedDate",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub verified_date: Field<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Source {
    /// URL with any `#fragment` removed
    pub fn base_url(&self) -> &str {
        split_fragment(&self.url).0
    }

    /// Non-empty fragment of the URL, if any
    pub fn fragment(&self) -> Option<&str> {
        split_fragment(&self.url).1
    }

    /// The declared granularity. Absent or `null` reads as the unrecognised
    /// empty value, never as a default granularity.
    pub fn granularity(&self) -> Granularity {
        match &self.granularity {
            Some(Some(granularity)) => granularity.clone(),
            _ => Granularity::Other(String::new()),
        }
    }

    pub fn excerpt(&self) -> Option<&str> {
        self.excerpt.as_ref().and_then(|e| e.as_deref())
    }

    pub fn verified_date(&self) -> Option<&str> {
        self.verified_date.as_ref().and_then(|d| d.as_deref())
    }
}

// A present field always deserializes to `Some`, so `null` becomes
// `Some(None)` while a missing field falls back to `default` (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// How precisely a source targets its claim.
///
/// Values we do not recognise are kept verbatim in `Other` so a record with
/// a typo still loads and is written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Granularity {
    /// The whole document is about the capability
    Dedicated,
    /// A section of the document, addressed by `#fragment`
    Section,
    /// A literal excerpt of the document
    Excerpt,
    Other(String),
}

impl From<String> for Granularity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "dedicated" => Granularity::Dedicated,
            "section" => Granularity::Section,
            "excerpt" => Granularity::Excerpt,
            _ => Granularity::Other(value),
        }
    }
}

impl From<Granularity> for String {
    fn from(value: Granularity) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Dedicated => f.write_str("dedicated"),
            Granularity::Section => f.write_str("section"),
            Granularity::Excerpt => f.write_str("excerpt"),
            Granularity::Other(raw) => f.write_str(raw),
        }
    }
}

/// Splits `https://x/doc#setup` into (`https://x/doc`, Some("setup")).
///
/// An empty fragment (`https://x/doc#`) counts as no fragment.
pub fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, fragment)) if !fragment.is_empty() => (base, Some(fragment)),
        Some((base, _)) => (base, None),
        None => (url, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("https://x/doc#setup"), ("https://x/doc", Some("setup")));
        assert_eq!(split_fragment("https://x/doc"), ("https://x/doc", None));
        assert_eq!(split_fragment("https://x/doc#"), ("https://x/doc", None));
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = r#"{
            "agent": "gemini-cli",
            "capabilities": [{
                "name": "Multi-file Editing",
                "category": "editing",
                "sources": [{
                    "url": "https://x/doc#setup",
                    "sourceGranularity": "section",
                    "verifiedDate": "2025-01-01",
                    "note": "keep me"
                }]
            }]
        }"#;
        let doc: CapabilityDocument = serde_json::from_str(raw).unwrap();
        let source = &doc.capabilities[0].sources[0];
        assert_eq!(source.granularity(), Granularity::Section);
        assert_eq!(source.fragment(), Some("setup"));

        let written = serde_json::to_value(&doc).unwrap();
        assert_eq!(written["agent"], "gemini-cli");
        assert_eq!(written["capabilities"][0]["category"], "editing");
        assert_eq!(written["capabilities"][0]["sources"][0]["note"], "keep me");
        assert!(written["capabilities"][0]["sources"][0].get("excerpt").is_none());
    }

    #[test]
    fn test_unrecognised_granularity_is_kept() {
        let source: Source =
            serde_json::from_str(r#"{"url": "https://x", "sourceGranularity": "paragraph"}"#).unwrap();
        assert_eq!(source.granularity(), Granularity::Other("paragraph".to_string()));
        let written = serde_json::to_value(&source).unwrap();
        assert_eq!(written["sourceGranularity"], "paragraph");
    }

    #[test]
    fn test_absent_and_null_fields_are_written_back_as_they_were() {
        let raw = r#"{"url": "https://x/other", "verifiedDate": null, "excerpt": null}"#;
        let source: Source = serde_json::from_str(raw).unwrap();

        assert_eq!(source.granularity, None);
        assert_eq!(source.verified_date, Some(None));
        assert_eq!(source.excerpt(), None);
        // Missing granularity is not silently "dedicated"
        assert_eq!(source.granularity(), Granularity::Other(String::new()));

        let written = serde_json::to_value(&source).unwrap();
        assert_eq!(
            written,
            serde_json::json!({"url": "https://x/other", "verifiedDate": null, "excerpt": null})
        );
    }

    #[test]
    fn test_null_granularity_stays_null() {
        let source: Source = serde_json::from_str(r#"{"url": "https://x", "sourceGranularity": null}"#).unwrap();
        assert_eq!(source.granularity, Some(None));
        let written = serde_json::to_value(&source).unwrap();
        assert!(written["sourceGranularity"].is_null());
        assert!(written.as_object().unwrap().contains_key("sourceGranularity"));
    }
}
