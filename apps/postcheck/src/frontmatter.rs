//! Frontmatter extraction and restricted-schema parsing.
//!
//! A document carries frontmatter when its first line is exactly `---` and
//! a later line is exactly `---` again. The text in between is parsed with
//! `serde_yaml` and then narrowed to scalars and lists of scalars; anything
//! nested is rejected with `SchemaViolation`.
//!
//! Serialization goes back through `serde_yaml` with insertion-ordered keys,
//! so strings that look like numbers or booleans are quoted and multi-line
//! strings use block literal style.

use crate::error::{Error, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Value as Yaml;
use std::ops::Range;

/// Upper bound for any document handed to the parser.
pub const MAX_CONTENT_BYTES: usize = 10 * 1024 * 1024;

pub const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
/// A single frontmatter scalar.
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Text form used by the passes; `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Int(i) => Some(i.to_string()),
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::Str(s) => Some(s.clone()),
        }
    }

    fn to_yaml(&self) -> Yaml {
        match self {
            Scalar::Null => Yaml::Null,
            Scalar::Bool(b) => Yaml::Bool(*b),
            Scalar::Int(i) => Yaml::Number((*i).into()),
            Scalar::Float(f) => Yaml::Number((*f).into()),
            Scalar::Str(s) => Yaml::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
/// A frontmatter value: a scalar or a flat list of scalars.
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl FieldValue {
    pub fn string(s: impl Into<String>) -> Self {
        FieldValue::Scalar(Scalar::Str(s.into()))
    }

    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(|s| Scalar::Str(s.into())).collect())
    }
}

/// Ordered key/value view of a frontmatter block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    fields: Vec<(String, FieldValue)>,
}

impl Serialize for Frontmatter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar field rendered as text. Empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            FieldValue::Scalar(s) => s.as_text().filter(|t| !t.is_empty()),
            FieldValue::List(_) => None,
        }
    }

    /// List field rendered as text items. A lone scalar reads as a
    /// one-item list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(FieldValue::List(items)) => items.iter().filter_map(Scalar::as_text).collect(),
            Some(FieldValue::Scalar(s)) => s.as_text().filter(|t| !t.is_empty()).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Replace an existing key in place, or append it.
    pub fn set(&mut self, key: &str, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    /// Serialize to YAML without the surrounding delimiters.
    pub fn to_yaml(&self) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        let mut map = serde_yaml::Mapping::new();
        for (k, v) in &self.fields {
            let value = match v {
                FieldValue::Scalar(s) => s.to_yaml(),
                FieldValue::List(items) => {
                    Yaml::Sequence(items.iter().map(Scalar::to_yaml).collect())
                }
            };
            map.insert(Yaml::String(k.clone()), value);
        }
        let out = serde_yaml::to_string(&Yaml::Mapping(map))
            .map_err(|e| Error::InvalidFrontmatter(e.to_string()))?;
        Ok(out.trim_end().to_string())
    }
}

/// Location of a frontmatter block inside the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Byte range of the block contents, delimiters excluded.
    pub content: Range<usize>,
    /// Byte offset where the body starts (after the closing delimiter line).
    pub body_start: usize,
    /// Number of lines before the body, delimiters included.
    pub lines_before_body: usize,
}

/// Result of extracting frontmatter from a document.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub data: Frontmatter,
    pub span: Option<BlockSpan>,
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == DELIMITER
}

/// Find the frontmatter block with a line scan; no regex involved.
pub fn locate(text: &str) -> Option<BlockSpan> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if !first.ends_with('\n') || !is_delimiter(first) {
        return None;
    }
    let start = first.len();
    let mut offset = start;
    let mut line_no = 1;
    for line in lines {
        line_no += 1;
        if is_delimiter(line) {
            return Some(BlockSpan {
                content: start..offset,
                body_start: offset + line.len(),
                lines_before_body: line_no,
            });
        }
        offset += line.len();
    }
    None
}

/// Extract and parse the frontmatter of `text`.
///
/// No frontmatter is not an error: the result is empty and `span` is `None`.
pub fn extract(text: &str) -> Result<Extracted> {
    if text.len() > MAX_CONTENT_BYTES {
        return Err(Error::ContentTooLarge {
            size: text.len() as u64,
            limit: MAX_CONTENT_BYTES as u64,
        });
    }
    let Some(span) = locate(text) else {
        return Ok(Extracted::default());
    };
    let data = parse_block(&text[span.content.clone()])?;
    Ok(Extracted {
        data,
        span: Some(span),
    })
}

/// Parse a raw block into the restricted schema.
pub fn parse_block(raw: &str) -> Result<Frontmatter> {
    if raw.len() > MAX_CONTENT_BYTES {
        return Err(Error::ContentTooLarge {
            size: raw.len() as u64,
            limit: MAX_CONTENT_BYTES as u64,
        });
    }
    let value: Yaml =
        serde_yaml::from_str(raw).map_err(|e| Error::InvalidFrontmatter(e.to_string()))?;
    let mapping = match value {
        Yaml::Null => return Ok(Frontmatter::default()),
        Yaml::Mapping(m) => m,
        other => {
            return Err(Error::InvalidFrontmatter(format!(
                "expected key/value pairs, found {}",
                kind_of(&other)
            )))
        }
    };
    let mut fm = Frontmatter::default();
    for (k, v) in mapping {
        let key = match k {
            Yaml::String(s) => s,
            Yaml::Number(n) => n.to_string(),
            Yaml::Bool(b) => b.to_string(),
            other => {
                return Err(Error::SchemaViolation {
                    key: format!("{:?}", other),
                    found: format!("{} key", kind_of(&other)),
                })
            }
        };
        let value = match v {
            Yaml::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(to_scalar(&key, item)?);
                }
                FieldValue::List(out)
            }
            other => FieldValue::Scalar(to_scalar(&key, other)?),
        };
        fm.fields.push((key, value));
    }
    Ok(fm)
}

fn to_scalar(key: &str, v: Yaml) -> Result<Scalar> {
    match v {
        Yaml::Null => Ok(Scalar::Null),
        Yaml::Bool(b) => Ok(Scalar::Bool(b)),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Scalar::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Scalar::Float(f))
            } else {
                Ok(Scalar::Str(n.to_string()))
            }
        }
        Yaml::String(s) => Ok(Scalar::Str(s)),
        other => Err(Error::SchemaViolation {
            key: key.to_string(),
            found: kind_of(&other).to_string(),
        }),
    }
}

fn kind_of(v: &Yaml) -> &'static str {
    match v {
        Yaml::Null => "null",
        Yaml::Bool(_) => "boolean",
        Yaml::Number(_) => "number",
        Yaml::String(_) => "string",
        Yaml::Sequence(_) => "list",
        Yaml::Mapping(_) => "mapping",
        Yaml::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frontmatter_yields_empty_structure() {
        let text = "# Title\n\nJust a body.\n";
        let ex = extract(text).unwrap();
        assert!(ex.data.is_empty());
        assert!(ex.span.is_none());
    }

    #[test]
    fn test_unclosed_block_is_not_frontmatter() {
        let ex = extract("---\ntitle: x\nbody without close\n").unwrap();
        assert!(ex.span.is_none());
    }

    #[test]
    fn test_extract_reports_offsets() {
        let text = "---\ntitle: Hello\ntags: [a, b]\n---\nBody\n";
        let ex = extract(text).unwrap();
        let span = ex.span.unwrap();
        assert_eq!(&text[span.content.clone()], "title: Hello\ntags: [a, b]\n");
        assert_eq!(&text[span.body_start..], "Body\n");
        assert_eq!(span.lines_before_body, 4);
        assert_eq!(ex.data.text("title").as_deref(), Some("Hello"));
        assert_eq!(ex.data.list("tags"), vec!["a", "b"]);
    }

    #[test]
    fn test_nested_mapping_is_schema_violation() {
        let text = "---\nauthor:\n  name: Ada\n---\nBody\n";
        let err = extract(text).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { ref key, .. } if key == "author"));
    }

    #[test]
    fn test_list_of_mappings_is_schema_violation() {
        let err = parse_block("authors:\n  - name: Ada\n").unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_invalid_frontmatter() {
        let err = parse_block("title: [unclosed\n").unwrap_err();
        assert!(matches!(err, Error::InvalidFrontmatter(_)));
        let err = parse_block("- just\n- a list\n").unwrap_err();
        assert!(matches!(err, Error::InvalidFrontmatter(_)));
    }

    #[test]
    fn test_oversized_content_is_rejected() {
        let big = "a".repeat(MAX_CONTENT_BYTES + 1);
        let err = extract(&big).unwrap_err();
        assert!(matches!(err, Error::ContentTooLarge { .. }));
    }

    #[test]
    fn test_serialization_round_trips_and_quotes_ambiguous_strings() {
        let mut fm = Frontmatter::default();
        fm.set("title", FieldValue::string("true"));
        fm.set("draft", FieldValue::Scalar(Scalar::Bool(false)));
        fm.set("year", FieldValue::Scalar(Scalar::Int(2025)));
        fm.set("tags", FieldValue::strings(["AI", "123"]));
        let yaml = fm.to_yaml().unwrap();
        let back = parse_block(&yaml).unwrap();
        assert_eq!(back, fm);
        let keys: Vec<_> = back.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["title", "draft", "year", "tags"]);
        assert!(yaml.contains("- AI"));
    }

    #[test]
    fn test_scalar_reads_as_single_item_list() {
        let fm = parse_block("tags: AI\nkeywords: ''\n").unwrap();
        assert_eq!(fm.list("tags"), vec!["AI"]);
        assert!(fm.list("keywords").is_empty());
        assert!(fm.list("missing").is_empty());
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut fm = parse_block("title: a\ndescription: b\nslug: c\n").unwrap();
        fm.set("description", FieldValue::string("new"));
        let keys: Vec<_> = fm.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["title", "description", "slug"]);
        assert_eq!(fm.text("description").as_deref(), Some("new"));
    }
}
