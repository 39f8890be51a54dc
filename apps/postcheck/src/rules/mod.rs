//! Rule engine: four independent passes over a parsed document.
//!
//! Each pass is a pure function from a [`Context`] to an [`Analysis`]; the
//! engine runs all of them and concatenates the results. No pass reads
//! another pass's output, so a failing check never hides a later one.

pub mod discover;
pub mod metadata;
pub mod tags;
pub mod terminology;

use crate::document::Document;
use crate::extract::Structure;
use crate::models::ruleset::Ruleset;
use crate::models::Analysis;

/// Read-only inputs shared by every pass.
pub struct Context<'a> {
    pub doc: &'a Document,
    pub structure: &'a Structure,
    pub rules: &'a Ruleset,
    pub body_lower: String,
}

impl<'a> Context<'a> {
    pub fn new(doc: &'a Document, structure: &'a Structure, rules: &'a Ruleset) -> Self {
        Self {
            doc,
            structure,
            rules,
            body_lower: doc.body.to_lowercase(),
        }
    }

    /// Title, heading texts, and body joined with spaces, after deprecated
    /// terms are rewritten to their preferred form, lowercased.
    ///
    /// Used wherever a finding must stay stable across `--apply`.
    pub fn canonical_text(&self) -> String {
        let mut joined = self.doc.title().unwrap_or_default();
        for h in &self.structure.headings {
            joined.push(' ');
            joined.push_str(&h.text);
        }
        joined.push(' ');
        joined.push_str(&self.doc.body);
        self.rules.canonicalize(&joined).to_lowercase()
    }

    /// 1-based file line of the first body line containing `needle`.
    pub fn body_line_of(&self, needle: &str) -> Option<usize> {
        self.doc
            .body
            .lines()
            .position(|l| l.contains(needle))
            .map(|idx| self.doc.file_line(idx + 1))
    }
}

/// Run every pass and accumulate the findings.
pub fn analyze(doc: &Document, structure: &Structure, rules: &Ruleset) -> Analysis {
    let cx = Context::new(doc, structure, rules);
    let mut out = Analysis::default();
    out.extend(metadata::run(&cx));
    out.extend(discover::run(&cx));
    out.extend(terminology::run(&cx));
    out.extend(tags::run(&cx));
    out
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::document::Document;
    use crate::extract::{self, Structure};
    use crate::models::ruleset::Ruleset;

    pub fn parse(raw: &str) -> (Document, Structure, Ruleset) {
        let doc = Document::parse("/blog/post/index.mdx", raw.to_string()).unwrap();
        let structure = extract::extract(&doc.body);
        (doc, structure, Ruleset::builtin().unwrap())
    }

    /// `n` filler words that trip no keyword table.
    pub fn words(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{parse, words};
    use super::*;

    #[test]
    fn test_all_passes_contribute() {
        let raw = format!(
            "---\ntitle: Short\ntags: [ai]\n---\n# One\n# Two\n\n{}\n",
            words(10)
        );
        let (doc, st, rules) = parse(&raw);
        let a = analyze(&doc, &st, &rules);
        let rules_seen: Vec<&str> = a
            .issues
            .iter()
            .map(|i| i.rule)
            .chain(a.suggestions.iter().map(|s| s.rule))
            .collect();
        assert!(rules_seen.iter().any(|r| r.starts_with("seo/")));
        assert!(rules_seen.iter().any(|r| r.starts_with("llm/")));
        assert!(rules_seen.iter().any(|r| r.starts_with("tags/")));
    }

    #[test]
    fn test_analysis_is_pure() {
        let raw = format!("---\ntitle: Tigris tutorial\n---\n## What is it?\n{}\n", words(50));
        let (doc, st, rules) = parse(&raw);
        let a = analyze(&doc, &st, &rules);
        let b = analyze(&doc, &st, &rules);
        assert_eq!(a.issues, b.issues);
        assert_eq!(a.suggestions, b.suggestions);
    }

    #[test]
    fn test_canonical_text_rewrites_deprecated_terms() {
        let (doc, st, rules) = parse("---\ntitle: Cross-cloud\n---\n## Fast access\n");
        let cx = Context::new(&doc, &st, &rules);
        let text = cx.canonical_text();
        assert!(text.contains("multi-cloud"));
        assert!(text.contains("low-latency access"));
        assert!(!text.contains("cross-cloud"));
    }
}
