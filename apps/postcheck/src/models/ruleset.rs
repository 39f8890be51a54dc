//! Ruleset schema consumed by the analysis passes and the synthesizer.
//!
//! Key components:
//! - `limits`: numeric thresholds for titles, descriptions, word counts.
//! - `brand`, `deprecated_terms`, `features`, `nouns`: terminology tables.
//! - `discover`: keyword sets for the discoverability heuristics.
//! - `tags`: category tags, casing fixes, deprecated tags, and the taxonomy.
//! - `synth`: keyword lists, action table, and sentence templates.
//!
//! The builtin ruleset is embedded from `rules/default.toml`. A ruleset is
//! compiled once (all regexes built up front) and then shared read-only.

use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const BUILTIN: &str = include_str!("../../rules/default.toml");

#[derive(Deserialize, Debug, Clone)]
/// Root ruleset as written in TOML.
pub struct RulesetSpec {
    #[serde(default)]
    pub limits: Limits,
    pub brand: BrandSpec,
    #[serde(default)]
    pub deprecated_terms: Vec<DeprecatedTermSpec>,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    #[serde(default)]
    pub nouns: Vec<NounSpec>,
    #[serde(default)]
    pub discover: DiscoverSpec,
    #[serde(default)]
    pub tags: TagSpec,
    pub synth: SynthSpec,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Limits {
    pub title_min: usize,
    pub title_max: usize,
    pub description_min: usize,
    pub description_max: usize,
    pub description_target: usize,
    pub description_target_short: usize,
    pub keywords_max: usize,
    pub words_min: usize,
    pub words_recommended: usize,
    pub alt_min: usize,
    pub slug_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            title_min: 30,
            title_max: 60,
            description_min: 120,
            description_max: 160,
            description_target: 150,
            description_target_short: 155,
            keywords_max: 10,
            words_min: 300,
            words_recommended: 500,
            alt_min: 5,
            slug_max: 50,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct BrandSpec {
    pub name: String,
    /// Accepted spellings of the brand as a whole word.
    #[serde(default)]
    pub spellings: Vec<String>,
    #[serde(default)]
    pub product: String,
    pub standard_description: String,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub value_props: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeprecatedTermSpec {
    pub term: String,
    pub preferred: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FeatureSpec {
    pub name: String,
    pub preferred: Vec<String>,
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub context: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NounSpec {
    pub term: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub good_with: Vec<String>,
    pub avoid: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DiscoverSpec {
    pub question_starts: Vec<String>,
    pub problem: Vec<String>,
    pub solution: Vec<String>,
    pub tech: Vec<String>,
    pub background: Vec<String>,
    pub conclusion: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TagSpec {
    pub min: usize,
    pub max: usize,
    pub max_suggested: usize,
    pub categories: Vec<String>,
    pub casing: Vec<TagRename>,
    pub deprecated: Vec<TagRename>,
    pub taxonomy: Vec<TaxonomySpec>,
}

impl Default for TagSpec {
    fn default() -> Self {
        Self {
            min: 2,
            max: 6,
            max_suggested: 5,
            categories: Vec::new(),
            casing: Vec::new(),
            deprecated: Vec::new(),
            taxonomy: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TagRename {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TaxonomySpec {
    pub tag: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SynthSpec {
    #[serde(default)]
    pub tech_keywords: Vec<String>,
    #[serde(default)]
    pub concept_keywords: Vec<String>,
    #[serde(default)]
    pub dev_concepts: Vec<String>,
    #[serde(default)]
    pub dev_tool_phrases: Vec<String>,
    #[serde(default)]
    pub tool_words: Vec<String>,
    #[serde(default)]
    pub ai_markers: Vec<String>,
    #[serde(default)]
    pub migration_markers: Vec<String>,
    #[serde(default)]
    pub value_props: Vec<String>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    pub default_action: String,
    pub default_tech: String,
    pub default_concept: String,
    #[serde(default)]
    pub topics: Vec<TopicSpec>,
    pub brand_continuation: String,
    pub generic_continuation: String,
    pub templates: Templates,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ActionSpec {
    pub any: Vec<String>,
    pub phrase: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TopicSpec {
    pub label: String,
    pub any: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
/// Sentence templates. Placeholders: `{action}`, `{tech}`, `{concept}`,
/// `{lead_concept}`, `{dev_concept}`, `{brand}`, `{value_prop}`, `{product}`.
pub struct Templates {
    pub generic: String,
    pub dev_tools: String,
    pub focused_ai: String,
    pub focused_migration: String,
    pub focused: String,
    pub mention_tools: String,
    pub mention: String,
}

/// A taxonomy keyword: plain substring or word-boundary regex.
#[derive(Debug, Clone)]
pub enum Keyword {
    Plain(String),
    Pattern(Regex),
}

impl Keyword {
    fn compile(raw: &str) -> Result<Self> {
        if raw.len() > 4 && raw.starts_with("\\b") && raw.ends_with("\\b") {
            let re = Regex::new(&format!("(?i){}", raw))
                .map_err(|e| Error::config(format!("invalid keyword pattern '{}': {}", raw, e)))?;
            Ok(Keyword::Pattern(re))
        } else {
            Ok(Keyword::Plain(raw.to_lowercase()))
        }
    }

    /// `text_lower` must already be lowercased.
    pub fn matches(&self, text_lower: &str) -> bool {
        match self {
            Keyword::Plain(k) => text_lower.contains(k.as_str()),
            Keyword::Pattern(re) => re.is_match(text_lower),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaxonomyEntry {
    pub tag: String,
    pub keywords: Vec<Keyword>,
    pub requires: Vec<Keyword>,
}

impl TaxonomyEntry {
    pub fn matches(&self, text_lower: &str) -> bool {
        self.keywords.iter().any(|k| k.matches(text_lower))
            && self.requires.iter().all(|k| k.matches(text_lower))
    }
}

#[derive(Debug, Clone)]
pub struct DeprecatedTerm {
    pub term: String,
    pub preferred: String,
    pub reason: Option<String>,
    /// Case-insensitive whole-word matcher for `term`.
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct TagRules {
    pub min: usize,
    pub max: usize,
    pub max_suggested: usize,
    categories: Vec<String>,
    pub casing: Vec<TagRename>,
    pub deprecated: Vec<TagRename>,
    pub taxonomy: Vec<TaxonomyEntry>,
}

impl TagRules {
    pub fn is_category(&self, tag: &str) -> bool {
        let lower = tag.to_lowercase();
        self.categories.iter().any(|c| *c == lower)
    }

    pub fn category_names(&self) -> &[String] {
        &self.categories
    }
}

/// A compiled, read-only ruleset.
#[derive(Debug, Clone)]
pub struct Ruleset {
    pub limits: Limits,
    pub brand: BrandSpec,
    pub deprecated: Vec<DeprecatedTerm>,
    pub features: Vec<FeatureSpec>,
    pub nouns: Vec<NounSpec>,
    pub discover: DiscoverSpec,
    pub tags: TagRules,
    pub synth: SynthSpec,
    brand_word: Regex,
    brand_sentence: Regex,
}

impl Ruleset {
    /// The ruleset embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let spec: RulesetSpec =
            toml::from_str(text).map_err(|e| Error::config(format!("invalid ruleset: {}", e)))?;
        Self::compile(spec)
    }

    /// Precompile every regex in `spec`.
    pub fn compile(spec: RulesetSpec) -> Result<Self> {
        let deprecated = spec
            .deprecated_terms
            .into_iter()
            .map(|d| {
                let pattern = word_pattern(&d.term)?;
                Ok(DeprecatedTerm {
                    term: d.term,
                    preferred: d.preferred,
                    reason: d.reason,
                    pattern,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let taxonomy = spec
            .tags
            .taxonomy
            .iter()
            .map(|t| {
                Ok(TaxonomyEntry {
                    tag: t.tag.clone(),
                    keywords: t.keywords.iter().map(|k| Keyword::compile(k)).collect::<Result<_>>()?,
                    requires: t.requires.iter().map(|k| Keyword::compile(k)).collect::<Result<_>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let tags = TagRules {
            min: spec.tags.min,
            max: spec.tags.max,
            max_suggested: spec.tags.max_suggested,
            categories: spec.tags.categories.iter().map(|c| c.to_lowercase()).collect(),
            casing: spec.tags.casing,
            deprecated: spec.tags.deprecated,
            taxonomy,
        };

        let escaped = regex::escape(&spec.brand.name);
        let brand_word = word_pattern(&spec.brand.name)?;
        let brand_sentence = Regex::new(&format!("(?i){}[^.]*[.!?]", escaped))
            .map_err(|e| Error::config(e.to_string()))?;

        Ok(Self {
            limits: spec.limits,
            brand: spec.brand,
            deprecated,
            features: spec.features,
            nouns: spec.nouns,
            discover: spec.discover,
            tags,
            synth: spec.synth,
            brand_word,
            brand_sentence,
        })
    }

    /// Lowercased brand name.
    pub fn brand_lower(&self) -> String {
        self.brand.name.to_lowercase()
    }

    /// Whole-word brand occurrences in `text`, any casing.
    pub fn brand_mentions<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.brand_word.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Number of brand-led sentences in `text`.
    pub fn brand_sentences(&self, text: &str) -> usize {
        self.brand_sentence.find_iter(text).count()
    }

    pub fn deprecated_term(&self, term: &str) -> Option<&DeprecatedTerm> {
        self.deprecated.iter().find(|d| d.term == term)
    }

    /// Replace every deprecated term in `text` with its preferred form.
    pub fn canonicalize(&self, text: &str) -> String {
        let mut out = text.to_string();
        for d in &self.deprecated {
            if d.pattern.is_match(&out) {
                out = d.pattern.replace_all(&out, regex::NoExpand(&d.preferred)).into_owned();
            }
        }
        out
    }
}

/// Case-insensitive whole-word matcher for a literal term.
pub fn word_pattern(term: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))
        .map_err(|e| Error::config(format!("invalid term '{}': {}", term, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ruleset_compiles() {
        let rules = Ruleset::builtin().unwrap();
        assert_eq!(rules.brand.name, "Tigris");
        assert_eq!(rules.limits.words_min, 300);
        assert_eq!(rules.tags.max, 6);
        assert!(rules.tags.is_category("Build with Tigris"));
        assert!(!rules.tags.is_category("AI"));
        assert_eq!(rules.deprecated.len(), 3);
    }

    #[test]
    fn test_word_keywords_respect_boundaries() {
        let rules = Ruleset::builtin().unwrap();
        let ai = rules.tags.taxonomy.iter().find(|t| t.tag == "AI").unwrap();
        assert!(ai.matches("we use ai every day"));
        assert!(!ai.matches("the maintainer said"));
    }

    #[test]
    fn test_requires_gates_combo_entry() {
        let rules = Ruleset::builtin().unwrap();
        let entry = rules
            .tags
            .taxonomy
            .iter()
            .find(|t| t.tag == "Build with Tigris")
            .unwrap();
        assert!(entry.matches("a tutorial for tigris users"));
        assert!(!entry.matches("a tutorial for everyone"));
    }

    #[test]
    fn test_canonicalize_replaces_whole_words_only() {
        let rules = Ruleset::builtin().unwrap();
        let out = rules.canonicalize("Cross-cloud setups need fast access. Not fast accessor.");
        assert_eq!(out, "multi-cloud setups need low-latency access. Not fast accessor.");
    }

    #[test]
    fn test_brand_mentions_and_sentences() {
        let rules = Ruleset::builtin().unwrap();
        let found = rules.brand_mentions("tigris and Tigris, not tigrisfs");
        assert_eq!(found, vec!["tigris", "Tigris"]);
        assert_eq!(rules.brand_sentences("tigris is fast. tigris scales! other."), 2);
    }

    #[test]
    fn test_invalid_ruleset_is_config_error() {
        let err = Ruleset::from_toml_str("[brand]\nname = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
