//! Shared data models for analysis results, patch plans, and printers.

pub mod ruleset;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Issue severity. Only one level exists today; the enum keeps the JSON
/// shape stable if more are added.
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A deficiency that blocks an "all clear" classification.
pub struct Issue {
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
    /// 1-based file line, when the finding has a location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Issue {
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: Severity::Error,
            message: message.into(),
            line: None,
        }
    }

    pub fn at(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Good,
    Bad,
}

/// A machine-applicable change attached to a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Fix {
    /// Replace the `description` field.
    Description { text: String },
    /// Append tags to the tag list.
    AddTags { tags: Vec<String> },
    /// Rewrite a tag to its canonical casing.
    TagCase { from: String, to: String },
    /// Move protected category tags to the front.
    CategoryTagsFirst,
    /// Swap a deprecated tag for its replacement.
    ReplaceTag { from: String, to: String },
    /// Replace every whole-word occurrence of `term` in the body.
    ReplaceTerm { term: String, preferred: String },
    /// Use the image caption as its alt text. `line` is 1-based in the body.
    CaptionAsAlt {
        src: String,
        caption: String,
        line: usize,
    },
}

impl Fix {
    pub fn touches_tags(&self) -> bool {
        matches!(
            self,
            Fix::AddTags { .. }
                | Fix::TagCase { .. }
                | Fix::CategoryTagsFirst
                | Fix::ReplaceTag { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Non-blocking feedback with polarity.
pub struct Suggestion {
    pub rule: &'static str,
    pub kind: SuggestionKind,
    pub body: String,
    #[serde(rename = "lineNumber", skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Suggestion {
    pub fn good(rule: &'static str, body: impl Into<String>) -> Self {
        Self {
            rule,
            kind: SuggestionKind::Good,
            body: body.into(),
            line_number: None,
            fix: None,
        }
    }

    pub fn bad(rule: &'static str, body: impl Into<String>) -> Self {
        Self {
            rule,
            kind: SuggestionKind::Bad,
            body: body.into(),
            line_number: None,
            fix: None,
        }
    }

    pub fn at(mut self, line: Option<usize>) -> Self {
        self.line_number = line;
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
/// Accumulated output of every analysis pass over one document.
pub struct Analysis {
    pub issues: Vec<Issue>,
    pub suggestions: Vec<Suggestion>,
}

impl Analysis {
    pub fn issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn suggest(&mut self, suggestion: Suggestion) {
        self.suggestions.push(suggestion);
    }

    pub fn extend(&mut self, other: Analysis) {
        self.issues.extend(other.issues);
        self.suggestions.extend(other.suggestions);
    }
}

#[derive(Debug, Clone, Serialize)]
/// A frontmatter digest shown next to a report.
pub struct MetaSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
/// Analysis of one document plus the structure it was derived from.
pub struct PostReport {
    pub file: String,
    #[serde(rename = "wordCount")]
    pub word_count: usize,
    pub headings: Vec<crate::extract::Heading>,
    pub images: Vec<crate::extract::ImageRef>,
    pub meta: MetaSummary,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize)]
/// A document that could not be analyzed.
pub struct PostFailure {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleCount {
    pub rule: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostScore {
    pub file: String,
    pub issues: usize,
    pub suggestions: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Aggregate statistics over a multi-document run.
pub struct CorpusSummary {
    pub posts: usize,
    #[serde(rename = "postsWithIssues")]
    pub posts_with_issues: usize,
    pub failed: usize,
    pub issues: usize,
    pub suggestions: usize,
    #[serde(rename = "averageWordCount")]
    pub average_word_count: usize,
    #[serde(rename = "commonIssues")]
    pub common_issues: Vec<RuleCount>,
    #[serde(rename = "needsAttention")]
    pub needs_attention: Vec<PostScore>,
    #[serde(rename = "bestPosts")]
    pub best_posts: Vec<PostScore>,
}

#[derive(Debug, Clone, Serialize)]
/// Review results container.
pub struct ReviewResult {
    pub reports: Vec<PostReport>,
    pub failures: Vec<PostFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CorpusSummary>,
}

impl ReviewResult {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.reports.iter().any(|r| !r.issues.is_empty())
    }
}
