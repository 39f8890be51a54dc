//! Review and image-check runners.
//!
//! Analysis fans out over posts with rayon; results are sorted by file so
//! output is deterministic. Rewrites (`--apply`) run sequentially after
//! all analysis is done.

use crate::aspect::{self, AspectIssue, AspectSummary, DimensionProbe};
use crate::corpus;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::extract;
use crate::models::ruleset::Ruleset;
use crate::models::{
    CorpusSummary, MetaSummary, PostFailure, PostReport, PostScore, ReviewResult, RuleCount,
};
use crate::patch::{self, PatchOutcome};
use crate::rules;
use crate::utils::{ensure_within, rel_to};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const NEEDS_ATTENTION: usize = 10;
const BEST_POSTS: usize = 5;

/// Inputs of a `review` run after configuration is resolved.
pub struct ReviewRequest<'a> {
    pub repo_root: &'a Path,
    pub content_dir: &'a Path,
    pub cwd: &'a Path,
    pub target: Option<&'a Path>,
    pub all: bool,
    pub apply: bool,
    pub rules: &'a Ruleset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One post, named on the command line or found in the working dir.
    Single { auto_detected: bool },
    Corpus,
}

#[derive(Debug)]
pub struct ReviewRun {
    pub scope: Scope,
    pub result: ReviewResult,
    pub applied: Vec<PatchOutcome>,
    /// Single-post report taken after `--apply` rewrote the file.
    pub after: Option<PostReport>,
    /// Posts whose rewrite failed; each also appears in `result.failures`.
    pub write_failures: usize,
}

impl ReviewRun {
    /// Whether the run must end with a non-zero exit code.
    ///
    /// A failed rewrite or an unreadable single post always fails; findings
    /// only fail the run under `check`.
    pub fn failed(&self, check: bool) -> bool {
        let single_failed =
            matches!(self.scope, Scope::Single { .. }) && self.result.reports.is_empty();
        single_failed || self.write_failures > 0 || (check && self.result.has_errors())
    }
}

/// Analyze one post and build its report.
pub fn review_post(path: &Path, rules: &Ruleset, base: &Path) -> Result<(Document, PostReport)> {
    let doc = Document::load(path)?;
    let structure = extract::extract(&doc.body);
    let analysis = rules::analyze(&doc, &structure, rules);
    debug!(
        path = %path.display(),
        issues = analysis.issues.len(),
        suggestions = analysis.suggestions.len(),
        "analyzed post"
    );
    let images = structure
        .images
        .iter()
        .cloned()
        .map(|mut img| {
            img.line_number = doc.file_line(img.line_number);
            img
        })
        .collect();
    let report = PostReport {
        file: rel_to(base, path),
        word_count: structure.word_count,
        headings: structure.headings.clone(),
        images,
        meta: MetaSummary {
            title: doc.title(),
            description: doc.description(),
            keywords: doc.keywords(),
            tags: doc.tags(),
        },
        issues: analysis.issues,
        suggestions: analysis.suggestions,
    };
    Ok((doc, report))
}

/// Analyze many posts in parallel. Per-post failures are collected;
/// security-relevant ones abort.
pub fn review_corpus(
    paths: &[PathBuf],
    rules: &Ruleset,
    base: &Path,
) -> Result<(Vec<(Document, PostReport)>, Vec<PostFailure>)> {
    let results: Vec<(PathBuf, Result<(Document, PostReport)>)> = paths
        .par_iter()
        .map(|p| (p.clone(), review_post(p, rules, base)))
        .collect();
    let mut reviewed = Vec::new();
    let mut failures = Vec::new();
    for (path, res) in results {
        match res {
            Ok(pair) => reviewed.push(pair),
            Err(e) if e.is_security_relevant() => return Err(e),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping post");
                failures.push(PostFailure {
                    file: rel_to(base, &path),
                    message: e.truncated(100),
                });
            }
        }
    }
    reviewed.sort_by(|a, b| a.1.file.cmp(&b.1.file));
    failures.sort_by(|a, b| a.file.cmp(&b.file));
    Ok((reviewed, failures))
}

/// Corpus statistics over successful reports.
pub fn summarize(reports: &[PostReport], failed: usize) -> CorpusSummary {
    let issues: usize = reports.iter().map(|r| r.issues.len()).sum();
    let suggestions: usize = reports.iter().map(|r| r.suggestions.len()).sum();
    let words: usize = reports.iter().map(|r| r.word_count).sum();
    let average_word_count = if reports.is_empty() {
        0
    } else {
        (words as f64 / reports.len() as f64).round() as usize
    };

    let mut by_rule: BTreeMap<&str, usize> = BTreeMap::new();
    for r in reports {
        for i in &r.issues {
            *by_rule.entry(i.rule).or_default() += 1;
        }
    }
    let mut common_issues: Vec<RuleCount> = by_rule
        .into_iter()
        .map(|(rule, count)| RuleCount {
            rule: rule.to_string(),
            count,
        })
        .collect();
    common_issues.sort_by(|a, b| b.count.cmp(&a.count));

    let score = |r: &PostReport| PostScore {
        file: r.file.clone(),
        issues: r.issues.len(),
        suggestions: r.suggestions.len(),
    };
    let mut needs_attention: Vec<PostScore> = reports
        .iter()
        .filter(|r| !r.issues.is_empty())
        .map(score)
        .collect();
    needs_attention.sort_by(|a, b| b.issues.cmp(&a.issues));
    needs_attention.truncate(NEEDS_ATTENTION);
    let mut best_posts: Vec<PostScore> = reports
        .iter()
        .filter(|r| r.issues.is_empty())
        .map(score)
        .collect();
    best_posts.sort_by(|a, b| a.suggestions.cmp(&b.suggestions));
    best_posts.truncate(BEST_POSTS);

    CorpusSummary {
        posts: reports.len(),
        posts_with_issues: reports.iter().filter(|r| !r.issues.is_empty()).count(),
        failed,
        issues,
        suggestions,
        average_word_count,
        common_issues,
        needs_attention,
        best_posts,
    }
}

/// Pick the posts a `review` run covers.
fn review_targets(req: &ReviewRequest) -> Result<(Scope, Vec<PathBuf>)> {
    if req.all {
        return Ok((Scope::Corpus, corpus::discover(req.content_dir)?));
    }
    if let Some(target) = req.target {
        let path = corpus::resolve_target(target)?;
        let path = ensure_within(&path, &[req.content_dir, req.cwd])?;
        return Ok((
            Scope::Single {
                auto_detected: false,
            },
            vec![path],
        ));
    }
    if let Some(path) = corpus::index_in(req.cwd) {
        let path = ensure_within(&path, &[req.content_dir, req.cwd])?;
        return Ok((Scope::Single { auto_detected: true }, vec![path]));
    }
    Ok((Scope::Corpus, corpus::discover(req.content_dir)?))
}

/// Run a full `review`: analyze, optionally rewrite, and for a single
/// post re-analyze the rewritten file.
pub fn run_review(req: &ReviewRequest) -> Result<ReviewRun> {
    let (scope, targets) = review_targets(req)?;
    if targets.is_empty() {
        return Err(Error::NotFound("No blog posts found to analyze".into()));
    }
    let (reviewed, mut failures) = review_corpus(&targets, req.rules, req.repo_root)?;

    let mut applied = Vec::new();
    let mut write_failures = 0;
    if req.apply {
        for (doc, report) in &reviewed {
            if report.suggestions.iter().all(|s| s.fix.is_none()) {
                continue;
            }
            match patch::apply(doc, &report.suggestions, req.rules) {
                Ok(outcome) => applied.push(outcome),
                Err(e) if e.is_security_relevant() => return Err(e),
                Err(e) => {
                    warn!(path = %doc.path.display(), error = %e, "rewrite failed");
                    write_failures += 1;
                    failures.push(PostFailure {
                        file: report.file.clone(),
                        message: e.truncated(100),
                    });
                }
            }
        }
    }

    let after = match (scope, applied.first()) {
        (Scope::Single { .. }, Some(outcome)) if outcome.changed => {
            Some(review_post(&outcome.path, req.rules, req.repo_root)?.1)
        }
        _ => None,
    };

    let reports: Vec<PostReport> = reviewed.into_iter().map(|(_, r)| r).collect();
    let summary = match scope {
        Scope::Corpus => Some(summarize(&reports, failures.len())),
        Scope::Single { .. } => None,
    };
    Ok(ReviewRun {
        scope,
        result: ReviewResult {
            reports,
            failures,
            summary,
        },
        applied,
        after,
        write_failures,
    })
}

/// Image check over `posts`; each post resolves images against the first
/// root in `roots` that contains it.
pub fn check_images(
    posts: &[PathBuf],
    roots: &[&Path],
    probe: &dyn DimensionProbe,
) -> Result<(Vec<AspectIssue>, AspectSummary)> {
    let results: Vec<Result<Vec<AspectIssue>>> = posts
        .par_iter()
        .map(|post| {
            let root = containing_root(post, roots)?;
            aspect::check_post(post, &root, probe)
        })
        .collect();
    let mut issues = Vec::new();
    for res in results {
        issues.extend(res?);
    }
    issues.sort_by(|a, b| a.file.cmp(&b.file).then(a.status.cmp(&b.status)));
    let summary = AspectSummary::from_issues(posts.len(), &issues);
    Ok((issues, summary))
}

/// Canonical form of the first root containing `path`.
pub fn containing_root(path: &Path, roots: &[&Path]) -> Result<PathBuf> {
    let resolved = ensure_within(path, roots)?;
    roots
        .iter()
        .filter_map(|r| r.canonicalize().ok())
        .find(|r| resolved.starts_with(r))
        .ok_or_else(|| Error::PathEscape(path.to_path_buf()))
}
