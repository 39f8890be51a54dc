//! Output rendering for review and aspect commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is a plain
//! serialization of the report structs plus a top-level summary.

use crate::aspect::{AspectIssue, AspectStatus, AspectSummary};
use crate::config::OutputMode;
use crate::lint::{ReviewRun, Scope};
use crate::models::{CorpusSummary, PostReport, SuggestionKind};
use crate::utils::rel_to;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: OutputMode) -> bool {
    output != OutputMode::Json && std::env::var_os("NO_COLOR").is_none()
}

fn print_json(v: &JsonVal) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} {}", crate::utils::error_prefix(), e),
    }
}

#[derive(Clone, Copy)]
enum Level {
    Error,
    Warn,
    Info,
}

fn label(level: Level, color: bool) -> (String, String) {
    let (icon, sev) = match level {
        Level::Error => ("✖", "⟦error⟧"),
        Level::Warn => ("▲", "⟦warn⟧"),
        Level::Info => ("◆", "⟦info⟧"),
    };
    if !color {
        return (icon.to_string(), sev.to_string());
    }
    match level {
        Level::Error => (icon.red().to_string(), sev.red().bold().to_string()),
        Level::Warn => (icon.yellow().to_string(), sev.yellow().bold().to_string()),
        Level::Info => (icon.blue().to_string(), sev.blue().bold().to_string()),
    }
}

fn finding_line(level: Level, file: &str, line: Option<usize>, rule: &str, msg: &str, color: bool) -> String {
    let (icon, sev) = label(level, color);
    let loc = match line {
        Some(n) => format!("{}:{}", file, n),
        None => file.to_string(),
    };
    let loc = if color { loc.bold().to_string() } else { loc };
    format!("{} {} {} ❲{}❳ — {}", icon, sev, loc, rule, msg)
}

fn bold_line(text: &str, color: bool) {
    if color {
        println!("{}", text.bold());
    } else {
        println!("{}", text);
    }
}

/// Finding lines for one report: issues first, then suggestions.
pub fn report_lines(r: &PostReport, color: bool) -> Vec<String> {
    let mut out = Vec::new();
    for i in &r.issues {
        out.push(finding_line(Level::Error, &r.file, i.line, i.rule, &i.message, color));
    }
    for s in &r.suggestions {
        let level = match s.kind {
            SuggestionKind::Bad => Level::Warn,
            SuggestionKind::Good => Level::Info,
        };
        out.push(finding_line(level, &r.file, s.line_number, s.rule, &s.body, color));
    }
    out
}

fn print_details(r: &PostReport) {
    println!("  words: {}", r.word_count);
    if let Some(t) = &r.meta.title {
        println!("  title: {} ({} chars)", t, t.chars().count());
    }
    if let Some(d) = &r.meta.description {
        println!("  description: {} chars", d.chars().count());
    }
    if !r.meta.keywords.is_empty() {
        println!("  keywords: {}", r.meta.keywords.join(", "));
    }
    if !r.meta.tags.is_empty() {
        println!("  tags: {}", r.meta.tags.join(", "));
    }
    if !r.headings.is_empty() {
        println!("  outline:");
        for h in &r.headings {
            let indent = "  ".repeat(h.level.saturating_sub(1) as usize);
            println!("    {}{} {}", indent, "#".repeat(h.level as usize), h.text);
        }
    }
    for img in &r.images {
        let alt = if img.alt.is_empty() { "(no alt)" } else { img.alt.as_str() };
        match &img.caption {
            Some(c) => println!(
                "  image {} [{}] line {}: {} — caption: {}",
                img.src,
                img.kind.label(),
                img.line_number,
                alt,
                c
            ),
            None => println!("  image {} [{}] line {}: {}", img.src, img.kind.label(), img.line_number, alt),
        }
    }
}

fn print_post(r: &PostReport, color: bool, details: bool) {
    for line in report_lines(r, color) {
        println!("{}", line);
    }
    if details {
        print_details(r);
    }
    let summary = format!(
        "— Summary — issues={} suggestions={} words={}",
        r.issues.len(),
        r.suggestions.len(),
        r.word_count
    );
    bold_line(&summary, color);
}

fn print_corpus_summary(s: &CorpusSummary, color: bool) {
    bold_line(
        &format!(
            "— Corpus — posts={} with_issues={} failed={} issues={} suggestions={} avg_words={}",
            s.posts, s.posts_with_issues, s.failed, s.issues, s.suggestions, s.average_word_count
        ),
        color,
    );
    if !s.common_issues.is_empty() {
        println!("Most common issues:");
        for c in &s.common_issues {
            println!("  {} ❲{}❳", c.count, c.rule);
        }
    }
    if !s.needs_attention.is_empty() {
        println!("Needs attention:");
        for p in &s.needs_attention {
            println!("  {} — {} issues, {} suggestions", p.file, p.issues, p.suggestions);
        }
    }
    if !s.best_posts.is_empty() {
        println!("Best posts:");
        for p in &s.best_posts {
            println!("  {} — no issues, {} suggestions", p.file, p.suggestions);
        }
    }
}

/// Print a review run in the requested format.
pub fn print_review(run: &ReviewRun, output: OutputMode, base: &Path) {
    if output == OutputMode::Json {
        print_json(&compose_review_json(run, base));
        return;
    }
    let color = use_colors(output);
    match run.scope {
        Scope::Single { .. } => {
            for r in &run.result.reports {
                print_post(r, color, true);
            }
        }
        Scope::Corpus => {
            if let Some(s) = &run.result.summary {
                print_corpus_summary(s, color);
            }
            for r in run.result.reports.iter().filter(|r| !r.issues.is_empty()) {
                println!();
                print_post(r, color, false);
            }
        }
    }
    for f in &run.result.failures {
        let (icon, sev) = label(Level::Error, color);
        println!("{} {} {} — {}", icon, sev, f.file, f.message);
    }
    for a in run.applied.iter().filter(|a| a.changed) {
        let file = rel_to(base, &a.path);
        if color {
            println!("{} {} ({})", "✏️  applied:".green().bold(), file.bold(), a.applied.join(", "));
        } else {
            println!("✏️  applied: {} ({})", file, a.applied.join(", "));
        }
    }
    if let Some(after) = &run.after {
        println!();
        bold_line("— After applying changes —", color);
        print_post(after, color, true);
    }
}

/// Compose review JSON object (pure) for testing/snapshot purposes.
pub fn compose_review_json(run: &ReviewRun, base: &Path) -> JsonVal {
    let applied: Vec<_> = run
        .applied
        .iter()
        .map(|a| {
            json!({
                "file": rel_to(base, &a.path),
                "changed": a.changed,
                "applied": a.applied,
            })
        })
        .collect();
    let mut out = serde_json::to_value(&run.result).unwrap_or_default();
    if let JsonVal::Object(map) = &mut out {
        map.insert("applied".into(), JsonVal::Array(applied));
        if let Some(after) = &run.after {
            map.insert("after".into(), serde_json::to_value(after).unwrap_or_default());
        }
    }
    out
}

fn aspect_level(status: AspectStatus) -> Level {
    match status {
        AspectStatus::Error => Level::Error,
        AspectStatus::Warning => Level::Warn,
        AspectStatus::Success => Level::Info,
    }
}

fn print_aspect_issue(i: &AspectIssue, base: &Path, color: bool) {
    let (icon, sev) = label(aspect_level(i.status), color);
    let file = rel_to(base, &i.file);
    let file = if color { file.bold().to_string() } else { file };
    println!("{} {} {} — {}", icon, sev, file, i.message);
    if let [by_width, by_height] = i.suggestions.as_slice() {
        println!("    Suggestion: Resize to {} or {}", by_width, by_height);
    }
}

fn print_aspect_summary(s: &AspectSummary, color: bool) {
    bold_line(
        &format!(
            "— Summary — posts={} errors={} warnings={} successes={}",
            s.posts, s.errors, s.warnings, s.successes
        ),
        color,
    );
}

/// Print aspect results grouped by status; passing images only when
/// `verbose`.
pub fn print_aspect(issues: &[AspectIssue], summary: &AspectSummary, verbose: bool, output: OutputMode, base: &Path) {
    if output == OutputMode::Json {
        print_json(&compose_aspect_json(issues, summary, base));
        return;
    }
    let color = use_colors(output);
    for status in [AspectStatus::Error, AspectStatus::Warning, AspectStatus::Success] {
        if status == AspectStatus::Success && !verbose {
            continue;
        }
        for i in issues.iter().filter(|i| i.status == status) {
            print_aspect_issue(i, base, color);
        }
    }
    print_aspect_summary(summary, color);
}

/// Print a diff-scoped aspect run: the changed posts, then results.
pub fn print_aspect_diff(
    changed: &[String],
    issues: &[AspectIssue],
    summary: &AspectSummary,
    verbose: bool,
    output: OutputMode,
    base: &Path,
) {
    if output == OutputMode::Json {
        let mut v = compose_aspect_json(issues, summary, base);
        if let JsonVal::Object(map) = &mut v {
            map.insert("changed".into(), json!(changed));
        }
        print_json(&v);
        return;
    }
    if changed.is_empty() {
        println!("No blog posts were modified in the diff");
        return;
    }
    println!("Found {} changed blog post(s):", changed.len());
    for c in changed {
        println!("  - {}", c);
    }
    print_aspect(issues, summary, verbose, output, base);
}

/// Compose aspect JSON object (pure) for testing/snapshot purposes.
pub fn compose_aspect_json(issues: &[AspectIssue], summary: &AspectSummary, base: &Path) -> JsonVal {
    let items: Vec<JsonVal> = issues
        .iter()
        .map(|i| {
            let mut v = serde_json::to_value(i).unwrap_or_default();
            if let JsonVal::Object(map) = &mut v {
                map.insert("file".into(), json!(rel_to(base, &i.file)));
            }
            v
        })
        .collect();
    json!({"results": items, "summary": summary})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::Dimensions;
    use crate::models::{Issue, MetaSummary, ReviewResult, Suggestion};
    use std::path::PathBuf;

    fn report() -> PostReport {
        PostReport {
            file: "blog/a/index.mdx".into(),
            word_count: 120,
            headings: Vec::new(),
            images: Vec::new(),
            meta: MetaSummary {
                title: Some("A".into()),
                description: None,
                keywords: Vec::new(),
                tags: Vec::new(),
            },
            issues: vec![Issue::new("seo/length", "Content too short").at(Some(4))],
            suggestions: vec![Suggestion::good("llm/code-examples", "Has code")],
        }
    }

    #[test]
    fn test_report_lines_plain() {
        let lines = report_lines(&report(), false);
        assert_eq!(
            lines,
            vec![
                "✖ ⟦error⟧ blog/a/index.mdx:4 ❲seo/length❳ — Content too short".to_string(),
                "◆ ⟦info⟧ blog/a/index.mdx ❲llm/code-examples❳ — Has code".to_string(),
            ]
        );
    }

    #[test]
    fn test_compose_review_json_shape() {
        let run = ReviewRun {
            scope: Scope::Single { auto_detected: false },
            result: ReviewResult {
                reports: vec![report()],
                failures: Vec::new(),
                summary: None,
            },
            applied: Vec::new(),
            after: None,
            write_failures: 0,
        };
        let v = compose_review_json(&run, Path::new("/repo"));
        assert_eq!(v["reports"][0]["wordCount"], 120);
        assert_eq!(v["reports"][0]["issues"][0]["rule"], "seo/length");
        assert!(v["applied"].as_array().unwrap().is_empty());
        assert!(v.get("summary").is_none());
        assert!(v.get("after").is_none());
    }

    #[test]
    fn test_compose_aspect_json_relative_files() {
        let issue = AspectIssue {
            status: AspectStatus::Warning,
            file: PathBuf::from("/repo/blog/a/index.mdx"),
            image: "./cover.png".into(),
            message: "m".into(),
            dimensions: Some(Dimensions { width: 1000, height: 1000 }),
            aspect_ratio: Some(1.0),
            suggestions: vec![
                Dimensions { width: 1778, height: 1000 },
                Dimensions { width: 1000, height: 563 },
            ],
        };
        let summary = AspectSummary::from_issues(1, std::slice::from_ref(&issue));
        let v = compose_aspect_json(&[issue], &summary, Path::new("/repo"));
        assert_eq!(v["results"][0]["file"], "blog/a/index.mdx");
        assert_eq!(v["results"][0]["status"], "warning");
        assert_eq!(v["results"][0]["suggestions"][1]["height"], 563);
        assert_eq!(v["summary"]["warnings"], 1);
    }
}
