//! Patch applier: turns fix-carrying suggestions into a rewritten document
//! and persists it atomically.
//!
//! `plan` is pure and returns the new text; `apply` plans and then writes,
//! skipping the write when nothing changed. This is the only module that
//! mutates files.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::extract::{scan_line, ImageKind};
use crate::frontmatter::FieldValue;
use crate::models::ruleset::{word_pattern, Ruleset};
use crate::models::{Fix, Suggestion};
use crate::rules::tags;
use regex::Captures;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Longest caption accepted as replacement alt text.
const MAX_ALT_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    pub path: PathBuf,
    pub changed: bool,
    pub applied: Vec<String>,
}

#[derive(Debug, Clone)]
/// The rewritten document text and a description of each applied change.
pub struct Plan {
    pub content: String,
    pub applied: Vec<String>,
}

/// Compute the rewritten document without touching the filesystem.
pub fn plan(doc: &Document, suggestions: &[Suggestion], rules: &Ruleset) -> Result<Plan> {
    let fixes: Vec<&Fix> = suggestions.iter().filter_map(|s| s.fix.as_ref()).collect();
    let mut applied = Vec::new();

    let mut body = apply_caption_alts(&doc.body, &fixes, &mut applied);
    for fix in &fixes {
        if let Fix::ReplaceTerm { term, preferred } = fix {
            let pattern = match rules.deprecated_term(term) {
                Some(d) => d.pattern.clone(),
                None => word_pattern(term)?,
            };
            if pattern.is_match(&body) {
                body = pattern
                    .replace_all(&body, |caps: &Captures| keep_leading_case(&caps[0], preferred))
                    .into_owned();
                applied.push(format!("terminology: \"{}\" -> \"{}\"", term, preferred));
            }
        }
    }

    let mut fm = doc.frontmatter.clone();
    if let Some(text) = fixes.iter().rev().find_map(|f| match f {
        Fix::Description { text } => Some(text),
        _ => None,
    }) {
        if doc.description().as_deref() != Some(text.as_str()) {
            fm.set("description", FieldValue::string(text.clone()));
            applied.push("description".to_string());
        }
    }
    if fixes.iter().any(|f| f.touches_tags()) {
        let current = doc.tags();
        let next = compose_tags(&current, &fixes, rules);
        if next != current {
            fm.set("tags", FieldValue::strings(next));
            applied.push("tags".to_string());
        }
    }

    let content = if fm == doc.frontmatter {
        format!("{}{}", doc.head(), body)
    } else {
        Document::render(&fm, &body)?
    };
    Ok(Plan { content, applied })
}

/// Plan and persist. A plan identical to the current text is not written.
pub fn apply(doc: &Document, suggestions: &[Suggestion], rules: &Ruleset) -> Result<PatchOutcome> {
    let plan = plan(doc, suggestions, rules)?;
    if plan.content == doc.raw {
        debug!(path = %doc.path.display(), "no changes to write");
        return Ok(PatchOutcome {
            path: doc.path.clone(),
            changed: false,
            applied: Vec::new(),
        });
    }
    write_atomic(&doc.path, &plan.content)?;
    info!(path = %doc.path.display(), changes = plan.applied.len(), "applied fixes");
    Ok(PatchOutcome {
        path: doc.path.clone(),
        changed: true,
        applied: plan.applied,
    })
}

/// `preferred`, capitalized when `found` starts with an uppercase letter.
fn keep_leading_case(found: &str, preferred: &str) -> String {
    let upper = found.chars().next().is_some_and(char::is_uppercase);
    let mut chars = preferred.chars();
    match chars.next() {
        Some(first) if upper => first.to_uppercase().chain(chars).collect(),
        _ => preferred.to_string(),
    }
}

/// One tag list assignment: renames, normalization, additions, then
/// category tags moved to the front.
fn compose_tags(current: &[String], fixes: &[&Fix], rules: &Ruleset) -> Vec<String> {
    let renamed: Vec<String> = current
        .iter()
        .map(|tag| {
            let mut t = tag.clone();
            for fix in fixes {
                match fix {
                    Fix::ReplaceTag { from, to } if t.eq_ignore_ascii_case(from) => t = to.clone(),
                    _ => {}
                }
            }
            for fix in fixes {
                match fix {
                    Fix::TagCase { from, to } if t == *from => t = to.clone(),
                    _ => {}
                }
            }
            t
        })
        .collect();
    let mut list = tags::normalize(&renamed, &rules.tags);
    for fix in fixes {
        if let Fix::AddTags { tags: additions } = fix {
            for tag in additions {
                tags::push_unique(&mut list, tag.clone());
            }
        }
    }
    tags::categories_first(list, &rules.tags)
}

fn apply_caption_alts(body: &str, fixes: &[&Fix], applied: &mut Vec<String>) -> String {
    let mut by_line: BTreeMap<usize, Vec<(&str, &str)>> = BTreeMap::new();
    for fix in fixes {
        if let Fix::CaptionAsAlt { src, caption, line } = fix {
            by_line
                .entry(*line)
                .or_default()
                .push((src.as_str(), caption.as_str()));
        }
    }
    if by_line.is_empty() {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len() + 64);
    for (idx, raw_line) in body.split_inclusive('\n').enumerate() {
        let Some(targets) = by_line.get(&(idx + 1)) else {
            out.push_str(raw_line);
            continue;
        };
        let content_len = raw_line.trim_end_matches(['\n', '\r']).len();
        let (content, ending) = raw_line.split_at(content_len);
        out.push_str(&rewrite_alts(content, targets, applied));
        out.push_str(ending);
    }
    out
}

fn rewrite_alts(line: &str, targets: &[(&str, &str)], applied: &mut Vec<String>) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with("import ") || trimmed.starts_with("export ") {
        debug!(line, "skipping alt rewrite in module statement");
        return line.to_string();
    }
    let mut out = line.to_string();
    // Right to left so earlier spans stay valid.
    for m in scan_line(line).into_iter().rev() {
        let Some((src, caption)) = targets.iter().find(|(src, _)| *src == m.src) else {
            continue;
        };
        if m.has_binding || inside_binding(line, m.span.start) {
            debug!(src, "skipping alt rewrite in attribute binding");
            continue;
        }
        let alt = sanitize_caption(caption);
        if alt.is_empty() {
            continue;
        }
        match (&m.alt_span, m.kind) {
            (Some(span), _) => out.replace_range(span.clone(), &alt),
            (None, ImageKind::RawMarkup) => {
                let spaced = line[..m.insert_at].ends_with(char::is_whitespace);
                let attr = if spaced {
                    format!("alt=\"{}\" ", alt)
                } else {
                    format!(" alt=\"{}\"", alt)
                };
                out.insert_str(m.insert_at, &attr);
            }
            (None, ImageKind::InlineMarkup) => continue,
        }
        applied.push(format!("alt text: {}", src));
    }
    out
}

/// Whether `pos` sits inside an unclosed `={...}` on the same line.
fn inside_binding(line: &str, pos: usize) -> bool {
    let before = &line[..pos];
    match before.rfind("={") {
        Some(open) => {
            let depth = before[open + 1..].chars().fold(0i32, |d, c| match c {
                '{' => d + 1,
                '}' => d - 1,
                _ => d,
            });
            depth > 0
        }
        None => false,
    }
}

/// Strip characters that would break markup, and cap the length.
pub fn sanitize_caption(caption: &str) -> String {
    let cleaned: String = caption
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '<' | '>' | '[' | ']'))
        .collect();
    crate::utils::truncate_chars(cleaned.trim(), MAX_ALT_CHARS)
        .trim_end()
        .to_string()
}

/// Write `content` to a temporary file beside `path`, then rename it over
/// `path`. The temporary file is removed on any failure, and the original
/// file's permissions carry over.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let fail = |source: io::Error| Error::WriteFailure {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(fail)?;
    tmp.write_all(content.as_bytes()).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(fail)?;
    }
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
