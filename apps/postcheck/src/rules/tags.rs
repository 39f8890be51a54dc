//! Tag taxonomy pass, plus the tag-list normalization shared with the
//! patch applier.

use super::Context;
use crate::models::ruleset::TagRules;
use crate::models::{Analysis, Fix, Issue, Suggestion};
use crate::synth;

pub const COUNT: &str = "tags/count";
pub const MISSING: &str = "tags/missing";
pub const CATEGORY_ORDER: &str = "tags/category-order";
pub const CASING: &str = "tags/casing";
pub const DEPRECATED: &str = "tags/deprecated";

pub fn run(cx: &Context) -> Analysis {
    let rules = &cx.rules.tags;
    let current = cx.doc.tags();
    let line = cx.doc.field_line("tags");
    let mut out = Analysis::default();

    if current.is_empty() {
        out.issue(
            Issue::new(COUNT, "No tags found. Add relevant tags for better discoverability").at(line),
        );
    } else if current.len() < rules.min {
        out.suggest(
            Suggestion::bad(
                COUNT,
                format!(
                    "Consider adding more tags ({}-{} recommended) for better categorization",
                    rules.min, rules.max_suggested
                ),
            )
            .at(line),
        );
    } else if current.len() > rules.max {
        out.suggest(
            Suggestion::bad(COUNT, "Too many tags. Focus on 3-5 most relevant ones").at(line),
        );
    }

    let normalized = normalize(&current, rules);

    let additions = synth::tags(cx, &normalized);
    if !additions.is_empty() {
        out.suggest(
            Suggestion::bad(MISSING, format!("Consider adding tags: {}", additions.join(", ")))
                .at(line)
                .with_fix(Fix::AddTags { tags: additions }),
        );
    }

    if !categories_lead(&normalized, rules) {
        out.suggest(
            Suggestion::bad(
                CATEGORY_ORDER,
                format!(
                    "Category tags ({}) should be at the top of the tag list",
                    rules.category_names().join(", ")
                ),
            )
            .at(line)
            .with_fix(Fix::CategoryTagsFirst),
        );
    }

    for tag in &current {
        if let Some(rule) = rules
            .casing
            .iter()
            .find(|c| tag.eq_ignore_ascii_case(&c.from) && *tag != c.to)
        {
            out.suggest(
                Suggestion::bad(
                    CASING,
                    format!("Use \"{}\" instead of \"{}\" for consistency", rule.to, tag),
                )
                .at(line)
                .with_fix(Fix::TagCase {
                    from: tag.clone(),
                    to: rule.to.clone(),
                }),
            );
        }
        if let Some(rule) = rules.deprecated.iter().find(|d| tag.eq_ignore_ascii_case(&d.from)) {
            out.suggest(
                Suggestion::bad(
                    DEPRECATED,
                    format!(
                        "Consider replacing \"{}\" with \"{}\" for better consistency",
                        tag, rule.to
                    ),
                )
                .at(line)
                .with_fix(Fix::ReplaceTag {
                    from: tag.clone(),
                    to: rule.to.clone(),
                }),
            );
        }
    }
    out
}

/// Apply deprecated-tag replacement and canonical casing, then drop
/// case-insensitive duplicates keeping the first occurrence.
pub fn normalize(tags: &[String], rules: &TagRules) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let mut t = tag.clone();
        if let Some(d) = rules.deprecated.iter().find(|d| t.eq_ignore_ascii_case(&d.from)) {
            t = d.to.clone();
        }
        if let Some(c) = rules.casing.iter().find(|c| t.eq_ignore_ascii_case(&c.from)) {
            t = c.to.clone();
        }
        push_unique(&mut out, t);
    }
    out
}

/// Append `tag` unless an equal tag (ignoring case) is already present.
pub fn push_unique(list: &mut Vec<String>, tag: String) {
    if !contains_tag(list, &tag) {
        list.push(tag);
    }
}

pub fn contains_tag(list: &[String], tag: &str) -> bool {
    list.iter().any(|t| t.to_lowercase() == tag.to_lowercase())
}

/// Stable partition: category tags first, everything else after.
pub fn categories_first(tags: Vec<String>, rules: &TagRules) -> Vec<String> {
    let (mut head, tail): (Vec<_>, Vec<_>) = tags.into_iter().partition(|t| rules.is_category(t));
    head.extend(tail);
    head
}

/// Whether no non-category tag precedes a category tag.
pub fn categories_lead(tags: &[String], rules: &TagRules) -> bool {
    let mut seen_other = false;
    for t in tags {
        if rules.is_category(t) {
            if seen_other {
                return false;
            }
        } else {
            seen_other = true;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ruleset::Ruleset;
    use crate::rules::fixtures::parse;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn run_raw(raw: &str) -> Analysis {
        let (doc, st, rules) = parse(raw);
        run(&Context::new(&doc, &st, &rules))
    }

    #[test]
    fn test_normalize_composes_fixes() {
        let rules = Ruleset::builtin().unwrap();
        let out = normalize(&v(&["ai", "open beta", "AI", "Features", "engineering"]), &rules.tags);
        assert_eq!(out, v(&["AI", "features", "Engineering"]));
    }

    #[test]
    fn test_category_partition_is_stable() {
        let rules = Ruleset::builtin().unwrap();
        let tags = v(&["AI", "Engineering", "Python", "Customers"]);
        assert!(!categories_lead(&tags, &rules.tags));
        let sorted = categories_first(tags, &rules.tags);
        assert_eq!(sorted, v(&["Engineering", "Customers", "AI", "Python"]));
        assert!(categories_lead(&sorted, &rules.tags));
    }

    #[test]
    fn test_no_tags_is_issue() {
        let a = run_raw("---\ntitle: x\n---\nhello\n");
        assert!(a.issues.iter().any(|i| i.rule == COUNT));
    }

    #[test]
    fn test_count_bounds() {
        let a = run_raw("---\ntags: [Python]\n---\nhello\n");
        assert!(a.suggestions.iter().any(|s| s.rule == COUNT && s.body.contains("more tags")));
        let a = run_raw("---\ntags: [a, b, c, d, e, f, g]\n---\nhello\n");
        assert!(a.suggestions.iter().any(|s| s.rule == COUNT && s.body.starts_with("Too many")));
    }

    #[test]
    fn test_missing_tags_suggested_with_fix() {
        let a = run_raw("---\ntags: [Engineering, Python]\n---\nWe use kubernetes with python.\n");
        let s = a.suggestions.iter().find(|s| s.rule == MISSING).unwrap();
        assert_eq!(s.fix, Some(Fix::AddTags { tags: v(&["Kubernetes"]) }));
    }

    #[test]
    fn test_casing_and_deprecated_tags() {
        let a = run_raw("---\ntags: [ai, vibe-coding]\n---\nhello\n");
        assert!(a.suggestions.iter().any(|s| s.fix
            == Some(Fix::TagCase { from: "ai".into(), to: "AI".into() })));
        assert!(a.suggestions.iter().any(|s| s.fix
            == Some(Fix::ReplaceTag { from: "vibe-coding".into(), to: "vibe coding".into() })));
    }

    #[test]
    fn test_category_order_flagged() {
        let a = run_raw("---\ntags: [Python, Engineering]\n---\nhello\n");
        assert!(a.suggestions.iter().any(|s| s.rule == CATEGORY_ORDER));
        let a = run_raw("---\ntags: [Engineering, Python]\n---\nhello\n");
        assert!(!a.suggestions.iter().any(|s| s.rule == CATEGORY_ORDER));
    }
}
