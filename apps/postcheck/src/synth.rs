//! Description and tag synthesis from content heuristics.
//!
//! Everything reads the canonical text (title, headings, body with
//! deprecated terms rewritten, lowercased), so a synthesized value stays the
//! same after `--apply` has rewritten the body.

use crate::models::ruleset::{Ruleset, SynthSpec};
use crate::rules::tags::{contains_tag, push_unique};
use crate::rules::Context;
use crate::utils::contains_word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionMode {
    /// Missing or too short: aim for the regular target length.
    Expand,
    /// Too long: aim for the short target length.
    Shorten,
}

/// Keyword signals derived from the canonical text.
#[derive(Debug, Clone)]
pub struct ContentContext {
    pub all_text: String,
    pub title: String,
    pub brand_post: bool,
    pub tech_terms: Vec<String>,
    pub concepts: Vec<String>,
    pub topics: Vec<String>,
}

impl ContentContext {
    pub fn gather(cx: &Context) -> Self {
        let rules = cx.rules;
        let spec = &rules.synth;
        let all_text = cx.canonical_text();
        let matching = |list: &[String]| -> Vec<String> {
            list.iter()
                .filter(|k| all_text.contains(&k.to_lowercase()))
                .cloned()
                .collect()
        };
        let tech_terms = matching(&spec.tech_keywords);
        let concepts = matching(&spec.concept_keywords);
        let topics = spec
            .topics
            .iter()
            .filter(|t| t.any.iter().any(|k| all_text.contains(&k.to_lowercase())))
            .map(|t| t.label.clone())
            .collect();
        Self {
            brand_post: all_text.contains(&rules.brand_lower()),
            title: cx.doc.title().unwrap_or_default().to_lowercase(),
            all_text,
            tech_terms,
            concepts,
            topics,
        }
    }

    fn has(&self, needle: &str) -> bool {
        self.all_text.contains(&needle.to_lowercase())
    }

    fn has_any(&self, needles: &[String]) -> bool {
        needles.iter().any(|n| self.has(n))
    }

    fn has_word(&self, needles: &[String]) -> bool {
        needles
            .iter()
            .any(|n| contains_word(&self.all_text, &n.to_lowercase()))
    }
}

/// Synthesize a meta description. Deterministic in the document text.
pub fn description(cx: &Context, mode: DescriptionMode) -> String {
    let rules = cx.rules;
    let ctx = ContentContext::gather(cx);
    let action = action_phrase(&ctx, &rules.synth);
    let draft = capitalize_first(&build(&ctx, rules, action));
    let limits = &rules.limits;
    let target = match mode {
        DescriptionMode::Expand => limits.description_target,
        DescriptionMode::Shorten => limits.description_target_short,
    };
    let continuation = if ctx.brand_post {
        &rules.synth.brand_continuation
    } else {
        &rules.synth.generic_continuation
    };
    fit_length(
        draft,
        target,
        limits.description_min,
        limits.description_max,
        continuation,
    )
}

/// Taxonomy tags the content matches that `current` lacks.
///
/// Only fills the list up to `max_suggested` entries, so applying the
/// result once leaves nothing further to suggest.
pub fn tags(cx: &Context, current: &[String]) -> Vec<String> {
    let rules = &cx.rules.tags;
    let room = rules
        .max_suggested
        .min(rules.max)
        .saturating_sub(current.len());
    if room == 0 {
        return Vec::new();
    }
    let text = cx.canonical_text();
    let mut found: Vec<String> = Vec::new();
    for entry in &rules.taxonomy {
        if rules.is_category(&entry.tag) && entry.requires.is_empty() {
            continue;
        }
        if contains_tag(current, &entry.tag) || !entry.matches(&text) {
            continue;
        }
        push_unique(&mut found, entry.tag.clone());
    }
    found.truncate(room);
    found
}

fn action_phrase<'s>(ctx: &ContentContext, spec: &'s SynthSpec) -> &'s str {
    spec.actions
        .iter()
        .find(|a| ctx.has_any(&a.any))
        .map(|a| a.phrase.as_str())
        .unwrap_or(spec.default_action.as_str())
}

fn build(ctx: &ContentContext, rules: &Ruleset, action: &str) -> String {
    let spec = &rules.synth;
    let t = &spec.templates;
    let tech = if !ctx.tech_terms.is_empty() {
        ctx.tech_terms.iter().take(2).cloned().collect::<Vec<_>>().join(" and ")
    } else if !ctx.topics.is_empty() {
        ctx.topics.join(" and ")
    } else {
        spec.default_tech.clone()
    };
    let concept = ctx
        .concepts
        .first()
        .cloned()
        .unwrap_or_else(|| spec.default_concept.clone());

    let mut vars = Vars::default();
    vars.set("action", action);
    vars.set("tech", &tech);
    vars.set("concept", &concept);
    vars.set("brand", &rules.brand.name);
    vars.set("product", &rules.brand.product);

    if !ctx.brand_post {
        return vars.fill(&t.generic);
    }

    let brand = rules.brand_lower();
    let title_has_dev = spec
        .dev_concepts
        .iter()
        .any(|c| contains_word(&ctx.title, c));
    let dev_tools = (title_has_dev && !ctx.title.contains(&brand)) || ctx.has_word(&spec.dev_tool_phrases);
    if dev_tools {
        let dev_concept = ctx
            .concepts
            .iter()
            .find(|c| spec.dev_concepts.contains(c))
            .cloned()
            .unwrap_or_else(|| spec.default_concept.clone());
        vars.set("dev_concept", &dev_concept);
        return vars.fill(&t.dev_tools);
    }

    let focused = rules.brand_sentences(&ctx.all_text) > 2 || ctx.title.contains(&brand);
    if focused {
        let value_prop = spec
            .value_props
            .iter()
            .find(|p| {
                let p = p.to_lowercase();
                ctx.has(&p) || ctx.has(&p.replacen('-', " ", 1)) || ctx.has(&p.replacen('-', "", 1))
            })
            .or_else(|| spec.value_props.first())
            .cloned()
            .unwrap_or_default();
        vars.set("value_prop", &value_prop);
        let lead = ctx
            .concepts
            .first()
            .cloned()
            .unwrap_or_else(|| capitalize_first(&spec.default_concept));
        vars.set("lead_concept", &lead);

        let ai = ctx.tech_terms.iter().any(|t| t == "ai") || ctx.has_any(&spec.ai_markers);
        if ai {
            return vars.fill(&t.focused_ai);
        }
        let migration =
            ctx.concepts.iter().any(|c| c == "migration") || ctx.has_any(&spec.migration_markers);
        if migration {
            return vars.fill(&t.focused_migration);
        }
        return vars.fill(&t.focused);
    }

    if ctx.has_word(&spec.tool_words) {
        vars.fill(&t.mention_tools)
    } else {
        vars.fill(&t.mention)
    }
}

/// Placeholder values for a template.
#[derive(Default)]
struct Vars(Vec<(&'static str, String)>);

impl Vars {
    fn set(&mut self, key: &'static str, value: &str) {
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.to_string()));
    }

    fn fill(&self, template: &str) -> String {
        let mut out = template.to_string();
        for (k, v) in &self.0 {
            out = out.replace(&format!("{{{}}}", k), v);
        }
        out
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim to `target` at a sentence or word boundary, or pad with
/// `continuation` when under `min` and the result stays within `max`.
/// Lengths are in characters.
pub fn fit_length(
    mut desc: String,
    target: usize,
    min: usize,
    max: usize,
    continuation: &str,
) -> String {
    if desc.chars().count() > target {
        let head: Vec<char> = desc.chars().take(target).collect();
        let last_period = head.iter().rposition(|c| *c == '.');
        let last_space = head.iter().rposition(|c| *c == ' ');
        desc = match (last_period, last_space) {
            (Some(p), _) if p + 20 > target => head[..=p].iter().collect(),
            (_, Some(s)) if s + 15 > target => {
                let mut cut: String = head[..s].iter().collect();
                cut.push('.');
                cut
            }
            _ => {
                let mut cut: String = head.iter().collect();
                cut.push_str("...");
                cut
            }
        };
    }
    let len = desc.chars().count();
    if len < min && len + continuation.chars().count() <= max {
        desc.push_str(continuation);
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::parse;

    fn describe(raw: &str, mode: DescriptionMode) -> String {
        let (doc, st, rules) = parse(raw);
        description(&Context::new(&doc, &st, &rules), mode)
    }

    #[test]
    fn test_description_is_deterministic() {
        let raw = "---\ntitle: Tigris for AI models\n---\n## How to build\nTigris stores model weights. Tigris is fast. Tigris scales.\n";
        let a = describe(raw, DescriptionMode::Expand);
        let b = describe(raw, DescriptionMode::Expand);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_generic_description_template() {
        let raw = "---\ntitle: Writing python scripts\n---\nA tutorial about python deployment.\n";
        let d = describe(raw, DescriptionMode::Expand);
        assert!(d.starts_with("Learn how python for deployment."), "{}", d);
        assert!(d.ends_with(" Step-by-step tutorial with practical examples."));
        assert!(d.chars().count() <= 160);
    }

    #[test]
    fn test_brand_focused_ai_template() {
        let raw = "---\ntitle: Serving models from Tigris\n---\nWe build inference on models.\n";
        let d = describe(raw, DescriptionMode::Expand);
        assert!(d.starts_with("Build AI applications with Tigris"), "{}", d);
    }

    #[test]
    fn test_first_letter_capitalized() {
        assert_eq!(capitalize_first("learn how"), "Learn how");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_fit_length_prefers_sentence_boundary() {
        let text = format!("{}. {}", "a".repeat(140), "b".repeat(40));
        let out = fit_length(text, 150, 120, 160, " more.");
        assert_eq!(out.chars().count(), 141);
        assert!(out.ends_with('.'));
    }

    #[test]
    fn test_fit_length_word_boundary_then_hard_cut() {
        let words = format!("{} {}", "a".repeat(100), "b".repeat(45));
        let text = format!("{} {}", words, "c".repeat(30));
        let out = fit_length(text, 150, 120, 160, "");
        assert_eq!(out, format!("{}.", words));

        let out = fit_length("x".repeat(200), 150, 120, 160, "");
        assert_eq!(out.chars().count(), 153);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_fit_length_pads_only_within_max() {
        let out = fit_length("Short.".into(), 150, 120, 160, " pad.");
        assert_eq!(out, "Short. pad.");
        let base = "y".repeat(119);
        let out = fit_length(base.clone(), 150, 120, 160, &" z".repeat(30));
        assert_eq!(out, base);
    }

    #[test]
    fn test_tag_synthesis_respects_room() {
        let raw = "---\ntitle: x\n---\npython kubernetes docker security latency\n";
        let (doc, st, rules) = parse(raw);
        let cx = Context::new(&doc, &st, &rules);
        let current: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        let found = tags(&cx, &current);
        assert_eq!(found.len(), 2);
        assert_eq!(found, vec!["Security".to_string(), "Performance".to_string()]);
        let full: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        assert!(tags(&cx, &full).is_empty());
    }
}
