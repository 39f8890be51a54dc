//! Brand terminology pass.
//!
//! All phrases come from the ruleset; nothing here knows a brand name.

use super::Context;
use crate::models::{Analysis, Fix, Suggestion};
use crate::utils::contains_word;

pub const BRAND_DESCRIPTION: &str = "terms/brand-description";
pub const DEPRECATED: &str = "terms/deprecated";
pub const FEATURE: &str = "terms/feature";
pub const VALUE_PROP: &str = "terms/value-prop";
pub const NOUNS: &str = "terms/nouns";
pub const BRAND_CASE: &str = "terms/brand-case";

pub fn run(cx: &Context) -> Analysis {
    let mut out = Analysis::default();
    let rules = cx.rules;
    let brand = &rules.brand;
    let brand_lower = rules.brand_lower();
    let body = cx.body_lower.as_str();
    let title = cx.doc.title().unwrap_or_default();
    let description = cx.doc.description().unwrap_or_default();
    let full = format!("{} {} {}", title, description, cx.doc.body).to_lowercase();
    let mentions_brand = full.contains(&brand_lower);

    let preferred = brand
        .descriptions
        .iter()
        .find(|d| full.contains(&d.to_lowercase()));
    match preferred {
        Some(d) => out.suggest(Suggestion::good(
            BRAND_DESCRIPTION,
            format!("Great! Using preferred {} description: \"{}\"", brand.name, d),
        )),
        None if mentions_brand => out.suggest(Suggestion::bad(
            BRAND_DESCRIPTION,
            format!(
                "Consider adding a standard {} description. Suggested: \"{}\"",
                brand.name, brand.standard_description
            ),
        )),
        None => {}
    }

    for d in &rules.deprecated {
        let Some(found) = d.pattern.find(&cx.doc.body) else {
            continue;
        };
        let mut msg = format!("Consider replacing \"{}\" with \"{}\".", d.term, d.preferred);
        if let Some(reason) = &d.reason {
            msg.push_str(&format!(" Reason: {}", reason));
        }
        out.suggest(
            Suggestion::bad(DEPRECATED, msg)
                .at(cx.body_line_of(found.as_str()))
                .with_fix(Fix::ReplaceTerm {
                    term: d.term.clone(),
                    preferred: d.preferred.clone(),
                }),
        );
    }

    for feature in &rules.features {
        let has_preferred = feature
            .preferred
            .iter()
            .any(|p| body.contains(&p.to_lowercase()));
        let has_alternative = feature
            .alternatives
            .iter()
            .any(|a| contains_word(body, &a.to_lowercase()));
        if has_alternative && !has_preferred {
            out.suggest(Suggestion::bad(
                FEATURE,
                format!(
                    "Consider using preferred terminology for {}: {}. {}",
                    feature.name,
                    feature.preferred.join(" or "),
                    feature.context
                ),
            ));
        }
    }

    let title_desc = format!("{} {}", title, description).to_lowercase();
    let has_value_prop = brand
        .value_props
        .iter()
        .any(|p| title_desc.contains(&p.to_lowercase()));
    if mentions_brand && !has_value_prop {
        let examples: Vec<String> = brand
            .value_props
            .iter()
            .take(3)
            .map(|p| format!("\"{}\"", p))
            .collect();
        out.suggest(
            Suggestion::bad(
                VALUE_PROP,
                format!(
                    "Consider highlighting a key {} value proposition in title/description (e.g., {})",
                    brand.name,
                    examples.join(", ")
                ),
            )
            .at(cx.doc.field_line("title")),
        );
    }

    for noun in &rules.nouns {
        if !contains_word(body, &noun.term) {
            continue;
        }
        if noun.avoid.iter().any(|a| contains_word(body, a)) {
            out.suggest(Suggestion::bad(
                NOUNS,
                format!(
                    "When using \"{}\" ({}), avoid mixing with terms like {}. Use {} instead for consistency",
                    noun.term,
                    noun.context,
                    noun.avoid.join(", "),
                    noun.good_with.join(", ")
                ),
            ));
        }
    }

    if body.contains(&brand_lower) {
        let wrong = rules
            .brand_mentions(&cx.doc.body)
            .into_iter()
            .find(|m| !brand.spellings.iter().any(|s| s == m));
        if let Some(wrong) = wrong {
            out.suggest(
                Suggestion::bad(
                    BRAND_CASE,
                    format!(
                        "Ensure consistent \"{}\" capitalization (found \"{}\"; capitalize when used as product name)",
                        brand.name, wrong
                    ),
                )
                .at(cx.body_line_of(wrong)),
            );
        }
    }
    out
}
