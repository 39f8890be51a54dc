//! SEO metadata pass: title, description, keywords, length, headings,
//! image alt text, slug.

use super::Context;
use crate::models::{Analysis, Fix, Issue, Suggestion};
use crate::synth::{self, DescriptionMode};

pub const TITLE: &str = "seo/title";
pub const DESCRIPTION: &str = "seo/description";
pub const KEYWORDS: &str = "seo/keywords";
pub const LENGTH: &str = "seo/length";
pub const HEADINGS: &str = "seo/headings";
pub const IMAGE_ALT: &str = "seo/image-alt";
pub const SLUG: &str = "seo/slug";

pub fn run(cx: &Context) -> Analysis {
    let mut out = Analysis::default();
    check_title(cx, &mut out);
    check_description(cx, &mut out);
    check_keywords(cx, &mut out);
    check_length(cx, &mut out);
    check_headings(cx, &mut out);
    check_images(cx, &mut out);
    check_slug(cx, &mut out);
    out
}

fn check_title(cx: &Context, out: &mut Analysis) {
    let limits = &cx.rules.limits;
    let Some(title) = cx.doc.title() else {
        out.issue(Issue::new(TITLE, "Missing title in frontmatter"));
        return;
    };
    let len = title.chars().count();
    let line = cx.doc.field_line("title");
    if len < limits.title_min {
        out.suggest(
            Suggestion::bad(
                TITLE,
                format!(
                    "Title is short ({} chars). Consider expanding to 50-{} characters for better SEO",
                    len, limits.title_max
                ),
            )
            .at(line),
        );
    } else if len > limits.title_max {
        out.suggest(
            Suggestion::bad(
                TITLE,
                format!(
                    "Title is long ({} chars). Consider shortening to under {} characters",
                    len, limits.title_max
                ),
            )
            .at(line),
        );
    }
}

fn check_description(cx: &Context, out: &mut Analysis) {
    let limits = &cx.rules.limits;
    let line = cx.doc.field_line("description");
    let (label, mode) = match cx.doc.description() {
        None => {
            out.issue(Issue::new(DESCRIPTION, "Missing meta description"));
            ("meta", DescriptionMode::Expand)
        }
        Some(desc) => {
            let len = desc.chars().count();
            if len < limits.description_min {
                out.suggest(
                    Suggestion::bad(
                        DESCRIPTION,
                        format!(
                            "Meta description is short ({} chars). Expand to 150-{} characters",
                            len, limits.description_max
                        ),
                    )
                    .at(line),
                );
                ("improved", DescriptionMode::Expand)
            } else if len > limits.description_max {
                out.suggest(
                    Suggestion::bad(
                        DESCRIPTION,
                        format!(
                            "Meta description is long ({} chars). Shorten to under {} characters",
                            len, limits.description_max
                        ),
                    )
                    .at(line),
                );
                ("shortened", DescriptionMode::Shorten)
            } else {
                return;
            }
        }
    };
    let text = synth::description(cx, mode);
    if text.is_empty() {
        return;
    }
    out.suggest(
        Suggestion::good(
            DESCRIPTION,
            format!("Suggested {} description: \"{}\"", label, text),
        )
        .at(line)
        .with_fix(Fix::Description { text }),
    );
}

fn check_keywords(cx: &Context, out: &mut Analysis) {
    let count = cx.doc.keywords().len();
    let line = cx.doc.field_line("keywords");
    if count == 0 {
        out.suggest(
            Suggestion::bad(KEYWORDS, "Consider adding relevant keywords for better discoverability")
                .at(line),
        );
    } else if count > cx.rules.limits.keywords_max {
        out.suggest(
            Suggestion::bad(
                KEYWORDS,
                format!("Too many keywords ({}). Focus on 5-8 most relevant ones", count),
            )
            .at(line),
        );
    }
}

fn check_length(cx: &Context, out: &mut Analysis) {
    let limits = &cx.rules.limits;
    let wc = cx.structure.word_count;
    if wc < limits.words_min {
        out.issue(Issue::new(
            LENGTH,
            format!(
                "Content is very short ({} words). Aim for at least {} words",
                wc, limits.words_recommended
            ),
        ));
    } else if wc < limits.words_recommended {
        out.suggest(Suggestion::bad(
            LENGTH,
            format!("Content is on the shorter side ({} words). Consider expanding", wc),
        ));
    }
}

fn check_headings(cx: &Context, out: &mut Analysis) {
    let st = cx.structure;
    if st.headings.is_empty() {
        out.issue(Issue::new(HEADINGS, "No headings found. Use H2-H6 to structure content"));
        return;
    }
    if st.count_level(1) > 1 {
        out.issue(Issue::new(HEADINGS, "Multiple H1 headings found. Use only one H1 per page"));
    }
    if st.count_level(2) == 0 {
        out.suggest(Suggestion::bad(
            HEADINGS,
            "No H2 headings found. Add section headings for better structure",
        ));
    }
}

fn check_images(cx: &Context, out: &mut Analysis) {
    let min = cx.rules.limits.alt_min;
    for img in &cx.structure.images {
        let line = Some(cx.doc.file_line(img.line_number));
        let alt_len = img.alt.trim().chars().count();
        let caption_fix = |caption: &String| Fix::CaptionAsAlt {
            src: img.src.clone(),
            caption: caption.clone(),
            line: img.line_number,
        };
        if alt_len == 0 {
            match &img.caption {
                Some(caption) => out.suggest(
                    Suggestion::bad(
                        IMAGE_ALT,
                        format!(
                            "Image missing alt text: {}. Consider using the caption text: \"{}\"",
                            img.src, caption
                        ),
                    )
                    .at(line)
                    .with_fix(caption_fix(caption)),
                ),
                None => out.issue(
                    Issue::new(IMAGE_ALT, format!("Image missing alt text: {}", img.src)).at(line),
                ),
            }
        } else if alt_len < min {
            match img.caption.as_ref().filter(|c| c.chars().count() >= min) {
                Some(caption) => out.suggest(
                    Suggestion::bad(
                        IMAGE_ALT,
                        format!(
                            "Alt text too short for image: {}. Consider using the caption text: \"{}\"",
                            img.src, caption
                        ),
                    )
                    .at(line)
                    .with_fix(caption_fix(caption)),
                ),
                None => out.suggest(
                    Suggestion::bad(IMAGE_ALT, format!("Alt text too short for image: {}", img.src))
                        .at(line),
                ),
            }
        }
    }
}

fn check_slug(cx: &Context, out: &mut Analysis) {
    let Some(slug) = cx.doc.slug() else {
        return;
    };
    let line = cx.doc.field_line("slug");
    if slug.chars().count() > cx.rules.limits.slug_max {
        out.suggest(
            Suggestion::bad(SLUG, "Slug is quite long. Consider shortening for better URLs").at(line),
        );
    }
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        out.suggest(
            Suggestion::bad(
                SLUG,
                "Slug should only contain lowercase letters, numbers, and hyphens",
            )
            .at(line),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuggestionKind;
    use crate::rules::fixtures::{parse, words};

    fn run_raw(raw: &str) -> Analysis {
        let (doc, st, rules) = parse(raw);
        run(&Context::new(&doc, &st, &rules))
    }

    fn post_with_words(n: usize) -> String {
        format!(
            "---\ntitle: A reasonably sized title for testing here\n---\n## Section\n{}\n",
            words(n)
        )
    }

    #[test]
    fn test_word_count_thresholds() {
        let a = run_raw(&post_with_words(250));
        assert!(a.issues.iter().any(|i| i.rule == LENGTH));

        let a = run_raw(&post_with_words(400));
        assert!(!a.issues.iter().any(|i| i.rule == LENGTH));
        assert!(a.suggestions.iter().any(|s| s.rule == LENGTH));

        let a = run_raw(&post_with_words(600));
        assert!(!a.issues.iter().any(|i| i.rule == LENGTH));
        assert!(!a.suggestions.iter().any(|s| s.rule == LENGTH));
    }

    #[test]
    fn test_missing_title_and_description_are_issues() {
        let a = run_raw("---\nslug: ok\n---\n## Hi\n");
        assert!(a.issues.iter().any(|i| i.rule == TITLE));
        assert!(a.issues.iter().any(|i| i.rule == DESCRIPTION));
        let synth = a
            .suggestions
            .iter()
            .find(|s| s.rule == DESCRIPTION && s.kind == SuggestionKind::Good)
            .unwrap();
        assert!(matches!(synth.fix, Some(Fix::Description { .. })));
    }

    #[test]
    fn test_short_title_reports_line() {
        let a = run_raw("---\nslug: x\ntitle: Short\n---\n## Hi\n");
        let s = a.suggestions.iter().find(|s| s.rule == TITLE).unwrap();
        assert_eq!(s.line_number, Some(3));
    }

    #[test]
    fn test_long_description_requests_shortened_synthesis() {
        let desc = "d".repeat(170);
        let a = run_raw(&format!("---\ndescription: {}\n---\n## Hi\n", desc));
        let good = a
            .suggestions
            .iter()
            .find(|s| s.kind == SuggestionKind::Good && s.rule == DESCRIPTION)
            .unwrap();
        assert!(good.body.starts_with("Suggested shortened description"));
        match &good.fix {
            Some(Fix::Description { text }) => assert!(text.chars().count() <= 160),
            other => panic!("unexpected fix: {:?}", other),
        }
    }

    #[test]
    fn test_heading_structure() {
        let a = run_raw("---\ntitle: t\n---\nno headings\n");
        assert!(a.issues.iter().any(|i| i.message.starts_with("No headings")));

        let a = run_raw("---\ntitle: t\n---\n# One\n# Two\n");
        assert!(a.issues.iter().any(|i| i.message.starts_with("Multiple H1")));
        assert!(a.suggestions.iter().any(|s| s.body.starts_with("No H2")));
    }

    #[test]
    fn test_short_alt_proposes_caption_verbatim() {
        let raw = "---\ntitle: t\n---\n## Hi\n![img](./a.png)\n*The full pipeline diagram*\n";
        let a = run_raw(raw);
        let s = a.suggestions.iter().find(|s| s.rule == IMAGE_ALT).unwrap();
        assert!(s.body.contains("\"The full pipeline diagram\""));
        assert_eq!(s.line_number, Some(5));
        assert_eq!(
            s.fix,
            Some(Fix::CaptionAsAlt {
                src: "./a.png".into(),
                caption: "The full pipeline diagram".into(),
                line: 2,
            })
        );
    }

    #[test]
    fn test_missing_alt_without_caption_is_issue() {
        let a = run_raw("---\ntitle: t\n---\n## Hi\n![](./a.png)\n\nprose\n");
        assert!(a.issues.iter().any(|i| i.rule == IMAGE_ALT && i.line == Some(5)));
    }

    #[test]
    fn test_short_alt_with_short_caption_has_no_fix() {
        let a = run_raw("---\ntitle: t\n---\n## Hi\n![a](./a.png)\n*Fig*\n");
        let s = a.suggestions.iter().find(|s| s.rule == IMAGE_ALT).unwrap();
        assert!(s.fix.is_none());
    }

    #[test]
    fn test_slug_rules() {
        let long = "a".repeat(51);
        let a = run_raw(&format!("---\nslug: {}\n---\n", long));
        assert!(a.suggestions.iter().any(|s| s.body.starts_with("Slug is quite long")));
        let a = run_raw("---\nslug: Bad_Slug\n---\n");
        assert!(a.suggestions.iter().any(|s| s.body.starts_with("Slug should only")));
        let a = run_raw("---\nslug: good-slug-1\n---\n");
        assert!(!a.suggestions.iter().any(|s| s.rule == SLUG));
    }
}
