//! LLM discoverability heuristics.

use super::Context;
use crate::models::{Analysis, Suggestion};

pub const QUESTION_HEADINGS: &str = "llm/question-headings";
pub const PROBLEM_SOLUTION: &str = "llm/problem-solution";
pub const CODE_EXAMPLES: &str = "llm/code-examples";
pub const TECH_KEYWORDS: &str = "llm/tech-keywords";
pub const BACKGROUND: &str = "llm/background";
pub const CONCLUSION: &str = "llm/conclusion";

pub fn run(cx: &Context) -> Analysis {
    let spec = &cx.rules.discover;
    let body = cx.body_lower.as_str();
    let mut out = Analysis::default();

    let has_question = cx
        .structure
        .headings
        .iter()
        .any(|h| is_question(&h.text, &spec.question_starts));
    if !has_question {
        out.suggest(Suggestion::bad(
            QUESTION_HEADINGS,
            "Consider adding question-style headings (What is..., How to...) for better LLM discovery",
        ));
    }

    if !contains_any(body, &spec.problem) || !contains_any(body, &spec.solution) {
        out.suggest(Suggestion::bad(
            PROBLEM_SOLUTION,
            "Consider adding clear problem/solution structure for better LLM understanding",
        ));
    }

    if has_code(&cx.doc.body) {
        out.suggest(Suggestion::good(
            CODE_EXAMPLES,
            "Great! Code examples help LLMs understand technical content",
        ));
    }

    let keywords: Vec<String> = cx.doc.keywords().iter().map(|k| k.to_lowercase()).collect();
    let has_tech = spec
        .tech
        .iter()
        .any(|t| body.contains(t.as_str()) || keywords.iter().any(|k| k.contains(t.as_str())));
    if !has_tech {
        out.suggest(Suggestion::bad(
            TECH_KEYWORDS,
            "Consider including relevant technical keywords for better categorization",
        ));
    }

    if !contains_any(body, &spec.background) {
        out.suggest(Suggestion::bad(
            BACKGROUND,
            "Consider adding background context for better LLM comprehension",
        ));
    }

    if !contains_any(body, &spec.conclusion) {
        out.suggest(Suggestion::bad(
            CONCLUSION,
            "Consider adding a conclusion section to summarize key points",
        ));
    }
    out
}

fn contains_any(text_lower: &str, words: &[String]) -> bool {
    words.iter().any(|w| text_lower.contains(w.as_str()))
}

/// `?` anywhere, or a leading interrogative followed by a space.
fn is_question(text: &str, starts: &[String]) -> bool {
    if text.contains('?') {
        return true;
    }
    let lower = text.to_lowercase();
    starts.iter().any(|s| {
        lower
            .strip_prefix(s.as_str())
            .is_some_and(|rest| rest.starts_with(' '))
    })
}

/// Fenced blocks, `<code>` tags, or an inline backtick span.
fn has_code(body: &str) -> bool {
    if body.contains("```") || body.contains("<code>") {
        return true;
    }
    body.lines().any(|line| {
        let mut parts = line.split('`');
        parts.next();
        match (parts.next(), parts.next()) {
            (Some(inner), Some(_)) => !inner.is_empty(),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuggestionKind;
    use crate::rules::fixtures::parse;

    fn rules_hit(raw: &str) -> Vec<(&'static str, SuggestionKind)> {
        let (doc, st, rules) = parse(raw);
        run(&Context::new(&doc, &st, &rules))
            .suggestions
            .into_iter()
            .map(|s| (s.rule, s.kind))
            .collect()
    }

    #[test]
    fn test_question_headings() {
        let starts = vec!["how".to_string(), "what".to_string()];
        assert!(is_question("How it works", &starts));
        assert!(is_question("Done?", &starts));
        assert!(!is_question("However", &starts));
        assert!(!is_question("Whatever", &starts));
    }

    #[test]
    fn test_inline_code_detection() {
        assert!(has_code("run `cargo test` now"));
        assert!(has_code("```\nfenced\n```"));
        assert!(!has_code("a lone ` backtick"));
        assert!(!has_code("empty `` span"));
    }

    #[test]
    fn test_complete_post_only_gets_praise() {
        let raw = "---\ntitle: t\n---\n## Why use an API?\n\
                   Background: the problem and our solution.\n\
                   Use `curl` to call it.\n\n## Conclusion\nDone.\n";
        let hits = rules_hit(raw);
        assert_eq!(hits, vec![(CODE_EXAMPLES, SuggestionKind::Good)]);
    }

    #[test]
    fn test_bare_post_gets_every_hint() {
        let hits = rules_hit("---\ntitle: t\n---\n## Intro\nhello\n");
        let ids: Vec<_> = hits.iter().map(|(r, _)| *r).collect();
        assert_eq!(
            ids,
            vec![QUESTION_HEADINGS, PROBLEM_SOLUTION, TECH_KEYWORDS, BACKGROUND, CONCLUSION]
        );
    }

    #[test]
    fn test_tech_keyword_from_frontmatter() {
        let raw = "---\nkeywords: [Cloud Storage]\n---\n## Intro\nhello\n";
        let ids: Vec<_> = rules_hit(raw).into_iter().map(|(r, _)| r).collect();
        assert!(!ids.contains(&TECH_KEYWORDS));
    }
}
