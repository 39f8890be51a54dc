//! Structural extraction from a document body.
//!
//! Every extractor is a line scanner over `&[&str]`, so it can be tested
//! against literal line arrays without touching the filesystem:
//! - headings: 1-6 leading `#` followed by whitespace and text
//! - words: whitespace-delimited tokens
//! - images: `![alt](src)` and `<img ... src="..." alt="...">`, each with an
//!   optional caption found in the following lines

use serde::Serialize;
use std::ops::Range;

/// How many lines after an image are searched for a caption.
pub const CAPTION_LOOKAHEAD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageKind {
    /// `![alt](src)`
    InlineMarkup,
    /// `<img src="..." alt="...">`
    RawMarkup,
}

impl ImageKind {
    pub fn label(self) -> &'static str {
        match self {
            ImageKind::InlineMarkup => "markdown",
            ImageKind::RawMarkup => "html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    pub kind: ImageKind,
    /// 1-based line within the body; reports rebase it onto the file.
    #[serde(rename = "lineNumber")]
    pub line_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Structural signals derived from a body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Structure {
    pub headings: Vec<Heading>,
    pub images: Vec<ImageRef>,
    pub word_count: usize,
}

impl Structure {
    pub fn count_level(&self, level: u8) -> usize {
        self.headings.iter().filter(|h| h.level == level).count()
    }
}

/// Run every extractor over `body`.
pub fn extract(body: &str) -> Structure {
    let lines: Vec<&str> = body.lines().collect();
    Structure {
        headings: headings(&lines),
        images: images(&lines),
        word_count: word_count(body),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn headings(lines: &[&str]) -> Vec<Heading> {
    lines.iter().filter_map(|l| parse_heading(l)).collect()
}

fn parse_heading(line: &str) -> Option<Heading> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some(Heading {
        level: hashes as u8,
        text: text.to_string(),
    })
}

/// One image occurrence on a line, with the byte spans the patcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch {
    pub kind: ImageKind,
    pub src: String,
    pub alt: String,
    /// Whole markup span.
    pub span: Range<usize>,
    /// Span of the alt text value, when present.
    pub alt_span: Option<Range<usize>>,
    /// Where a new `alt` attribute would be inserted (raw markup only).
    pub insert_at: usize,
    /// Whether any attribute on the tag is a `name={...}` binding.
    pub has_binding: bool,
}

/// Find every image on a single line, ordered by position.
pub fn scan_line(line: &str) -> Vec<ImageMatch> {
    let mut found = scan_inline(line);
    found.extend(scan_raw(line));
    found.sort_by_key(|m| m.span.start);
    found
}

fn scan_inline(line: &str) -> Vec<ImageMatch> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while let Some(pos) = line[i..].find("![") {
        let start = i + pos;
        let alt_start = start + 2;
        if let Some(off) = line[alt_start..].find(']') {
            let alt_end = alt_start + off;
            if bytes.get(alt_end + 1) == Some(&b'(') {
                let src_start = alt_end + 2;
                if let Some(off2) = line[src_start..].find(')') {
                    let src_end = src_start + off2;
                    if src_end > src_start {
                        out.push(ImageMatch {
                            kind: ImageKind::InlineMarkup,
                            src: line[src_start..src_end].trim().to_string(),
                            alt: line[alt_start..alt_end].to_string(),
                            span: start..src_end + 1,
                            alt_span: Some(alt_start..alt_end),
                            insert_at: alt_start,
                            has_binding: false,
                        });
                        i = src_end + 1;
                        continue;
                    }
                }
            }
        } else {
            break;
        }
        i = start + 2;
    }
    out
}

/// Attribute scanner states for raw `<img>` tags.
enum AttrValue {
    Quoted(Range<usize>),
    Binding,
    Bare,
}

fn scan_raw(line: &str) -> Vec<ImageMatch> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while let Some(pos) = line[i..].find("<img") {
        let start = i + pos;
        let mut j = start + 4;
        let opens_tag = match bytes.get(j) {
            Some(b) => b.is_ascii_whitespace() || *b == b'/' || *b == b'>',
            None => false,
        };
        if !opens_tag {
            i = j;
            continue;
        }
        let mut src: Option<String> = None;
        let mut alt: Option<(String, Range<usize>)> = None;
        let mut has_binding = false;
        let mut end: Option<(usize, usize)> = None;
        while j < bytes.len() {
            let b = bytes[j];
            if b.is_ascii_whitespace() {
                j += 1;
                continue;
            }
            if b == b'>' {
                end = Some((j, j + 1));
                break;
            }
            if b == b'/' && bytes.get(j + 1) == Some(&b'>') {
                end = Some((j, j + 2));
                break;
            }
            let name_start = j;
            while j < bytes.len()
                && !bytes[j].is_ascii_whitespace()
                && !matches!(bytes[j], b'=' | b'>' | b'/')
            {
                j += 1;
            }
            if j == name_start {
                // stray '/' not followed by '>'
                j += 1;
                continue;
            }
            let name = &line[name_start..j];
            if bytes.get(j) != Some(&b'=') {
                continue;
            }
            j += 1;
            let value = match bytes.get(j) {
                Some(q @ (b'"' | b'\'')) => {
                    let vstart = j + 1;
                    match line[vstart..].find(*q as char) {
                        Some(off) => {
                            j = vstart + off + 1;
                            AttrValue::Quoted(vstart..vstart + off)
                        }
                        None => break,
                    }
                }
                Some(b'{') => {
                    let mut depth = 0usize;
                    let mut closed = false;
                    while j < bytes.len() {
                        match bytes[j] {
                            b'{' => depth += 1,
                            b'}' => {
                                depth -= 1;
                                if depth == 0 {
                                    j += 1;
                                    closed = true;
                                    break;
                                }
                            }
                            _ => {}
                        }
                        j += 1;
                    }
                    if !closed {
                        break;
                    }
                    AttrValue::Binding
                }
                _ => {
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    AttrValue::Bare
                }
            };
            match (name, value) {
                ("src", AttrValue::Quoted(r)) => src = Some(line[r].to_string()),
                ("alt", AttrValue::Quoted(r)) => alt = Some((line[r.clone()].to_string(), r)),
                (_, AttrValue::Binding) => has_binding = true,
                _ => {}
            }
        }
        let Some((insert_at, tag_end)) = end else {
            break;
        };
        if let Some(src) = src.filter(|s| !s.is_empty()) {
            let (alt_text, alt_span) = match alt {
                Some((t, r)) => (t, Some(r)),
                None => (String::new(), None),
            };
            out.push(ImageMatch {
                kind: ImageKind::RawMarkup,
                src,
                alt: alt_text,
                span: start..tag_end,
                alt_span,
                insert_at,
                has_binding,
            });
        }
        i = tag_end;
    }
    out
}

pub fn images(lines: &[&str]) -> Vec<ImageRef> {
    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        for m in scan_line(line) {
            out.push(ImageRef {
                src: m.src,
                alt: m.alt,
                kind: m.kind,
                line_number: idx + 1,
                caption: find_caption(lines, idx),
            });
        }
    }
    out
}

/// Look for an emphasis caption in the lines following `image_idx`.
///
/// Blank lines are skipped. The search ends at the first caption found or
/// at the first line that is neither blank, emphasis-shaped, nor an image.
pub fn find_caption(lines: &[&str], image_idx: usize) -> Option<String> {
    for line in lines.iter().skip(image_idx + 1).take(CAPTION_LOOKAHEAD) {
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        if let Some(inner) = em_tag_text(t) {
            return non_empty(inner);
        }
        if let Some(inner) = wrapped_in(t, '*').or_else(|| wrapped_in(t, '_')) {
            return non_empty(inner);
        }
        let caption_like = t.starts_with("<em>")
            || t.starts_with("</em>")
            || t.starts_with('*')
            || t.starts_with('_')
            || t.starts_with("![");
        if !caption_like {
            break;
        }
    }
    None
}

fn em_tag_text(line: &str) -> Option<&str> {
    let open = line.find("<em>")?;
    let rest = &line[open + 4..];
    let close = rest.find("</em>")?;
    Some(&rest[..close])
}

fn wrapped_in(line: &str, marker: char) -> Option<&str> {
    let inner = line.strip_prefix(marker)?.strip_suffix(marker)?;
    if inner.is_empty() || inner.contains(marker) {
        return None;
    }
    Some(inner)
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("Hello   world\n\nfoo"), 3);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_headings_levels_and_order() {
        let lines = [
            "# Title",
            "text",
            "## Section ",
            "####### too deep",
            "###no space",
            "###### Six",
            "#",
        ];
        let hs = headings(&lines);
        assert_eq!(
            hs,
            vec![
                Heading { level: 1, text: "Title".into() },
                Heading { level: 2, text: "Section".into() },
                Heading { level: 6, text: "Six".into() },
            ]
        );
    }

    #[test]
    fn test_inline_image_with_em_caption() {
        let lines = ["![](./cover.png)", "", "<em>A diagram of the system</em>"];
        let imgs = images(&lines);
        assert_eq!(imgs.len(), 1);
        assert_eq!(imgs[0].src, "./cover.png");
        assert_eq!(imgs[0].alt, "");
        assert_eq!(imgs[0].kind, ImageKind::InlineMarkup);
        assert_eq!(imgs[0].line_number, 1);
        assert_eq!(imgs[0].caption.as_deref(), Some("A diagram of the system"));
    }

    #[test]
    fn test_caption_search_stops_at_prose() {
        let lines = ["![x](a.png)", "Some paragraph.", "*Too late*"];
        assert_eq!(find_caption(&lines, 0), None);
    }

    #[test]
    fn test_caption_search_is_bounded() {
        let lines = ["![x](a.png)", "", "", "", "*Four lines away*"];
        assert_eq!(find_caption(&lines, 0), None);
    }

    #[test]
    fn test_underscore_and_asterisk_captions() {
        assert_eq!(
            find_caption(&["![x](a.png)", "_Under caption_"], 0).as_deref(),
            Some("Under caption")
        );
        assert_eq!(
            find_caption(&["![x](a.png)", "**bold line**"], 0),
            None
        );
        assert_eq!(
            find_caption(&["![x](a.png)", "![y](b.png)", "*After second*"], 0).as_deref(),
            Some("After second")
        );
    }

    #[test]
    fn test_raw_img_attributes_any_order() {
        let line = r#"<p><img alt="Chart" class="w" src='./chart.webp' /></p>"#;
        let found = scan_line(line);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ImageKind::RawMarkup);
        assert_eq!(found[0].src, "./chart.webp");
        assert_eq!(found[0].alt, "Chart");
        assert_eq!(&line[found[0].alt_span.clone().unwrap()], "Chart");
        assert!(!found[0].has_binding);
    }

    #[test]
    fn test_raw_img_without_quoted_src_is_skipped() {
        let found = scan_line(r#"<img src={require("./a.png").default} alt="x" />"#);
        assert!(found.is_empty());
        let found = scan_line("<image href=\"a.png\">");
        assert!(found.is_empty());
    }

    #[test]
    fn test_raw_img_binding_is_flagged() {
        let found = scan_line(r#"<img src="./a.png" style={{width: 10}}>"#);
        assert_eq!(found.len(), 1);
        assert!(found[0].has_binding);
        assert!(found[0].alt_span.is_none());
    }

    #[test]
    fn test_multiple_images_on_one_line_in_order() {
        let line = r#"<img src="b.png"> and ![first](a.png) then ![second](c.png)"#;
        let srcs: Vec<_> = scan_line(line).into_iter().map(|m| m.src).collect();
        assert_eq!(srcs, vec!["b.png", "a.png", "c.png"]);
    }

    #[test]
    fn test_broken_inline_markup_is_ignored() {
        assert!(scan_line("![alt] (a.png)").is_empty());
        assert!(scan_line("![alt]()").is_empty());
        assert!(scan_line("![unclosed").is_empty());
    }
}
