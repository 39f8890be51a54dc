//! A content document: frontmatter + body, parsed from its raw text.
//!
//! `raw` stays the source of truth; `frontmatter` and `body` are derived
//! views. `render` rebuilds a full document from (possibly modified) views.

use crate::error::{Error, Result};
use crate::frontmatter::{self, BlockSpan, Frontmatter, DELIMITER, MAX_CONTENT_BYTES};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub frontmatter: Frontmatter,
    pub body: String,
    pub raw: String,
    span: Option<BlockSpan>,
}

impl Document {
    /// Parse `raw` as the contents of `path`.
    pub fn parse(path: impl Into<PathBuf>, raw: String) -> Result<Self> {
        let extracted = frontmatter::extract(&raw)?;
        let body = match &extracted.span {
            Some(span) => raw[span.body_start..].to_string(),
            None => raw.clone(),
        };
        Ok(Self {
            path: path.into(),
            frontmatter: extracted.data,
            body,
            raw,
            span: extracted.span,
        })
    }

    /// Read and parse a document, refusing files over the size ceiling
    /// before reading them.
    pub fn load(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if meta.len() > MAX_CONTENT_BYTES as u64 {
            return Err(Error::ContentTooLarge {
                size: meta.len(),
                limit: MAX_CONTENT_BYTES as u64,
            });
        }
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(path, raw)
    }

    /// Text preceding the body: delimiters plus the original block.
    pub fn head(&self) -> &str {
        match &self.span {
            Some(span) => &self.raw[..span.body_start],
            None => "",
        }
    }

    /// Number of file lines before the first body line.
    pub fn body_line_offset(&self) -> usize {
        self.span.as_ref().map_or(0, |s| s.lines_before_body)
    }

    /// Map a 1-based body line to a 1-based file line.
    pub fn file_line(&self, body_line: usize) -> usize {
        body_line + self.body_line_offset()
    }

    /// 1-based file line of a frontmatter field, if declared.
    pub fn field_line(&self, key: &str) -> Option<usize> {
        let span = self.span.as_ref()?;
        let prefix = format!("{}:", key);
        self.raw[span.content.clone()]
            .lines()
            .position(|l| l.trim_start().starts_with(&prefix))
            .map(|idx| idx + 2)
    }

    pub fn title(&self) -> Option<String> {
        self.frontmatter.text("title")
    }

    pub fn description(&self) -> Option<String> {
        self.frontmatter.text("description")
    }

    pub fn keywords(&self) -> Vec<String> {
        self.frontmatter.list("keywords")
    }

    pub fn tags(&self) -> Vec<String> {
        self.frontmatter.list("tags")
    }

    pub fn slug(&self) -> Option<String> {
        self.frontmatter.text("slug")
    }

    /// Serialize `frontmatter` and concatenate it with `body`.
    pub fn render(frontmatter: &Frontmatter, body: &str) -> Result<String> {
        let yaml = frontmatter.to_yaml()?;
        let mut out = String::with_capacity(yaml.len() + body.len() + 8);
        out.push_str(DELIMITER);
        out.push('\n');
        if !yaml.is_empty() {
            out.push_str(&yaml);
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(body);
        Ok(out)
    }
}
