//! Error taxonomy for document analysis, rewriting, and image linting.
//!
//! Per-document errors (`InvalidFrontmatter`, `SchemaViolation`,
//! `ContentTooLarge`) are recoverable: runners collect them next to the
//! successful reports and keep going. `PathEscape` must always reach the
//! caller, which must not touch the offending path.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by postcheck operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The frontmatter block is not a valid key/value document.
    #[error("invalid frontmatter: {0}")]
    InvalidFrontmatter(String),

    /// A frontmatter value is a nested or otherwise disallowed type.
    #[error("frontmatter field '{key}' has unsupported type: {found}")]
    SchemaViolation { key: String, found: String },

    /// Input exceeds the fixed size ceiling.
    #[error("content too large: {size} bytes (limit {limit})")]
    ContentTooLarge { size: u64, limit: u64 },

    /// The referenced cover image does not exist.
    #[error("image file not found: {0}")]
    ImageNotFound(PathBuf),

    /// The image exists but its dimensions could not be determined.
    #[error("could not read image dimensions for {path}: {reason}")]
    DimensionRead { path: PathBuf, reason: String },

    /// A resolved path falls outside the permitted content root.
    #[error("path escapes the content root: {0}")]
    PathEscape(PathBuf),

    /// Writing or renaming the rewritten document failed.
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested file or corpus does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration or ruleset could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// A git invocation failed.
    #[error("git error: {0}")]
    Git(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error must abort the operation instead of being reported
    /// per document.
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, Self::PathEscape(_))
    }

    /// Render the message capped at `limit` characters for user output.
    pub fn truncated(&self, limit: usize) -> String {
        crate::utils::truncate_chars(&self.to_string(), limit)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
