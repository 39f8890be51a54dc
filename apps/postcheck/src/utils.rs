//! Supporting helpers: colored message prefixes, path containment, and
//! small text utilities shared by the passes.

use crate::error::{Error, Result};
use owo_colors::OwoColorize;
use std::path::{Component, Path, PathBuf};

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if colors_enabled() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Display `target` relative to `base` when possible.
pub fn rel_to(base: &Path, target: &Path) -> String {
    pathdiff::diff_paths(target, base)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| target.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// Cut `s` to at most `limit` characters.
pub fn truncate_chars(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Case-sensitive whole-word search: `word` must not be glued to other
/// alphanumeric characters on either side.
pub fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(word) {
        let start = from + pos;
        let end = start + word.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        let glued = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
        if !glued(before) && !glued(after) {
            return true;
        }
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Normalize `.` and `..` components without touching the filesystem.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve an existing `path` and require it to live under one of `roots`.
///
/// Symlinks are resolved on both sides, so a link pointing outside the
/// roots is rejected as well.
pub fn ensure_within(path: &Path, roots: &[&Path]) -> Result<PathBuf> {
    let resolved = path.canonicalize().map_err(|e| Error::io(path, e))?;
    let inside = roots
        .iter()
        .filter_map(|r| r.canonicalize().ok())
        .any(|r| resolved.starts_with(&r));
    if inside {
        Ok(resolved)
    } else {
        Err(Error::PathEscape(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_contains_word_respects_boundaries() {
        assert!(contains_word("use an ide today", "ide"));
        assert!(contains_word("ide", "ide"));
        assert!(!contains_word("provide a side", "ide"));
        assert!(contains_word("side, ide.", "ide"));
    }

    #[test]
    fn test_truncate_chars_handles_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_normalize_lexical_collapses_parent_dirs() {
        let p = normalize_lexical(Path::new("/blog/post/./../other/img.png"));
        assert_eq!(p, PathBuf::from("/blog/other/img.png"));
    }

    #[test]
    fn test_ensure_within_rejects_outside_paths() {
        let root = tempdir().unwrap();
        let other = tempdir().unwrap();
        let inside = root.path().join("a.md");
        let outside = other.path().join("b.md");
        std::fs::write(&inside, "x").unwrap();
        std::fs::write(&outside, "x").unwrap();
        assert!(ensure_within(&inside, &[root.path()]).is_ok());
        let err = ensure_within(&outside, &[root.path()]).unwrap_err();
        assert!(matches!(err, Error::PathEscape(_)));
    }
}
