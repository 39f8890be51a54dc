//! Git helpers for the diff-scoped aspect check.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Whether `dir` is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .current_dir(dir)
        .args(["rev-parse", "--git-dir"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Paths changed between `base` and `head`, relative to `dir`.
pub fn changed_files(dir: &Path, base: &str, head: &str) -> Result<Vec<String>> {
    for r in [base, head] {
        if r.is_empty() || r.starts_with('-') {
            return Err(Error::Git(format!("invalid ref '{}'", r)));
        }
    }
    let range = format!("{}...{}", base, head);
    let output = Command::new("git")
        .current_dir(dir)
        .args(["diff", "--name-only", "--relative", &range, "--"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::Git(format!("failed to start `git diff`: {}", e)))?;
    if !output.status.success() {
        return Err(Error::Git(format!(
            "`git diff --name-only {}` failed: {}",
            range,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    let files: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    debug!(count = files.len(), %range, "changed files");
    Ok(files)
}

/// Post entry files touched by a change set: changed `index.mdx` files and
/// the `index.mdx` next to every changed image. First occurrence wins.
pub fn select_changed_posts(files: &[String], content_prefix: &str) -> Vec<String> {
    let prefix = format!("{}/", content_prefix.trim_end_matches('/'));
    let nested = |f: &str| {
        f.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.contains('/'))
    };

    let posts = files
        .iter()
        .filter(|f| nested(f.as_str()) && f.ends_with("/index.mdx"))
        .cloned();
    let from_images = files
        .iter()
        .filter(|f| nested(f.as_str()) && is_image(f))
        .filter_map(|f| f.rsplit_once('/').map(|(dir, _)| format!("{}/index.mdx", dir)));

    let mut out: Vec<String> = Vec::new();
    for p in posts.chain(from_images) {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

fn is_image(file: &str) -> bool {
    file.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
