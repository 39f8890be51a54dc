//! Post discovery under the content directory.
//!
//! A post is a directory directly below the content directory holding an
//! `index.mdx`, or an `index.md` when no `index.mdx` exists.

use crate::error::{Error, Result};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const INDEX_FILES: [&str; 2] = ["index.mdx", "index.md"];

/// Entry file of the post living in `dir`, if any.
pub fn index_in(dir: &Path) -> Option<PathBuf> {
    INDEX_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Every post under `content_dir`, sorted by path.
pub fn discover(content_dir: &Path) -> Result<Vec<PathBuf>> {
    if !content_dir.is_dir() {
        return Err(Error::NotFound(format!(
            "content directory {}",
            content_dir.display()
        )));
    }
    let pattern = content_dir.join("*");
    let pattern = pattern.to_string_lossy();
    let entries = glob(&pattern).map_err(|e| Error::config(format!("bad glob: {}", e)))?;
    let mut posts = Vec::new();
    for entry in entries {
        match entry {
            Ok(dir) if dir.is_dir() => {
                if let Some(index) = index_in(&dir) {
                    posts.push(index);
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    posts.sort();
    debug!(count = posts.len(), dir = %content_dir.display(), "discovered posts");
    Ok(posts)
}

/// Resolve a user-supplied target: a post file, or a post directory.
pub fn resolve_target(target: &Path) -> Result<PathBuf> {
    if target.is_dir() {
        return index_in(target)
            .ok_or_else(|| Error::NotFound(format!("no index.mdx in {}", target.display())));
    }
    if target.is_file() {
        return Ok(target.to_path_buf());
    }
    Err(Error::NotFound(format!("File not found: {}", target.display())))
}
