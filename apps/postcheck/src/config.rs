//! Configuration discovery and effective settings resolution.
//!
//! postcheck reads `postcheck.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an
//! `Effective` config.
//! Defaults:
//! - `content_dir`: `blog`
//! - `output`: `human`
//! - `rules`: the built-in ruleset
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{Error, Result};
use crate::models::ruleset::Ruleset;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILES: [&str; 3] = ["postcheck.toml", "postcheck.yaml", "postcheck.yml"];
pub const DEFAULT_CONTENT_DIR: &str = "blog";

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `postcheck.toml|yaml`.
pub struct PostcheckConfig {
    pub content_dir: Option<String>,
    pub output: Option<String>,
    /// Replacement ruleset TOML, relative to the repository root.
    pub rules: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!(
                "unknown output mode '{}' (expected human|json)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub content_dir: PathBuf,
    pub output: OutputMode,
    pub rules_path: Option<PathBuf>,
    pub config_found: bool,
}

impl Effective {
    /// Load the configured ruleset, or the built-in one.
    pub fn ruleset(&self) -> Result<Ruleset> {
        match &self.rules_path {
            Some(p) => Ruleset::from_path(p),
            None => Ruleset::builtin(),
        }
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `postcheck.toml|yaml|yml` or a `.git` entry is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `PostcheckConfig` from the first config file present in `root`.
///
/// A present but malformed file is an error rather than silently ignored.
pub fn load_config(root: &Path) -> Result<Option<PostcheckConfig>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let cfg: PostcheckConfig = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|e| Error::config(format!("{}: {}", name, e)))?
        } else {
            serde_yaml::from_str(&s).map_err(|e| Error::config(format!("{}: {}", name, e)))?
        };
        debug!(path = %path.display(), "loaded config");
        return Ok(Some(cfg));
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_content_dir: Option<&str>,
    cli_output: Option<&str>,
) -> Result<Effective> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let start = start.canonicalize().unwrap_or(start);
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let content_dir = cli_content_dir
        .map(str::to_string)
        .or(cfg.content_dir)
        .unwrap_or_else(|| DEFAULT_CONTENT_DIR.to_string());
    let output = cli_output
        .map(str::to_string)
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let rules_path = cfg.rules.map(|r| repo_root.join(r));

    Ok(Effective {
        content_dir: repo_root.join(content_dir),
        output: OutputMode::parse(&output)?,
        rules_path,
        config_found,
        repo_root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("postcheck.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
content_dir = "content/posts"
output = "json"
    "#
        )
        .unwrap();
        fs::create_dir_all(root.join("content/posts/a")).unwrap();

        // Discovery walks up from a nested directory.
        let nested = root.join("content/posts/a");
        let eff = resolve_effective(nested.to_str(), None, None).unwrap();
        assert!(eff.config_found);
        assert_eq!(eff.repo_root, root.canonicalize().unwrap());
        assert!(eff.content_dir.ends_with("content/posts"));
        assert_eq!(eff.output, OutputMode::Json);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("postcheck.yaml"), "output: human\n").unwrap();

        let eff = resolve_effective(root.to_str(), None, None).unwrap();
        assert!(eff.content_dir.ends_with("blog"));
        assert_eq!(eff.output, OutputMode::Human);
        assert!(eff.rules_path.is_none());
        assert!(eff.ruleset().is_ok());
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("postcheck.toml"), "content_dir = \"posts\"\noutput = \"json\"\n").unwrap();
        let eff = resolve_effective(root.to_str(), Some("drafts"), Some("human")).unwrap();
        assert!(eff.content_dir.ends_with("drafts"));
        assert_eq!(eff.output, OutputMode::Human);
    }

    #[test]
    fn test_malformed_config_and_output_are_errors() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("postcheck.toml"), "content_dir = [").unwrap();
        assert!(matches!(
            resolve_effective(root.to_str(), None, None),
            Err(Error::Config(_))
        ));
        fs::remove_file(root.join("postcheck.toml")).unwrap();
        assert!(resolve_effective(root.to_str(), None, Some("xml")).is_err());
    }

    #[test]
    fn test_custom_rules_path_is_loaded() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("postcheck.toml"), "rules = \"missing.toml\"\n").unwrap();
        let eff = resolve_effective(root.to_str(), None, None).unwrap();
        assert_eq!(eff.rules_path, Some(root.canonicalize().unwrap().join("missing.toml")));
        assert!(eff.ruleset().is_err());
    }
}
