//! postcheck CLI binary entry point.
//! Delegates to library modules for review/aspect checks and prints results.

use clap::Parser;
use postcheck::aspect::ImageSizeProbe;
use postcheck::cli::{Cli, Commands};
use postcheck::config::{self, Effective, OutputMode};
use postcheck::lint::{self, ReviewRequest, Scope};
use postcheck::utils::{ensure_within, error_prefix, info_prefix, note_prefix};
use postcheck::{corpus, git, output, Error, Result};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Longest error message shown to the user.
const MAX_ERROR_CHARS: usize = 100;

fn init_logging() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("warn")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", error_prefix(), e.truncated(MAX_ERROR_CHARS));
            1
        }
    };
    std::process::exit(code);
}

fn current_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
    Ok(cwd.canonicalize().unwrap_or(cwd))
}

fn effective(
    repo_root: Option<&str>,
    content_dir: Option<&str>,
    output: Option<&str>,
) -> Result<Effective> {
    let eff = config::resolve_effective(repo_root, content_dir, output)?;
    if !eff.config_found && eff.output == OutputMode::Human {
        eprintln!("{} No postcheck.toml found; using defaults.", note_prefix());
    }
    Ok(eff)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Review {
            file,
            apply,
            all,
            check,
            output,
            repo_root,
            content_dir,
        } => {
            let eff = effective(repo_root.as_deref(), content_dir.as_deref(), output.as_deref())?;
            let rules = eff.ruleset()?;
            let cwd = current_dir()?;
            let req = ReviewRequest {
                repo_root: &eff.repo_root,
                content_dir: &eff.content_dir,
                cwd: &cwd,
                target: file.as_deref().map(Path::new),
                all,
                apply,
                rules: &rules,
            };
            let run = lint::run_review(&req)?;
            if run.scope == (Scope::Single { auto_detected: true }) && eff.output == OutputMode::Human {
                let name = cwd.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                eprintln!("{} Auto-detected blog post: {}", info_prefix(), name);
            }
            output::print_review(&run, eff.output, &eff.repo_root);
            Ok(if run.failed(check) { 1 } else { 0 })
        }
        Commands::Aspect {
            file,
            verbose,
            output,
            repo_root,
            content_dir,
        } => {
            let eff = effective(repo_root.as_deref(), content_dir.as_deref(), output.as_deref())?;
            let cwd = current_dir()?;
            let posts = match file {
                Some(f) => {
                    let post = corpus::resolve_target(Path::new(&f))?;
                    vec![ensure_within(&post, &[eff.content_dir.as_path(), cwd.as_path()])?]
                }
                None => corpus::discover(&eff.content_dir)?,
            };
            let (issues, summary) =
                lint::check_images(&posts, &[eff.content_dir.as_path(), cwd.as_path()], &ImageSizeProbe)?;
            output::print_aspect(&issues, &summary, verbose, eff.output, &eff.repo_root);
            Ok(if summary.failed() { 1 } else { 0 })
        }
        Commands::AspectDiff {
            base,
            head,
            verbose,
            output,
            repo_root,
            content_dir,
        } => {
            let eff = effective(repo_root.as_deref(), content_dir.as_deref(), output.as_deref())?;
            if !git::is_git_repo(&eff.repo_root) {
                return Err(Error::Git(
                    "not in a git repository; use `postcheck aspect` instead".into(),
                ));
            }
            let prefix = pathdiff::diff_paths(&eff.content_dir, &eff.repo_root)
                .unwrap_or_else(|| eff.content_dir.clone())
                .to_string_lossy()
                .replace('\\', "/");
            let files = git::changed_files(&eff.repo_root, &base, &head)?;
            let changed = git::select_changed_posts(&files, &prefix);
            let posts: Vec<PathBuf> = changed
                .iter()
                .map(|c| eff.repo_root.join(c))
                .filter(|p| {
                    let exists = p.is_file();
                    if !exists {
                        warn!(path = %p.display(), "changed post no longer exists");
                    }
                    exists
                })
                .collect();
            let (issues, summary) =
                lint::check_images(&posts, &[eff.content_dir.as_path()], &ImageSizeProbe)?;
            output::print_aspect_diff(&changed, &issues, &summary, verbose, eff.output, &eff.repo_root);
            Ok(if summary.failed() { 1 } else { 0 })
        }
    }
}
