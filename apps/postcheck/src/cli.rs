//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "postcheck",
    version,
    about = "Blog post SEO review and cover image linting",
    long_about = "postcheck — analyze blog posts for SEO, discoverability, terminology, and tag consistency, apply the fixes it can, and lint cover image aspect ratios.\n\nConfiguration precedence: CLI > postcheck.toml > defaults.",
    after_help = "Examples:\n  postcheck review blog/my-post/index.mdx --apply\n  postcheck review --all --output json\n  postcheck aspect --verbose\n  postcheck aspect-diff origin/main HEAD",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for reviewing posts and checking images.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current postcheck version.")]
    Version,
    /// Review posts
    #[command(
        about = "Review blog posts",
        long_about = "Run metadata, discoverability, terminology, and tag checks. Without FILE, reviews the post in the current directory, or every post when none is found there. Findings do not fail the run unless --check is set.",
        after_help = "Examples:\n  postcheck review\n  postcheck review blog/my-post --apply\n  postcheck review --all --check"
    )]
    Review {
        #[arg(help = "Post file or post directory")]
        file: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Write suggested fixes back to the post")]
        apply: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Review every post even when one is detectable")]
        all: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero when any error-level issue is found")]
        check: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Directory holding one sub-directory per post (default: blog)")]
        content_dir: Option<String>,
    },
    /// Check cover image aspect ratios
    #[command(
        about = "Check cover image aspect ratios",
        long_about = "Verify that each post's `image` frontmatter file is 16:9. Exits non-zero on any error or warning.",
        after_help = "Examples:\n  postcheck aspect\n  postcheck aspect blog/my-post/index.mdx --verbose"
    )]
    Aspect {
        #[arg(help = "Post file or post directory (default: every post)")]
        file: Option<String>,
        #[arg(long, short = 'v', action = clap::ArgAction::SetTrue, help = "Also list images that pass")]
        verbose: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Directory holding one sub-directory per post (default: blog)")]
        content_dir: Option<String>,
    },
    /// Check cover images of posts changed between two git refs
    #[command(
        about = "Check images of changed posts",
        long_about = "Run the aspect check only on posts whose index.mdx or images changed in `git diff BASE...HEAD`.",
        after_help = "Examples:\n  postcheck aspect-diff\n  postcheck aspect-diff HEAD~1 HEAD"
    )]
    AspectDiff {
        #[arg(default_value = "origin/main", help = "Base ref")]
        base: String,
        #[arg(default_value = "HEAD", help = "Head ref")]
        head: String,
        #[arg(long, short = 'v', action = clap::ArgAction::SetTrue, help = "Also list images that pass")]
        verbose: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Directory holding one sub-directory per post (default: blog)")]
        content_dir: Option<String>,
    },
}
