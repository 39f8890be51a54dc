//! postcheck core library.
//!
//! This crate exposes programmatic APIs for reviewing blog posts (SEO
//! metadata, discoverability, terminology, tags), rewriting them with the
//! fixes the review proposes, and linting cover image aspect ratios.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `frontmatter` / `document`: Bounded frontmatter parsing and document views.
//! - `extract`: Headings, images, captions, and word count from a body.
//! - `rules`: The four analysis passes.
//! - `synth`: Description and tag synthesis.
//! - `patch`: Fix application and atomic writes.
//! - `aspect`: Cover image aspect-ratio classification.
//! - `corpus` / `git`: Post discovery, full or diff-scoped.
//! - `lint`: Runners tying the above together.
//! - `models`: Report structs and the ruleset.
//! - `output`: Human/JSON printers.
//! - `utils`: Supporting helpers.
pub mod aspect;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod git;
pub mod lint;
pub mod models;
pub mod output;
pub mod patch;
pub mod rules;
pub mod synth;
pub mod utils;

pub use error::{Error, Result};
