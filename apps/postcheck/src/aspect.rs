//! Cover image aspect-ratio linter.
//!
//! Reads the `image` frontmatter field of a post, resolves `./` references
//! against the post directory, and classifies the pixel ratio against 16:9.
//! The tolerance is an absolute difference in ratio, not a percentage.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::utils::{ensure_within, normalize_lexical};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Target ratio as an exact fraction.
pub const TARGET: (u64, u64) = (16, 9);
/// Maximum absolute deviation from the target ratio.
pub const TOLERANCE: f64 = 0.1;

pub fn target_ratio() -> f64 {
    TARGET.0 as f64 / TARGET.1 as f64
}

/// Reads pixel dimensions of an image file.
pub trait DimensionProbe: Sync {
    fn dimensions(&self, path: &Path) -> Result<Dimensions>;
}

/// Probe backed by the `imagesize` header reader.
pub struct ImageSizeProbe;

impl DimensionProbe for ImageSizeProbe {
    fn dimensions(&self, path: &Path) -> Result<Dimensions> {
        let size = imagesize::size(path).map_err(|e| Error::DimensionRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Dimensions {
            width: size.width as u64,
            height: size.height as u64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectStatus {
    Error,
    Warning,
    Success,
}

impl AspectStatus {
    pub fn is_problem(self) -> bool {
        self != AspectStatus::Success
    }
}

#[derive(Debug, Clone, Serialize)]
/// Classification of one post's cover image.
pub struct AspectIssue {
    pub status: AspectStatus,
    pub file: PathBuf,
    pub image: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    /// Resize targets: height preserved first, then width preserved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Dimensions>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AspectSummary {
    pub posts: usize,
    pub errors: usize,
    pub warnings: usize,
    pub successes: usize,
}

impl AspectSummary {
    pub fn from_issues(posts: usize, issues: &[AspectIssue]) -> Self {
        let count = |s| issues.iter().filter(|i| i.status == s).count();
        Self {
            posts,
            errors: count(AspectStatus::Error),
            warnings: count(AspectStatus::Warning),
            successes: count(AspectStatus::Success),
        }
    }

    /// Errors and warnings both fail the run.
    pub fn failed(&self) -> bool {
        self.errors + self.warnings > 0
    }
}

/// `round(value * num / den)` in integers, halves rounding up.
fn scale_round(value: u64, num: u64, den: u64) -> u64 {
    (2 * value * num + den) / (2 * den)
}

/// Both 16:9 resize targets: keep the height, or keep the width.
pub fn resize_targets(d: Dimensions) -> [Dimensions; 2] {
    [
        Dimensions {
            width: scale_round(d.height, TARGET.0, TARGET.1),
            height: d.height,
        },
        Dimensions {
            width: d.width,
            height: scale_round(d.width, TARGET.1, TARGET.0),
        },
    ]
}

/// Classify measured dimensions. Both sides must be non-zero.
pub fn classify(d: Dimensions) -> (AspectStatus, f64) {
    let ratio = d.width as f64 / d.height as f64;
    if (ratio - target_ratio()).abs() <= TOLERANCE {
        (AspectStatus::Success, ratio)
    } else {
        (AspectStatus::Warning, ratio)
    }
}

/// Check the cover image of the post at `path`.
///
/// Missing or unreadable images become error-status entries. A reference
/// resolving outside `content_root` aborts with `PathEscape`.
pub fn check_post(
    path: &Path,
    content_root: &Path,
    probe: &dyn DimensionProbe,
) -> Result<Vec<AspectIssue>> {
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) if e.is_security_relevant() => return Err(e),
        Err(e) => {
            return Ok(vec![AspectIssue {
                status: AspectStatus::Error,
                file: path.to_path_buf(),
                image: String::new(),
                message: format!("Error analyzing file: {}", e.truncated(100)),
                dimensions: None,
                aspect_ratio: None,
                suggestions: Vec::new(),
            }])
        }
    };
    let Some(reference) = doc.frontmatter.text("image") else {
        return Ok(Vec::new());
    };
    let reference = reference.trim().to_string();
    if !reference.starts_with("./") {
        debug!(path = %path.display(), image = %reference, "skipping non-relative image");
        return Ok(Vec::new());
    }
    let entry = |status, message: String| AspectIssue {
        status,
        file: path.to_path_buf(),
        image: reference.clone(),
        message,
        dimensions: None,
        aspect_ratio: None,
        suggestions: Vec::new(),
    };

    let dims = match measure(path, &reference, content_root, probe) {
        Ok(d) => d,
        Err(e) if e.is_security_relevant() => return Err(e),
        Err(Error::ImageNotFound(_)) => {
            return Ok(vec![entry(
                AspectStatus::Error,
                format!("Image file not found: {}", reference),
            )])
        }
        Err(Error::DimensionRead { reason, .. }) => {
            return Ok(vec![entry(
                AspectStatus::Error,
                format!("Could not read image dimensions: {} ({})", reference, reason),
            )])
        }
        Err(e) => return Err(e),
    };

    let (status, ratio) = classify(dims);
    let mut issue = entry(status, String::new());
    issue.dimensions = Some(dims);
    issue.aspect_ratio = Some(ratio);
    issue.message = match status {
        AspectStatus::Success => format!(
            "Image has correct 16:9 aspect ratio: {} ({})",
            reference, dims
        ),
        _ => {
            issue.suggestions = resize_targets(dims).to_vec();
            format!(
                "Image aspect ratio {:.2} is not 16:9 ({:.2}): {} ({})",
                ratio,
                target_ratio(),
                reference,
                dims
            )
        }
    };
    Ok(vec![issue])
}

fn measure(
    post: &Path,
    reference: &str,
    content_root: &Path,
    probe: &dyn DimensionProbe,
) -> Result<Dimensions> {
    let dir = post.parent().unwrap_or(Path::new("."));
    // Canonical on both sides; the content dir may be a symlink.
    let dir = dir.canonicalize().map_err(|e| Error::io(dir, e))?;
    let resolved = normalize_lexical(&dir.join(reference));
    let root = content_root
        .canonicalize()
        .unwrap_or_else(|_| normalize_lexical(content_root));
    if !resolved.starts_with(&root) {
        return Err(Error::PathEscape(resolved));
    }
    if !resolved.is_file() {
        return Err(Error::ImageNotFound(resolved));
    }
    // Symlinks may still point elsewhere.
    let real = ensure_within(&resolved, &[content_root])?;
    let dims = probe.dimensions(&real)?;
    if dims.width == 0 || dims.height == 0 {
        return Err(Error::DimensionRead {
            path: real,
            reason: format!("invalid dimensions {}", dims),
        });
    }
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct FixedProbe(Dimensions);

    impl DimensionProbe for FixedProbe {
        fn dimensions(&self, _path: &Path) -> Result<Dimensions> {
            Ok(self.0)
        }
    }

    struct FailingProbe;

    impl DimensionProbe for FailingProbe {
        fn dimensions(&self, path: &Path) -> Result<Dimensions> {
            Err(Error::DimensionRead {
                path: path.to_path_buf(),
                reason: "unsupported format".into(),
            })
        }
    }

    fn dims(width: u64, height: u64) -> Dimensions {
        Dimensions { width, height }
    }

    fn post(root: &Path, image: &str) -> PathBuf {
        let dir = root.join("post");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index.mdx");
        fs::write(&path, format!("---\ntitle: t\nimage: {}\n---\nbody\n", image)).unwrap();
        path
    }

    /// Smallest header `imagesize` accepts for a PNG.
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_exact_ratio_is_success() {
        let (status, ratio) = classify(dims(1600, 900));
        assert_eq!(status, AspectStatus::Success);
        assert!((ratio - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_is_warning_with_both_targets() {
        let (status, _) = classify(dims(1000, 1000));
        assert_eq!(status, AspectStatus::Warning);
        assert_eq!(resize_targets(dims(1000, 1000)), [dims(1778, 1000), dims(1000, 563)]);
    }

    #[test]
    fn test_tolerance_is_absolute() {
        assert_eq!(classify(dims(1870, 1000)).0, AspectStatus::Success);
        assert_eq!(classify(dims(1900, 1000)).0, AspectStatus::Warning);
    }

    #[test]
    fn test_check_post_with_real_png() {
        let root = tempfile::tempdir().unwrap();
        let path = post(root.path(), "./cover.png");
        fs::write(root.path().join("post/cover.png"), png_header(1000, 1000)).unwrap();
        let issues = check_post(&path, root.path(), &ImageSizeProbe).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].status, AspectStatus::Warning);
        assert_eq!(issues[0].dimensions, Some(dims(1000, 1000)));
        assert!(issues[0].message.contains("1.00 is not 16:9 (1.78)"));
        assert_eq!(issues[0].suggestions, vec![dims(1778, 1000), dims(1000, 563)]);
    }

    #[test]
    fn test_missing_image_field_is_not_an_issue() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("post");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index.mdx");
        fs::write(&path, "---\ntitle: t\n---\nbody\n").unwrap();
        assert!(check_post(&path, root.path(), &FixedProbe(dims(1, 1))).unwrap().is_empty());
        let path = post(root.path(), "https://cdn.example.com/x.png");
        assert!(check_post(&path, root.path(), &FixedProbe(dims(1, 1))).unwrap().is_empty());
    }

    #[test]
    fn test_missing_and_unreadable_images_are_errors() {
        let root = tempfile::tempdir().unwrap();
        let path = post(root.path(), "./nope.png");
        let issues = check_post(&path, root.path(), &FixedProbe(dims(16, 9))).unwrap();
        assert_eq!(issues[0].status, AspectStatus::Error);
        assert!(issues[0].message.starts_with("Image file not found"));

        fs::write(root.path().join("post/nope.png"), b"not an image").unwrap();
        let issues = check_post(&path, root.path(), &FailingProbe).unwrap();
        assert_eq!(issues[0].status, AspectStatus::Error);
        assert!(issues[0].message.starts_with("Could not read image dimensions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_content_dir_resolves_images() {
        let root = tempfile::tempdir().unwrap();
        let real = root.path().join("real");
        let path = post(&real, "./cover.png");
        fs::write(real.join("post/cover.png"), png_header(1600, 900)).unwrap();
        let blog = root.path().join("blog");
        std::os::unix::fs::symlink(&real, &blog).unwrap();

        let linked = blog.join("post/index.mdx");
        for content_root in [blog.clone(), blog.canonicalize().unwrap()] {
            let issues = check_post(&linked, &content_root, &ImageSizeProbe).unwrap();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].status, AspectStatus::Success);
        }
        assert!(path.is_file());
    }

    #[test]
    fn test_escaping_reference_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let path = post(root.path(), "./../../etc/passwd");
        let err = check_post(&path, root.path(), &FixedProbe(dims(16, 9))).unwrap_err();
        assert!(matches!(err, Error::PathEscape(_)));
    }
}
