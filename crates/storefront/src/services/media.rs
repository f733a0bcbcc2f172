//! Uploaded product images.
//!
//! Files are written under the configured media directory by a sanitized
//! version of the uploaded filename and served back from `/media`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Image types accepted for product photos.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Characters outside this set are stripped from stored names.
static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("Invalid regex"));

/// Errors from storing uploads.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Nothing usable is left after sanitizing the name.
    #[error("invalid file name")]
    InvalidFilename,

    /// The extension is not an accepted image type.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// The upload had no content.
    #[error("uploaded file is empty")]
    Empty,

    /// Writing to disk failed.
    #[error("failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reduce an uploaded filename to a safe, flat name.
///
/// Path components are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9_.-]` is removed and leading dots are stripped.
///
/// # Errors
///
/// Returns `MediaError::InvalidFilename` when nothing is left, and
/// `MediaError::UnsupportedType` for non-image extensions.
pub fn sanitize_filename(original: &str) -> Result<String, MediaError> {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let cleaned = UNSAFE_CHARS_RE.replace_all(&base, "");
    let cleaned = cleaned.trim_start_matches(['.', '_']);

    let Some((stem, extension)) = cleaned.rsplit_once('.') else {
        return Err(MediaError::InvalidFilename);
    };
    if stem.is_empty() {
        return Err(MediaError::InvalidFilename);
    }
    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(MediaError::UnsupportedType(extension));
    }

    Ok(format!("{stem}.{extension}"))
}

/// Filesystem store for product images.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    /// Store rooted at `dir`; the directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The media root.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a sanitized version of `filename`, replacing any
    /// file of the same name. Returns the stored name.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` for unusable names, empty uploads, or I/O failure.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let name = sanitize_filename(filename)?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), bytes).await?;

        tracing::debug!(file = %name, size = bytes.len(), "stored media file");
        Ok(name)
    }
}
