//! Local filesystem storage for uploaded files.
//!
//! All files live under a single configured root directory. Request-supplied
//! subdirectory names are sanitized before they ever touch the filesystem, and
//! every write is double-checked to resolve inside the root. Filenames are
//! generated server-side so uploads can never collide with or overwrite each
//! other.

use crate::errors::{Error, Result};
use chrono::Utc;
use rand::prelude::RngExt;
use rand::rng;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Sanitize a client-supplied target directory.
///
/// Returns `Ok(None)` when the input is empty after trimming, letting the
/// caller substitute the configured default. Backslashes are treated as path
/// separators so Windows-style input behaves the same as Unix-style. Absolute
/// paths are accepted but made relative by dropping the leading separator.
///
/// Any component that would climb out of the storage root (`..`, or a Windows
/// drive prefix) is rejected outright rather than silently stripped, so a
/// traversal attempt fails loudly instead of landing somewhere unexpected.
pub fn sanitize_dir(raw: &str) -> Result<Option<String>> {
    let trimmed = raw.trim().replace('\\', "/");

    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(&trimmed).components() {
        match component {
            Component::Normal(part) => {
                // Components are produced from a &str, so this cannot fail
                let part = part.to_str().ok_or_else(|| Error::BadRequest {
                    message: "Invalid directory".to_string(),
                })?;
                parts.push(part);
            }
            // A leading "/" or interior "." carries no meaning here
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                warn!(dir = %raw, "Rejected directory with traversal component");
                return Err(Error::BadRequest {
                    message: "Invalid directory".to_string(),
                });
            }
        }
    }

    if parts.is_empty() {
        return Ok(None);
    }

    Ok(Some(parts.join("/")))
}

/// A file that has been durably written under the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Sanitized directory the file was placed in, relative to the root
    pub dir: String,
    /// Generated filename, unique per upload
    pub filename: String,
}

impl StoredFile {
    /// Path of the file relative to the storage root, with `/` separators.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.dir, self.filename)
    }
}

/// Filesystem-backed store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store at `root`, creating the directory if it does not exist.
    ///
    /// The root is canonicalized once here so later containment checks compare
    /// against a stable absolute path.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            tracing::error!(root = %root.display(), "Failed to create storage root: {e}");
            Error::Internal {
                operation: "create target directory".to_string(),
            }
        })?;

        let root = tokio::fs::canonicalize(&root).await.map_err(|e| {
            tracing::error!(root = %root.display(), "Failed to resolve storage root: {e}");
            Error::Internal {
                operation: "create target directory".to_string(),
            }
        })?;

        Ok(Self { root })
    }

    /// The canonicalized storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` into `dir` (already sanitized) under a freshly generated
    /// filename with the given extension.
    ///
    /// The target directory is created if missing. An already-existing
    /// directory is not an error, so concurrent uploads into the same
    /// directory both succeed. The payload is written to a temporary name
    /// first and renamed into place, so a reader never observes a partially
    /// written file.
    pub async fn store(&self, dir: &str, extension: &str, bytes: &[u8]) -> Result<StoredFile> {
        let target_dir = self.root.join(dir);

        // create_dir_all succeeds if the directory already exists
        tokio::fs::create_dir_all(&target_dir).await.map_err(|e| {
            tracing::error!(dir = %target_dir.display(), "Failed to create upload directory: {e}");
            Error::Internal {
                operation: "create target directory".to_string(),
            }
        })?;

        // Belt and braces on top of sanitize_dir: the resolved directory must
        // still live under the root. Symlinks inside the tree could otherwise
        // point writes elsewhere.
        let resolved = tokio::fs::canonicalize(&target_dir).await.map_err(|e| {
            tracing::error!(dir = %target_dir.display(), "Failed to resolve upload directory: {e}");
            Error::Internal {
                operation: "create target directory".to_string(),
            }
        })?;
        if !resolved.starts_with(&self.root) {
            warn!(dir = %resolved.display(), "Upload directory resolved outside storage root");
            return Err(Error::Internal {
                operation: "create target directory".to_string(),
            });
        }

        let filename = generate_filename(extension);
        let final_path = resolved.join(&filename);
        let tmp_path = resolved.join(format!(".{filename}.tmp"));

        if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
            tracing::error!(path = %tmp_path.display(), "Failed to write uploaded file: {e}");
            return Err(Error::Internal {
                operation: "move uploaded file".to_string(),
            });
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            tracing::error!(path = %final_path.display(), "Failed to move uploaded file into place: {e}");
            // Best effort: don't leave the temp file behind
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::Internal {
                operation: "move uploaded file".to_string(),
            });
        }

        debug!(path = %final_path.display(), size = bytes.len(), "Stored uploaded file");

        Ok(StoredFile {
            dir: dir.to_string(),
            filename,
        })
    }
}

/// Generate a collision-resistant filename: 16 hex chars of randomness plus
/// the current unix timestamp, joined by an underscore.
fn generate_filename(extension: &str) -> String {
    let mut token_bytes = [0u8; 8];
    rng().fill(&mut token_bytes);
    format!("{}_{}.{}", hex::encode(token_bytes), Utc::now().timestamp(), extension)
}
