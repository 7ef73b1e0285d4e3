//! File upload handling.
//!
//! Incoming multipart fields are validated against an explicit MIME
//! allow-list and a per-file size ceiling, then streamed to disk under a
//! collision-resistant generated name. Callers are responsible for removing
//! the stored file if the surrounding operation fails, via [`remove_file`].

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use chrono::Utc;
use rand::Rng;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::UploadConfig;
use crate::errors::Error;

/// MIME types accepted for download uploads. Covers documents, archives,
/// images, audio and video.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "text/plain",
    "text/csv",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/avi",
    "video/quicktime",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
];

/// A file that has been written to the upload directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Generated on-disk name (unique within the upload directory)
    pub filename: String,
    /// Name the client supplied
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    /// Absolute or config-relative path of the stored file
    pub path: PathBuf,
}

impl StoredFile {
    pub fn url(&self) -> String {
        format!("/uploads/{}", self.filename)
    }
}

pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Generate a collision-resistant filename from the client-supplied name.
///
/// The original base name is sanitized to `[a-zA-Z0-9_]`, then suffixed
/// with a millisecond timestamp and a random number. The original
/// extension is kept, sanitized the same way, so path components from the
/// client can never reach the filesystem.
pub fn generate_filename(original_name: &str) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(sanitize_stem)
        .filter(|s| !s.is_empty());

    let timestamp = Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);

    match ext {
        Some(ext) => format!("{}_{}-{}.{}", sanitize_stem(stem), timestamp, suffix, ext),
        None => format!("{}_{}-{}", sanitize_stem(stem), timestamp, suffix),
    }
}

/// Stream one multipart field to disk, enforcing the MIME allow-list and
/// the configured size ceiling.
///
/// The size check happens while streaming, so an oversized body is cut off
/// at the limit rather than buffered in full. On any failure the partial
/// file is removed before the error is returned.
pub async fn save_field(mut field: Field<'_>, config: &UploadConfig) -> Result<StoredFile, Error> {
    let original_name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| Error::BadRequest {
            message: "Uploaded file is missing a filename".to_string(),
        })?;

    let mime_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(&original_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    if !is_allowed_mime(&mime_type) {
        return Err(Error::BadRequest {
            message: format!("File type not allowed: {mime_type}"),
        });
    }

    tokio::fs::create_dir_all(&config.dir)
        .await
        .map_err(|e| Error::Internal {
            operation: format!("create upload directory: {e}"),
        })?;

    let filename = generate_filename(&original_name);
    let path = config.dir.join(&filename);

    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| Error::Internal {
            operation: format!("create uploaded file: {e}"),
        })?;

    let mut size: u64 = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                remove_file(&path).await;
                return Err(Error::BadRequest {
                    message: format!("Failed to read uploaded file: {e}"),
                });
            }
        };

        size += chunk.len() as u64;
        if size > config.max_file_size {
            remove_file(&path).await;
            return Err(Error::BadRequest {
                message: format!(
                    "File too large. Maximum allowed size: {}MB",
                    config.max_file_size / 1024 / 1024
                ),
            });
        }

        if let Err(e) = file.write_all(&chunk).await {
            remove_file(&path).await;
            return Err(Error::Internal {
                operation: format!("write uploaded file: {e}"),
            });
        }
    }

    if let Err(e) = file.flush().await {
        remove_file(&path).await;
        return Err(Error::Internal {
            operation: format!("flush uploaded file: {e}"),
        });
    }

    debug!(filename = %filename, size, mime = %mime_type, "Stored uploaded file");

    Ok(StoredFile {
        filename,
        original_name,
        mime_type,
        size: size as i64,
        path,
    })
}

/// Delete a stored file. Idempotent: a missing file is not an error.
///
/// Returns whether a file was actually removed. Failures are logged and
/// swallowed so cleanup never masks the original error.
pub async fn remove_file(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove stored file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_filename_sanitizes_and_keeps_extension() {
        let name = generate_filename("My Résumé (2024).pdf");
        assert!(name.ends_with(".pdf"));
        assert!(name.starts_with("My_R"));
        assert!(!name.contains(' '));
        assert!(!name.contains('('));
    }

    #[test]
    fn test_generate_filename_blocks_path_traversal() {
        let name = generate_filename("../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_generate_filename_without_extension() {
        let name = generate_filename("README");
        assert!(name.starts_with("README_"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_generate_filename_is_unlikely_to_collide() {
        let a = generate_filename("report.pdf");
        let b = generate_filename("report.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn test_mime_allow_list() {
        assert!(is_allowed_mime("application/pdf"));
        assert!(is_allowed_mime("image/png"));
        assert!(is_allowed_mime("audio/ogg"));
        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_mime("text/html"));
    }

    #[test_log::test(tokio::test)]
    async fn test_remove_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored.txt");
        tokio::fs::write(&path, b"data").await.unwrap();

        assert!(remove_file(&path).await);
        assert!(!remove_file(&path).await);
    }
}
