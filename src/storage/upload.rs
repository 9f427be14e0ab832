//! Image storage for product photos on the filesystem.
//!
//! Files land flat in the uploads directory as `{ms}-{32 hex}.{ext}` and are
//! served by the static file fallback under `/uploads/`.

use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// URL prefix the static file service exposes the uploads directory under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Accepted image MIME types and the extension stored for each.
const ALLOWED_IMAGE_TYPES: [(&str, &str); 3] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// Error type for upload operations.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid upload filename: {0}")]
    InvalidName(String),
}

/// File extension for an accepted image MIME type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| allowed.eq_ignore_ascii_case(mime.trim()))
        .map(|(_, ext)| *ext)
}

/// Unique stored filename: timestamp plus 16 random bytes in hex.
pub fn upload_filename(ext: &str, now_ms: u64) -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    format!("{}-{}.{}", now_ms, hex::encode(bytes), ext)
}

/// Public URL for a stored filename.
pub fn upload_url(filename: &str) -> String {
    format!("{}/{}", UPLOADS_URL_PREFIX, filename)
}

fn upload_path(uploads_dir: &Path, filename: &str) -> Result<PathBuf, UploadError> {
    if filename.is_empty()
        || !filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        || filename.starts_with('.')
    {
        return Err(UploadError::InvalidName(filename.to_string()));
    }
    Ok(uploads_dir.join(filename))
}

/// Initialize the uploads directory.
///
/// Creates the directory if it doesn't exist.
pub async fn init_uploads(uploads_dir: &Path) -> Result<(), UploadError> {
    fs::create_dir_all(uploads_dir).await?;
    Ok(())
}

/// Write an uploaded file to disk.
///
/// Uses atomic write (write to temp file, then rename) so the static file
/// service never serves a partial image.
pub async fn write_upload(
    uploads_dir: &Path,
    filename: &str,
    content: &[u8],
) -> Result<PathBuf, UploadError> {
    let path = upload_path(uploads_dir, filename)?;

    fs::create_dir_all(uploads_dir).await?;

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;

    fs::rename(&temp_path, &path).await?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_mime("image/png"), Some("png"));
        assert_eq!(extension_for_mime("IMAGE/WEBP"), Some("webp"));
        assert_eq!(extension_for_mime("image/gif"), None);
        assert_eq!(extension_for_mime("text/html"), None);
        assert_eq!(extension_for_mime(""), None);
    }

    #[test]
    fn test_upload_filename_shape() {
        let name = upload_filename("png", 1_700_000_000_000);
        let (stamp, rest) = name.split_once('-').unwrap();
        let (id, ext) = rest.split_once('.').unwrap();

        assert_eq!(stamp, "1700000000000");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "png");
    }

    #[test]
    fn test_upload_filenames_are_unique() {
        assert_ne!(upload_filename("jpg", 1), upload_filename("jpg", 1));
    }

    #[test]
    fn test_upload_url() {
        assert_eq!(upload_url("1-ab.jpg"), "/uploads/1-ab.jpg");
    }

    #[tokio::test]
    async fn test_write_upload() {
        let temp_dir = TempDir::new().unwrap();
        let uploads_dir = temp_dir.path().join("uploads");

        init_uploads(&uploads_dir).await.unwrap();

        let filename = upload_filename("jpg", 1_700_000_000_000);
        let path = write_upload(&uploads_dir, &filename, b"\xff\xd8\xff fake jpeg")
            .await
            .unwrap();

        assert_eq!(path, uploads_dir.join(&filename));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\xff\xd8\xff fake jpeg");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_write_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let uploads_dir = temp_dir.path().join("public").join("uploads");

        write_upload(&uploads_dir, "1-aa.png", b"png").await.unwrap();
        assert!(uploads_dir.join("1-aa.png").exists());
    }

    #[tokio::test]
    async fn test_invalid_name() {
        let temp_dir = TempDir::new().unwrap();

        for name in ["", "../escape.jpg", "a/b.jpg", ".hidden"] {
            let result = write_upload(temp_dir.path(), name, b"content").await;
            assert!(matches!(result, Err(UploadError::InvalidName(_))));
        }
    }
}
