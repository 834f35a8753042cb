use chrono::Utc;
use rand::Rng;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::error::{AppError, Result};

/// Extensions accepted for upload, with the MIME type each maps to
pub const ALLOWED_EXTENSIONS: &[(&str, &str)] = &[
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
    (".webp", "image/webp"),
    (".txt", "text/plain"),
    (".pdf", "application/pdf"),
    (".mp4", "video/mp4"),
    (".webm", "video/webm"),
    (".ogg", "video/ogg"),
    (".mov", "video/quicktime"),
    (".avi", "video/x-msvideo"),
    (".mkv", "video/x-matroska"),
];

/// Upload directory on the local file system. Rows reference files by their
/// name relative to `base_path`.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Lowercased extension including the leading dot, or empty
    fn extension_of(original: &str) -> String {
        Path::new(original)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }

    /// Build a collision-resistant name: `file-<unix ms>-<random><ext>`
    pub fn generate_file_name(original: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!(
            "file-{}-{}{}",
            Utc::now().timestamp_millis(),
            suffix,
            Self::extension_of(original)
        )
    }

    /// Check the upload's extension against the allow-list and return the
    /// MIME type it maps to
    pub fn validate_extension(original: &str) -> Result<&'static str> {
        let ext = Self::extension_of(original);
        ALLOWED_EXTENSIONS
            .iter()
            .find(|(allowed, _)| *allowed == ext)
            .map(|(_, mime)| *mime)
            .ok_or_else(|| {
                let allowed: Vec<&str> = ALLOWED_EXTENSIONS.iter().map(|(e, _)| *e).collect();
                AppError::BadRequest(format!(
                    "Invalid file type. Allowed extensions: {}",
                    allowed.join(", ")
                ))
            })
    }

    /// Map a stored name to its path, refusing anything that could escape the
    /// upload directory
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.base_path.join(name)),
            _ => Err(AppError::BadRequest(format!("Invalid file name: {}", name))),
        }
    }

    /// Create (or truncate) a file in the upload directory
    pub async fn create(&self, name: &str) -> Result<fs::File> {
        let full_path = self.resolve(name)?;
        fs::create_dir_all(&self.base_path).await?;
        let file = fs::File::create(&full_path).await.map_err(|e| {
            AppError::Storage(format!("Failed to create {:?}: {}", full_path, e))
        })?;
        tracing::debug!("Created upload file {:?}", full_path);
        Ok(file)
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, name: &str) -> Result<()> {
        let full_path = self.resolve(name)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted upload file {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete {}: {}",
                name, e
            ))),
        }
    }

    /// Delete a stored file, logging instead of failing
    pub async fn discard(&self, name: &str) {
        if let Err(e) = self.remove(name).await {
            tracing::warn!("Ignoring failed cleanup of {}: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn generated_names_keep_lowercased_extension() {
        let name = LocalStorage::generate_file_name("Holiday Photo.PNG");
        assert!(name.starts_with("file-"));
        assert!(name.ends_with(".png"));
        assert_ne!(name, LocalStorage::generate_file_name("Holiday Photo.PNG"));
    }

    #[test]
    fn extension_allow_list_maps_to_mime() {
        assert_eq!(LocalStorage::validate_extension("a.JPG").unwrap(), "image/jpeg");
        assert_eq!(LocalStorage::validate_extension("clip.mkv").unwrap(), "video/x-matroska");

        let err = LocalStorage::validate_extension("script.sh").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains(".webp")));
        assert!(LocalStorage::validate_extension("no_extension").is_err());
    }

    #[test]
    fn resolve_rejects_paths_outside_upload_dir() {
        let storage = LocalStorage::new("/srv/uploads");
        assert_eq!(
            storage.resolve("file-1-2.png").unwrap(),
            PathBuf::from("/srv/uploads/file-1-2.png")
        );
        assert!(storage.resolve("../secrets.txt").is_err());
        assert!(storage.resolve("nested/file.png").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
    }

    #[tokio::test]
    async fn remove_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let mut file = storage.create("a.txt").await.unwrap();
        file.write_all(b"hello").await.unwrap();
        file.flush().await.unwrap();
        assert!(dir.path().join("a.txt").exists());

        storage.remove("a.txt").await.unwrap();
        assert!(!dir.path().join("a.txt").exists());
        storage.remove("a.txt").await.unwrap();
    }
}
