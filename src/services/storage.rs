//! Video asset storage on the local filesystem.
//!
//! Uploaded videos are written under a single upload directory with a
//! generated file name. That name is the stored reference kept in the
//! project record; it is only ever resolved against the upload directory.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ingest::UploadedFile;

/// Filesystem-backed video store.
#[derive(Debug, Clone)]
pub struct VideoAssetStore {
    upload_dir: PathBuf,
}

impl VideoAssetStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Get the content type for a stored reference based on its extension.
    pub fn content_type_for(reference: &str) -> &'static str {
        let ext = Path::new(reference)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext.to_lowercase().as_str() {
            "mp4" => "video/mp4",
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            _ => "application/octet-stream",
        }
    }

    /// Generate a fresh stored reference, keeping the original extension.
    pub fn generate_reference(original_name: Option<&str>) -> String {
        // Text after the last dot of the bare file name, so `.mp4` keeps `mp4`
        let extension = original_name
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty());
        match extension {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        }
    }

    /// Write an uploaded file and return its stored reference.
    ///
    /// Returns `None` without touching the disk when there is no file.
    pub async fn save(&self, file: Option<&UploadedFile>) -> AppResult<Option<String>> {
        let Some(file) = file else {
            return Ok(None);
        };

        let reference = Self::generate_reference(file.filename.as_deref());

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to create upload directory: {}", e)))?;

        tokio::fs::write(self.upload_dir.join(&reference), &file.data)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to write video {}: {}", reference, e)))?;

        info!(
            "Saved video {} ({} bytes, original name {:?})",
            reference,
            file.data.len(),
            file.filename
        );
        Ok(Some(reference))
    }

    /// Read a stored video into memory.
    pub async fn read(&self, reference: &str) -> AppResult<Vec<u8>> {
        let path = self
            .resolve(reference)
            .ok_or_else(|| AppError::NotFound("Video".to_string()))?;

        debug!("Reading video {}", path.display());
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Video".to_string()))
            }
            Err(e) => Err(AppError::FileSystem(format!(
                "Failed to read video {}: {}",
                reference, e
            ))),
        }
    }

    /// Join a reference onto the upload directory, refusing anything that is
    /// not a single plain file name.
    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let mut components = Path::new(reference).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.upload_dir.join(name)),
            _ => None,
        }
    }
}
