//! Storage for uploaded audio blobs.
//!
//! Files live flat under the media root with generated UUID names, so
//! concurrent uploads can never collide and the original file name never
//! reaches the filesystem.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct MediaStore {
    media_path: PathBuf,
}

impl MediaStore {
    pub fn new(media_path: impl Into<PathBuf>) -> Self {
        Self {
            media_path: media_path.into(),
        }
    }

    /// Create the media root if missing.
    pub async fn init(&self) -> Result<(), MediaStoreError> {
        fs::create_dir_all(&self.media_path).await?;
        Ok(())
    }

    pub fn media_path(&self) -> &Path {
        &self.media_path
    }

    /// Absolute path of a stored file name.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.media_path.join(file_name)
    }

    /// Write the bytes under a generated name and return that name. The
    /// extension comes from the upload's file name, falling back to the MIME
    /// type's canonical one when the name carries none.
    pub async fn save(
        &self,
        original_name: Option<&str>,
        mime_type: &str,
        data: &[u8],
    ) -> Result<String, MediaStoreError> {
        let extension = original_name
            .and_then(extension_of)
            .unwrap_or_else(|| extension_for_mime(mime_type).to_string());
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        let path = self.media_path.join(&file_name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(file_name)
    }

    /// Best-effort delete. Failure is logged, never propagated.
    pub async fn delete(&self, file_name: &str) {
        let path = self.media_path.join(file_name);
        if let Err(e) = fs::remove_file(&path).await {
            warn!("Could not delete media file {}: {}", path.display(), e);
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Canonical extension for the accepted upload MIME types.
fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        _ => "bin",
    }
}
