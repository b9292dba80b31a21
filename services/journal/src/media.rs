//! Media attachment manager
//!
//! Stores uploaded images on local disk under generated names, hands back
//! their public URLs, and removes them again when an entry lets go of its
//! image. The placeholder image is a static asset and is never touched.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// File name of the placeholder asset
pub const PLACEHOLDER_FILE: &str = "placeholder.png";

/// An uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Outcome of a removal request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The file existed and was deleted
    Removed,
    /// No such file in the upload directory
    NotFound,
    /// The URL names the placeholder or no usable file name
    Skipped,
}

/// Media errors
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local-disk image store
#[derive(Debug, Clone)]
pub struct MediaStore {
    upload_dir: PathBuf,
    public_base_url: String,
    placeholder_url: String,
}

impl MediaStore {
    /// Create a media store writing into `upload_dir` and publishing files
    /// under `<public_base_url>/uploads/`
    pub fn new(upload_dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        let public_base_url = public_base_url.trim_end_matches('/').to_string();
        let placeholder_url = format!("{}/assets/{}", public_base_url, PLACEHOLDER_FILE);

        Self {
            upload_dir: upload_dir.into(),
            public_base_url,
            placeholder_url,
        }
    }

    /// URL of the placeholder image
    pub fn placeholder_url(&self) -> &str {
        &self.placeholder_url
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Persist an upload and return its public URL
    ///
    /// No upload at all is a valid outcome and yields the placeholder URL.
    pub async fn store_upload(&self, upload: Option<Upload>) -> Result<String, MediaError> {
        let Some(upload) = upload else {
            return Ok(self.placeholder_url.clone());
        };

        let content_type = upload.content_type.as_deref().unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(MediaError::UnsupportedMediaType(
                "Only images are allowed".to_string(),
            ));
        }

        let file_name = format!(
            "{}{}",
            Uuid::new_v4(),
            extension_of(upload.file_name.as_deref())
        );

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(self.upload_dir.join(&file_name), &upload.bytes).await?;

        info!("Stored upload {} ({} bytes)", file_name, upload.bytes.len());
        Ok(format!("{}/uploads/{}", self.public_base_url, file_name))
    }

    /// Remove the uploaded file an image URL points at
    ///
    /// A missing file is reported as [`Removal::NotFound`], not as an error.
    pub async fn remove_by_url(&self, url: &str) -> Result<Removal, MediaError> {
        if url == self.placeholder_url {
            return Ok(Removal::Skipped);
        }

        let Some(file_name) = file_name_from_url(url) else {
            return Ok(Removal::Skipped);
        };
        if file_name == PLACEHOLDER_FILE {
            return Ok(Removal::Skipped);
        }

        match tokio::fs::remove_file(self.upload_dir.join(file_name)).await {
            Ok(()) => {
                info!("Removed upload {}", file_name);
                Ok(Removal::Removed)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Removal::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an image in the background
    ///
    /// The caller does not wait for the result; failures are only logged.
    pub fn spawn_removal(&self, url: String) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            match store.remove_by_url(&url).await {
                Ok(outcome) => debug!("Image removal for {}: {:?}", url, outcome),
                Err(e) => warn!("Failed to delete image file {}: {}", url, e),
            }
        })
    }
}

/// Last path segment of a URL, without query or fragment
///
/// Returns `None` for names that could escape the upload directory.
fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return None;
    }
    Some(name)
}

/// Lower-cased extension of the client's file name, with its dot
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
