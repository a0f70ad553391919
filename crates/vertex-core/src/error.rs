//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] vertex_storage::StorageError),

    #[error("Download error: {0}")]
    Download(#[from] vertex_download::DownloadError),

    #[error("DRM error: {0}")]
    Drm(#[from] vertex_drm::DrmError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
