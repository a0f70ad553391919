//! VERTEX Core
//!
//! Central coordination layer for the VERTEX download manager.
//! Owns configuration and assembles the pipeline over storage and the
//! platform DRM connector.

mod center;
mod config;
mod error;

pub use center::DownloadCenter;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use vertex_download::{Download, DownloadError, DownloadManager, DownloadState};
pub use vertex_drm::{
    DrmAgent, DrmConnector, DrmError, DrmMimeKind, DrmRights, NoDrm, MIMETYPE_DRM_CONTENT,
    MIMETYPE_DRM_MESSAGE,
};
pub use vertex_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
