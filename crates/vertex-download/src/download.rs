//! Download data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    /// Waiting for user consent
    Pending,
    /// Download in progress
    Downloading,
    /// Download paused (for resume)
    Paused,
    /// Download completed successfully
    Completed,
    /// Download failed
    Failed,
    /// Download cancelled by user
    Cancelled,
}

impl DownloadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::Pending => "pending",
            DownloadState::Downloading => "downloading",
            DownloadState::Paused => "paused",
            DownloadState::Completed => "completed",
            DownloadState::Failed => "failed",
            DownloadState::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for DownloadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DownloadState::Pending),
            "downloading" => Ok(DownloadState::Downloading),
            "paused" => Ok(DownloadState::Paused),
            "completed" => Ok(DownloadState::Completed),
            "failed" => Ok(DownloadState::Failed),
            "cancelled" => Ok(DownloadState::Cancelled),
            _ => Err(format!("Unknown download state: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    pub id: String,
    pub url: String,
    pub file_path: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    /// The DRM agent claimed the reported MIME type
    pub drm_protected: bool,
    /// The body must pass through DRM conversion before use
    pub needs_drm_conversion: bool,
    pub total_bytes: Option<u64>,
    pub downloaded_bytes: u64,
    pub state: DownloadState,
    pub hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Download {
    pub fn new(url: String, file_path: String, file_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            file_path,
            file_name,
            mime_type: None,
            drm_protected: false,
            needs_drm_conversion: false,
            total_bytes: None,
            downloaded_bytes: 0,
            state: DownloadState::Pending,
            hash: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Get download progress as percentage (0-100)
    pub fn progress(&self) -> f64 {
        match self.total_bytes {
            Some(total) if total > 0 => {
                (self.downloaded_bytes as f64 / total as f64 * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }

    /// Check if download can be resumed
    pub fn can_resume(&self) -> bool {
        matches!(self.state, DownloadState::Paused | DownloadState::Failed)
            && self.downloaded_bytes > 0
    }

    /// Whether completed content should get usage rights installed
    pub fn wants_rights_install(&self) -> bool {
        self.drm_protected || self.needs_drm_conversion
    }
}
