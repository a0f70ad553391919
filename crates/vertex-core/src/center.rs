//! Main application state container

use std::sync::Arc;

use vertex_download::{Download, DownloadManager};
use vertex_drm::{DrmConnector, NoDrm};
use vertex_storage::Database;

use crate::config::Config;
use crate::Result;

/// Central state container for the download manager.
///
/// Owns the database and the download pipeline; frontends are pure
/// renderers over this.
pub struct DownloadCenter {
    /// Configuration
    config: Config,
    /// Database
    db: Database,
    /// Download pipeline
    download_manager: DownloadManager,
}

impl DownloadCenter {
    /// Initialize a new instance with the platform DRM connector.
    ///
    /// When DRM is disabled in the config, the connector is replaced
    /// with [`NoDrm`] and every download classifies as unprotected.
    pub fn new(config: Config, drm: Arc<dyn DrmConnector>) -> Result<Self> {
        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;

        let drm: Arc<dyn DrmConnector> = if config.drm_enabled {
            drm
        } else {
            Arc::new(NoDrm)
        };
        let download_manager = DownloadManager::new(db.clone(), config.download_dir.clone(), drm);

        Ok(Self {
            config,
            db,
            download_manager,
        })
    }

    /// Load persisted state
    pub fn initialize(&self) -> Result<()> {
        self.download_manager.load_downloads()?;

        tracing::info!("Download center initialized");

        Ok(())
    }

    // === Download operations ===

    pub fn download_manager(&self) -> &DownloadManager {
        &self.download_manager
    }

    pub fn create_download(&self, url: String, file_name: String) -> Result<Download> {
        Ok(self.download_manager.create_download(url, file_name)?)
    }

    // === Config ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for DownloadCenter {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            download_manager: self.download_manager.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_center() -> DownloadCenter {
        // Use in-memory database for testing
        let db = Database::open_in_memory().unwrap();
        let config = Config {
            database_path: PathBuf::from(":memory:"),
            download_dir: PathBuf::from("/tmp/downloads"),
            drm_enabled: false,
        };

        let download_manager =
            DownloadManager::new(db.clone(), config.download_dir.clone(), Arc::new(NoDrm));

        DownloadCenter {
            config,
            db,
            download_manager,
        }
    }

    #[test]
    fn test_center_initialization() {
        let center = test_center();
        center.initialize().unwrap();

        let download = center
            .create_download(
                "https://example.com/file.pdf".to_string(),
                "file.pdf".to_string(),
            )
            .unwrap();

        assert_eq!(download.file_name, "file.pdf");
        assert!(center.download_manager().get_download(&download.id).is_ok());
    }

    #[test]
    fn test_drm_disabled_classifies_unprotected() {
        let center = test_center();

        let download = center
            .create_download(
                "https://example.com/license".to_string(),
                "license.bin".to_string(),
            )
            .unwrap();

        let updated = center
            .download_manager()
            .set_mime_type(
                &download.id,
                Some(vertex_drm::MIMETYPE_DRM_MESSAGE.to_string()),
            )
            .unwrap();

        // No platform agent: not flagged as protected, but the pure
        // conversion check still applies
        assert!(!updated.drm_protected);
        assert!(updated.needs_drm_conversion);
        assert_eq!(updated.file_name, "license.dm");
    }
}
