//! Download manager
//!
//! The pipeline consults the DRM classifier at four points: when a
//! MIME type is reported, when the destination filename is finalized,
//! when a completed file's MIME type is resolved, and when usage
//! rights are installed after completion.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vertex_drm::{
    install_rights, is_drm_convert_needed, is_drm_mime_type, modify_drm_file_extension,
    original_mime_type, DrmConnector,
};
use vertex_storage::Database;

use crate::download::{Download, DownloadState};
use crate::error::DownloadError;
use crate::Result;

pub struct DownloadManager {
    /// In-memory download cache
    downloads: Arc<RwLock<HashMap<String, Download>>>,
    /// Database for persistence
    db: Database,
    /// Default download directory
    download_dir: PathBuf,
    /// Connector for the platform DRM agent
    drm: Arc<dyn DrmConnector>,
}

impl DownloadManager {
    pub fn new(db: Database, download_dir: PathBuf, drm: Arc<dyn DrmConnector>) -> Self {
        Self {
            downloads: Arc::new(RwLock::new(HashMap::new())),
            db,
            download_dir,
            drm,
        }
    }

    /// Create a new download (pending user consent)
    pub fn create_download(&self, url: String, file_name: String) -> Result<Download> {
        let safe_file_name = sanitize_file_name(&file_name);
        let file_path = self.download_dir.join(&safe_file_name);
        let download = Download::new(url, file_path.to_string_lossy().to_string(), safe_file_name);

        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(download.id.clone(), download.clone());

        tracing::info!(
            download_id = %download.id,
            url = %download.url,
            "Created new download"
        );

        Ok(download)
    }

    /// Get a download by ID
    pub fn get_download(&self, id: &str) -> Result<Download> {
        self.downloads
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound(id.to_string()))
    }

    /// Start a download (after user consent)
    pub fn start_download(&self, id: &str) -> Result<Download> {
        let mut download = self.get_download(id)?;

        if download.state != DownloadState::Pending {
            return Err(DownloadError::InvalidState(
                "Download is not in pending state".to_string(),
            ));
        }

        download.state = DownloadState::Downloading;
        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        tracing::info!(download_id = %id, "Started download");

        Ok(download)
    }

    /// Update download progress
    pub fn update_progress(
        &self,
        id: &str,
        downloaded: u64,
        total: Option<u64>,
    ) -> Result<Download> {
        let mut download = self.get_download(id)?;

        download.downloaded_bytes = downloaded;
        if let Some(t) = total {
            download.total_bytes = Some(t);
        }

        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        Ok(download)
    }

    /// Record the MIME type the server reported for a download.
    ///
    /// The DRM agent is consulted here, before the body is accepted:
    /// protected content is flagged, and content that needs conversion
    /// has its destination renamed to the converted form.
    pub fn set_mime_type(&self, id: &str, mime_type: Option<String>) -> Result<Download> {
        let mut download = self.get_download(id)?;

        download.drm_protected = is_drm_mime_type(self.drm.as_ref(), mime_type.as_deref());
        download.needs_drm_conversion = mime_type.as_deref().is_some_and(is_drm_convert_needed);
        download.mime_type = mime_type;

        if download.drm_protected {
            tracing::info!(download_id = %id, mime_type = ?download.mime_type, "Download is DRM-protected");
        }

        if download.needs_drm_conversion {
            self.finalize_drm_file_name(&mut download);
        }

        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        Ok(download)
    }

    /// Rename the destination to the converted form (`.dm`/`.dcf`).
    fn finalize_drm_file_name(&self, download: &mut Download) {
        let Some(mime) = download.mime_type.as_deref() else {
            return;
        };

        if let Some(renamed) = modify_drm_file_extension(Some(&download.file_name), mime) {
            download.file_path = self
                .download_dir
                .join(&renamed)
                .to_string_lossy()
                .to_string();
            tracing::info!(
                download_id = %download.id,
                file_name = %renamed,
                "Renamed destination for DRM conversion"
            );
            download.file_name = renamed;
        }
    }

    /// Pause a download
    pub fn pause_download(&self, id: &str) -> Result<Download> {
        let mut download = self.get_download(id)?;

        if download.state != DownloadState::Downloading {
            return Err(DownloadError::InvalidState(
                "Download is not in progress".to_string(),
            ));
        }

        download.state = DownloadState::Paused;
        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        tracing::info!(download_id = %id, "Paused download");

        Ok(download)
    }

    /// Resume a download
    pub fn resume_download(&self, id: &str) -> Result<Download> {
        let mut download = self.get_download(id)?;

        if !download.can_resume() {
            return Err(DownloadError::InvalidState(
                "Download cannot be resumed".to_string(),
            ));
        }

        download.state = DownloadState::Downloading;
        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        tracing::info!(download_id = %id, "Resumed download");

        Ok(download)
    }

    /// Complete a download.
    ///
    /// For DRM-protected content, usage rights are installed through
    /// the agent; a rights failure is logged by the classifier and
    /// never fails the completion.
    pub fn complete_download(&self, id: &str, hash: Option<String>) -> Result<Download> {
        let mut download = self.get_download(id)?;

        download.state = DownloadState::Completed;
        download.hash = hash;
        download.completed_at = Some(chrono::Utc::now());

        if download.wants_rights_install() {
            if let Some(mime) = download.mime_type.as_deref() {
                install_rights(self.drm.as_ref(), &download.file_path, mime);
            }
        }

        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        tracing::info!(
            download_id = %id,
            hash = ?download.hash,
            "Completed download"
        );

        Ok(download)
    }

    /// Cancel a download
    pub fn cancel_download(&self, id: &str) -> Result<Download> {
        let mut download = self.get_download(id)?;

        download.state = DownloadState::Cancelled;
        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        tracing::info!(download_id = %id, "Cancelled download");

        Ok(download)
    }

    /// Mark download as failed
    pub fn fail_download(&self, id: &str, _reason: &str) -> Result<Download> {
        let mut download = self.get_download(id)?;

        download.state = DownloadState::Failed;
        self.save_download(&download)?;
        self.downloads
            .write()
            .insert(id.to_string(), download.clone());

        tracing::warn!(download_id = %id, "Download failed");

        Ok(download)
    }

    /// MIME type a completed file should be opened with.
    ///
    /// For protected content this is the agent's declared original
    /// type; in every other case the recorded type is kept.
    pub fn resolved_mime_type(&self, id: &str) -> Result<String> {
        let download = self.get_download(id)?;
        let fallback = download
            .mime_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        Ok(original_mime_type(
            self.drm.as_ref(),
            Path::new(&download.file_path),
            fallback,
        ))
    }

    /// Get all downloads
    pub fn list_downloads(&self) -> Vec<Download> {
        self.downloads.read().values().cloned().collect()
    }

    /// Get active downloads
    pub fn active_downloads(&self) -> Vec<Download> {
        self.downloads
            .read()
            .values()
            .filter(|d| matches!(d.state, DownloadState::Downloading | DownloadState::Pending))
            .cloned()
            .collect()
    }

    /// Load downloads from database
    pub fn load_downloads(&self) -> Result<()> {
        use chrono::{DateTime, Utc};

        let downloads = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, file_path, file_name, mime_type, drm_protected,
                        needs_drm_conversion, total_bytes, downloaded_bytes, state,
                        hash, created_at, completed_at
                 FROM downloads",
            )?;

            let downloads: Vec<Download> = stmt
                .query_map([], |row| {
                    let state_str: String = row.get(9)?;
                    let state: DownloadState = state_str.parse().unwrap_or(DownloadState::Pending);

                    // Parse datetime strings
                    let created_str: String = row.get(11)?;
                    let completed_str: Option<String> = row.get(12)?;

                    let created_at = DateTime::parse_from_rfc3339(&created_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now());
                    let completed_at = completed_str.and_then(|s| {
                        DateTime::parse_from_rfc3339(&s)
                            .map(|dt| dt.with_timezone(&Utc))
                            .ok()
                    });

                    Ok(Download {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        file_path: row.get(2)?,
                        file_name: row.get(3)?,
                        mime_type: row.get(4)?,
                        drm_protected: row.get(5)?,
                        needs_drm_conversion: row.get(6)?,
                        total_bytes: row.get(7)?,
                        downloaded_bytes: row.get::<_, i64>(8)? as u64,
                        state,
                        hash: row.get(10)?,
                        created_at,
                        completed_at,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(downloads)
        })?;

        let mut cache = self.downloads.write();
        for download in downloads {
            cache.insert(download.id.clone(), download);
        }

        Ok(())
    }

    /// Save download to database
    fn save_download(&self, download: &Download) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO downloads
                 (id, url, file_path, file_name, mime_type, drm_protected,
                  needs_drm_conversion, total_bytes, downloaded_bytes, state,
                  hash, created_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    download.id,
                    download.url,
                    download.file_path,
                    download.file_name,
                    download.mime_type,
                    download.drm_protected,
                    download.needs_drm_conversion,
                    download.total_bytes.map(|v| v as i64),
                    download.downloaded_bytes as i64,
                    download.state.as_str(),
                    download.hash,
                    download.created_at.to_rfc3339(),
                    download.completed_at.map(|dt| dt.to_rfc3339()),
                ],
            )?;
            Ok(())
        })?)
    }
}

impl Clone for DownloadManager {
    fn clone(&self) -> Self {
        Self {
            downloads: Arc::clone(&self.downloads),
            db: self.db.clone(),
            download_dir: self.download_dir.clone(),
            drm: Arc::clone(&self.drm),
        }
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("download")
        .trim();

    if name.is_empty() {
        "download".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vertex_drm::{DrmAgent, DrmError, DrmRights, NoDrm, MIMETYPE_DRM_MESSAGE};

    /// Agent that claims every DRM MIME type and records saved rights.
    struct TestAgent {
        save_fails: bool,
        original: Option<String>,
        saved: Arc<Mutex<Vec<(DrmRights, String)>>>,
    }

    impl DrmAgent for TestAgent {
        fn can_handle(&self, _path: &str, mime_type: Option<&str>) -> vertex_drm::Result<bool> {
            match mime_type {
                Some(mime) => Ok(is_drm_convert_needed(mime)),
                None => Ok(self.original.is_some()),
            }
        }

        fn original_mime_type(&self, _path: &str) -> vertex_drm::Result<String> {
            self.original
                .clone()
                .ok_or_else(|| DrmError::Agent("not protected".to_string()))
        }

        fn save_rights(&self, rights: &DrmRights, path: &str) -> vertex_drm::Result<()> {
            self.saved
                .lock()
                .unwrap()
                .push((rights.clone(), path.to_string()));
            if self.save_fails {
                Err(DrmError::Io(std::io::Error::other("disk full")))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct TestDrm {
        save_fails: bool,
        original: Option<String>,
        saved: Arc<Mutex<Vec<(DrmRights, String)>>>,
    }

    impl DrmConnector for TestDrm {
        fn connect(&self) -> vertex_drm::Result<Box<dyn DrmAgent>> {
            Ok(Box::new(TestAgent {
                save_fails: self.save_fails,
                original: self.original.clone(),
                saved: Arc::clone(&self.saved),
            }))
        }
    }

    fn manager_with(drm: Arc<dyn DrmConnector>) -> DownloadManager {
        let db = Database::open_in_memory().unwrap();
        DownloadManager::new(db, PathBuf::from("/downloads"), drm)
    }

    #[test]
    fn test_download_manager() {
        let manager = manager_with(Arc::new(NoDrm));

        // Create a download
        let download = manager
            .create_download(
                "https://example.com/file.pdf".to_string(),
                "file.pdf".to_string(),
            )
            .unwrap();

        assert_eq!(download.state, DownloadState::Pending);

        // Start download
        let started = manager.start_download(&download.id).unwrap();
        assert_eq!(started.state, DownloadState::Downloading);

        // Update progress
        manager
            .update_progress(&download.id, 500, Some(1000))
            .unwrap();
        let updated = manager.get_download(&download.id).unwrap();
        assert_eq!(updated.downloaded_bytes, 500);

        // Complete download
        let completed = manager
            .complete_download(&download.id, Some("abc123".to_string()))
            .unwrap();
        assert_eq!(completed.state, DownloadState::Completed);
        assert_eq!(completed.hash, Some("abc123".to_string()));
    }

    #[test]
    fn test_plain_mime_type_is_not_flagged() {
        let manager = manager_with(Arc::new(TestDrm::default()));

        let download = manager
            .create_download(
                "https://example.com/file.pdf".to_string(),
                "file.pdf".to_string(),
            )
            .unwrap();

        let updated = manager
            .set_mime_type(&download.id, Some("application/pdf".to_string()))
            .unwrap();

        assert!(!updated.drm_protected);
        assert!(!updated.needs_drm_conversion);
        assert_eq!(updated.file_name, "file.pdf");
    }

    #[test]
    fn test_drm_mime_type_flags_and_renames() {
        let manager = manager_with(Arc::new(TestDrm::default()));

        let download = manager
            .create_download(
                "https://example.com/license".to_string(),
                "My Song.txt".to_string(),
            )
            .unwrap();

        let updated = manager
            .set_mime_type(&download.id, Some(MIMETYPE_DRM_MESSAGE.to_string()))
            .unwrap();

        assert!(updated.drm_protected);
        assert!(updated.needs_drm_conversion);
        assert_eq!(updated.file_name, "My_Song.dm");
        assert!(updated.file_path.ends_with("My_Song.dm"));
    }

    #[test]
    fn test_completion_installs_rights() {
        let drm = Arc::new(TestDrm::default());
        let manager = manager_with(drm.clone());

        let download = manager
            .create_download(
                "https://example.com/license".to_string(),
                "license.bin".to_string(),
            )
            .unwrap();
        manager
            .set_mime_type(&download.id, Some(MIMETYPE_DRM_MESSAGE.to_string()))
            .unwrap();
        manager.start_download(&download.id).unwrap();
        let completed = manager.complete_download(&download.id, None).unwrap();

        assert_eq!(completed.state, DownloadState::Completed);

        let saved = drm.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1, completed.file_path);
        assert_eq!(saved[0].0.mime_type, MIMETYPE_DRM_MESSAGE);
    }

    #[test]
    fn test_rights_failure_still_completes() {
        let drm = Arc::new(TestDrm {
            save_fails: true,
            ..Default::default()
        });
        let manager = manager_with(drm.clone());

        let download = manager
            .create_download(
                "https://example.com/license".to_string(),
                "license.bin".to_string(),
            )
            .unwrap();
        manager
            .set_mime_type(&download.id, Some(MIMETYPE_DRM_MESSAGE.to_string()))
            .unwrap();

        let completed = manager.complete_download(&download.id, None).unwrap();
        assert_eq!(completed.state, DownloadState::Completed);
        assert_eq!(drm.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_resolved_mime_type_for_protected_file() {
        let drm = Arc::new(TestDrm {
            original: Some("audio/mpeg".to_string()),
            ..Default::default()
        });
        let manager = manager_with(drm);

        let download = manager
            .create_download(
                "https://example.com/track".to_string(),
                "track.dcf".to_string(),
            )
            .unwrap();
        manager
            .set_mime_type(&download.id, Some("application/vnd.oma.drm.content".to_string()))
            .unwrap();

        assert_eq!(
            manager.resolved_mime_type(&download.id).unwrap(),
            "audio/mpeg"
        );
    }

    #[test]
    fn test_resolved_mime_type_keeps_recorded_type() {
        let manager = manager_with(Arc::new(NoDrm));

        let download = manager
            .create_download(
                "https://example.com/file.pdf".to_string(),
                "file.pdf".to_string(),
            )
            .unwrap();
        manager
            .set_mime_type(&download.id, Some("application/pdf".to_string()))
            .unwrap();

        assert_eq!(
            manager.resolved_mime_type(&download.id).unwrap(),
            "application/pdf"
        );
    }

    #[test]
    fn test_load_downloads_round_trips_drm_flags() {
        let db = Database::open_in_memory().unwrap();
        let drm: Arc<dyn DrmConnector> = Arc::new(TestDrm::default());
        let manager = DownloadManager::new(db.clone(), PathBuf::from("/downloads"), drm.clone());

        let download = manager
            .create_download(
                "https://example.com/license".to_string(),
                "license.bin".to_string(),
            )
            .unwrap();
        manager
            .set_mime_type(&download.id, Some(MIMETYPE_DRM_MESSAGE.to_string()))
            .unwrap();

        // Fresh manager over the same database
        let reloaded = DownloadManager::new(db, PathBuf::from("/downloads"), drm);
        reloaded.load_downloads().unwrap();

        let restored = reloaded.get_download(&download.id).unwrap();
        assert!(restored.drm_protected);
        assert!(restored.needs_drm_conversion);
        assert_eq!(restored.file_name, "license.dm");
    }
}
