//! Trait seam for the platform DRM agent
//!
//! The rights engine is an external service; this crate only talks to
//! it through short-lived handles. A handle is scoped to a single
//! classifier call and released on drop, on every exit path.

use crate::error::DrmError;
use crate::rights::DrmRights;
use crate::Result;

/// One acquired handle to the platform DRM agent.
pub trait DrmAgent {
    /// Whether the agent recognizes the file and/or MIME type.
    fn can_handle(&self, path: &str, mime_type: Option<&str>) -> Result<bool>;

    /// MIME type the content had before it was wrapped for DRM.
    fn original_mime_type(&self, path: &str) -> Result<String>;

    /// Persist usage rights for the file at `path`.
    fn save_rights(&self, rights: &DrmRights, path: &str) -> Result<()>;
}

/// Acquires per-call agent handles.
///
/// Each classifier operation connects, performs one request, and drops
/// the handle before returning, so connectors are shared freely across
/// threads.
pub trait DrmConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn DrmAgent>>;
}

/// Connector for builds without a platform rights engine. Every
/// acquisition reports the agent as unavailable, so classification
/// degrades to "not protected".
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDrm;

impl DrmConnector for NoDrm {
    fn connect(&self) -> Result<Box<dyn DrmAgent>> {
        Err(DrmError::Unavailable(
            "no DRM service on this platform".to_string(),
        ))
    }
}
