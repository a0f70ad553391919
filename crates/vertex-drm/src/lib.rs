//! VERTEX DRM Layer
//!
//! Classification helpers for DRM-protected downloads. The platform
//! rights engine stays behind the [`DrmConnector`] seam; this crate
//! decides when the pipeline has to talk to it and degrades safely
//! when it cannot.

mod agent;
mod classify;
mod error;
mod mime;
mod rights;

pub use agent::{DrmAgent, DrmConnector, NoDrm};
pub use classify::{
    install_rights, is_drm_convert_needed, is_drm_mime_type, modify_drm_file_extension,
    original_mime_type, EMULATED_STORAGE_PREFIX, LEGACY_STORAGE_PREFIX,
};
pub use error::DrmError;
pub use mime::{
    DrmMimeKind, ACTION_BUY_LICENSE, EXTENSION_DRM_MESSAGE, EXTENSION_INTERNAL_DRM,
    EXTENSION_INTERNAL_FWDL, MIMETYPE_DRM_CONTENT, MIMETYPE_DRM_MESSAGE,
};
pub use rights::DrmRights;

pub type Result<T> = std::result::Result<T, DrmError>;
