//! DRM file classification
//!
//! Stateless helpers the download pipeline calls around protected
//! content: MIME classification before a body is accepted, the
//! conversion check, destination renaming, original-MIME lookup for
//! completed files, and rights installation. None of these return an
//! error; when the agent is unavailable or a request fails, they log
//! a diagnostic and degrade to the unprotected behavior.

use std::path::Path;

use crate::agent::DrmConnector;
use crate::mime::DrmMimeKind;
use crate::rights::DrmRights;

/// Emulated-storage mount as the pipeline sees it.
pub const EMULATED_STORAGE_PREFIX: &str = "/storage/emulated/0";
/// Legacy view of the same mount; rights must be registered against it.
pub const LEGACY_STORAGE_PREFIX: &str = "/storage/emulated/legacy";

/// Ask the DRM agent whether it handles the given MIME type.
///
/// Empty or missing MIME types are never DRM.
pub fn is_drm_mime_type(connector: &dyn DrmConnector, mime_type: Option<&str>) -> bool {
    let mime = match mime_type {
        Some(m) if !m.is_empty() => m,
        _ => return false,
    };

    let agent = match connector.connect() {
        Ok(agent) => agent,
        Err(e) => {
            tracing::warn!(error = %e, "DRM agent unavailable, treating MIME type as unprotected");
            return false;
        }
    };

    match agent.can_handle("", Some(mime)) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(mime_type = %mime, error = %e, "DRM agent failed to classify MIME type");
            false
        }
    }
}

/// True if a body with this MIME type must pass through DRM conversion
/// before it is usable on disk.
pub fn is_drm_convert_needed(mime_type: &str) -> bool {
    DrmMimeKind::from_mime(mime_type).is_some()
}

/// Rewrite a destination filename for DRM-converted content.
///
/// Spaces become underscores and the last extension is stripped; the
/// suffix for the DRM kind is then appended (no suffix for non-DRM
/// MIME types). A `None` filename passes through unchanged.
pub fn modify_drm_file_extension(filename: Option<&str>, mime_type: &str) -> Option<String> {
    let filename = filename?;

    let mut name = filename.replace(' ', "_");
    if let Some(index) = name.rfind('.') {
        name.truncate(index);
    }
    if let Some(kind) = DrmMimeKind::from_mime(mime_type) {
        name.push_str(kind.extension());
    }

    Some(name)
}

/// Return the original MIME type of a (possibly protected) file.
///
/// One agent handle is acquired for this single call and dropped
/// before returning, whatever the outcome. If the agent does not
/// recognize the path, or cannot be reached at all, the fallback is
/// returned unchanged.
pub fn original_mime_type(connector: &dyn DrmConnector, path: &Path, fallback: &str) -> String {
    let raw_path = path.to_string_lossy();

    let agent = match connector.connect() {
        Ok(agent) => agent,
        Err(e) => {
            tracing::warn!(error = %e, "DRM agent unavailable, keeping reported MIME type");
            return fallback.to_string();
        }
    };

    match agent.can_handle(&raw_path, None) {
        Ok(true) => match agent.original_mime_type(&raw_path) {
            Ok(mime) => mime,
            Err(e) => {
                tracing::warn!(path = %raw_path, error = %e, "Failed to read original MIME type");
                fallback.to_string()
            }
        },
        Ok(false) => fallback.to_string(),
        Err(e) => {
            tracing::warn!(path = %raw_path, error = %e, "DRM agent failed to inspect file");
            fallback.to_string()
        }
    }
}

/// Install usage rights for a downloaded rights object.
///
/// Paths under the emulated-storage mount are rewritten to the legacy
/// view before the agent persists them. Persistence failures are
/// logged and swallowed; a missing license never fails the pipeline.
pub fn install_rights(connector: &dyn DrmConnector, path: &str, mime_type: &str) {
    let path = match path.strip_prefix(EMULATED_STORAGE_PREFIX) {
        Some(rest) => format!("{}{}", LEGACY_STORAGE_PREFIX, rest),
        None => path.to_string(),
    };

    let agent = match connector.connect() {
        Ok(agent) => agent,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "DRM agent unavailable, rights not installed");
            return;
        }
    };

    let rights = DrmRights::new(path.clone(), mime_type.to_string());
    if let Err(e) = agent.save_rights(&rights, &path) {
        tracing::warn!(path = %path, error = %e, "Failed to install DRM rights");
    }
}
