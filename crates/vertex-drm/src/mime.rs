//! DRM MIME types and file extensions

use serde::{Deserialize, Serialize};

/// MIME type of an OMA DRM message wrapper
pub const MIMETYPE_DRM_MESSAGE: &str = "application/vnd.oma.drm.message";
/// MIME type of OMA DRM protected content
pub const MIMETYPE_DRM_CONTENT: &str = "application/vnd.oma.drm.content";

/// Extension given to DRM message files
pub const EXTENSION_DRM_MESSAGE: &str = ".dm";
/// Extension given to internally converted forward-lock files
pub const EXTENSION_INTERNAL_FWDL: &str = ".fl";
/// Extension given to DRM content containers
pub const EXTENSION_INTERNAL_DRM: &str = ".dcf";

/// Action a frontend fires to start a license purchase for protected content
pub const ACTION_BUY_LICENSE: &str = "vertex.drm.action.BUY_LICENSE";

/// The two special DRM media types whose bodies must be converted
/// before they are usable on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrmMimeKind {
    /// DRM message wrapper (`.dm`)
    Message,
    /// Protected content container (`.dcf`)
    Content,
}

impl DrmMimeKind {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            MIMETYPE_DRM_MESSAGE => Some(DrmMimeKind::Message),
            MIMETYPE_DRM_CONTENT => Some(DrmMimeKind::Content),
            _ => None,
        }
    }

    /// Extension the converted file gets on disk
    pub fn extension(&self) -> &'static str {
        match self {
            DrmMimeKind::Message => EXTENSION_DRM_MESSAGE,
            DrmMimeKind::Content => EXTENSION_INTERNAL_DRM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime() {
        assert_eq!(
            DrmMimeKind::from_mime(MIMETYPE_DRM_MESSAGE),
            Some(DrmMimeKind::Message)
        );
        assert_eq!(
            DrmMimeKind::from_mime(MIMETYPE_DRM_CONTENT),
            Some(DrmMimeKind::Content)
        );
        assert_eq!(DrmMimeKind::from_mime("application/pdf"), None);
        assert_eq!(DrmMimeKind::from_mime(""), None);
    }

    #[test]
    fn test_extension() {
        assert_eq!(DrmMimeKind::Message.extension(), ".dm");
        assert_eq!(DrmMimeKind::Content.extension(), ".dcf");
    }
}
