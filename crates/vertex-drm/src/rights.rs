//! Usage-rights payload

use serde::{Deserialize, Serialize};

/// Rights payload handed to the DRM agent for persistence.
///
/// `data_path` points at the downloaded rights object itself; the
/// agent reads it and registers the contained rights under `mime_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrmRights {
    pub data_path: String,
    pub mime_type: String,
}

impl DrmRights {
    pub fn new(data_path: String, mime_type: String) -> Self {
        Self {
            data_path,
            mime_type,
        }
    }
}
