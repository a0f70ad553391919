//! DRM error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrmError {
    /// The platform DRM agent could not be constructed or reached.
    #[error("DRM agent unavailable: {0}")]
    Unavailable(String),

    #[error("DRM agent request failed: {0}")]
    Agent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
