//! VERTEX Download Pipeline
//!
//! Rust-implemented downloader with OMA DRM support:
//! - MIME classification before a body is accepted
//! - Forced rename for content that needs DRM conversion
//! - Usage-rights installation after completion
//! - Original-MIME resolution when opening completed files

mod download;
mod error;
mod manager;

pub use download::{Download, DownloadState};
pub use error::DownloadError;
pub use manager::DownloadManager;

pub type Result<T> = std::result::Result<T, DownloadError>;
