//! VERTEX Storage Layer
//!
//! SQLite-based persistence for download records and settings.
//! All writes go through a single connection behind a mutex.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
