//! Error types for the host-facing APIs

use extendify_core::CoreError;
use thiserror::Error;
use watcher::WatchError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to watch for changes: {0}")]
    Watch(#[from] WatchError),

    #[error("Failed to scan themes directory: {0}")]
    Scan(#[from] walkdir::Error),
}
