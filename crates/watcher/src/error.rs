//! Error types for the watcher engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by watcher operations
#[derive(Error, Debug)]
pub enum WatchError {
    /// Caller passed an argument the engine cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Registration path is neither the root nor a direct child of it
    #[error("Path must be a direct child of the base dir or the base dir itself. Base dir: {root}, path: {path}")]
    NotDirectChild { root: PathBuf, path: PathBuf },

    /// The directory could not be opened for change notification
    #[error("Error opening base dir {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    /// A watch request could not be issued against an open directory
    #[error("Failed to read directory changes for {path}: {reason}")]
    ArmFailed { path: PathBuf, reason: String },

    /// Engine threads could not be started
    #[error("Failed to start watcher thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Configuration value out of range
    #[error("Invalid watcher configuration: {0}")]
    Config(String),
}

/// Errors produced while decoding a raw notification buffer
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("Unknown action code {0}")]
    UnknownAction(u32),

    #[error("Truncated record at offset {offset}")]
    Truncated { offset: usize },

    #[error("Record name at offset {offset} is not valid UTF-8")]
    InvalidName { offset: usize },
}
