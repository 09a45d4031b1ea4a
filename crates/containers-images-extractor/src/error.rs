//! Images extractor error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Scan path not found: {0}")]
    ScanPathNotFound(PathBuf),

    #[error("Unsupported scan path (expected a directory or a .tar, .tar.gz, .tgz archive): {0}")]
    UnsupportedScanPath(PathBuf),

    #[error("Discovery error: {path}\nReason: {message}")]
    Discovery { path: PathBuf, message: String },

    #[error("Archive error: {path}\nReason: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("Could not read manifest: {path}\nReason: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
