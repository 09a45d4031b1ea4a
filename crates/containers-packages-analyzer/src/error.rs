//! Packages analyzer error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(
        "syft executable not found: {0}\n\nHint:\n  • Install syft: https://github.com/anchore/syft\n  • Or point --syft at the binary"
    )]
    SyftNotFound(PathBuf),

    #[error("Analysis of image '{image}' failed: {message}")]
    CommandFailed { image: String, message: String },

    #[error("Invalid syft output for image '{image}': {source}")]
    InvalidOutput {
        image: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
