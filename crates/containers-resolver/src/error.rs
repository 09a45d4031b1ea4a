use containers_images_extractor::ExtractError;
use containers_packages_analyzer::AnalyzeError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a resolution
///
/// Collaborator errors are passed through unchanged: their message is the
/// message of the underlying error.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The resolution folder is missing, not a directory, or the results
    /// directory could not be created in it
    #[error(transparent)]
    ResolutionFolder(std::io::Error),

    /// Discovery, merge or persistence failed
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config file: {path}\nReason: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
