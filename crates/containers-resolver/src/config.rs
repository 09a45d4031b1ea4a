//! Resolver configuration
//!
//! Read from a YAML file; every key is optional.
//!
//! ```yaml
//! platform: linux/amd64
//! results_dir: .checkmarx/containers
//! keep_results: false
//! syft_binary: syft
//! ```

use crate::error::ConfigError;
use containers_packages_analyzer::DEFAULT_SYFT_BINARY;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "CONTAINERS_RESOLVER_CONFIG";

pub const DEFAULT_PLATFORM: &str = "linux/amd64";

/// Results directory, relative to the resolution folder
pub const DEFAULT_RESULTS_DIR: &str = ".checkmarx/containers";

const CONFIG_DIR_NAME: &str = "containers-resolver";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Platform images are analyzed for. `None` analyzes for the host platform.
    pub platform: Option<String>,
    /// Where the resolution is written, relative to the resolution folder
    pub results_dir: PathBuf,
    /// Leave the results directory in place after the resolution
    pub keep_results: bool,
    /// syft executable used by the CLI
    pub syft_binary: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            platform: Some(DEFAULT_PLATFORM.to_string()),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            keep_results: false,
            syft_binary: PathBuf::from(DEFAULT_SYFT_BINARY),
        }
    }
}

impl ResolverConfig {
    /// Loads and validates a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads the config file found by [`find_config_file`], or the defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match find_config_file(explicit)? {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// The results directory must stay strictly inside the resolution folder
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut depth = 0;
        for component in self.results_dir.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                _ => {
                    return Err(ConfigError::InvalidValue(format!(
                        "results_dir must be a relative path inside the resolution folder: {}",
                        self.results_dir.display()
                    )));
                }
            }
        }

        if depth == 0 {
            return Err(ConfigError::InvalidValue(
                "results_dir must not be empty".to_string(),
            ));
        }

        if let Some(platform) = &self.platform
            && platform.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue(
                "platform must not be empty (use null to disable it)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_results_dir(mut self, results_dir: impl Into<PathBuf>) -> Self {
        self.results_dir = results_dir.into();
        self
    }

    pub fn with_keep_results(mut self, keep_results: bool) -> Self {
        self.keep_results = keep_results;
        self
    }

    pub fn with_syft_binary(mut self, syft_binary: impl Into<PathBuf>) -> Self {
        self.syft_binary = syft_binary.into();
        self
    }
}

/// Finds the config file
///
/// Search order:
/// 1. `explicit` (must exist)
/// 2. the file named by `CONTAINERS_RESOLVER_CONFIG`, when it exists
/// 3. `<config dir>/containers-resolver/config.yaml`
pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(
            "{} points to a missing file: {}",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}
