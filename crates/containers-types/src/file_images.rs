//! Manifest files discovered under a scan path

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Settings discovered alongside manifests
///
/// Keyed by the settings file path relative to the scan root, each entry maps
/// variable names to values.
pub type SettingsFiles = BTreeMap<String, BTreeMap<String, String>>;

/// A manifest file, with its absolute and scan-root-relative paths
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilePath {
    pub full_path: PathBuf,
    pub relative_path: PathBuf,
}

impl FilePath {
    pub fn new(full_path: impl Into<PathBuf>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            full_path: full_path.into(),
            relative_path: relative_path.into(),
        }
    }
}

/// A Helm chart directory (the one holding `Chart.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HelmChartInfo {
    /// Chart directory
    pub directory: PathBuf,
    /// values.yaml, relative to the scan root. `None` when the chart has none.
    pub values_file: Option<PathBuf>,
    /// Files under templates/
    pub template_files: Vec<FilePath>,
}

/// Discovered manifest files, by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileImages {
    pub dockerfile: Vec<FilePath>,
    pub docker_compose: Vec<FilePath>,
    pub helm: Vec<HelmChartInfo>,
}

impl FileImages {
    pub fn is_empty(&self) -> bool {
        self.dockerfile.is_empty() && self.docker_compose.is_empty() && self.helm.is_empty()
    }

    /// Number of discovered manifests (a Helm chart counts once)
    pub fn len(&self) -> usize {
        self.dockerfile.len() + self.docker_compose.len() + self.helm.len()
    }
}
