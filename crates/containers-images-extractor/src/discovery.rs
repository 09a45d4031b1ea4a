//! Manifest discovery
//!
//! Walks a scan root and sorts what it finds into Dockerfiles, Compose files,
//! Helm charts and `.env` settings files.

use crate::error::{ExtractError, Result};
use crate::settings::{ENV_FILE_NAME, parse_env_file};
use containers_types::{FileImages, FilePath, HelmChartInfo, SettingsFiles};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker file of a Helm chart directory
pub const HELM_CHART_FILE: &str = "Chart.yaml";

/// Values file read from a Helm chart directory
pub const HELM_VALUES_FILE: &str = "values.yaml";

const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

const HELM_TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "tpl"];

/// Everything found under a scan root
#[derive(Debug, Clone, Default)]
pub struct DiscoveredManifests {
    pub file_images: FileImages,
    pub settings_files: SettingsFiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestKind {
    Dockerfile,
    DockerCompose,
    Settings,
}

fn classify(file_name: &str) -> Option<ManifestKind> {
    let lower = file_name.to_ascii_lowercase();

    if file_name == ENV_FILE_NAME {
        return Some(ManifestKind::Settings);
    }

    if lower == "dockerfile"
        || lower.starts_with("dockerfile.")
        || lower.ends_with(".dockerfile")
        || lower == "containerfile"
    {
        return Some(ManifestKind::Dockerfile);
    }

    let is_yaml = lower.ends_with(".yml") || lower.ends_with(".yaml");
    if is_yaml && (lower.starts_with("docker-compose") || lower.starts_with("compose")) {
        return Some(ManifestKind::DockerCompose);
    }

    None
}

/// Discovers manifests below `root`
///
/// Lists are sorted alphabetically by path. `.git` and `node_modules` are not
/// entered, and symlink loops are detected and skipped. Symlinks resolving
/// outside `root` are ignored.
#[tracing::instrument(skip(root), fields(root = %root.display()))]
pub fn discover_manifests(root: &Path) -> Result<DiscoveredManifests> {
    debug!("Starting manifest discovery");
    let mut discovered = DiscoveredManifests::default();
    let mut visited = HashSet::new();
    let canonical_root = canonicalize(root)?;

    visit_dir(root, &canonical_root, root, &mut discovered, &mut visited)?;

    let files = &mut discovered.file_images;
    files.dockerfile.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    files
        .docker_compose
        .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    files.helm.sort_by(|a, b| a.directory.cmp(&b.directory));

    info!(
        dockerfiles = files.dockerfile.len(),
        compose_files = files.docker_compose.len(),
        helm_charts = files.helm.len(),
        settings_files = discovered.settings_files.len(),
        "Discovered manifest files"
    );

    Ok(discovered)
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| ExtractError::Discovery {
        path: path.to_path_buf(),
        message: format!("failed to canonicalize path: {}", e),
    })
}

/// Whether `path` resolves to a location inside the scan root
fn is_within(canonical_root: &Path, path: &Path) -> bool {
    path.canonicalize()
        .is_ok_and(|resolved| resolved.starts_with(canonical_root))
}

fn visit_dir(
    root: &Path,
    canonical_root: &Path,
    dir: &Path,
    discovered: &mut DiscoveredManifests,
    visited: &mut HashSet<PathBuf>,
) -> Result<()> {
    let canonical_dir = canonicalize(dir)?;

    if !canonical_dir.starts_with(canonical_root) {
        warn!(dir = %dir.display(), "Directory resolves outside the scan root, skipping");
        return Ok(());
    }

    if !visited.insert(canonical_dir.clone()) {
        warn!(dir = %canonical_dir.display(), "Symlink loop detected, skipping");
        return Ok(());
    }

    if dir.join(HELM_CHART_FILE).is_file() {
        let chart = helm_chart(root, canonical_root, dir)?;
        debug!(chart = %dir.display(), templates = chart.template_files.len(), "Found Helm chart");
        discovered.file_images.helm.push(chart);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ExtractError::Discovery {
        path: dir.to_path_buf(),
        message: format!("failed to read directory: {}", e),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ExtractError::Discovery {
            path: dir.to_path_buf(),
            message: format!("failed to read directory entry: {}", e),
        })?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };

        if path.is_dir() {
            if SKIPPED_DIRS.contains(&file_name) {
                continue;
            }
            visit_dir(root, canonical_root, &path, discovered, visited)?;
            continue;
        }

        let kind = classify(file_name);
        if kind.is_some() && !is_within(canonical_root, &path) {
            warn!(file = %path.display(), "File resolves outside the scan root, skipping");
            continue;
        }

        match kind {
            Some(ManifestKind::Dockerfile) => {
                debug!(file = %path.display(), "Found Dockerfile");
                let relative = relative_to(root, &path);
                discovered
                    .file_images
                    .dockerfile
                    .push(FilePath::new(path, relative));
            }
            Some(ManifestKind::DockerCompose) => {
                debug!(file = %path.display(), "Found Compose file");
                let relative = relative_to(root, &path);
                discovered
                    .file_images
                    .docker_compose
                    .push(FilePath::new(path, relative));
            }
            Some(ManifestKind::Settings) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    ExtractError::Discovery {
                        path: path.clone(),
                        message: format!("failed to read settings file: {}", e),
                    }
                })?;
                let key = relative_to(root, &path).to_string_lossy().into_owned();
                debug!(file = %key, "Found settings file");
                discovered
                    .settings_files
                    .insert(key, parse_env_file(&content));
            }
            None => {}
        }
    }

    Ok(())
}

fn helm_chart(root: &Path, canonical_root: &Path, dir: &Path) -> Result<HelmChartInfo> {
    let values = dir.join(HELM_VALUES_FILE);
    let values_file = (values.is_file() && is_within(canonical_root, &values))
        .then(|| relative_to(root, &values));

    let pattern = format!(
        "{}/templates/**/*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let paths = glob::glob(&pattern).map_err(|e| ExtractError::Discovery {
        path: dir.to_path_buf(),
        message: format!("invalid template pattern: {}", e),
    })?;

    let mut template_files = Vec::new();
    for path in paths {
        let path = path.map_err(|e| ExtractError::Discovery {
            path: dir.to_path_buf(),
            message: format!("failed to read templates: {}", e),
        })?;

        let is_template = path.is_file()
            && is_within(canonical_root, &path)
            && path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| HELM_TEMPLATE_EXTENSIONS.contains(&ext));
        if is_template {
            let relative = relative_to(root, &path);
            template_files.push(FilePath::new(path, relative));
        }
    }
    template_files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(HelmChartInfo {
        directory: dir.to_path_buf(),
        values_file,
        template_files,
    })
}
