//! Images extractor trait and its filesystem implementation

use crate::archive::{is_archive, unpack_archive};
use crate::discovery::discover_manifests;
use crate::error::{ExtractError, Result};
use crate::fs::{RESOLUTION_FILE_NAME, save_json};
use crate::merge::merge_images;
use async_trait::async_trait;
use containers_types::{ContainerResolution, FileImages, ImageModel, SettingsFiles};
use std::io;
use std::path::{Path, PathBuf};

/// Output of [`ImagesExtractor::extract_files`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFiles {
    pub file_images: FileImages,
    pub settings_files: SettingsFiles,
    /// Working directory the extractor created, to be deleted once the
    /// resolution is done. `None` when the scan path was used in place.
    pub output_path: Option<PathBuf>,
}

/// Finds manifests and turns them into a canonical image list
#[async_trait]
pub trait ImagesExtractor: Send + Sync {
    /// Discovers manifest and settings files under `scan_path`
    async fn extract_files(&self, scan_path: &Path) -> Result<ExtractedFiles>;

    /// Merges explicit images with the references found in `files`
    async fn extract_and_merge_images_from_files(
        &self,
        files: &FileImages,
        images: Vec<ImageModel>,
        settings_files: &SettingsFiles,
    ) -> Result<Vec<ImageModel>>;

    /// Persists a resolution into `folder_path`
    async fn save_object_to_file(
        &self,
        folder_path: &Path,
        resolutions: &[ContainerResolution],
    ) -> Result<()>;
}

/// Extractor working on the local filesystem
///
/// Directories are scanned in place. Tar archives are unpacked into a fresh
/// temporary directory which is reported as the output path.
#[derive(Debug, Clone)]
pub struct FsImagesExtractor {
    temp_prefix: String,
}

impl Default for FsImagesExtractor {
    fn default() -> Self {
        Self {
            temp_prefix: "containers-resolver-".to_string(),
        }
    }
}

impl FsImagesExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix of temporary directories created for archives
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    fn extract_archive(temp_prefix: &str, archive: &Path) -> Result<ExtractedFiles> {
        let temp_dir = tempfile::Builder::new().prefix(temp_prefix).tempdir()?;

        unpack_archive(archive, temp_dir.path())?;
        let discovered = discover_manifests(temp_dir.path())?;

        // Dropping the TempDir on an earlier error removes it
        let output_path = temp_dir.keep();
        tracing::debug!("Archive unpacked into {}", output_path.display());

        Ok(ExtractedFiles {
            file_images: discovered.file_images,
            settings_files: discovered.settings_files,
            output_path: Some(output_path),
        })
    }
}

#[async_trait]
impl ImagesExtractor for FsImagesExtractor {
    async fn extract_files(&self, scan_path: &Path) -> Result<ExtractedFiles> {
        let metadata = match tokio::fs::metadata(scan_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExtractError::ScanPathNotFound(scan_path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        // Discovery and unpacking are blocking filesystem work
        let path = scan_path.to_path_buf();
        if metadata.is_dir() {
            let discovered =
                tokio::task::spawn_blocking(move || discover_manifests(&path)).await??;
            return Ok(ExtractedFiles {
                file_images: discovered.file_images,
                settings_files: discovered.settings_files,
                output_path: None,
            });
        }

        if is_archive(scan_path) {
            let temp_prefix = self.temp_prefix.clone();
            return tokio::task::spawn_blocking(move || {
                Self::extract_archive(&temp_prefix, &path)
            })
            .await?;
        }

        Err(ExtractError::UnsupportedScanPath(scan_path.to_path_buf()))
    }

    async fn extract_and_merge_images_from_files(
        &self,
        files: &FileImages,
        images: Vec<ImageModel>,
        settings_files: &SettingsFiles,
    ) -> Result<Vec<ImageModel>> {
        merge_images(files, images, settings_files)
    }

    async fn save_object_to_file(
        &self,
        folder_path: &Path,
        resolutions: &[ContainerResolution],
    ) -> Result<()> {
        save_json(folder_path, RESOLUTION_FILE_NAME, resolutions).await?;
        Ok(())
    }
}
