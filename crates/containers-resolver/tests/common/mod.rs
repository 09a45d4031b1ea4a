use async_trait::async_trait;
use containers_images_extractor::{
    ExtractError, ExtractedFiles, ImagesExtractor, RESOLUTION_FILE_NAME, save_json,
};
use containers_packages_analyzer::{AnalyzeError, PackagesAnalyzer};
use containers_types::{
    ContainerImage, ContainerResolution, FileImages, ImageModel, SettingsFiles,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Collaborator call, in the order the resolver made it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ExtractFiles(PathBuf),
    Merge(Vec<ImageModel>),
    AnalyzeImages(Vec<ImageModel>),
    AnalyzeWithPlatform(Vec<ImageModel>, String),
    Save(PathBuf),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

pub struct FakeExtractor {
    pub log: CallLog,
    pub extracted: ExtractedFiles,
    /// Images returned by the merge step; `None` echoes the input
    pub merged: Option<Vec<ImageModel>>,
    pub fail_extract: bool,
    pub fail_merge: bool,
    pub fail_save: bool,
}

impl FakeExtractor {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            extracted: ExtractedFiles::default(),
            merged: None,
            fail_extract: false,
            fail_merge: false,
            fail_save: false,
        }
    }

    #[allow(dead_code)]
    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.extracted.output_path = Some(output_path.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_merged(mut self, merged: Vec<ImageModel>) -> Self {
        self.merged = Some(merged);
        self
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ImagesExtractor for FakeExtractor {
    async fn extract_files(&self, scan_path: &Path) -> Result<ExtractedFiles, ExtractError> {
        self.record(Call::ExtractFiles(scan_path.to_path_buf()));
        if self.fail_extract {
            return Err(ExtractError::Discovery {
                path: scan_path.to_path_buf(),
                message: "invalid path".to_string(),
            });
        }
        Ok(self.extracted.clone())
    }

    async fn extract_and_merge_images_from_files(
        &self,
        _files: &FileImages,
        images: Vec<ImageModel>,
        _settings_files: &SettingsFiles,
    ) -> Result<Vec<ImageModel>, ExtractError> {
        self.record(Call::Merge(images.clone()));
        if self.fail_merge {
            return Err(ExtractError::Manifest {
                path: PathBuf::from("docker-compose.yaml"),
                message: "merge failed".to_string(),
            });
        }
        Ok(self.merged.clone().unwrap_or(images))
    }

    async fn save_object_to_file(
        &self,
        folder_path: &Path,
        resolutions: &[ContainerResolution],
    ) -> Result<(), ExtractError> {
        self.record(Call::Save(folder_path.to_path_buf()));
        if self.fail_save {
            return Err(ExtractError::Io(std::io::Error::other("disk full")));
        }
        save_json(folder_path, RESOLUTION_FILE_NAME, resolutions).await?;
        Ok(())
    }
}

pub struct FakeAnalyzer {
    pub log: CallLog,
    pub fail: bool,
}

impl FakeAnalyzer {
    pub fn new(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    fn resolve(&self, images: &[ImageModel]) -> Result<Vec<ContainerResolution>, AnalyzeError> {
        if self.fail {
            return Err(AnalyzeError::CommandFailed {
                image: images.first().map(|i| i.name.clone()).unwrap_or_default(),
                message: "analysis failed".to_string(),
            });
        }
        Ok(images
            .iter()
            .map(|image| ContainerResolution {
                container_image: ContainerImage {
                    image_name: image.name.clone(),
                    image_locations: image.image_locations.clone(),
                    ..Default::default()
                },
                container_packages: vec![],
            })
            .collect())
    }
}

#[async_trait]
impl PackagesAnalyzer for FakeAnalyzer {
    async fn analyze_images(
        &self,
        images: &[ImageModel],
    ) -> Result<Vec<ContainerResolution>, AnalyzeError> {
        self.log
            .lock()
            .unwrap()
            .push(Call::AnalyzeImages(images.to_vec()));
        self.resolve(images)
    }

    async fn analyze_images_with_platform(
        &self,
        images: &[ImageModel],
        platform: &str,
    ) -> Result<Vec<ContainerResolution>, AnalyzeError> {
        self.log.lock().unwrap().push(Call::AnalyzeWithPlatform(
            images.to_vec(),
            platform.to_string(),
        ));
        self.resolve(images)
    }
}

pub fn images(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
