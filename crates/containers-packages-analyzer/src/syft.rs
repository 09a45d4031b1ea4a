//! syft CLI wrapper
//!
//! Runs `syft <image> -o syft-json` for each image and maps the document to a
//! [`ContainerResolution`].

use crate::analyzer::PackagesAnalyzer;
use crate::error::{AnalyzeError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use containers_types::{
    ContainerImage, ContainerPackage, ContainerResolution, ImageModel, Layer,
    split_image_reference,
};
use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

pub const DEFAULT_SYFT_BINARY: &str = "syft";

/// Analyzer backed by the `syft` executable
#[derive(Debug, Clone)]
pub struct SyftAnalyzer {
    binary: PathBuf,
}

impl Default for SyftAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SYFT_BINARY)
    }
}

impl SyftAnalyzer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run syft for one image and return stdout
    async fn run_syft(&self, image: &str, platform: Option<&str>) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image).args(["-o", "syft-json", "-q"]);
        if let Some(platform) = platform {
            cmd.arg("--platform").arg(platform);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: {} {} -o syft-json{}",
            self.binary.display(),
            image,
            platform.map(|p| format!(" --platform {}", p)).unwrap_or_default()
        );

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AnalyzeError::SyftNotFound(self.binary.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("syft exited with {}", output.status)
            } else {
                stderr
            };
            return Err(AnalyzeError::CommandFailed {
                image: image.to_string(),
                message,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn analyze(
        &self,
        images: &[ImageModel],
        platform: Option<&str>,
    ) -> Result<Vec<ContainerResolution>> {
        let mut resolutions = Vec::with_capacity(images.len());

        for image in images {
            tracing::info!(image = %image.name, platform = ?platform, "Analyzing image");
            let output = self.run_syft(&image.name, platform).await?;
            let resolution = parse_syft_output(image, &output)?;
            tracing::debug!(
                image = %image.name,
                packages = resolution.package_count(),
                layers = resolution.container_image.history.len(),
                "Image analyzed"
            );
            resolutions.push(resolution);
        }

        Ok(resolutions)
    }
}

#[async_trait]
impl PackagesAnalyzer for SyftAnalyzer {
    async fn analyze_images(&self, images: &[ImageModel]) -> Result<Vec<ContainerResolution>> {
        self.analyze(images, None).await
    }

    async fn analyze_images_with_platform(
        &self,
        images: &[ImageModel],
        platform: &str,
    ) -> Result<Vec<ContainerResolution>> {
        self.analyze(images, Some(platform)).await
    }
}

/// syft-json document (the subset the resolution needs)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyftDocument {
    artifacts: Vec<SyftArtifact>,
    source: SyftSource,
    distro: SyftDistro,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyftArtifact {
    name: String,
    version: String,
    #[serde(rename = "type")]
    package_type: String,
    locations: Vec<SyftLocation>,
    licenses: Vec<SyftLicense>,
    metadata: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyftLocation {
    #[serde(rename = "layerID")]
    layer_id: Option<String>,
}

/// Licenses are plain strings in older schemas, objects in newer ones
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyftLicense {
    Plain(String),
    Detailed { value: String },
}

impl SyftLicense {
    fn into_value(self) -> String {
        match self {
            SyftLicense::Plain(value) | SyftLicense::Detailed { value } => value,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyftSource {
    #[serde(alias = "target")]
    metadata: SyftImageMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SyftImageMetadata {
    #[serde(rename = "imageID")]
    image_id: String,
    manifest_digest: String,
    layers: Vec<SyftLayer>,
    /// base64 encoded image config
    config: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyftLayer {
    digest: String,
    size: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyftDistro {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageConfig {
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryEntry {
    created_by: String,
    empty_layer: bool,
}

/// Maps a syft-json document to the resolution of `image`
pub fn parse_syft_output(image: &ImageModel, output: &str) -> Result<ContainerResolution> {
    let document: SyftDocument =
        serde_json::from_str(output).map_err(|source| AnalyzeError::InvalidOutput {
            image: image.name.clone(),
            source,
        })?;

    let (image_name, image_tag) = split_image_reference(&image.name);
    let distribution = document.distro.id;
    let metadata = document.source.metadata;

    let commands = layer_commands(&metadata.config);
    let history = metadata
        .layers
        .into_iter()
        .enumerate()
        .map(|(index, layer)| Layer {
            order: index as u32 + 1,
            size: layer.size,
            layer_id: layer.digest,
            command: commands.get(index).cloned().unwrap_or_default(),
        })
        .collect();

    let container_packages = document
        .artifacts
        .into_iter()
        .map(|artifact| to_package(artifact, &distribution))
        .collect();

    Ok(ContainerResolution {
        container_image: ContainerImage {
            image_name,
            image_tag,
            distribution,
            image_hash: metadata.manifest_digest,
            image_id: metadata.image_id,
            image_locations: image.image_locations.clone(),
            history,
        },
        container_packages,
    })
}

fn to_package(artifact: SyftArtifact, distribution: &str) -> ContainerPackage {
    let (source_name, source_version) = package_source(&artifact.metadata);

    let mut layer_ids: Vec<String> = Vec::new();
    for layer_id in artifact.locations.into_iter().filter_map(|l| l.layer_id) {
        if !layer_ids.contains(&layer_id) {
            layer_ids.push(layer_id);
        }
    }

    ContainerPackage {
        name: artifact.name,
        version: artifact.version,
        distribution: distribution.to_string(),
        package_type: artifact.package_type,
        source_name,
        source_version,
        licenses: artifact
            .licenses
            .into_iter()
            .map(SyftLicense::into_value)
            .collect(),
        layer_ids,
    }
}

/// Source package of an OS package (dpkg `source`, apk `originPackage`, rpm `sourceRpm`)
fn package_source(metadata: &serde_json::Value) -> (String, String) {
    let field = |key: &str| {
        metadata
            .get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let name = field("source")
        .or_else(|| field("originPackage"))
        .or_else(|| field("sourceRpm"))
        .unwrap_or_default();
    let version = field("sourceVersion").unwrap_or_default();

    (name, version)
}

/// `created_by` of every history entry that produced a layer, in order
fn layer_commands(encoded_config: &str) -> Vec<String> {
    if encoded_config.is_empty() {
        return Vec::new();
    }

    let config = STANDARD
        .decode(encoded_config)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<ImageConfig>(&bytes).ok());

    match config {
        Some(config) => config
            .history
            .into_iter()
            .filter(|entry| !entry.empty_layer)
            .map(|entry| entry.created_by)
            .collect(),
        None => {
            tracing::debug!("Could not decode image config, layer commands left empty");
            Vec::new()
        }
    }
}
