//! Image analysis output
//!
//! One [`ContainerResolution`] per analyzed image. The whole list is written to
//! disk as JSON, so field names follow the PascalCase wire format consumers
//! of `containers-resolution.json` expect.

use crate::image::ImageLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerResolution {
    pub container_image: ContainerImage,
    pub container_packages: Vec<ContainerPackage>,
}

/// Identifying metadata of an analyzed image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerImage {
    pub image_name: String,
    pub image_tag: String,
    /// OS distribution id (e.g. "debian", "alpine")
    pub distribution: String,
    /// Manifest digest
    pub image_hash: String,
    pub image_id: String,
    pub image_locations: Vec<ImageLocation>,
    pub history: Vec<Layer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Layer {
    /// 1-based position in the image
    pub order: u32,
    pub size: u64,
    pub layer_id: String,
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerPackage {
    pub name: String,
    pub version: String,
    pub distribution: String,
    /// Package ecosystem (deb, apk, npm, ...)
    #[serde(rename = "Type")]
    pub package_type: String,
    pub source_name: String,
    pub source_version: String,
    pub licenses: Vec<String>,
    /// Layers that contain files owned by the package
    pub layer_ids: Vec<String>,
}

impl ContainerResolution {
    pub fn package_count(&self) -> usize {
        self.container_packages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageOrigin;

    fn sample() -> ContainerResolution {
        ContainerResolution {
            container_image: ContainerImage {
                image_name: "image1".to_string(),
                image_tag: "latest".to_string(),
                distribution: "debian".to_string(),
                image_hash: "sha256:123abc".to_string(),
                image_id: "id12345".to_string(),
                image_locations: vec![ImageLocation::new(
                    ImageOrigin::Dockerfile,
                    "/path/to/Dockerfile",
                )],
                history: vec![Layer {
                    order: 1,
                    size: 12345,
                    layer_id: "layer1".to_string(),
                    command: "ADD /file1 /".to_string(),
                }],
            },
            container_packages: vec![ContainerPackage {
                name: "package1".to_string(),
                version: "1.0.0".to_string(),
                distribution: "debian".to_string(),
                package_type: "binary".to_string(),
                source_name: "src-package1".to_string(),
                source_version: "1.0.0".to_string(),
                licenses: vec!["MIT".to_string()],
                layer_ids: vec!["layer1".to_string()],
            }],
        }
    }

    #[test]
    fn test_resolution_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();

        let image = &json["ContainerImage"];
        assert_eq!(image["ImageName"], "image1");
        assert_eq!(image["ImageHash"], "sha256:123abc");
        assert_eq!(image["ImageId"], "id12345");
        assert_eq!(image["ImageLocations"][0]["Origin"], "Dockerfile");
        assert_eq!(image["History"][0]["LayerId"], "layer1");

        let package = &json["ContainerPackages"][0];
        assert_eq!(package["Type"], "binary");
        assert_eq!(package["SourceName"], "src-package1");
        assert_eq!(package["LayerIds"][0], "layer1");
    }

    #[test]
    fn test_package_count() {
        assert_eq!(sample().package_count(), 1);
        assert_eq!(ContainerResolution::default().package_count(), 0);
    }
}
