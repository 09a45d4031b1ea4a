//! Canonical image references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag assumed when a reference carries none
pub const DEFAULT_TAG: &str = "latest";

/// Location path recorded for images given explicitly by the caller
pub const USER_INPUT_PATH: &str = "NONE";

/// Where an image reference was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageOrigin {
    UserInput,
    Dockerfile,
    DockerCompose,
    Helm,
}

impl fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageOrigin::UserInput => write!(f, "UserInput"),
            ImageOrigin::Dockerfile => write!(f, "Dockerfile"),
            ImageOrigin::DockerCompose => write!(f, "DockerCompose"),
            ImageOrigin::Helm => write!(f, "Helm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageLocation {
    pub origin: ImageOrigin,
    pub path: String,
}

impl ImageLocation {
    pub fn new(origin: ImageOrigin, path: impl Into<String>) -> Self {
        Self {
            origin,
            path: path.into(),
        }
    }
}

/// An image to analyze, with every place it was referenced from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageModel {
    pub name: String,
    pub image_locations: Vec<ImageLocation>,
}

impl ImageModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_locations: Vec::new(),
        }
    }

    /// An image given explicitly by the caller
    pub fn from_user_input(name: impl Into<String>) -> Self {
        Self::new(name).with_location(ImageLocation::new(ImageOrigin::UserInput, USER_INPUT_PATH))
    }

    pub fn with_location(mut self, location: ImageLocation) -> Self {
        self.add_location(location);
        self
    }

    /// Records a location, ignoring exact duplicates
    pub fn add_location(&mut self, location: ImageLocation) {
        if !self.image_locations.contains(&location) {
            self.image_locations.push(location);
        }
    }
}

/// Converts explicit image names into image models
///
/// Blank names are dropped and repeated names collapse into one model, keeping
/// the order of first appearance.
pub fn to_image_models<S: AsRef<str>>(images: &[S]) -> Vec<ImageModel> {
    let mut models: Vec<ImageModel> = Vec::new();

    for image in images {
        let name = image.as_ref().trim();
        if name.is_empty() || models.iter().any(|m| m.name == name) {
            continue;
        }
        models.push(ImageModel::from_user_input(name));
    }

    models
}

/// Splits an image reference into `(name, tag)`
///
/// A digest suffix (`@sha256:...`) is dropped. A trailing `:NNNN` that belongs
/// to a registry host (`localhost:5000/app`) is not a tag. Without a tag,
/// [`DEFAULT_TAG`] is returned.
pub fn split_image_reference(reference: &str) -> (String, String) {
    let reference = match reference.split_once('@') {
        Some((name, _digest)) => name,
        None => reference,
    };

    if let Some(pos) = reference.rfind(':') {
        let potential_tag = &reference[pos + 1..];
        let potential_name = &reference[..pos];

        // A registry port is always followed by a path segment
        if !potential_tag.is_empty() && !potential_tag.contains('/') {
            return (potential_name.to_string(), potential_tag.to_string());
        }
    }

    (reference.to_string(), DEFAULT_TAG.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_image_models() {
        let models = to_image_models(&["image1", "image2"]);

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "image1");
        assert_eq!(
            models[0].image_locations,
            vec![ImageLocation::new(ImageOrigin::UserInput, "NONE")]
        );
        assert_eq!(models[1].name, "image2");
    }

    #[test]
    fn test_to_image_models_skips_blank_and_duplicates() {
        let models = to_image_models(&["nginx", " ", "nginx", "", "redis:7"]);

        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["nginx", "redis:7"]);
    }

    #[test]
    fn test_to_image_models_empty() {
        let images: Vec<String> = vec![];
        assert!(to_image_models(&images).is_empty());
    }

    #[test]
    fn test_add_location_dedupes() {
        let mut model = ImageModel::new("nginx");
        model.add_location(ImageLocation::new(ImageOrigin::Dockerfile, "Dockerfile"));
        model.add_location(ImageLocation::new(ImageOrigin::Dockerfile, "Dockerfile"));
        model.add_location(ImageLocation::new(ImageOrigin::Helm, "chart/values.yaml"));

        assert_eq!(model.image_locations.len(), 2);
    }

    #[test]
    fn test_split_image_reference_with_tag() {
        let (name, tag) = split_image_reference("ghcr.io/org/app:v1.0");
        assert_eq!(name, "ghcr.io/org/app");
        assert_eq!(tag, "v1.0");
    }

    #[test]
    fn test_split_image_reference_without_tag() {
        let (name, tag) = split_image_reference("debian");
        assert_eq!(name, "debian");
        assert_eq!(tag, "latest");
    }

    #[test]
    fn test_split_image_reference_numeric_tag() {
        let (name, tag) = split_image_reference("redis:7");
        assert_eq!(name, "redis");
        assert_eq!(tag, "7");
    }

    #[test]
    fn test_split_image_reference_with_port() {
        let (name, tag) = split_image_reference("localhost:5000/app");
        assert_eq!(name, "localhost:5000/app");
        assert_eq!(tag, "latest");
    }

    #[test]
    fn test_split_image_reference_with_port_and_tag() {
        let (name, tag) = split_image_reference("localhost:5000/app:dev");
        assert_eq!(name, "localhost:5000/app");
        assert_eq!(tag, "dev");
    }

    #[test]
    fn test_split_image_reference_with_digest() {
        let (name, tag) = split_image_reference("alpine:3.19@sha256:abcdef");
        assert_eq!(name, "alpine");
        assert_eq!(tag, "3.19");
    }
}
