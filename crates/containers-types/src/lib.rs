//! Containers resolver data model
//!
//! Types shared between the images extractor, the packages analyzer and the
//! resolver pipeline:
//!
//! - [`FileImages`]: manifest files discovered under a scan path
//! - [`ImageModel`]: a canonical image reference with the places it came from
//! - [`ContainerResolution`]: per-image analysis output that gets persisted

pub mod file_images;
pub mod image;
pub mod resolution;

pub use file_images::{FileImages, FilePath, HelmChartInfo, SettingsFiles};
pub use image::{
    DEFAULT_TAG, ImageLocation, ImageModel, ImageOrigin, USER_INPUT_PATH, split_image_reference,
    to_image_models,
};
pub use resolution::{ContainerImage, ContainerPackage, ContainerResolution, Layer};
