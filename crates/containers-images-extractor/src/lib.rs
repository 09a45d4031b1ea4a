//! Containers images extractor
//!
//! Finds manifest files (Dockerfiles, Compose files, Helm charts) under a scan
//! path and turns the image references they contain, together with images
//! given explicitly, into a canonical image list.
//!
//! The [`ImagesExtractor`] trait is the seam the resolver depends on;
//! [`FsImagesExtractor`] is the filesystem-backed implementation.

pub mod archive;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod fs;
pub mod merge;
pub mod references;
pub mod settings;

pub use discovery::{DiscoveredManifests, discover_manifests};
pub use error::{ExtractError, Result};
pub use extractor::{ExtractedFiles, FsImagesExtractor, ImagesExtractor};
pub use fs::{RESOLUTION_FILE_NAME, delete_directory, save_json, validate_folder_path};
pub use merge::merge_images;
