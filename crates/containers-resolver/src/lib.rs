//! Containers resolver
//!
//! Orchestrates one container image resolution:
//!
//! 1. validate the resolution folder and create the results directory
//! 2. discover manifest files under the scan path
//! 3. merge discovered image references with explicitly given images
//! 4. analyze packages and layers of every image
//! 5. persist the resolution, then clean up temporary directories
//!
//! The two collaborators are injected: any [`ImagesExtractor`] and any
//! [`PackagesAnalyzer`] can back a [`Resolver`].

pub mod config;
pub mod error;
pub mod resolver;

pub use config::{
    CONFIG_ENV_VAR, DEFAULT_PLATFORM, DEFAULT_RESULTS_DIR, ResolverConfig, find_config_file,
};
pub use error::{ConfigError, ResolveError, Result};
pub use resolver::Resolver;

pub use containers_images_extractor::{FsImagesExtractor, ImagesExtractor};
pub use containers_packages_analyzer::{PackagesAnalyzer, SyftAnalyzer};
