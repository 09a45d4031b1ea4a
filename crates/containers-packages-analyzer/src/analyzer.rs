//! Packages analyzer trait

use crate::error::Result;
use async_trait::async_trait;
use containers_types::{ContainerResolution, ImageModel};

/// Produces per-image package and layer data
#[async_trait]
pub trait PackagesAnalyzer: Send + Sync {
    /// Analyzes every image for the host platform
    async fn analyze_images(&self, images: &[ImageModel]) -> Result<Vec<ContainerResolution>>;

    /// Analyzes every image for `platform` (e.g. "linux/amd64")
    async fn analyze_images_with_platform(
        &self,
        images: &[ImageModel],
        platform: &str,
    ) -> Result<Vec<ContainerResolution>>;
}
