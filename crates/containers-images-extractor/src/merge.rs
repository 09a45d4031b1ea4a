//! Merging explicit images with references found in manifests

use crate::discovery::HELM_VALUES_FILE;
use crate::error::{ExtractError, Result};
use crate::references::{compose_images, dockerfile_images, helm_values_images};
use crate::settings::ENV_FILE_NAME;
use containers_types::{FileImages, ImageLocation, ImageModel, ImageOrigin, SettingsFiles};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Builds the canonical image list
///
/// Explicit images come first, followed by Dockerfile, Compose and Helm
/// references in discovery order. An image referenced several times becomes a
/// single model carrying every location. Manifests that cannot be parsed are
/// skipped with a warning; manifests that cannot be read fail the merge.
pub fn merge_images(
    files: &FileImages,
    explicit_images: Vec<ImageModel>,
    settings_files: &SettingsFiles,
) -> Result<Vec<ImageModel>> {
    let mut merged: Vec<ImageModel> = Vec::with_capacity(explicit_images.len());
    for image in explicit_images {
        insert_model(&mut merged, image);
    }

    for dockerfile in &files.dockerfile {
        let content = read_manifest(&dockerfile.full_path)?;
        let location = dockerfile.relative_path.to_string_lossy();
        for image in dockerfile_images(&content) {
            insert(&mut merged, image, ImageOrigin::Dockerfile, &location);
        }
    }

    let no_variables = BTreeMap::new();
    for compose in &files.docker_compose {
        let content = read_manifest(&compose.full_path)?;
        let variables = compose_variables(&compose.relative_path, settings_files)
            .unwrap_or(&no_variables);
        let location = compose.relative_path.to_string_lossy();

        match compose_images(&content, variables) {
            Ok(images) => {
                for image in images {
                    insert(&mut merged, image, ImageOrigin::DockerCompose, &location);
                }
            }
            Err(e) => warn!(file = %location, error = %e, "Skipping unparsable Compose file"),
        }
    }

    for chart in &files.helm {
        let Some(values_file) = &chart.values_file else {
            continue;
        };
        let content = read_manifest(&chart.directory.join(HELM_VALUES_FILE))?;
        let location = values_file.to_string_lossy();

        match helm_values_images(&content) {
            Ok(images) => {
                for image in images {
                    insert(&mut merged, image, ImageOrigin::Helm, &location);
                }
            }
            Err(e) => warn!(file = %location, error = %e, "Skipping unparsable Helm values"),
        }
    }

    debug!(images = merged.len(), "Merged image list");
    Ok(merged)
}

fn read_manifest(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ExtractError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// The `.env` next to a Compose file, if one was discovered
fn compose_variables<'a>(
    compose_relative_path: &Path,
    settings_files: &'a SettingsFiles,
) -> Option<&'a BTreeMap<String, String>> {
    let env_path = compose_relative_path
        .parent()
        .unwrap_or(Path::new(""))
        .join(ENV_FILE_NAME);
    settings_files.get(&*env_path.to_string_lossy())
}

fn insert(merged: &mut Vec<ImageModel>, name: String, origin: ImageOrigin, path: &str) {
    insert_model(
        merged,
        ImageModel::new(name).with_location(ImageLocation::new(origin, path)),
    );
}

fn insert_model(merged: &mut Vec<ImageModel>, model: ImageModel) {
    match merged.iter_mut().find(|m| m.name == model.name) {
        Some(existing) => {
            for location in model.image_locations {
                existing.add_location(location);
            }
        }
        None => merged.push(model),
    }
}
