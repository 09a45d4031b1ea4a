//! The resolution pipeline

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use containers_images_extractor::{
    ImagesExtractor, RESOLUTION_FILE_NAME, delete_directory, validate_folder_path,
};
use containers_packages_analyzer::PackagesAnalyzer;
use containers_types::to_image_models;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Instrument, debug, error, info, warn};

/// Results directory of one call
struct ResultsDir {
    path: PathBuf,
    /// Topmost directory this call created, if any
    created: Option<PathBuf>,
}

/// Runs resolutions with an injected extractor and analyzer
///
/// Calls against the same resolution folder must not overlap: the results
/// directory is not locked.
pub struct Resolver<E, A> {
    extractor: E,
    analyzer: A,
    config: ResolverConfig,
}

impl<E, A> Resolver<E, A>
where
    E: ImagesExtractor,
    A: PackagesAnalyzer,
{
    pub fn new(extractor: E, analyzer: A) -> Self {
        Self {
            extractor,
            analyzer,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves the images referenced under `scan_path` plus `images`
    ///
    /// The resolution is written to `<resolution_folder>/<results_dir>`.
    /// Once that directory exists, cleanup runs whatever the outcome: the
    /// extractor's working directory is deleted, and unless `keep_results` is
    /// set so are the directories this call created. A results directory that
    /// already existed is kept; only the resolution file is removed from it.
    /// Cleanup failures are logged, never returned. Any other failure aborts
    /// the pipeline and is returned as-is.
    ///
    /// `is_debug` raises the pipeline trace of this call to `info` level.
    pub async fn resolve(
        &self,
        scan_path: &Path,
        resolution_folder: &Path,
        images: &[String],
        is_debug: bool,
    ) -> Result<()> {
        let span = tracing::info_span!(
            "resolve",
            scan_path = %scan_path.display(),
            resolution_folder = %resolution_folder.display(),
            is_debug
        );

        async {
            if is_debug {
                info!(?images, config = ?self.config, "Resolve parameters");
            } else {
                debug!(?images, config = ?self.config, "Resolve parameters");
            }

            let results_dir = self.prepare_results_dir(resolution_folder).await?;

            let mut output_path = None;
            let outcome = self
                .run_pipeline(scan_path, &results_dir.path, images, is_debug, &mut output_path)
                .await;

            self.cleanup(resolution_folder, output_path.as_deref(), &results_dir)
                .await;

            if outcome.is_ok() {
                info!("Resolution completed");
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn prepare_results_dir(&self, resolution_folder: &Path) -> Result<ResultsDir> {
        if let Err(e) = validate_folder_path(resolution_folder).await {
            error!(error = %e, "Resolution folder is not valid");
            return Err(ResolveError::ResolutionFolder(e));
        }

        let path = resolution_folder.join(&self.config.results_dir);
        let created = match self.create_results_dir(resolution_folder, &path).await {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, results_dir = %path.display(), "Could not create results directory");
                return Err(ResolveError::ResolutionFolder(e));
            }
        };

        Ok(ResultsDir { path, created })
    }

    /// Creates the results directory, returning the topmost directory that
    /// did not exist before
    async fn create_results_dir(
        &self,
        resolution_folder: &Path,
        results_dir: &Path,
    ) -> io::Result<Option<PathBuf>> {
        let mut created = None;
        let mut current = resolution_folder.to_path_buf();
        for component in self.config.results_dir.components() {
            current.push(component);
            if !tokio::fs::try_exists(&current).await? {
                created = Some(current);
                break;
            }
        }

        tokio::fs::create_dir_all(results_dir).await?;
        Ok(created)
    }

    async fn run_pipeline(
        &self,
        scan_path: &Path,
        results_dir: &Path,
        images: &[String],
        is_debug: bool,
        output_path: &mut Option<PathBuf>,
    ) -> Result<()> {
        trace_step(is_debug, "extract files");
        let extracted = self
            .extractor
            .extract_files(scan_path)
            .await
            .inspect_err(|e| error!(error = %e, "Could not extract files"))?;
        *output_path = extracted.output_path.clone();

        trace_step(is_debug, "merge images");
        let images_to_analyze = self
            .extractor
            .extract_and_merge_images_from_files(
                &extracted.file_images,
                to_image_models(images),
                &extracted.settings_files,
            )
            .await
            .inspect_err(|e| error!(error = %e, "Could not extract images from files"))?;

        trace_step(is_debug, "analyze images");
        let analysis = match &self.config.platform {
            Some(platform) => {
                self.analyzer
                    .analyze_images_with_platform(&images_to_analyze, platform)
                    .await
            }
            None => self.analyzer.analyze_images(&images_to_analyze).await,
        };
        let resolutions = analysis.inspect_err(|e| error!(error = %e, "Could not analyze images"))?;

        trace_step(is_debug, "save resolution");
        self.extractor
            .save_object_to_file(results_dir, &resolutions)
            .await
            .inspect_err(|e| error!(error = %e, "Could not save resolution result"))?;

        info!(
            images = images_to_analyze.len(),
            resolutions = resolutions.len(),
            results_dir = %results_dir.display(),
            "Resolution saved"
        );
        Ok(())
    }

    async fn cleanup(
        &self,
        resolution_folder: &Path,
        output_path: Option<&Path>,
        results_dir: &ResultsDir,
    ) {
        if let Some(output_path) = output_path
            && !output_path.as_os_str().is_empty()
            && !same_path(output_path, resolution_folder)
        {
            if let Err(e) = delete_directory(output_path).await {
                warn!(error = %e, path = %output_path.display(), "Could not delete extractor output");
            }
        }

        if self.config.keep_results {
            return;
        }

        match &results_dir.created {
            Some(created) if !same_path(created, resolution_folder) => {
                if let Err(e) = delete_directory(created).await {
                    warn!(error = %e, path = %created.display(), "Could not delete results directory");
                }
            }
            _ => {
                let file = results_dir.path.join(RESOLUTION_FILE_NAME);
                match tokio::fs::remove_file(&file).await {
                    Ok(()) => debug!(file = %file.display(), "Deleted resolution file"),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(error = %e, file = %file.display(), "Could not delete resolution file")
                    }
                }
            }
        }
    }
}

fn trace_step(is_debug: bool, step: &str) {
    if is_debug {
        info!(step, "Resolve step");
    } else {
        debug!(step, "Resolve step");
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
