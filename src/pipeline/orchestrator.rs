//! Orchestrates the per-image transforms and the global split.

use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::error::Result;
use crate::geometry::{apply_crop, center_crop_offsets, resize_target, CropWindow};
use crate::image::{self, Image};
use crate::lister::Lister;
use crate::sampling::{source_id, LabeledPatch, Sampler};
use crate::split::{split_patches, SplitResult};
use crate::writer::PatchWriter;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub images: usize,
    pub patches: usize,
    pub train: usize,
    pub test: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} image(s) -> {} patch(es): {} train, {} test",
            self.images, self.patches, self.train, self.test
        )
    }
}

/// Batch pipeline turning a directory of images into train/test patches.
///
/// All randomness (grid jitter, cell choice, shuffle) comes from the one
/// generator owned by the pipeline.
pub struct Pipeline<R = StdRng> {
    config: Config,
    window: CropWindow,
    sampler: Sampler,
    lister: Lister,
    rng: R,
    show_progress: bool,
}

impl Pipeline<StdRng> {
    /// Create a pipeline seeded from `config.seed`, or from the OS if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Pipeline<R> {
    /// Create a pipeline drawing from an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_rng(config: Config, rng: R) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        let window = center_crop_offsets(config.enforced_dimm, config.cropped_dimm)?;
        let sampler = Sampler::new(
            config.cropped_dimm,
            config.sample_dimm,
            config.samples_per_image,
        )?;
        let lister = Lister::new(&config.valid_extension);

        Ok(Self {
            config,
            window,
            sampler,
            lister,
            rng,
            show_progress: false,
        })
    }

    /// Draw progress bars on stderr while running.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// List candidate images under `input_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be traversed.
    pub fn list<P: AsRef<Path>>(&self, input_root: P) -> Result<Vec<PathBuf>> {
        self.lister.list(input_root)
    }

    /// Resize to the enforced dimension, then cut the centered crop.
    ///
    /// # Errors
    ///
    /// Returns an error if `image` is not a 3-channel array.
    pub fn transform(&self, image: Image) -> Result<Image> {
        let resized = resize_target(image, self.config.enforced_dimm)?;
        Ok(apply_crop(&resized, self.window))
    }

    /// Decode, transform and sample a single image.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not sit under `input_root` with the
    /// configured extension, or if the file cannot be decoded.
    pub fn process_image(&mut self, path: &Path, input_root: &Path) -> Result<Vec<LabeledPatch>> {
        let id = source_id(path, input_root, &self.config.valid_extension)?;
        let decoded = image::load_image(path)?;
        tracing::debug!("Decoded {} with shape {:?}", path.display(), decoded.shape());

        let cropped = self.transform(decoded)?;
        self.sampler.sample(&cropped, &id, &mut self.rng)
    }

    /// Process `paths` in order, stopping at the first failure.
    ///
    /// Patches come out grouped by image, in sample-index order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Pipeline::process_image`].
    pub fn collect(&mut self, paths: &[PathBuf], input_root: &Path) -> Result<Vec<LabeledPatch>> {
        let pb = self.progress_bar(paths.len(), "Sampling");
        let mut patches = Vec::with_capacity(paths.len() * self.sampler.count());

        for path in paths {
            patches.extend(self.process_image(path, input_root)?);
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(patches)
    }

    /// Shuffle all patches and partition them by the configured train ratio.
    pub fn split(&mut self, patches: Vec<LabeledPatch>) -> SplitResult {
        split_patches(patches, self.config.train_ratio, &mut self.rng)
    }

    /// Run the whole pipeline from `input_root` to `output_root`.
    ///
    /// Nothing is written until every image has been sampled, so a bad input
    /// file leaves the output directory untouched.
    ///
    /// # Errors
    ///
    /// Returns the first listing, decoding, sampling or writing error.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_root: P,
        output_root: Q,
    ) -> Result<RunSummary> {
        let input_root = input_root.as_ref();
        let output_root = output_root.as_ref();

        tracing::info!("Listing *.{} under {}", self.config.valid_extension, input_root.display());
        let paths = self.list(input_root)?;
        if paths.is_empty() {
            tracing::warn!("No input images found under {}", input_root.display());
        }

        tracing::info!("Sampling {} image(s)...", paths.len());
        let patches = self.collect(&paths, input_root)?;

        tracing::info!("Splitting {} patch(es)...", patches.len());
        let result = self.split(patches);

        tracing::info!("Writing patches to: {}", output_root.display());
        let writer = PatchWriter::new(output_root, &self.config.valid_extension);
        let pb = self.progress_bar(result.len(), "Writing");
        writer.write_all(&result, &pb)?;
        pb.finish_and_clear();

        let summary = RunSummary {
            images: paths.len(),
            patches: result.len(),
            train: result.train.len(),
            test: result.test.len(),
        };
        tracing::info!("Processing complete: {summary}");
        Ok(summary)
    }

    fn progress_bar(&self, len: usize, label: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(label);
        pb
    }
}
