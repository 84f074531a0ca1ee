//! Pipeline configuration: dimensions, ratios and the TOML file format.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geometry::{center_crop_offsets, PatchGrid};
use crate::image::RGB_CHANNELS;

/// Default number of patches cut from every image.
pub const DEFAULT_SAMPLES_PER_IMAGE: usize = 3;

/// An image shape as `(height, width, channels)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl Dimension {
    #[must_use]
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Shape tuple in `ndarray` order.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Parse a comma-joined `"H,W,C"` triple, reporting failures against `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on wrong arity, non-numeric or zero components.
    pub fn parse_field(field: &str, value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(Error::config(
                field,
                format!("expected \"H,W,C\", got {value:?} ({} components)", parts.len()),
            ));
        }

        let mut values = [0usize; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| Error::config(field, format!("{part:?} is not a non-negative integer")))?;
            if *slot == 0 {
                return Err(Error::config(field, "dimensions must be positive"));
            }
        }

        Ok(Self::new(values[0], values[1], values[2]))
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_field("dimension", s)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.height, self.width, self.channels)
    }
}

/// Configuration for the patch extraction pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File extension of input images, without the leading dot.
    pub valid_extension: String,

    /// Every input image is resized to this shape.
    pub enforced_dimm: Dimension,

    /// Central window cut out of the enforced image.
    pub cropped_dimm: Dimension,

    /// Shape of each extracted patch.
    pub sample_dimm: Dimension,

    /// Fraction of all patches assigned to the training split.
    pub train_ratio: f64,

    /// Number of patches cut from every image.
    pub samples_per_image: usize,

    /// Random seed for reproducibility. None for random.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            valid_extension: "jpg".to_string(),
            enforced_dimm: Dimension::new(270, 480, RGB_CHANNELS),
            cropped_dimm: Dimension::new(270, 270, RGB_CHANNELS),
            sample_dimm: Dimension::new(80, 80, RGB_CHANNELS),
            train_ratio: 0.7,
            samples_per_image: DEFAULT_SAMPLES_PER_IMAGE,
            seed: None,
        }
    }
}

/// On-disk representation; dimensions stay as strings until validated.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    valid_extension: String,
    enforced_dimm: String,
    cropped_dimm: String,
    sample_dimm: String,
    train_ratio: f64,
    samples_per_image: Option<usize>,
    seed: Option<u64>,
}

impl Config {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a field is missing, malformed or
    /// inconsistent with the others.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text).map_err(|err| Error::Configuration {
            field: "config".to_string(),
            reason: err.to_string(),
        })?;

        let config = Self {
            valid_extension: normalize_extension(&file.valid_extension),
            enforced_dimm: Dimension::parse_field("enforced_dimm", &file.enforced_dimm)?,
            cropped_dimm: Dimension::parse_field("cropped_dimm", &file.cropped_dimm)?,
            sample_dimm: Dimension::parse_field("sample_dimm", &file.sample_dimm)?,
            train_ratio: file.train_ratio,
            samples_per_image: file.samples_per_image.unwrap_or(DEFAULT_SAMPLES_PER_IMAGE),
            seed: file.seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigRead`] if the file cannot be read, otherwise
    /// the same errors as [`Config::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| Error::ConfigRead {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration.
    ///
    /// Runs before any image is touched, so that a bad setup fails the run
    /// without producing output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if any field is out of range or the
    /// dimensions are inconsistent, and [`Error::InsufficientArea`] if the
    /// sample grid cannot hold `samples_per_image` patches.
    pub fn validate(&self) -> Result<()> {
        if self.valid_extension.is_empty() {
            return Err(Error::config("valid_extension", "must not be empty"));
        }
        if self.valid_extension.contains(['/', '\\']) {
            return Err(Error::config(
                "valid_extension",
                "must not contain path separators",
            ));
        }

        for (field, dim) in [
            ("enforced_dimm", self.enforced_dimm),
            ("cropped_dimm", self.cropped_dimm),
            ("sample_dimm", self.sample_dimm),
        ] {
            if dim.height == 0 || dim.width == 0 {
                return Err(Error::config(field, "dimensions must be positive"));
            }
            if u32::try_from(dim.height).is_err() || u32::try_from(dim.width).is_err() {
                return Err(Error::config(field, "height and width must fit in u32"));
            }
            if dim.channels != RGB_CHANNELS {
                return Err(Error::config(
                    field,
                    format!("expected {RGB_CHANNELS} channels, got {}", dim.channels),
                ));
            }
        }

        center_crop_offsets(self.enforced_dimm, self.cropped_dimm)?;

        if self.sample_dimm.height > self.cropped_dimm.height
            || self.sample_dimm.width > self.cropped_dimm.width
        {
            return Err(Error::config(
                "sample_dimm",
                format!(
                    "sample {} exceeds cropped {}",
                    self.sample_dimm, self.cropped_dimm
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.train_ratio) {
            return Err(Error::config("train_ratio", "must be between 0.0 and 1.0"));
        }

        if self.samples_per_image == 0 {
            return Err(Error::config(
                "samples_per_image",
                "must be greater than 0",
            ));
        }

        PatchGrid::new(self.cropped_dimm, self.sample_dimm).ensure_capacity(self.samples_per_image)
    }
}

/// Strip a leading dot so `".jpg"` and `"jpg"` mean the same thing.
fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_string()
}
