//! Random non-overlapping patch extraction.

use std::path::{Component, Path};

use ndarray::s;
use rand::seq::index;
use rand::Rng;

use crate::config::Dimension;
use crate::error::{Error, Result};
use crate::geometry::PatchGrid;
use crate::image::Image;

/// A patch cut from one source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledPatch {
    /// Source path relative to the input root, extension stripped.
    pub source_id: String,
    /// Position of the patch in its image's random cell order.
    pub index: usize,
    /// Pixels, shaped like the sample dimension.
    pub patch: Image,
}

/// Draws patches on a fixed grid of sample-sized cells.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    cropped: Dimension,
    sample: Dimension,
    count: usize,
}

impl Sampler {
    /// Create a sampler cutting `count` patches of `sample` from `cropped` images.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientArea`] if fewer than `count` grid cells fit.
    pub fn new(cropped: Dimension, sample: Dimension, count: usize) -> Result<Self> {
        if sample.height == 0 || sample.width == 0 {
            return Err(Error::config("sample_dimm", "dimensions must be positive"));
        }
        PatchGrid::new(cropped, sample).ensure_capacity(count)?;
        Ok(Self {
            cropped,
            sample,
            count,
        })
    }

    /// Number of patches produced per image.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Cut `count` pairwise non-overlapping patches out of `image`.
    ///
    /// The grid is shifted by a random offset within the leftover margin,
    /// then cells are drawn without replacement. Draw order sets the index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if `image` is not shaped like the
    /// cropped dimension.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        image: &Image,
        source_id: &str,
        rng: &mut R,
    ) -> Result<Vec<LabeledPatch>> {
        let (height, width, _) = image.dim();
        if (height, width) != (self.cropped.height, self.cropped.width) {
            return Err(Error::InvalidImage {
                expected: format!("{:?}", self.cropped.shape()),
                actual: format!("{:?}", image.shape()),
            });
        }

        let grid = PatchGrid::new(self.cropped, self.sample);
        let origin = grid.random_origin(rng);
        let cells: Vec<(usize, usize)> = grid.cells(origin).collect();

        let chosen = index::sample(rng, cells.len(), self.count);

        Ok(chosen
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let (y, x) = cells[cell];
                LabeledPatch {
                    source_id: source_id.to_string(),
                    index,
                    patch: image
                        .slice(s![y..y + self.sample.height, x..x + self.sample.width, ..])
                        .to_owned(),
                }
            })
            .collect())
    }
}

/// Derive a patch label from an input path: the path relative to `root`
/// with the `.{extension}` suffix removed, components joined by `/`.
///
/// # Errors
///
/// Returns [`Error::PathFormat`] if `path` is not under `root`, does not end
/// with the extension, or leaves an empty or non-UTF-8 label.
pub fn source_id(path: &Path, root: &Path, extension: &str) -> Result<String> {
    let format_err = |reason: &str| Error::PathFormat {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let relative = path
        .strip_prefix(root)
        .map_err(|_| format_err(&format!("not under input root {}", root.display())))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| format_err("path is not valid UTF-8"))?,
            ),
            _ => return Err(format_err("relative path must not contain . or ..")),
        }
    }
    let joined = parts.join("/");

    let suffix = format!(".{extension}");
    let stem = joined
        .strip_suffix(&suffix)
        .ok_or_else(|| format_err(&format!("does not end with {suffix}")))?;

    if stem.is_empty() || stem.ends_with('/') {
        return Err(format_err("empty file stem"));
    }

    Ok(stem.to_string())
}
