//! Pure geometry: resize targets, center-crop windows and patch grids.

use image::{imageops, imageops::FilterType};
use ndarray::s;
use rand::Rng;

use crate::config::Dimension;
use crate::error::{Error, Result};
use crate::image::{from_rgb, to_rgb, Image};

/// Resize filter used to bring images to the enforced dimension.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Resize `image` to the height and width of `enforced`.
///
/// An image already at `enforced` is returned untouched.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if `image` is not a 3-channel array, or
/// if `enforced` has a side that does not fit in `u32`.
pub fn resize_target(image: Image, enforced: Dimension) -> Result<Image> {
    let (height, width, _) = image.dim();
    if (height, width) == (enforced.height, enforced.width) {
        return Ok(image);
    }

    let too_large = || Error::InvalidImage {
        expected: "enforced sides below 2^32".to_string(),
        actual: enforced.to_string(),
    };
    let dst_w = u32::try_from(enforced.width).map_err(|_| too_large())?;
    let dst_h = u32::try_from(enforced.height).map_err(|_| too_large())?;

    let resized = imageops::resize(&to_rgb(&image)?, dst_w, dst_h, RESIZE_FILTER);
    Ok(from_rgb(&resized))
}

/// Row/column bounds of a crop window, half-open on the max side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub d0_min: usize,
    pub d1_min: usize,
    pub d0_max: usize,
    pub d1_max: usize,
}

/// Compute the centered `cropped` window inside an `enforced` image.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if `cropped` is larger than `enforced`
/// along either axis.
pub fn center_crop_offsets(enforced: Dimension, cropped: Dimension) -> Result<CropWindow> {
    if enforced.height < cropped.height || enforced.width < cropped.width {
        return Err(Error::config(
            "cropped_dimm",
            format!("cropped {cropped} exceeds enforced {enforced}"),
        ));
    }

    let d0_min = (enforced.height - cropped.height) / 2;
    let d1_min = (enforced.width - cropped.width) / 2;

    Ok(CropWindow {
        d0_min,
        d1_min,
        d0_max: d0_min + cropped.height,
        d1_max: d1_min + cropped.width,
    })
}

/// Cut `window` out of `image` as a new owned array.
///
/// # Panics
///
/// Panics if the window reaches outside the image; windows built by
/// [`center_crop_offsets`] always fit an image resized to the enforced
/// dimension.
#[must_use]
pub fn apply_crop(image: &Image, window: CropWindow) -> Image {
    image
        .slice(s![window.d0_min..window.d0_max, window.d1_min..window.d1_max, ..])
        .to_owned()
}

/// Regular grid of sample-sized cells tiling a cropped image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGrid {
    /// Cell shape.
    pub cell: Dimension,
    /// Cells along the height axis (`n_i`).
    pub rows: usize,
    /// Cells along the width axis (`n_j`).
    pub cols: usize,
    /// Leftover rows after tiling, the jitter range on axis 0.
    pub slack_rows: usize,
    /// Leftover columns after tiling, the jitter range on axis 1.
    pub slack_cols: usize,
}

impl PatchGrid {
    /// # Panics
    ///
    /// Panics if `sample` has a zero height or width.
    #[must_use]
    pub const fn new(cropped: Dimension, sample: Dimension) -> Self {
        Self {
            cell: sample,
            rows: cropped.height / sample.height,
            cols: cropped.width / sample.width,
            slack_rows: cropped.height % sample.height,
            slack_cols: cropped.width % sample.width,
        }
    }

    /// Number of non-overlapping cells.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Check that `requested` distinct cells exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientArea`] if the grid is too small.
    pub fn ensure_capacity(&self, requested: usize) -> Result<()> {
        if self.capacity() < requested {
            return Err(Error::InsufficientArea {
                available: self.capacity(),
                requested,
            });
        }
        Ok(())
    }

    /// Draw a random grid origin within the slack on each axis.
    ///
    /// An axis without slack always yields 0.
    pub fn random_origin<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        (jitter(rng, self.slack_rows), jitter(rng, self.slack_cols))
    }

    /// Top-left coordinates of every cell for a grid anchored at `origin`,
    /// row-major.
    pub fn cells(&self, origin: (usize, usize)) -> impl Iterator<Item = (usize, usize)> {
        let (i0, j0) = origin;
        let (cell_h, cell_w, cols) = (self.cell.height, self.cell.width, self.cols);
        (0..self.rows).flat_map(move |i| (0..cols).map(move |j| (i0 + i * cell_h, j0 + j * cell_w)))
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, slack: usize) -> usize {
    if slack == 0 {
        0
    } else {
        rng.random_range(0..slack)
    }
}
