//! Image loading utilities.

use std::path::Path;

use image::RgbImage;
use ndarray::Array3;

use crate::error::{Error, Result};

use super::{Image, RGB_CHANNELS};

/// Decode an image file into an HWC pixel array.
///
/// Whatever the stored color type, the result always has 3 channels.
///
/// # Errors
///
/// Returns [`Error::Decode`] naming the path if the file cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(from_rgb(&img.to_rgb8()))
}

/// Copy an `RgbImage` into an `(height, width, 3)` array.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn from_rgb(rgb: &RgbImage) -> Image {
    let (width, height) = rgb.dimensions();
    let shape = (height as usize, width as usize, RGB_CHANNELS);

    // Safe: x and y are bounded by the source dimensions, which are u32
    Array3::from_shape_fn(shape, |(y, x, c)| rgb.get_pixel(x as u32, y as u32)[c])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_from_rgb_layout() {
        let mut rgb = RgbImage::new(4, 2);
        rgb.put_pixel(3, 1, Rgb([10, 20, 30]));

        let image = from_rgb(&rgb);

        assert_eq!(image.dim(), (2, 4, 3));
        assert_eq!(image[[1, 3, 0]], 10);
        assert_eq!(image[[1, 3, 1]], 20);
        assert_eq!(image[[1, 3, 2]], 30);
        assert_eq!(image[[0, 0, 0]], 0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image("does/not/exist.png").unwrap_err();
        assert!(matches!(err, Error::Decode { ref path, .. } if path.ends_with("exist.png")));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        assert!(matches!(load_image(&path), Err(Error::Decode { .. })));
    }
}
