//! Image saving utilities.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::{Error, Result};

use super::{Image, RGB_CHANNELS};

/// JPEG quality used for `.jpg`/`.jpeg` outputs.
const JPEG_QUALITY: u8 = 95;

/// Encode a pixel array to `path`, format inferred from the extension.
///
/// The parent directory must already exist.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the array is not 3-channel,
/// [`Error::Write`] if a JPEG file cannot be created, and [`Error::Encode`]
/// if encoding or writing fails.
pub fn save_image<P: AsRef<Path>>(image: &Image, path: P) -> Result<()> {
    let path = path.as_ref();
    let rgb = to_rgb(image)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let encode_err = |source: image::ImageError| Error::Encode {
        path: path.to_path_buf(),
        source,
    };

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path).map_err(|source| Error::Write {
                path: path.to_path_buf(),
                source,
            })?;
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
            rgb.write_with_encoder(encoder).map_err(encode_err)?;
        }
        _ => rgb.save(path).map_err(encode_err)?,
    }

    Ok(())
}

/// Convert an `(height, width, 3)` array into an `RgbImage`.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the channel count is not 3 or a side
/// does not fit in `u32`.
pub fn to_rgb(image: &Image) -> Result<RgbImage> {
    let (height, width, channels) = image.dim();
    let invalid = || Error::InvalidImage {
        expected: format!("(h, w, {RGB_CHANNELS}) with h, w < 2^32"),
        actual: format!("{:?}", image.shape()),
    };

    if channels != RGB_CHANNELS {
        return Err(invalid());
    }
    let w = u32::try_from(width).map_err(|_| invalid())?;
    let h = u32::try_from(height).map_err(|_| invalid())?;

    Ok(RgbImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([image[[y, x, 0]], image[[y, x, 1]], image[[y, x, 2]]])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{from_rgb, load_image};
    use ndarray::Array3;

    fn gradient(height: usize, width: usize) -> Image {
        #[allow(clippy::cast_possible_truncation)]
        Array3::from_shape_fn((height, width, RGB_CHANNELS), |(y, x, c)| {
            ((y * 7 + x * 3 + c * 50) % 256) as u8
        })
    }

    #[test]
    fn test_to_rgb_rejects_wrong_channels() {
        let image = Array3::<u8>::zeros((4, 4, 1));
        assert!(matches!(to_rgb(&image), Err(Error::InvalidImage { .. })));
    }

    #[test]
    fn test_to_rgb_layout() {
        let image = gradient(3, 5);
        let rgb = to_rgb(&image).unwrap();
        assert_eq!(rgb.dimensions(), (5, 3));
        assert_eq!(from_rgb(&rgb), image);
    }

    #[test]
    fn test_png_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.png");
        let image = gradient(8, 6);

        save_image(&image, &path).unwrap();

        assert_eq!(load_image(&path).unwrap(), image);
    }

    #[test]
    fn test_jpeg_keeps_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.jpg");

        save_image(&gradient(16, 24), &path).unwrap();

        assert_eq!(load_image(&path).unwrap().dim(), (16, 24, 3));
    }

    #[test]
    fn test_jpeg_missing_parent_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("patch.jpg");

        let err = save_image(&gradient(2, 2), &path).unwrap_err();

        assert!(matches!(err, Error::Write { path: ref p, .. } if *p == path));
        assert!(err.to_string().contains("patch.jpg"), "{err}");
    }

    #[test]
    fn test_missing_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("patch.png");
        assert!(save_image(&gradient(2, 2), &path).is_err());
    }
}
