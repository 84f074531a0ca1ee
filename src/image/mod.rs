//! Image loading, conversion, and saving utilities.

mod load;
mod save;

pub use load::{from_rgb, load_image};
pub use save::{save_image, to_rgb};

use ndarray::Array3;

/// Dense pixel array in HWC layout (height, width, channels).
pub type Image = Array3<u8>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
