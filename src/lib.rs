//! # `patchprep`
//!
//! Turns a directory of images into a patch dataset: every image is resized
//! to a fixed shape, center-cropped, and cut into randomly placed
//! non-overlapping patches. All patches are then shuffled together and
//! split into `train/` and `test/` directories.
//!
//! ## Example
//!
//! ```no_run
//! use patchprep::{Config, Pipeline};
//!
//! # fn main() -> patchprep::Result<()> {
//! let config = Config {
//!     seed: Some(42),
//!     ..Config::default()
//! };
//! let mut pipeline = Pipeline::new(config)?;
//!
//! let summary = pipeline.run("images/", "dataset/")?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod image;
pub mod lister;
pub mod pipeline;
pub mod sampling;
pub mod split;
pub mod writer;

pub use config::{Config, Dimension};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunSummary};
pub use sampling::LabeledPatch;
pub use split::{Split, SplitResult};
