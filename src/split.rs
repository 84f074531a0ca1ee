//! Global shuffle and train/test partition.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::sampling::LabeledPatch;

/// Which output set a patch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// Output subdirectory name.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Disjoint train and test sets covering every input patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitResult {
    pub train: Vec<LabeledPatch>,
    pub test: Vec<LabeledPatch>,
}

impl SplitResult {
    /// Total number of patches across both sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.test.is_empty()
    }

    /// Iterate over both sets, train first, tagging each patch with its split.
    pub fn iter(&self) -> impl Iterator<Item = (Split, &LabeledPatch)> {
        self.train
            .iter()
            .map(|p| (Split::Train, p))
            .chain(self.test.iter().map(|p| (Split::Test, p)))
    }
}

/// Number of training patches for `total` patches at `train_ratio`.
///
/// Floors the product and never exceeds `total`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn train_count(total: usize, train_ratio: f64) -> usize {
    // Safe: ratio is clamped to [0, 1] so the product lies in [0, total]
    let n = (train_ratio.clamp(0.0, 1.0) * total as f64).floor() as usize;
    n.min(total)
}

/// Shuffle `patches` uniformly and cut them at `floor(train_ratio * total)`.
///
/// The first part becomes the training set, the rest the test set. Empty
/// input and ratios of exactly 0.0 or 1.0 are all valid.
pub fn split_patches<R: Rng + ?Sized>(
    mut patches: Vec<LabeledPatch>,
    train_ratio: f64,
    rng: &mut R,
) -> SplitResult {
    patches.shuffle(rng);
    let cut = train_count(patches.len(), train_ratio);
    let test = patches.split_off(cut);

    SplitResult {
        train: patches,
        test,
    }
}
