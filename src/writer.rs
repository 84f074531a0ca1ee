//! Persisting labeled patches under `train/` and `test/`.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;

use crate::error::{Error, Result};
use crate::image::save_image;
use crate::sampling::LabeledPatch;
use crate::split::{Split, SplitResult};

/// Relative destination of `patch`: `{split}/{source_id}_{index}.{extension}`.
#[must_use]
pub fn destination(split: Split, patch: &LabeledPatch, extension: &str) -> PathBuf {
    Path::new(split.dir_name()).join(format!(
        "{}_{}.{extension}",
        patch.source_id, patch.index
    ))
}

/// Writes patches below an output root, creating directories on demand.
#[derive(Debug, Clone)]
pub struct PatchWriter {
    root: PathBuf,
    extension: String,
}

impl PatchWriter {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Encode one patch to its destination and return the full path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or encoding fails.
    pub fn write(&self, split: Split, patch: &LabeledPatch) -> Result<PathBuf> {
        let path = self.root.join(destination(split, patch, &self.extension));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        save_image(&patch.patch, &path)?;
        Ok(path)
    }

    /// Write every patch of `result`, train first, ticking `progress` per file.
    ///
    /// # Errors
    ///
    /// Stops at the first failed write; files already written stay on disk.
    pub fn write_all(&self, result: &SplitResult, progress: &ProgressBar) -> Result<usize> {
        let mut written = 0;
        for (split, patch) in result.iter() {
            let path = self.write(split, patch)?;
            tracing::trace!("Wrote {}", path.display());
            written += 1;
            progress.inc(1);
        }
        Ok(written)
    }
}
