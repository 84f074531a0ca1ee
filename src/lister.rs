//! Recursive discovery of input images.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Finds files with a given extension under a root directory.
#[derive(Debug, Clone)]
pub struct Lister {
    suffix: String,
}

impl Lister {
    /// Build a lister matching file names that end in `.{extension}`.
    ///
    /// Matching is case-sensitive. A leading dot in `extension` is ignored.
    #[must_use]
    pub fn new(extension: &str) -> Self {
        Self {
            suffix: format!(".{}", extension.trim_start_matches('.')),
        }
    }

    /// Whether `path` names a file this lister accepts.
    ///
    /// The suffix is compared on raw bytes, so names that are not valid
    /// UTF-8 are still listed and rejected later with a path error.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.as_encoded_bytes())
            .is_some_and(|name| {
                name.len() > self.suffix.len() && name.ends_with(self.suffix.as_bytes())
            })
    }

    /// List matching files under `root`, recursively.
    ///
    /// Entries are visited in file-name order within each directory, so the
    /// result is stable across runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Walk`] if `root` or any directory below it cannot be read.
    pub fn list<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        let mut paths = Vec::new();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|source| Error::Walk {
                root: root.to_path_buf(),
                source,
            })?;

            if entry.file_type().is_file() && self.accepts(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        tracing::debug!("Found {} file(s) under {}", paths.len(), root.display());
        Ok(paths)
    }
}
