//! Filesystem existence checks used as satisfaction predicates.
//!
//! Each check is a single `stat` with no retry. Only "not found" is treated as
//! an answer; every other failure is surfaced as a [`StatError`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
#[error("failed to stat {}: {source}", path.display())]
pub struct StatError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// True iff a filesystem entry exists at `path` (symlinks are followed).
pub fn path_exists(path: &Path) -> Result<bool, StatError> {
    match fs::metadata(path) {
        Ok(_) => {
            trace!(path = %path.display(), "path exists");
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            trace!(path = %path.display(), "path not found");
            Ok(false)
        }
        Err(source) => Err(StatError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// True iff nothing exists at `path`.
pub fn path_absent(path: &Path) -> Result<bool, StatError> {
    path_exists(path).map(|exists| !exists)
}
