//! Temporary files for in-flight uploads.
//!
//! Every staged file is deleted when its [`StagedFile`] is dropped, whichever way the
//! request ends.

use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tubely_core::constants::STAGED_FILE_PREFIX;

use crate::error::ProcessingError;

/// Suffix of the file receiving the upload body
pub const ORIGINAL_SUFFIX: &str = ".mp4";

/// Suffix of the faststart copy
pub const PROCESSING_SUFFIX: &str = ".processing.mp4";

/// Directory where uploads are staged
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create an empty staged file named `tubely-upload-*{suffix}` and open it for writing.
    pub fn create(&self, suffix: &str) -> Result<(File, StagedFile), ProcessingError> {
        let named = tempfile::Builder::new()
            .prefix(&format!("{}-", STAGED_FILE_PREFIX))
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        let (file, path) = named.into_parts();

        tracing::debug!(path = %path.display(), "Staged file created");

        Ok((File::from_std(file), StagedFile { path }))
    }
}

/// A staged file removed from disk on drop
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The upload body exactly as received. Only this handle can be probed.
#[derive(Debug)]
pub struct OriginalUpload(StagedFile);

impl OriginalUpload {
    pub(crate) fn new(file: StagedFile) -> Self {
        Self(file)
    }

    pub fn path(&self) -> &Path {
        self.0.path()
    }
}

/// Faststart copy of an [`OriginalUpload`]. Only this handle can be stored.
#[derive(Debug)]
pub struct FastStartOutput(StagedFile);

impl FastStartOutput {
    pub(crate) fn new(file: StagedFile) -> Self {
        Self(file)
    }

    pub fn path(&self) -> &Path {
        self.0.path()
    }
}
