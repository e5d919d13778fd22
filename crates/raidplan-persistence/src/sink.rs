//! Write-through sink that keeps a progress file in sync with the store.

use std::path::{Path, PathBuf};

use raidplan_core::ProgressSink;
use raidplan_model::PersistedProgress;

use crate::io::save_progress;

/// Saves every committed progress state to one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressSink for JsonFileSink {
    fn persist(
        &self,
        progress: &PersistedProgress,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut progress = progress.clone();
        save_progress(&mut progress, &self.path)?;
        Ok(())
    }
}
