//! Opening a catalog and its progress file as one tracker session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use raidplan_core::{Catalog, ProgressChange, RestoreReport, Tracker, TrackerOptions};
use raidplan_persistence::{JsonFileSink, PersistenceError, load_progress_or_default};
use tracing::{info, info_span};

pub struct Session {
    pub tracker: Tracker,
    pub progress_path: PathBuf,
    pub restore: RestoreReport,
}

impl Session {
    /// Load the catalog, restore saved progress and attach write-through
    /// saving to `progress_path`.
    pub fn open(catalog_path: &Path, progress_path: &Path, options: TrackerOptions) -> Result<Self> {
        let span = info_span!("session", catalog = %catalog_path.display());
        let _guard = span.enter();

        let tracker = open_tracker(catalog_path, options)?;
        let saved = load_progress_or_default(progress_path).map_err(describe_persistence_error)?;
        let restore = tracker.restore(&saved);
        info!(
            restored = restore.restored,
            dropped = restore.dropped.len(),
            "session ready"
        );
        let tracker = tracker.with_sink(Box::new(JsonFileSink::new(progress_path)));
        Ok(Self {
            tracker,
            progress_path: progress_path.to_path_buf(),
            restore,
        })
    }

    /// Run a mutation and fail if the write-through did not reach disk.
    pub fn apply<F>(&self, mutation: F) -> Result<ProgressChange>
    where
        F: FnOnce(&Tracker) -> Result<ProgressChange, raidplan_core::ProgressError>,
    {
        let change = mutation(&self.tracker)?;
        self.tracker.store().flush();
        if let Some(error) = self.tracker.store().last_persist_error() {
            bail!(
                "progress changed in memory but could not be saved to {}: {error}",
                self.progress_path.display()
            );
        }
        Ok(change)
    }
}

pub fn open_tracker(catalog_path: &Path, options: TrackerOptions) -> Result<Tracker> {
    let catalog = Catalog::load(catalog_path)
        .with_context(|| format!("load catalog {}", catalog_path.display()))?;
    Tracker::with_options(catalog, options)
        .with_context(|| format!("build dependency graph for {}", catalog_path.display()))
}

fn describe_persistence_error(error: PersistenceError) -> anyhow::Error {
    let mut message = error.user_message();
    if let Some(suggestion) = error.suggestion() {
        message.push_str(&format!(" ({suggestion})"));
    }
    anyhow::Error::new(error).context(message)
}
