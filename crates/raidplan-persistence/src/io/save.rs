//! Progress saving.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use raidplan_model::PersistedProgress;

use crate::error::{PersistenceError, Result};

/// Save progress as pretty-printed JSON, stamping `savedAt`.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a
/// truncated progress file behind.
pub fn save_progress(progress: &mut PersistedProgress, path: &Path) -> Result<()> {
    progress.saved_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let mut bytes = serde_json::to_vec_pretty(progress)
        .map_err(|source| PersistenceError::Serialization { source })?;
    bytes.push(b'\n');

    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PersistenceError::io("create directory", parent, e))?;
    }

    let mut file =
        File::create(&temp_path).map_err(|e| PersistenceError::io("create", &temp_path, e))?;
    file.write_all(&bytes)
        .map_err(|e| PersistenceError::io("write", &temp_path, e))?;
    file.sync_all()
        .map_err(|e| PersistenceError::io("sync", &temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| PersistenceError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        quests = progress.completed_quest_ids.len(),
        levels = progress.completed_hideout_level_ids.len(),
        "saved progress to {}",
        path.display()
    );
    Ok(())
}
