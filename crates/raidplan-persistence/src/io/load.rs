//! Progress loading.

use std::fs;
use std::path::Path;

use raidplan_model::{CURRENT_SCHEMA_VERSION, PROGRESS_SCHEMA, PersistedProgress};
use serde::Deserialize;

use crate::error::{PersistenceError, Result};

/// Just enough of the file to decide whether it can be read at all.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    schema: Option<String>,
    schema_version: Option<u32>,
}

/// Load progress from a JSON file.
pub fn load_progress(path: &Path) -> Result<PersistedProgress> {
    let bytes = fs::read(path).map_err(|e| PersistenceError::io("read", path, e))?;
    parse_progress_bytes(&bytes, path)
}

/// Load progress, or start empty when the file does not exist yet.
pub fn load_progress_or_default(path: &Path) -> Result<PersistedProgress> {
    if !path.exists() {
        tracing::info!("no progress file at {}, starting empty", path.display());
        return Ok(PersistedProgress::default());
    }
    load_progress(path)
}

fn parse_progress_bytes(bytes: &[u8], path: &Path) -> Result<PersistedProgress> {
    let header: Header =
        serde_json::from_slice(bytes).map_err(|e| PersistenceError::InvalidFormat {
            path: path.to_path_buf(),
            reason: format!("not a JSON object: {e}"),
        })?;

    match header.schema.as_deref() {
        Some(PROGRESS_SCHEMA) => {}
        Some(other) => {
            return Err(PersistenceError::InvalidFormat {
                path: path.to_path_buf(),
                reason: format!("unknown schema '{other}'"),
            });
        }
        None => {
            return Err(PersistenceError::InvalidFormat {
                path: path.to_path_buf(),
                reason: "missing schema tag".to_string(),
            });
        }
    }

    let version = header.schema_version.unwrap_or(CURRENT_SCHEMA_VERSION);
    if version > CURRENT_SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: version,
            max_supported: CURRENT_SCHEMA_VERSION,
            path: path.to_path_buf(),
        });
    }

    let progress: PersistedProgress =
        serde_json::from_slice(bytes).map_err(|source| PersistenceError::Deserialization {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        quests = progress.completed_quest_ids.len(),
        levels = progress.completed_hideout_level_ids.len(),
        "loaded progress from {}",
        path.display()
    );
    Ok(progress)
}
