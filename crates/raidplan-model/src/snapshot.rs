//! Persisted shape of player progress.

use serde::{Deserialize, Serialize};

/// Schema tag written into every progress file.
pub const PROGRESS_SCHEMA: &str = "raidplan.progress";

/// Current progress schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Player progress as stored by the external storage collaborator.
///
/// Ids are kept as raw strings: the catalog may have changed since the file
/// was written, and stale ids are reconciled (dropped) on restore rather than
/// rejected while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgress {
    pub schema: String,
    pub schema_version: u32,
    /// SHA-256 of the catalog the progress was recorded against.
    #[serde(default)]
    pub catalog_fingerprint: Option<String>,
    /// RFC 3339 timestamp of the last save.
    #[serde(default)]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub completed_quest_ids: Vec<String>,
    #[serde(default)]
    pub completed_hideout_level_ids: Vec<String>,
}

impl Default for PersistedProgress {
    fn default() -> Self {
        Self {
            schema: PROGRESS_SCHEMA.to_string(),
            schema_version: CURRENT_SCHEMA_VERSION,
            catalog_fingerprint: None,
            saved_at: None,
            completed_quest_ids: Vec::new(),
            completed_hideout_level_ids: Vec::new(),
        }
    }
}

impl PersistedProgress {
    pub fn new<Q, L>(quests: Q, levels: L) -> Self
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            completed_quest_ids: quests.into_iter().map(Into::into).collect(),
            completed_hideout_level_ids: levels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_catalog_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.catalog_fingerprint = fingerprint;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.completed_quest_ids.is_empty() && self.completed_hideout_level_ids.is_empty()
    }
}
