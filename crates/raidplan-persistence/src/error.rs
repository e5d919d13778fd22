//! Persistence error types.
//!
//! Errors carry a user-facing message and an optional remediation hint.

use std::path::PathBuf;
use thiserror::Error;

/// Progress file operation error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not a raidplan progress file.
    #[error("Invalid progress file format: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// Written by a newer raidplan.
    #[error("Progress file version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    #[error("Failed to serialize progress")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to deserialize progress")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The temp file could not be renamed over the target.
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::InvalidFormat { path, reason } => {
                format!(
                    "The file at {} is not a raidplan progress file: {}",
                    path.display(),
                    reason
                )
            }
            Self::UnsupportedVersion {
                found,
                max_supported,
                ..
            } => {
                format!(
                    "This progress file was written by a newer version of raidplan \
                    (file version {found}, this version supports up to {max_supported})."
                )
            }
            Self::Serialization { .. } => "An error occurred while saving progress.".to_string(),
            Self::Deserialization { path, .. } => {
                format!(
                    "An error occurred while reading progress from {}. The file may be corrupted.",
                    path.display()
                )
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the file to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::InvalidFormat { .. } => {
                Some("Point --progress at a file written by raidplan, or at a new path.".into())
            }
            Self::UnsupportedVersion { .. } => Some("Update raidplan to the latest release.".into()),
            Self::Serialization { .. } => None,
            Self::Deserialization { .. } => {
                Some("Restore a backup, or delete the file to start from empty progress.".into())
            }
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
