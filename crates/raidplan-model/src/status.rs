use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a graph node, always derived from the completed sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedStatus {
    /// At least one prerequisite is not completed.
    Locked,
    /// Every prerequisite is completed, the node itself is not.
    Available,
    Completed,
}

impl DerivedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Available => "available",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
