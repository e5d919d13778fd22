#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::EmptyId { kind: $kind });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a catalog item.
    ItemId,
    "item"
);
string_id!(
    /// Identifier of a quest.
    QuestId,
    "quest"
);
string_id!(
    /// Identifier of a single hideout station level.
    LevelId,
    "hideout level"
);
string_id!(StationId, "station");
string_id!(MapId, "map");
string_id!(MarkerId, "marker");

const QUEST_PREFIX: &str = "quest:";
const LEVEL_PREFIX: &str = "level:";

/// A node of the dependency graph.
///
/// Renders as `quest:<id>` or `level:<id>`, which is also the wire form used in
/// change notifications and aggregation provenance.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum NodeId {
    Quest(QuestId),
    HideoutLevel(LevelId),
}

impl NodeId {
    pub fn quest(id: &QuestId) -> Self {
        Self::Quest(id.clone())
    }

    pub fn level(id: &LevelId) -> Self {
        Self::HideoutLevel(id.clone())
    }

    pub fn is_quest(&self) -> bool {
        matches!(self, Self::Quest(_))
    }

    pub fn is_hideout_level(&self) -> bool {
        matches!(self, Self::HideoutLevel(_))
    }

    /// The raw id without the kind prefix.
    pub fn raw(&self) -> &str {
        match self {
            Self::Quest(id) => id.as_str(),
            Self::HideoutLevel(id) => id.as_str(),
        }
    }
}

impl FromStr for NodeId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix(QUEST_PREFIX) {
            return QuestId::new(rest)
                .map(Self::Quest)
                .map_err(|_| ModelError::InvalidNodeId(s.to_string()));
        }
        if let Some(rest) = trimmed.strip_prefix(LEVEL_PREFIX) {
            return LevelId::new(rest)
                .map(Self::HideoutLevel)
                .map_err(|_| ModelError::InvalidNodeId(s.to_string()));
        }
        Err(ModelError::InvalidNodeId(s.to_string()))
    }
}

impl TryFrom<String> for NodeId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quest(id) => write!(f, "{QUEST_PREFIX}{id}"),
            Self::HideoutLevel(id) => write!(f, "{LEVEL_PREFIX}{id}"),
        }
    }
}

impl From<QuestId> for NodeId {
    fn from(id: QuestId) -> Self {
        Self::Quest(id)
    }
}

impl From<LevelId> for NodeId {
    fn from(id: LevelId) -> Self {
        Self::HideoutLevel(id)
    }
}
