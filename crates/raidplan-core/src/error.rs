#![deny(unsafe_code)]

use std::path::PathBuf;

use raidplan_model::{ItemId, MapId, MarkerId, NodeId, QuestId, StationId};

/// Catalog integrity failures. Any of these aborts initialization: the
/// tracker refuses to serve an inconsistent graph.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{node} depends on unknown node {missing}")]
    UnresolvedDependency { node: NodeId, missing: NodeId },

    #[error("{node} references unknown item {item}")]
    UnresolvedItem { node: NodeId, item: ItemId },

    #[error("{node} requires zero of item {item}")]
    InvalidQuantity { node: NodeId, item: ItemId },

    #[error("marker {marker} points at missing objective {objective_index} of quest {quest}")]
    UnresolvedObjective {
        marker: MarkerId,
        quest: QuestId,
        objective_index: usize,
    },

    #[error("marker {marker} is placed on unknown map {map}")]
    UnresolvedMap { marker: MarkerId, map: MapId },

    #[error("invalid levels for station {station}: {message}")]
    InvalidStationLevels { station: StationId, message: String },

    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<NodeId> },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_cycle(cycle: &[NodeId]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_list(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rejected runtime operations. The store is never left partially mutated
/// when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("cannot complete {node}: prerequisites not completed: {}", format_list(.missing))]
    PrerequisitesUnmet { node: NodeId, missing: Vec<NodeId> },

    #[error("unknown station: {0}")]
    UnknownStation(StationId),

    #[error("station {station} has no level {level} (max {max})")]
    StationLevelOutOfRange {
        station: StationId,
        level: u32,
        max: u32,
    },

    #[error("unknown map: {0}")]
    UnknownMap(MapId),
}
