//! Derived node status as a pure function of the completed sets.

use std::collections::BTreeMap;

use raidplan_model::{DerivedStatus, NodeId};

use crate::graph::DependencyGraph;
use crate::progress::ProgressState;

/// Status of one node, `None` if the node is not in the graph.
pub fn derive_status(
    graph: &DependencyGraph,
    state: &ProgressState,
    node: &NodeId,
) -> Option<DerivedStatus> {
    let prerequisites = graph.prerequisites_of(node)?;
    let status = if state.is_completed(node) {
        DerivedStatus::Completed
    } else if prerequisites.iter().all(|p| state.is_completed(p)) {
        DerivedStatus::Available
    } else {
        DerivedStatus::Locked
    };
    Some(status)
}

/// Direct prerequisites of `node` that are not completed yet.
pub fn missing_prerequisites(
    graph: &DependencyGraph,
    state: &ProgressState,
    node: &NodeId,
) -> Option<Vec<NodeId>> {
    graph.prerequisites_of(node).map(|prerequisites| {
        prerequisites
            .iter()
            .filter(|p| !state.is_completed(p))
            .cloned()
            .collect()
    })
}

/// Number of completion waves until each incomplete node becomes available.
///
/// Available nodes have distance 0; a locked node is one more than the largest
/// distance among its incomplete prerequisites. Completed nodes are absent.
pub fn unlock_distances(graph: &DependencyGraph, state: &ProgressState) -> BTreeMap<NodeId, u32> {
    let mut distances: BTreeMap<NodeId, u32> = BTreeMap::new();
    for node in graph.topological_order() {
        if state.is_completed(node) {
            continue;
        }
        let distance = graph
            .prerequisites_of(node)
            .into_iter()
            .flatten()
            .filter_map(|p| distances.get(p))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        distances.insert(node.clone(), distance);
    }
    distances
}
