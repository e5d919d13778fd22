//! Map overlay: which markers are shown for the current progress.

use std::collections::{BTreeMap, BTreeSet};

use raidplan_model::{DerivedStatus, MapId, MarkerId, MarkerRecord, NodeId, ObjectiveRef};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::graph::DependencyGraph;
use crate::progress::ProgressState;
use crate::status::derive_status;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OverlayOptions {
    /// Markers the player dismissed. Never shown, whatever their objective.
    pub hidden: BTreeSet<MarkerId>,
}

impl OverlayOptions {
    #[must_use]
    pub fn with_hidden<I>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = MarkerId>,
    {
        self.hidden.extend(markers);
        self
    }
}

/// Active markers keyed by map and by objective.
///
/// Every map in the catalog has an entry in `by_map`, possibly empty.
/// Landmarks (markers without an objective) only appear in `by_map`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveMarkers {
    pub by_map: BTreeMap<MapId, BTreeSet<MarkerId>>,
    pub by_objective: BTreeMap<ObjectiveRef, BTreeSet<MarkerId>>,
}

impl ActiveMarkers {
    pub fn for_map(&self, map: &MapId) -> Option<&BTreeSet<MarkerId>> {
        self.by_map.get(map)
    }

    pub fn for_objective(&self, objective: &ObjectiveRef) -> Option<&BTreeSet<MarkerId>> {
        self.by_objective.get(objective)
    }

    pub fn len(&self) -> usize {
        self.by_map.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_map.values().all(BTreeSet::is_empty)
    }
}

/// A marker is active when it has no objective, or its objective's quest is
/// available. Dismissal is handled by [`active_markers`].
pub fn is_marker_active(
    graph: &DependencyGraph,
    state: &ProgressState,
    marker: &MarkerRecord,
) -> bool {
    match &marker.objective {
        None => true,
        Some(objective) => {
            let quest = NodeId::quest(&objective.quest_id);
            derive_status(graph, state, &quest) == Some(DerivedStatus::Available)
        }
    }
}

pub fn active_markers(
    catalog: &Catalog,
    graph: &DependencyGraph,
    state: &ProgressState,
    options: &OverlayOptions,
) -> ActiveMarkers {
    let mut active = ActiveMarkers {
        by_map: catalog
            .maps()
            .map(|map| (map.id.clone(), BTreeSet::new()))
            .collect(),
        by_objective: BTreeMap::new(),
    };
    let shown = catalog
        .markers()
        .filter(|marker| !options.hidden.contains(&marker.id))
        .filter(|marker| is_marker_active(graph, state, marker));
    for marker in shown {
        active
            .by_map
            .entry(marker.map_id.clone())
            .or_default()
            .insert(marker.id.clone());
        if let Some(objective) = &marker.objective {
            active
                .by_objective
                .entry(objective.clone())
                .or_default()
                .insert(marker.id.clone());
        }
    }
    active
}
