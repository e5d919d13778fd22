//! The tracker facade: catalog, graph and progress store wired together,
//! with the read APIs consumed by front ends.

use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, PoisonError};

use raidplan_model::{
    DerivedStatus, LevelId, MapId, MarkerId, NodeId, PersistedProgress, StationId,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{Aggregation, AggregationOptions, aggregate};
use crate::catalog::Catalog;
use crate::error::{CatalogError, ProgressError};
use crate::graph::DependencyGraph;
use crate::options::TrackerOptions;
use crate::overlay::{ActiveMarkers, active_markers};
use crate::progress::{
    ProgressChange, ProgressSink, ProgressSnapshot, ProgressState, ProgressStore, RestoreReport,
};
use crate::status::{derive_status, missing_prerequisites};

/// Progress of one hideout station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSummary {
    pub station_id: StationId,
    pub name: String,
    /// Highest level completed together with every level below it.
    pub current_level: u32,
    pub max_level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<LevelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_status: Option<DerivedStatus>,
}

struct CachedAggregation {
    version: u64,
    options: AggregationOptions,
    result: Arc<Aggregation>,
}

pub struct Tracker {
    catalog: Arc<Catalog>,
    graph: Arc<DependencyGraph>,
    store: ProgressStore,
    options: TrackerOptions,
    cache: Mutex<Option<CachedAggregation>>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("nodes", &self.graph.len())
            .field("store", &self.store)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn new(catalog: Catalog) -> Result<Self, CatalogError> {
        Self::with_options(catalog, TrackerOptions::default())
    }

    /// Build the dependency graph and an empty progress store.
    ///
    /// Fails if the catalog references unknown nodes or has a cycle.
    pub fn with_options(catalog: Catalog, options: TrackerOptions) -> Result<Self, CatalogError> {
        let graph = Arc::new(DependencyGraph::build(&catalog, &options)?);
        let store = ProgressStore::new(Arc::clone(&graph))
            .with_catalog_fingerprint(catalog.fingerprint());
        info!(
            nodes = graph.len(),
            layers = graph.layers().len(),
            "tracker initialized"
        );
        Ok(Self {
            catalog: Arc::new(catalog),
            graph,
            store,
            options,
            cache: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn with_sink(self, sink: Box<dyn ProgressSink>) -> Self {
        self.store.set_sink(sink);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> Receiver<ProgressChange> {
        self.store.subscribe()
    }

    /// Load saved progress, reconciling it against the current catalog.
    pub fn restore(&self, persisted: &PersistedProgress) -> RestoreReport {
        let mut report = self.store.restore(persisted);
        report.catalog_changed = persisted
            .catalog_fingerprint
            .as_deref()
            .is_some_and(|saved| saved != self.catalog.fingerprint());
        if report.catalog_changed {
            warn!(
                dropped = report.dropped.len(),
                "saved progress was recorded against a different catalog"
            );
        }
        report
    }

    pub fn persisted(&self) -> PersistedProgress {
        self.store.persisted()
    }

    pub fn get_status(&self, node: &NodeId) -> Result<DerivedStatus, ProgressError> {
        self.store.status(node)
    }

    pub fn is_completed(&self, node: &NodeId) -> bool {
        self.store.is_completed(node)
    }

    /// Status of every node, in topological order.
    pub fn statuses(&self) -> Vec<(NodeId, DerivedStatus)> {
        let snapshot = self.snapshot();
        self.graph
            .topological_order()
            .iter()
            .filter_map(|node| {
                derive_status(&self.graph, &snapshot.state, node).map(|s| (node.clone(), s))
            })
            .collect()
    }

    /// Direct prerequisites of `node` that are not completed yet.
    pub fn missing_prerequisites(&self, node: &NodeId) -> Result<Vec<NodeId>, ProgressError> {
        let snapshot = self.snapshot();
        missing_prerequisites(&self.graph, &snapshot.state, node)
            .ok_or_else(|| ProgressError::UnknownNode(node.clone()))
    }

    pub fn mark_complete(&self, node: &NodeId) -> Result<ProgressChange, ProgressError> {
        self.store.mark_complete(node)
    }

    pub fn mark_incomplete(&self, node: &NodeId) -> Result<ProgressChange, ProgressError> {
        self.store.mark_incomplete(node)
    }

    pub fn toggle(&self, node: &NodeId) -> Result<ProgressChange, ProgressError> {
        self.store.toggle(node)
    }

    /// Complete levels `1..=level` of a station and retract the ones above.
    pub fn set_station_level(
        &self,
        station: &StationId,
        level: u32,
    ) -> Result<ProgressChange, ProgressError> {
        let found = self
            .catalog
            .station(station)
            .ok_or_else(|| ProgressError::UnknownStation(station.clone()))?;
        let max = found.max_level();
        if level > max {
            return Err(ProgressError::StationLevelOutOfRange {
                station: station.clone(),
                level,
                max,
            });
        }
        let count = usize::try_from(level).unwrap_or(usize::MAX);
        self.store.set_levels_completed(&found.levels, count)
    }

    pub fn station_summaries(&self) -> Vec<StationSummary> {
        let snapshot = self.snapshot();
        let state: &ProgressState = &snapshot.state;
        self.catalog
            .stations()
            .map(|station| {
                let completed = station
                    .levels
                    .iter()
                    .take_while(|id| state.completed_levels().contains(*id))
                    .count();
                let next_level = station.levels.get(completed).cloned();
                let next_status = next_level
                    .as_ref()
                    .and_then(|id| derive_status(&self.graph, state, &NodeId::level(id)));
                StationSummary {
                    station_id: station.id.clone(),
                    name: station.name.clone(),
                    current_level: u32::try_from(completed).unwrap_or(u32::MAX),
                    max_level: station.max_level(),
                    next_level,
                    next_status,
                }
            })
            .collect()
    }

    /// Aggregated requirements using the configured default options.
    pub fn aggregated_requirements(&self) -> Result<Arc<Aggregation>, CatalogError> {
        self.get_aggregated_requirements(&self.options.aggregation)
    }

    /// Aggregated item requirements for the current progress.
    ///
    /// The last result is memoized by store version and options.
    pub fn get_aggregated_requirements(
        &self,
        options: &AggregationOptions,
    ) -> Result<Arc<Aggregation>, CatalogError> {
        let snapshot = self.snapshot();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref()
            && cached.version == snapshot.version
            && cached.options == *options
        {
            debug!(version = snapshot.version, "aggregation cache hit");
            return Ok(Arc::clone(&cached.result));
        }
        let result = Arc::new(aggregate(
            &self.catalog,
            &self.graph,
            &snapshot.state,
            options,
        )?);
        *cache = Some(CachedAggregation {
            version: snapshot.version,
            options: options.clone(),
            result: Arc::clone(&result),
        });
        Ok(result)
    }

    pub fn active_markers(&self) -> ActiveMarkers {
        let snapshot = self.snapshot();
        active_markers(
            &self.catalog,
            &self.graph,
            &snapshot.state,
            &self.options.overlay,
        )
    }

    /// Active marker ids on one map.
    pub fn get_active_markers(&self, map: &MapId) -> Result<BTreeSet<MarkerId>, ProgressError> {
        if self.catalog.map(map).is_none() {
            return Err(ProgressError::UnknownMap(map.clone()));
        }
        Ok(self
            .active_markers()
            .by_map
            .remove(map)
            .unwrap_or_default())
    }
}
