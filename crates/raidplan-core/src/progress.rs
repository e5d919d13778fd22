#![deny(unsafe_code)]

//! The progress store: the only mutable state of the tracker.
//!
//! Every mutation runs under one mutex, including its cascade and the change
//! notification. The state itself is swapped as a whole (`Arc` replacement),
//! so readers holding a [`ProgressSnapshot`] never observe a half-applied
//! cascade. Write-through to the attached [`ProgressSink`] happens on a
//! background writer; the lock is released before any sink I/O.

use std::collections::{BTreeSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use raidplan_model::{DerivedStatus, LevelId, NodeId, PersistedProgress, QuestId};
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::error::ProgressError;
use crate::graph::DependencyGraph;
use crate::status::{derive_status, missing_prerequisites};
use crate::writer::{PersistStatus, PersistWriter};

/// Completed quest and hideout-level ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    completed_quests: BTreeSet<QuestId>,
    completed_levels: BTreeSet<LevelId>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from raw completed nodes without checking prerequisites.
    ///
    /// Meant for read-only computations over hypothetical progress; use
    /// [`ProgressStore`] for invariant-checked mutation.
    pub fn with_completed<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut state = Self::default();
        for node in nodes {
            state.insert(&node);
        }
        state
    }

    pub fn is_completed(&self, node: &NodeId) -> bool {
        match node {
            NodeId::Quest(id) => self.completed_quests.contains(id),
            NodeId::HideoutLevel(id) => self.completed_levels.contains(id),
        }
    }

    pub fn completed_quests(&self) -> &BTreeSet<QuestId> {
        &self.completed_quests
    }

    pub fn completed_levels(&self) -> &BTreeSet<LevelId> {
        &self.completed_levels
    }

    pub fn completed_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.completed_quests
            .iter()
            .map(NodeId::quest)
            .chain(self.completed_levels.iter().map(NodeId::level))
    }

    pub fn len(&self) -> usize {
        self.completed_quests.len() + self.completed_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed_quests.is_empty() && self.completed_levels.is_empty()
    }

    fn insert(&mut self, node: &NodeId) -> bool {
        match node {
            NodeId::Quest(id) => self.completed_quests.insert(id.clone()),
            NodeId::HideoutLevel(id) => self.completed_levels.insert(id.clone()),
        }
    }

    fn remove(&mut self, node: &NodeId) -> bool {
        match node {
            NodeId::Quest(id) => self.completed_quests.remove(id),
            NodeId::HideoutLevel(id) => self.completed_levels.remove(id),
        }
    }

    pub fn to_persisted(&self, catalog_fingerprint: Option<String>) -> PersistedProgress {
        PersistedProgress::new(
            self.completed_quests.iter().map(ToString::to_string),
            self.completed_levels.iter().map(ToString::to_string),
        )
        .with_catalog_fingerprint(catalog_fingerprint)
    }
}

/// Emitted after every mutation that changed the completed sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressChange {
    /// Store version after the mutation.
    pub version: u64,
    pub completed: BTreeSet<NodeId>,
    pub retracted: BTreeSet<NodeId>,
}

impl ProgressChange {
    fn unchanged(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.retracted.is_empty()
    }

    /// Every node whose status may have changed: the mutated nodes and
    /// their direct dependents.
    ///
    /// Dependents further down stay locked either way, since their direct
    /// prerequisite is incomplete before and after the change.
    pub fn affected(&self, graph: &DependencyGraph) -> BTreeSet<NodeId> {
        let mut affected: BTreeSet<NodeId> =
            self.completed.union(&self.retracted).cloned().collect();
        for node in self.completed.iter().chain(&self.retracted) {
            affected.extend(graph.dependents_of(node).into_iter().flatten().cloned());
        }
        affected
    }
}

/// A consistent view of the store at one version.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub version: u64,
    pub state: Arc<ProgressState>,
}

/// Write-through target for progress.
///
/// Called from the store's writer thread once per committed version, in
/// commit order.
pub trait ProgressSink: Send + Sync {
    fn persist(
        &self,
        progress: &PersistedProgress,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Why a persisted id was dropped on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropReason {
    /// Not a valid id, or no longer present in the catalog.
    UnknownId,
    /// Its prerequisites are not completed in the restored state.
    PrerequisitesMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedId {
    pub id: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub restored: usize,
    pub dropped: Vec<DroppedId>,
    /// The progress was recorded against a different catalog.
    pub catalog_changed: bool,
}

struct StoreInner {
    state: Arc<ProgressState>,
    version: u64,
    subscribers: Vec<Sender<ProgressChange>>,
    writer: Option<PersistWriter>,
}

pub struct ProgressStore {
    graph: Arc<DependencyGraph>,
    catalog_fingerprint: Option<String>,
    inner: Mutex<StoreInner>,
    persist_status: PersistStatus,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ProgressStore")
            .field("version", &snapshot.version)
            .field("completed", &snapshot.state.len())
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    pub fn new(graph: Arc<DependencyGraph>) -> Self {
        Self {
            graph,
            catalog_fingerprint: None,
            inner: Mutex::new(StoreInner {
                state: Arc::new(ProgressState::default()),
                version: 0,
                subscribers: Vec::new(),
                writer: None,
            }),
            persist_status: PersistStatus::default(),
        }
    }

    /// Record the catalog fingerprint in every persisted snapshot.
    #[must_use]
    pub fn with_catalog_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.catalog_fingerprint = Some(fingerprint.into());
        self
    }

    #[must_use]
    pub fn with_sink(self, sink: Box<dyn ProgressSink>) -> Self {
        self.set_sink(sink);
        self
    }

    /// Attach a write-through sink, replacing any previous one.
    ///
    /// The previous sink finishes its queued saves before the new one takes
    /// over, so saves never reach the file out of order.
    pub fn set_sink(&self, sink: Box<dyn ProgressSink>) {
        let writer = PersistWriter::spawn(sink, Arc::clone(&self.persist_status));
        let mut inner = self.lock();
        drop(inner.writer.replace(writer));
    }

    pub fn graph(&self) -> &Arc<DependencyGraph> {
        &self.graph
    }

    pub fn catalog_fingerprint(&self) -> Option<&str> {
        self.catalog_fingerprint.as_deref()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let inner = self.lock();
        ProgressSnapshot {
            version: inner.version,
            state: Arc::clone(&inner.state),
        }
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// The error message of the last failed write-through, if the most
    /// recent persistence attempt failed.
    ///
    /// Saves run in the background; call [`flush`](Self::flush) first to
    /// observe the outcome of a mutation that just returned.
    pub fn last_persist_error(&self) -> Option<String> {
        self.persist_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until every save queued so far has reached the sink.
    pub fn flush(&self) {
        let marker = self.lock().writer.as_ref().map(PersistWriter::flush_marker);
        if let Some(marker) = marker {
            let _ = marker.recv();
        }
    }

    /// Receive a [`ProgressChange`] after every mutation.
    pub fn subscribe(&self) -> Receiver<ProgressChange> {
        let (tx, rx) = mpsc::channel();
        self.lock().subscribers.push(tx);
        rx
    }

    pub fn persisted(&self) -> PersistedProgress {
        self.snapshot()
            .state
            .to_persisted(self.catalog_fingerprint.clone())
    }

    pub fn is_completed(&self, node: &NodeId) -> bool {
        self.lock().state.is_completed(node)
    }

    pub fn status(&self, node: &NodeId) -> Result<DerivedStatus, ProgressError> {
        let snapshot = self.snapshot();
        derive_status(&self.graph, &snapshot.state, node)
            .ok_or_else(|| ProgressError::UnknownNode(node.clone()))
    }

    pub fn mark_complete(&self, node: &NodeId) -> Result<ProgressChange, ProgressError> {
        let span = info_span!("mark_complete", node = %node);
        let _guard = span.enter();
        let mut inner = self.lock();
        self.complete_locked(&mut inner, node)
    }

    /// Retract a node and every completed node that depends on it.
    ///
    /// The returned change lists the full retracted set, not only `node`.
    pub fn mark_incomplete(&self, node: &NodeId) -> Result<ProgressChange, ProgressError> {
        let span = info_span!("mark_incomplete", node = %node);
        let _guard = span.enter();
        if !self.graph.contains(node) {
            return Err(ProgressError::UnknownNode(node.clone()));
        }
        let mut inner = self.lock();
        self.retract_locked(&mut inner, node)
    }

    /// Flip completion of `node`. The branch is decided under the same lock
    /// that applies it.
    pub fn toggle(&self, node: &NodeId) -> Result<ProgressChange, ProgressError> {
        let span = info_span!("toggle", node = %node);
        let _guard = span.enter();
        if !self.graph.contains(node) {
            return Err(ProgressError::UnknownNode(node.clone()));
        }
        let mut inner = self.lock();
        if inner.state.is_completed(node) {
            self.retract_locked(&mut inner, node)
        } else {
            self.complete_locked(&mut inner, node)
        }
    }

    fn complete_locked(
        &self,
        inner: &mut StoreInner,
        node: &NodeId,
    ) -> Result<ProgressChange, ProgressError> {
        let missing = missing_prerequisites(&self.graph, &inner.state, node)
            .ok_or_else(|| ProgressError::UnknownNode(node.clone()))?;
        if inner.state.is_completed(node) {
            return Ok(ProgressChange::unchanged(inner.version));
        }
        if !missing.is_empty() {
            return Err(ProgressError::PrerequisitesUnmet {
                node: node.clone(),
                missing,
            });
        }
        let mut next = ProgressState::clone(&inner.state);
        next.insert(node);
        let change = ProgressChange {
            completed: BTreeSet::from([node.clone()]),
            ..ProgressChange::default()
        };
        Ok(self.commit(inner, next, change))
    }

    fn retract_locked(
        &self,
        inner: &mut StoreInner,
        node: &NodeId,
    ) -> Result<ProgressChange, ProgressError> {
        let retracted = retraction_set(&self.graph, &inner.state, node);
        if retracted.is_empty() {
            return Ok(ProgressChange::unchanged(inner.version));
        }
        let mut next = ProgressState::clone(&inner.state);
        for id in &retracted {
            next.remove(id);
        }
        let change = ProgressChange {
            retracted,
            ..ProgressChange::default()
        };
        Ok(self.commit(inner, next, change))
    }

    /// Make exactly the first `level` entries of `station_levels` completed.
    ///
    /// Levels above `level` are retracted with their cascade, then levels
    /// `1..=level` are completed in order. Fails without any change if a
    /// level's prerequisites outside the station are not completed.
    pub fn set_levels_completed(
        &self,
        station_levels: &[LevelId],
        level: usize,
    ) -> Result<ProgressChange, ProgressError> {
        let span = info_span!("set_station_level", level);
        let _guard = span.enter();
        let mut inner = self.lock();
        let mut next = ProgressState::clone(&inner.state);
        let mut retracted = BTreeSet::new();
        let mut completed = BTreeSet::new();

        for id in station_levels.iter().skip(level) {
            let node = NodeId::level(id);
            let cascade = retraction_set(&self.graph, &next, &node);
            for removed in &cascade {
                next.remove(removed);
            }
            retracted.extend(cascade);
        }

        for id in station_levels.iter().take(level) {
            let node = NodeId::level(id);
            if next.is_completed(&node) {
                continue;
            }
            let missing = missing_prerequisites(&self.graph, &next, &node)
                .ok_or_else(|| ProgressError::UnknownNode(node.clone()))?;
            if !missing.is_empty() {
                return Err(ProgressError::PrerequisitesUnmet { node, missing });
            }
            next.insert(&node);
            completed.insert(node);
        }

        if completed.is_empty() && retracted.is_empty() {
            return Ok(ProgressChange::unchanged(inner.version));
        }
        let change = ProgressChange {
            completed,
            retracted,
            ..ProgressChange::default()
        };
        Ok(self.commit(&mut inner, next, change))
    }

    /// Replace the state with persisted progress, dropping ids the catalog no
    /// longer knows and ids whose prerequisites did not survive.
    pub fn restore(&self, persisted: &PersistedProgress) -> RestoreReport {
        let span = info_span!("restore", quests = persisted.completed_quest_ids.len(),
            levels = persisted.completed_hideout_level_ids.len());
        let _guard = span.enter();
        let mut report = RestoreReport::default();
        let mut requested = BTreeSet::new();

        let quests = persisted
            .completed_quest_ids
            .iter()
            .map(|raw| (raw, QuestId::new(raw.as_str()).ok().map(NodeId::Quest)));
        let levels = persisted
            .completed_hideout_level_ids
            .iter()
            .map(|raw| (raw, LevelId::new(raw.as_str()).ok().map(NodeId::HideoutLevel)));
        for (raw, node) in quests.chain(levels) {
            match node {
                Some(node) if self.graph.contains(&node) => {
                    requested.insert(node);
                }
                _ => {
                    warn!(id = %raw, "dropping unknown id from saved progress");
                    report.dropped.push(DroppedId {
                        id: raw.clone(),
                        reason: DropReason::UnknownId,
                    });
                }
            }
        }

        let mut next = ProgressState::default();
        for node in self.graph.topological_order() {
            if !requested.contains(node) {
                continue;
            }
            let satisfied = self
                .graph
                .prerequisites_of(node)
                .into_iter()
                .flatten()
                .all(|p| next.is_completed(p));
            if satisfied {
                next.insert(node);
            } else {
                warn!(id = %node, "dropping saved completion with incomplete prerequisites");
                report.dropped.push(DroppedId {
                    id: node.raw().to_string(),
                    reason: DropReason::PrerequisitesMissing,
                });
            }
        }
        report.restored = next.len();

        let mut inner = self.lock();
        let previous: BTreeSet<NodeId> = inner.state.completed_nodes().collect();
        let current: BTreeSet<NodeId> = next.completed_nodes().collect();
        let change = ProgressChange {
            completed: current.difference(&previous).cloned().collect(),
            retracted: previous.difference(&current).cloned().collect(),
            ..ProgressChange::default()
        };
        if !change.is_empty() {
            self.commit(&mut inner, next, change);
        }
        info!(
            restored = report.restored,
            dropped = report.dropped.len(),
            "progress restored"
        );
        report
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // The state is only ever replaced whole, so a poisoned lock still
        // guards a consistent value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(
        &self,
        inner: &mut StoreInner,
        next: ProgressState,
        mut change: ProgressChange,
    ) -> ProgressChange {
        inner.version += 1;
        inner.state = Arc::new(next);
        change.version = inner.version;

        // Queued under the lock so the writer sees versions in order.
        if let Some(writer) = &inner.writer {
            writer.save(
                inner.version,
                Arc::clone(&inner.state),
                self.catalog_fingerprint.clone(),
            );
        }

        inner
            .subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
        info!(
            version = change.version,
            completed = change.completed.len(),
            retracted = change.retracted.len(),
            "progress updated"
        );
        change
    }
}

/// Nodes removed when `node` is retracted: `node` itself (if completed) and
/// every completed node reachable through reverse edges.
///
/// Returns an empty set when `node` is not completed.
pub fn retraction_set(
    graph: &DependencyGraph,
    state: &ProgressState,
    node: &NodeId,
) -> BTreeSet<NodeId> {
    let mut retracted = BTreeSet::new();
    if !state.is_completed(node) {
        return retracted;
    }
    let mut queue = VecDeque::from([node.clone()]);
    while let Some(current) = queue.pop_front() {
        if !retracted.insert(current.clone()) {
            continue;
        }
        for dependent in graph.dependents_of(&current).into_iter().flatten() {
            if state.is_completed(dependent) && !retracted.contains(dependent) {
                queue.push_back(dependent.clone());
            }
        }
    }
    retracted
}
