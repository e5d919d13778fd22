//! Progress tracking core for raidplan.
//!
//! Quests and hideout levels form a dependency graph built once from a
//! validated [`Catalog`]. Player progress lives in a [`ProgressStore`]; node
//! status, aggregated item requirements and active map markers are pure
//! functions of a progress snapshot. [`Tracker`] wires these together.

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod graph;
pub mod hash;
pub mod options;
pub mod overlay;
pub mod progress;
pub mod status;
pub mod tracker;
mod writer;

pub use aggregate::{
    AggregatedRequirement, Aggregation, AggregationOptions, Contribution, NodeScope,
    OwnedQuantities, Selection, aggregate, aggregate_nodes, apply_owned, merge, select_nodes,
};
pub use catalog::{Catalog, NodeRequirement, Station};
pub use error::{CatalogError, ProgressError};
pub use graph::DependencyGraph;
pub use options::TrackerOptions;
pub use overlay::{ActiveMarkers, OverlayOptions, active_markers, is_marker_active};
pub use progress::{
    DropReason, DroppedId, ProgressChange, ProgressSink, ProgressSnapshot, ProgressState,
    ProgressStore, RestoreReport, retraction_set,
};
pub use status::{derive_status, missing_prerequisites, unlock_distances};
pub use tracker::{StationSummary, Tracker};
