//! Data model for raidplan: typed ids, catalog records, derived status and
//! the persisted progress shape.

pub mod error;
pub mod ids;
pub mod records;
pub mod snapshot;
pub mod status;

pub use error::{ModelError, Result};
pub use ids::{ItemId, LevelId, MapId, MarkerId, NodeId, QuestId, StationId};
pub use records::{
    CatalogData, Coordinate, Disposition, HideoutLevelRecord, ItemRecord, ItemRequirement,
    MapRecord, MarkerRecord, ObjectiveRecord, ObjectiveRef, QuestRecord, StationRecord,
};
pub use snapshot::{CURRENT_SCHEMA_VERSION, PROGRESS_SCHEMA, PersistedProgress};
pub use status::DerivedStatus;
