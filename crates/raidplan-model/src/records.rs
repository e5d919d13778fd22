//! Normalized catalog records as they arrive from the game-data loader.
//!
//! These are the wire form of the catalog. Field names are camelCase and
//! unknown fields are rejected so that malformed records never reach the
//! dependency graph.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, LevelId, MapId, MarkerId, QuestId, StationId};

/// The complete catalog input for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CatalogData {
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub quests: Vec<QuestRecord>,
    /// Optional station names. Stations referenced only by levels are
    /// still recognized, named after their id.
    #[serde(default)]
    pub hideout_stations: Vec<StationRecord>,
    #[serde(default)]
    pub hideout_levels: Vec<HideoutLevelRecord>,
    #[serde(default)]
    pub maps: Vec<MapRecord>,
    #[serde(default)]
    pub markers: Vec<MarkerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuestRecord {
    pub id: QuestId,
    pub name: String,
    #[serde(default)]
    pub prerequisite_quest_ids: Vec<QuestId>,
    #[serde(default)]
    pub prerequisite_hideout_level_ids: Vec<LevelId>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveRecord>,
    /// Items handed to the player when the quest starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provided_item_ids: Vec<ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectiveRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required_items: Vec<ItemRequirement>,
}

/// Whether a hand-in consumes the items or only requires holding them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    #[default]
    Consumed,
    Kept,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemRequirement {
    pub item_id: ItemId,
    pub quantity: u32,
    /// Item must have been found in raid (cannot be bought).
    #[serde(default)]
    pub found_in_raid: bool,
    #[serde(default)]
    pub disposition: Disposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StationRecord {
    pub id: StationId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HideoutLevelRecord {
    pub id: LevelId,
    pub station_id: StationId,
    /// 1-based level number within the station.
    pub level: u32,
    #[serde(default)]
    pub prerequisite_level_ids: Vec<LevelId>,
    #[serde(default)]
    pub prerequisite_quest_ids: Vec<QuestId>,
    #[serde(default)]
    pub required_items: Vec<ItemRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MapRecord {
    pub id: MapId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

/// Points at one objective of a quest (0-based index into `objectives`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectiveRef {
    pub quest_id: QuestId,
    pub objective_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarkerRecord {
    pub id: MarkerId,
    pub map_id: MapId,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    /// `None` marks a landmark that is always shown.
    #[serde(default)]
    pub objective: Option<ObjectiveRef>,
}
