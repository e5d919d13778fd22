#![deny(unsafe_code)]

//! Validated, immutable game-data tables.
//!
//! A [`Catalog`] is built once per session from [`CatalogData`]. Building it
//! checks ids for duplicates, resolves every item and marker reference and
//! checks that station levels are numbered 1..N. Prerequisite references are
//! resolved later by the graph builder.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;

use raidplan_model::{
    CatalogData, HideoutLevelRecord, ItemId, ItemRecord, ItemRequirement, LevelId, MapId,
    MapRecord, MarkerId, MarkerRecord, NodeId, QuestId, QuestRecord, StationId,
};
use tracing::info;

use crate::error::CatalogError;
use crate::hash::sha256_hex;

/// A hideout station with its levels in order (index 0 is level 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub levels: Vec<LevelId>,
}

impl Station {
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX)
    }

    /// Level id for a 1-based level number.
    pub fn level_id(&self, level: u32) -> Option<&LevelId> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        self.levels.get(index)
    }
}

/// One item requirement of a node, with the objective it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRequirement<'a> {
    /// Objective index for quests, `None` for hideout levels.
    pub objective_index: Option<usize>,
    pub requirement: &'a ItemRequirement,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    items: BTreeMap<ItemId, ItemRecord>,
    quests: BTreeMap<QuestId, QuestRecord>,
    levels: BTreeMap<LevelId, HideoutLevelRecord>,
    stations: BTreeMap<StationId, Station>,
    maps: BTreeMap<MapId, MapRecord>,
    markers: BTreeMap<MarkerId, MarkerRecord>,
    fingerprint: String,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        let fingerprint = sha256_hex(&serde_json::to_vec(&data)?);
        let CatalogData {
            items: item_records,
            quests: quest_records,
            hideout_stations,
            hideout_levels,
            maps: map_records,
            markers: marker_records,
        } = data;

        let mut items = BTreeMap::new();
        for item in item_records {
            insert_unique(&mut items, item.id.clone(), item, "item")?;
        }

        let mut quests = BTreeMap::new();
        for quest in quest_records {
            let node = NodeId::quest(&quest.id);
            for objective in &quest.objectives {
                check_requirements(&items, &node, &objective.required_items)?;
            }
            let unknown_provided = quest
                .provided_item_ids
                .iter()
                .find(|id| !items.contains_key(*id));
            if let Some(item) = unknown_provided {
                return Err(CatalogError::UnresolvedItem {
                    node,
                    item: item.clone(),
                });
            }
            insert_unique(&mut quests, quest.id.clone(), quest, "quest")?;
        }

        let mut station_names = BTreeMap::new();
        for station in hideout_stations {
            insert_unique(&mut station_names, station.id, station.name, "station")?;
        }

        let mut levels = BTreeMap::new();
        let mut by_station: BTreeMap<StationId, Vec<(u32, LevelId)>> = BTreeMap::new();
        for level in hideout_levels {
            check_requirements(&items, &NodeId::level(&level.id), &level.required_items)?;
            by_station
                .entry(level.station_id.clone())
                .or_default()
                .push((level.level, level.id.clone()));
            insert_unique(&mut levels, level.id.clone(), level, "hideout level")?;
        }

        let mut stations = BTreeMap::new();
        for (station_id, mut numbered) in by_station {
            numbered.sort();
            for (expected, (level, _)) in (1u32..).zip(&numbered) {
                if *level != expected {
                    return Err(CatalogError::InvalidStationLevels {
                        station: station_id,
                        message: format!("expected level {expected}, found level {level}"),
                    });
                }
            }
            let name = station_names
                .remove(&station_id)
                .unwrap_or_else(|| station_id.to_string());
            stations.insert(
                station_id.clone(),
                Station {
                    id: station_id,
                    name,
                    levels: numbered.into_iter().map(|(_, id)| id).collect(),
                },
            );
        }
        // Declared stations without any level are kept as empty stations.
        for (station_id, name) in station_names {
            stations.insert(
                station_id.clone(),
                Station {
                    id: station_id,
                    name,
                    levels: Vec::new(),
                },
            );
        }

        let mut maps = BTreeMap::new();
        for map in map_records {
            insert_unique(&mut maps, map.id.clone(), map, "map")?;
        }

        let mut markers = BTreeMap::new();
        for marker in marker_records {
            if !maps.contains_key(&marker.map_id) {
                return Err(CatalogError::UnresolvedMap {
                    marker: marker.id,
                    map: marker.map_id,
                });
            }
            if let Some(objective) = &marker.objective {
                let resolved = quests
                    .get(&objective.quest_id)
                    .is_some_and(|quest: &QuestRecord| {
                        objective.objective_index < quest.objectives.len()
                    });
                if !resolved {
                    return Err(CatalogError::UnresolvedObjective {
                        marker: marker.id.clone(),
                        quest: objective.quest_id.clone(),
                        objective_index: objective.objective_index,
                    });
                }
            }
            insert_unique(&mut markers, marker.id.clone(), marker, "marker")?;
        }

        info!(
            items = items.len(),
            quests = quests.len(),
            hideout_levels = levels.len(),
            stations = stations.len(),
            maps = maps.len(),
            markers = markers.len(),
            "catalog validated"
        );

        Ok(Self {
            items,
            quests,
            levels,
            stations,
            maps,
            markers,
            fingerprint,
        })
    }

    /// SHA-256 (hex) of the catalog input.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn item(&self, id: &ItemId) -> Option<&ItemRecord> {
        self.items.get(id)
    }

    pub fn quest(&self, id: &QuestId) -> Option<&QuestRecord> {
        self.quests.get(id)
    }

    pub fn level(&self, id: &LevelId) -> Option<&HideoutLevelRecord> {
        self.levels.get(id)
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn map(&self, id: &MapId) -> Option<&MapRecord> {
        self.maps.get(id)
    }

    pub fn marker(&self, id: &MarkerId) -> Option<&MarkerRecord> {
        self.markers.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.values()
    }

    pub fn quests(&self) -> impl Iterator<Item = &QuestRecord> {
        self.quests.values()
    }

    pub fn levels(&self) -> impl Iterator<Item = &HideoutLevelRecord> {
        self.levels.values()
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn maps(&self) -> impl Iterator<Item = &MapRecord> {
        self.maps.values()
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerRecord> {
        self.markers.values()
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        match node {
            NodeId::Quest(id) => self.quests.contains_key(id),
            NodeId::HideoutLevel(id) => self.levels.contains_key(id),
        }
    }

    /// Display name of a node, if it exists.
    pub fn node_name(&self, node: &NodeId) -> Option<String> {
        match node {
            NodeId::Quest(id) => self.quest(id).map(|quest| quest.name.clone()),
            NodeId::HideoutLevel(id) => self.level(id).map(|level| {
                let station = self
                    .station(&level.station_id)
                    .map_or_else(|| level.station_id.to_string(), |s| s.name.clone());
                format!("{station} {}", level.level)
            }),
        }
    }

    /// Whether `node` is a quest that hands out `item` when it starts.
    pub fn provides(&self, node: &NodeId, item: &ItemId) -> bool {
        match node {
            NodeId::Quest(id) => self
                .quest(id)
                .is_some_and(|quest| quest.provided_item_ids.contains(item)),
            NodeId::HideoutLevel(_) => false,
        }
    }

    /// Item requirements of a node: quest objective items or the build cost of
    /// a hideout level. `None` for unknown nodes.
    pub fn requirements_of(&self, node: &NodeId) -> Option<Vec<NodeRequirement<'_>>> {
        match node {
            NodeId::Quest(id) => self.quest(id).map(|quest| {
                quest
                    .objectives
                    .iter()
                    .enumerate()
                    .flat_map(|(index, objective)| {
                        objective
                            .required_items
                            .iter()
                            .map(move |requirement| NodeRequirement {
                                objective_index: Some(index),
                                requirement,
                            })
                    })
                    .collect()
            }),
            NodeId::HideoutLevel(id) => self.level(id).map(|level| {
                level
                    .required_items
                    .iter()
                    .map(|requirement| NodeRequirement {
                        objective_index: None,
                        requirement,
                    })
                    .collect()
            }),
        }
    }
}

fn insert_unique<K, V>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    kind: &'static str,
) -> Result<(), CatalogError>
where
    K: Ord + ToString,
{
    match map.entry(key) {
        Entry::Occupied(entry) => Err(CatalogError::DuplicateId {
            kind,
            id: entry.key().to_string(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

fn check_requirements(
    items: &BTreeMap<ItemId, ItemRecord>,
    node: &NodeId,
    requirements: &[ItemRequirement],
) -> Result<(), CatalogError> {
    for requirement in requirements {
        if !items.contains_key(&requirement.item_id) {
            return Err(CatalogError::UnresolvedItem {
                node: node.clone(),
                item: requirement.item_id.clone(),
            });
        }
        if requirement.quantity == 0 {
            return Err(CatalogError::InvalidQuantity {
                node: node.clone(),
                item: requirement.item_id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(json: &str) -> Result<Catalog, CatalogError> {
        Catalog::from_json_str(json)
    }

    #[test]
    fn groups_station_levels_in_order() {
        let catalog = catalog(
            r#"{
                "hideoutStations": [{"id": "stash", "name": "Stash"}],
                "hideoutLevels": [
                    {"id": "stash-2", "stationId": "stash", "level": 2},
                    {"id": "stash-1", "stationId": "stash", "level": 1},
                    {"id": "vents-1", "stationId": "vents", "level": 1}
                ]
            }"#,
        )
        .expect("catalog");
        let stash = catalog.station(&StationId::new("stash").unwrap()).unwrap();
        assert_eq!(stash.name, "Stash");
        assert_eq!(stash.max_level(), 2);
        assert_eq!(stash.level_id(2).map(LevelId::as_str), Some("stash-2"));
        assert_eq!(stash.level_id(0), None);
        let vents = catalog.station(&StationId::new("vents").unwrap()).unwrap();
        assert_eq!(vents.name, "vents");
    }

    #[test]
    fn rejects_gap_in_station_levels() {
        let error = catalog(
            r#"{"hideoutLevels": [
                {"id": "stash-1", "stationId": "stash", "level": 1},
                {"id": "stash-3", "stationId": "stash", "level": 3}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(error, CatalogError::InvalidStationLevels { .. }));
    }

    #[test]
    fn rejects_unknown_item() {
        let error = catalog(
            r#"{"quests": [{"id": "q", "name": "Q", "objectives": [
                {"requiredItems": [{"itemId": "ghost", "quantity": 1}]}
            ]}]}"#,
        )
        .unwrap_err();
        match error {
            CatalogError::UnresolvedItem { node, item } => {
                assert_eq!(node.to_string(), "quest:q");
                assert_eq!(item.as_str(), "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn provided_items_must_exist() {
        let json = r#"{
            "items": [{"id": "flyer", "name": "Flyer"}],
            "quests": [{"id": "q", "name": "Q", "providedItemIds": ["flyer"]}]
        }"#;
        let loaded = catalog(json).expect("catalog");
        let quest: NodeId = "quest:q".parse().unwrap();
        assert!(loaded.provides(&quest, &ItemId::new("flyer").unwrap()));
        assert!(!loaded.provides(&quest, &ItemId::new("bolts").unwrap()));

        let error = catalog(&json.replace(r#"["flyer"]"#, r#"["ghost"]"#)).unwrap_err();
        assert_eq!(error.to_string(), "quest:q references unknown item ghost");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let error = catalog(
            r#"{"items": [{"id": "a", "name": "A"}, {"id": "a", "name": "Again"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(error, CatalogError::DuplicateId { kind: "item", .. }));
    }

    #[test]
    fn rejects_marker_for_missing_objective() {
        let error = catalog(
            r#"{
                "quests": [{"id": "q", "name": "Q", "objectives": [{}]}],
                "maps": [{"id": "woods", "name": "Woods"}],
                "markers": [{"id": "m", "mapId": "woods", "coordinate": {"x": 0, "y": 0},
                             "objective": {"questId": "q", "objectiveIndex": 1}}]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(error, CatalogError::UnresolvedObjective { objective_index: 1, .. }));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = catalog(r#"{"items": [{"id": "a", "name": "A"}]}"#).unwrap();
        let b = catalog(r#"{"items": [{"id": "a", "name": "A"}]}"#).unwrap();
        let c = catalog(r#"{"items": [{"id": "a", "name": "B"}]}"#).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn enumerates_objective_requirements() {
        let catalog = catalog(
            r#"{
                "items": [{"id": "bolts", "name": "Bolts"}],
                "quests": [{"id": "q", "name": "Q", "objectives": [
                    {},
                    {"requiredItems": [{"itemId": "bolts", "quantity": 4}]}
                ]}]
            }"#,
        )
        .unwrap();
        let node: NodeId = "quest:q".parse().unwrap();
        let requirements = catalog.requirements_of(&node).unwrap();
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].objective_index, Some(1));
        assert_eq!(requirements[0].requirement.quantity, 4);
        assert!(catalog.requirements_of(&"quest:nope".parse().unwrap()).is_none());
    }
}
