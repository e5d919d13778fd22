//! Tests for the catalog wire format.

use raidplan_model::{
    CURRENT_SCHEMA_VERSION, CatalogData, Disposition, NodeId, PROGRESS_SCHEMA, PersistedProgress,
};

const CATALOG: &str = r#"{
    "items": [{"id": "salewa", "name": "Salewa first aid kit"}],
    "quests": [{
        "id": "shooting-cans",
        "name": "Shooting Cans",
        "prerequisiteQuestIds": ["debut"],
        "objectives": [
            {"requiredItems": [{"itemId": "salewa", "quantity": 3, "foundInRaid": true}]},
            {"description": "Hand over the rifle"}
        ]
    }],
    "hideoutLevels": [{
        "id": "medstation-1",
        "stationId": "medstation",
        "level": 1,
        "requiredItems": [{"itemId": "salewa", "quantity": 1, "disposition": "kept"}]
    }],
    "markers": [{
        "id": "m1",
        "mapId": "customs",
        "coordinate": {"x": 10.5, "y": -3.0},
        "objective": {"questId": "shooting-cans", "objectiveIndex": 0}
    }]
}"#;

#[test]
fn parses_camel_case_catalog() {
    let data: CatalogData = serde_json::from_str(CATALOG).expect("parse catalog");
    assert_eq!(data.items.len(), 1);
    let quest = &data.quests[0];
    assert_eq!(quest.prerequisite_quest_ids[0].as_str(), "debut");
    assert!(quest.prerequisite_hideout_level_ids.is_empty());
    let requirement = &quest.objectives[0].required_items[0];
    assert!(requirement.found_in_raid);
    assert_eq!(requirement.disposition, Disposition::Consumed);
    assert_eq!(
        data.hideout_levels[0].required_items[0].disposition,
        Disposition::Kept
    );
    let marker = &data.markers[0];
    assert_eq!(marker.coordinate.z, None);
    assert_eq!(marker.objective.as_ref().map(|o| o.objective_index), Some(0));
}

#[test]
fn rejects_unknown_fields() {
    let json = r#"{"items": [{"id": "a", "name": "A", "weight": 2}]}"#;
    assert!(serde_json::from_str::<CatalogData>(json).is_err());
}

#[test]
fn rejects_empty_ids_while_parsing() {
    let json = r#"{"items": [{"id": " ", "name": "Blank"}]}"#;
    let error = serde_json::from_str::<CatalogData>(json).unwrap_err();
    assert!(error.to_string().contains("item id must not be empty"));
}

#[test]
fn node_ids_serialize_as_prefixed_strings() {
    let nodes: Vec<NodeId> = vec!["quest:debut".parse().unwrap(), "level:stash-2".parse().unwrap()];
    let json = serde_json::to_string(&nodes).unwrap();
    assert_eq!(json, r#"["quest:debut","level:stash-2"]"#);
    let round: Vec<NodeId> = serde_json::from_str(&json).unwrap();
    assert_eq!(round, nodes);
}

#[test]
fn persisted_progress_defaults_to_current_schema() {
    let progress = PersistedProgress::new(["debut"], Vec::<String>::new());
    assert_eq!(progress.schema, PROGRESS_SCHEMA);
    assert_eq!(progress.schema_version, CURRENT_SCHEMA_VERSION);
    assert!(!progress.is_empty());

    let json = r#"{"schema": "raidplan.progress", "schemaVersion": 1}"#;
    let parsed: PersistedProgress = serde_json::from_str(json).unwrap();
    assert!(parsed.is_empty());
    assert_eq!(parsed.catalog_fingerprint, None);
}
