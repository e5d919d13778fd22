//! A tracker wired to a progress file through `JsonFileSink`.

use raidplan_core::{Catalog, Tracker};
use raidplan_model::NodeId;
use raidplan_persistence::{JsonFileSink, load_progress};
use tempfile::tempdir;

const CATALOG: &str = r#"{
    "quests": [
        {"id": "debut", "name": "Debut"},
        {"id": "shootout", "name": "Shootout picnic", "prerequisiteQuestIds": ["debut"]}
    ],
    "hideoutLevels": [{"id": "stash-1", "stationId": "stash", "level": 1}]
}"#;

fn node(id: &str) -> NodeId {
    id.parse().unwrap()
}

fn tracker() -> Tracker {
    Tracker::new(Catalog::from_json_str(CATALOG).unwrap()).unwrap()
}

#[test]
fn every_mutation_is_written_through() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    let tracker = tracker().with_sink(Box::new(JsonFileSink::new(&path)));

    tracker.mark_complete(&node("quest:debut")).unwrap();
    tracker.mark_complete(&node("quest:shootout")).unwrap();
    tracker.mark_complete(&node("level:stash-1")).unwrap();
    tracker.store().flush();

    let mut saved = load_progress(&path).unwrap();
    assert!(saved.saved_at.take().is_some());
    assert_eq!(saved.catalog_fingerprint.take().map(|f| f.len()), Some(64));
    insta::assert_json_snapshot!(saved, @r#"
    {
      "schema": "raidplan.progress",
      "schemaVersion": 1,
      "catalogFingerprint": null,
      "savedAt": null,
      "completedQuestIds": [
        "debut",
        "shootout"
      ],
      "completedHideoutLevelIds": [
        "stash-1"
      ]
    }
    "#);

    tracker.mark_incomplete(&node("quest:debut")).unwrap();
    tracker.store().flush();
    let saved = load_progress(&path).unwrap();
    assert!(saved.completed_quest_ids.is_empty());
    assert_eq!(saved.completed_hideout_level_ids, vec!["stash-1".to_string()]);
    assert!(tracker.store().last_persist_error().is_none());
}

#[test]
fn saved_progress_restores_into_a_fresh_tracker() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    {
        let tracker = tracker().with_sink(Box::new(JsonFileSink::new(&path)));
        tracker.mark_complete(&node("quest:debut")).unwrap();
        // Dropping the tracker drains pending saves.
    }

    let restored = tracker();
    let report = restored.restore(&load_progress(&path).unwrap());
    assert_eq!(report.restored, 1);
    assert!(report.dropped.is_empty());
    assert!(!report.catalog_changed);
    assert!(restored.is_completed(&node("quest:debut")));
}

#[test]
fn unwritable_target_is_reported_without_losing_state() {
    let dir = tempdir().unwrap();
    // A directory in place of the file makes the final rename fail.
    let path = dir.path().join("progress.json");
    std::fs::create_dir(&path).unwrap();
    let tracker = tracker().with_sink(Box::new(JsonFileSink::new(&path)));

    tracker.mark_complete(&node("quest:debut")).unwrap();
    assert!(tracker.is_completed(&node("quest:debut")));
    tracker.store().flush();
    assert!(tracker.store().last_persist_error().is_some());
}
