//! Integration tests for catalog/progress sessions.

use std::fs;
use std::path::{Path, PathBuf};

use raidplan_cli::config::parse_options;
use raidplan_cli::session::Session;
use raidplan_core::{AggregationOptions, ProgressError, TrackerOptions};
use raidplan_model::{ItemId, NodeId, StationId};
use raidplan_persistence::load_progress;
use tempfile::tempdir;

fn sample_catalog() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/sample-catalog.json")
}

fn node(id: &str) -> NodeId {
    id.parse().unwrap()
}

#[test]
fn test_changes_survive_reopening() {
    let dir = tempdir().unwrap();
    let progress = dir.path().join("progress.json");

    let session = Session::open(&sample_catalog(), &progress, TrackerOptions::default()).unwrap();
    session
        .apply(|tracker| tracker.mark_complete(&node("quest:debut")))
        .unwrap();
    session
        .apply(|tracker| tracker.set_station_level(&StationId::new("workbench").unwrap(), 1))
        .unwrap();
    drop(session);

    let saved = load_progress(&progress).unwrap();
    assert_eq!(saved.completed_quest_ids, vec!["debut".to_string()]);
    assert_eq!(saved.completed_hideout_level_ids, vec!["workbench-1".to_string()]);

    let reopened = Session::open(&sample_catalog(), &progress, TrackerOptions::default()).unwrap();
    assert_eq!(reopened.restore.restored, 2);
    assert!(reopened.restore.dropped.is_empty());
    assert!(reopened.tracker.is_completed(&node("level:workbench-1")));
}

#[test]
fn test_rejected_mutation_is_not_saved() {
    let dir = tempdir().unwrap();
    let progress = dir.path().join("progress.json");

    let session = Session::open(&sample_catalog(), &progress, TrackerOptions::default()).unwrap();
    let error = session
        .apply(|tracker| tracker.mark_complete(&node("quest:gunsmith-1")))
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ProgressError>(),
        Some(ProgressError::PrerequisitesUnmet { .. })
    ));
    assert!(!progress.exists());
}

#[test]
fn test_stale_ids_are_dropped_on_open() {
    let dir = tempdir().unwrap();
    let progress = dir.path().join("progress.json");
    fs::write(
        &progress,
        r#"{
            "schema": "raidplan.progress",
            "schemaVersion": 1,
            "catalogFingerprint": "0000",
            "completedQuestIds": ["debut", "retired-quest", "delivery-from-the-past"],
            "completedHideoutLevelIds": []
        }"#,
    )
    .unwrap();

    let session = Session::open(&sample_catalog(), &progress, TrackerOptions::default()).unwrap();
    insta::assert_json_snapshot!(session.restore, @r#"
    {
      "restored": 1,
      "dropped": [
        {
          "id": "retired-quest",
          "reason": "unknown-id"
        },
        {
          "id": "delivery-from-the-past",
          "reason": "prerequisites-missing"
        }
      ],
      "catalogChanged": true
    }
    "#);
}

#[test]
fn test_unsupported_progress_file_fails_with_hint() {
    let dir = tempdir().unwrap();
    let progress = dir.path().join("progress.json");
    fs::write(&progress, r#"{"schema": "raidplan.progress", "schemaVersion": 7}"#).unwrap();

    let error = Session::open(&sample_catalog(), &progress, TrackerOptions::default())
        .err()
        .unwrap();
    let message = format!("{error:#}");
    assert!(message.contains("newer version of raidplan"), "{message}");
    assert!(message.contains("Update raidplan"), "{message}");
}

#[test]
fn test_configured_look_ahead_plans_locked_quests() {
    let dir = tempdir().unwrap();
    let options = parse_options(
        r#"
        [aggregation]
        scope = "quests"
        selection = { kind = "look-ahead", depth = 1 }
        "#,
    )
    .unwrap();
    let session = Session::open(&sample_catalog(), &dir.path().join("p.json"), options).unwrap();

    let default_needs = session
        .tracker
        .get_aggregated_requirements(&AggregationOptions::default())
        .unwrap();
    assert!(default_needs.get(&ItemId::new("gas-analyzer").unwrap()).is_none());

    let planned = session.tracker.aggregated_requirements().unwrap();
    let analyzers = planned.get(&ItemId::new("gas-analyzer").unwrap()).unwrap();
    assert_eq!(analyzers.outstanding_quantity, 2);
    assert!(analyzers.found_in_raid);
    assert!(planned.nodes.iter().all(NodeId::is_quest));
}

#[test]
fn test_missing_catalog_reports_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let error = Session::open(&missing, &dir.path().join("p.json"), TrackerOptions::default())
        .err()
        .unwrap();
    assert!(format!("{error:#}").contains("nope.json"));
}
