//! End-to-end checkpoint updates through `Tracker`, covering group fan-out,
//! narrowing, atomicity, and the properties of status derivation.

mod common;

use common::{ConfigBuilder, JobBuilder, TestHarness};
use fleetdata::status::DOCUMENTS_VARIANT;
use fleetdata::{Checkpoint, CheckpointUpdate, TrackingError, UpdateMode};

const GROUP: [&str; 4] = ["L1", "L2", "L3", "L4"];

fn convoy(harness: &TestHarness) {
    harness.create_jobs(
        GROUP
            .iter()
            .map(|id| JobBuilder::new(id).group("G-0301").build()),
    );
}

#[test]
fn test_start_propagates_with_independent_statuses() {
    let harness = TestHarness::with_config(
        ConfigBuilder::new()
            .location("Lat Krabang DC", DOCUMENTS_VARIANT)
            .build(),
    );
    harness.create_jobs([
        JobBuilder::new("L1").group("G1").origin("Bang Na Hub").build(),
        JobBuilder::new("L2").group("G1").origin("Lat Krabang DC").build(),
        JobBuilder::new("L3").group("G1").build(),
    ]);
    // L2 already has paperwork in flight; the group update must not hide it.
    harness
        .tracker
        .coordinator()
        .apply_checkpoint_update(
            &CheckpointUpdate::for_load("L2")
                .set(Checkpoint::InTransit, "2026-03-01T12:00:00Z")
                .set(Checkpoint::DocsSubmitted, "2026-03-01T12:30:00Z"),
            false,
        )
        .unwrap();

    let outcome = harness
        .apply(
            CheckpointUpdate::for_load("L1")
                .set(Checkpoint::Start, "2026-03-01T06:00:00+07:00")
                .set_coords(Checkpoint::Start, "13.6900,100.7501"),
        )
        .unwrap();

    assert_eq!(outcome.mode, UpdateMode::Group);
    assert_eq!(outcome.group_size, 3);
    for id in ["L1", "L2", "L3"] {
        let record = harness.record(id);
        assert_eq!(record.start.at.as_deref(), Some("2026-03-01T06:00:00+07:00"));
        assert_eq!(record.start.coords.as_deref(), Some("13.6900,100.7501"));
    }
    assert_eq!(outcome.status_of("L1"), Some("Job started"));
    assert_eq!(outcome.status_of("L2"), Some("Documents submitted"));
    assert_eq!(outcome.status_of("L3"), Some("Job started"));
    assert_eq!(harness.status("L2"), "Documents submitted");
}

#[test]
fn test_end_unload_never_leaves_target() {
    let harness = TestHarness::new();
    convoy(&harness);

    for flag in [true, false] {
        let outcome = harness
            .apply(
                CheckpointUpdate::for_load("L3")
                    .set(Checkpoint::UnloadingEnd, "2026-03-02T16:00:00Z")
                    .with_group_flag(flag),
            )
            .unwrap();
        assert_eq!(outcome.mode, UpdateMode::Single);
        assert_eq!(outcome.group_size, 1);
    }

    assert_eq!(harness.status("L3"), "Unloading finished");
    for id in ["L1", "L2", "L4"] {
        assert_eq!(harness.status(id), "Ready for job");
        assert!(!harness.record(id).is_reached(Checkpoint::UnloadingEnd));
    }
}

#[test]
fn test_origin_arrival_only() {
    let harness = TestHarness::new();
    harness.create_jobs([JobBuilder::new("L1").build()]);

    let outcome = harness
        .apply(CheckpointUpdate::for_load("L1").set(Checkpoint::OriginArrival, "2026-03-01 08:15"))
        .unwrap();

    assert_eq!(outcome.mode, UpdateMode::Single);
    assert_eq!(harness.status("L1"), "Arrived at origin");
}

#[test]
fn test_failed_member_rolls_back_whole_group() {
    let harness = TestHarness::new();
    convoy(&harness);
    harness
        .apply(CheckpointUpdate::for_load("L1").set(Checkpoint::Start, "2026-03-01T06:00:00Z"))
        .unwrap();
    let before = harness.snapshot(&GROUP);

    harness.fail_status_writes_for("L3");
    let err = harness
        .apply(CheckpointUpdate::for_load("L1").set(Checkpoint::OriginArrival, "2026-03-01T08:00:00Z"))
        .unwrap_err();

    assert!(matches!(err, TrackingError::Database(_)));
    assert_eq!(harness.snapshot(&GROUP), before);
    for id in GROUP {
        assert!(!harness.record(id).is_reached(Checkpoint::OriginArrival));
    }
}

#[test]
fn test_group_larger_than_limit_is_rejected() {
    let harness = TestHarness::with_config(ConfigBuilder::new().max_group_size(3).build());
    convoy(&harness);
    let before = harness.snapshot(&GROUP);

    let err = harness
        .apply(CheckpointUpdate::for_load("L2").set(Checkpoint::LoadingEnd, "2026-03-01T09:00:00Z"))
        .unwrap_err();

    assert!(matches!(err, TrackingError::GroupTooLarge { size: 4, limit: 3, .. }));
    assert_eq!(harness.snapshot(&GROUP), before);
}

#[test]
fn test_updates_on_disjoint_checkpoints_commute() {
    let first = CheckpointUpdate::for_load("L1")
        .set(Checkpoint::InTransit, "2026-03-01T12:00:00Z")
        .with_group_flag(false);
    let second = CheckpointUpdate::for_load("L1")
        .set(Checkpoint::DestinationArrival, "2026-03-01T18:00:00Z")
        .set_coords(Checkpoint::DestinationArrival, "18.7883,98.9853");

    let forward = TestHarness::new();
    forward.create_jobs([JobBuilder::new("L1").build()]);
    forward.apply(first.clone()).unwrap();
    forward.apply(second.clone()).unwrap();

    let backward = TestHarness::new();
    backward.create_jobs([JobBuilder::new("L1").build()]);
    backward.apply(second).unwrap();
    backward.apply(first).unwrap();

    assert_eq!(forward.record("L1"), backward.record("L1"));
    assert_eq!(forward.status("L1"), backward.status("L1"));
    assert_eq!(forward.status("L1"), "Arrived at destination");
}

#[test]
fn test_repeating_an_update_changes_nothing() {
    let harness = TestHarness::new();
    convoy(&harness);
    let update = CheckpointUpdate::for_load("L4").set(Checkpoint::LoadingStart, "2026-03-01T09:00:00Z");

    let once = harness.apply(update.clone()).unwrap();
    let after_once = harness.snapshot(&GROUP);
    let twice = harness.apply(update).unwrap();

    assert_eq!(once, twice);
    assert_eq!(harness.snapshot(&GROUP), after_once);
}

#[test]
fn test_completed_job_stays_completed() {
    let harness = TestHarness::new();
    harness.create_jobs([JobBuilder::new("L1").build()]);
    harness
        .apply(CheckpointUpdate::for_load("L1").set(Checkpoint::Complete, "2026-03-03T10:00:00Z"))
        .unwrap();

    for cp in Checkpoint::ALL {
        if cp == Checkpoint::Complete {
            continue;
        }
        harness
            .apply(CheckpointUpdate::for_load("L1").set(cp, "2026-03-03T11:00:00Z"))
            .unwrap();
        assert_eq!(harness.status("L1"), "Completed", "after setting {}", cp);
    }
}

#[test]
fn test_unknown_job_is_not_found() {
    let harness = TestHarness::new();
    let err = harness
        .apply(CheckpointUpdate::for_load("ghost").set(Checkpoint::Start, "2026-03-01T06:00:00Z"))
        .unwrap_err();
    assert!(matches!(err, TrackingError::NotFound(_)));
    assert!(err.is_client_error());
}

#[test]
fn test_json_payload_with_legacy_names() {
    let harness = TestHarness::new();
    convoy(&harness);

    let update = CheckpointUpdate::from_json(
        r#"{
            "load_id": "L2",
            "start_recive_datetime": "2026-03-01T09:00:00Z",
            "start_receive_coords": "13.69,100.75"
        }"#,
    )
    .unwrap();
    let outcome = harness.apply(update).unwrap();

    assert_eq!(outcome.mode, UpdateMode::Group);
    for id in GROUP {
        assert_eq!(harness.status(id), "Loading");
    }
}

#[test]
fn test_deleted_job_leaves_the_group() {
    let harness = TestHarness::new();
    convoy(&harness);
    harness.tracker.jobs().delete_job("L4").unwrap();

    let outcome = harness
        .apply(CheckpointUpdate::for_load("L1").set(Checkpoint::Start, "2026-03-01T06:00:00Z"))
        .unwrap();
    assert_eq!(outcome.group_size, 3);
    assert!(outcome.status_of("L4").is_none());
}

#[test]
fn test_padded_group_key_still_reaches_every_member() {
    let harness = TestHarness::new();
    harness.create_jobs([
        JobBuilder::new("L1").group("G1 ").build(),
        JobBuilder::new("L2").group(" G1").build(),
    ]);

    let outcome = harness
        .apply(CheckpointUpdate::for_load("L1").set(Checkpoint::Start, "2026-03-01T06:00:00Z"))
        .unwrap();

    assert_eq!(outcome.mode, UpdateMode::Group);
    assert_eq!(outcome.group_size, 2);
    assert_eq!(outcome.status_of("L1"), Some("Job started"));
    for id in ["L1", "L2"] {
        assert_eq!(harness.status(id), "Job started");
        assert!(harness.record(id).is_reached(Checkpoint::Start));
    }
}
