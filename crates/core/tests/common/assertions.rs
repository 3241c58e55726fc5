//! Custom assertion helpers for the integration tests.

use ap_protocol::ipc::Event;
use ap_protocol::stage_models::{LogLevel, SessionSnapshot, StageId};
use ap_protocol::timeline_models::{EntityStatus, PlaybackSnapshot};

/// Assert that every entity on the board is complete at 100%.
#[allow(dead_code)]
pub fn assert_all_complete(snapshot: &PlaybackSnapshot) {
    assert!(!snapshot.entities.is_empty(), "Board has no entities");
    for entity in &snapshot.entities {
        assert_eq!(
            entity.status,
            EntityStatus::Complete,
            "{} should be complete",
            entity.name
        );
        assert_eq!(entity.progress, 100.0, "{} should be at 100%", entity.name);
        assert!(entity.payload.is_some(), "{} should carry its payload", entity.name);
    }
}

/// Assert that the session log contains `message` at `level`.
#[allow(dead_code)]
pub fn assert_logged(snapshot: &SessionSnapshot, message: &str, level: LogLevel) {
    assert!(
        snapshot
            .log
            .iter()
            .any(|e| e.message == message && e.level == level),
        "Expected log line {:?} at {:?}, got: {:#?}",
        message,
        level,
        snapshot.log.iter().map(|e| &e.message).collect::<Vec<_>>()
    );
}

/// Count the events matching `predicate`.
#[allow(dead_code)]
pub fn count_events(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|e| predicate(e)).count()
}

/// Assert that `stage` finished its playback exactly once in `events`.
#[allow(dead_code)]
pub fn assert_finished_once(events: &[Event], stage: StageId) {
    let finished = count_events(events, |e| {
        matches!(e, Event::PlaybackFinished { stage: s } if *s == stage)
    });
    assert_eq!(finished, 1, "Stage {} should finish exactly once", stage);
}

/// Assert that no stage result was written in `events`.
#[allow(dead_code)]
pub fn assert_no_result_written(events: &[Event]) {
    let written = count_events(events, |e| matches!(e, Event::ResultWritten { .. }));
    assert_eq!(written, 0, "No result should have been written");
}
