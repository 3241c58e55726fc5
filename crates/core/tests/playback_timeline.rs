//! Integration tests for timeline playback.
//!
//! These tests combine the timeline builder, the scheduler and the playback
//! board the way a stage does, and verify:
//! - The two-entity scenario converges to both entities complete
//! - Board subscribers only ever see progress move forward
//! - Cancelling a running stage writes nothing
//! - A cancel issued before the stage starts playing still stops it

mod common;

use ap_core::engine::StageRun;
use ap_core::playback::{Clock, LogicalClock, PlaybackBoard, PlaybackOutcome, PlaybackScheduler, TokioClock};
use ap_core::timeline::build_timeline;
use ap_protocol::ipc::Op;
use ap_protocol::stage_models::{LogLevel, StageId};
use ap_protocol::timeline_models::EntityStatus;
use common::assertions::*;
use common::fixtures::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::test]
async fn test_two_entity_scenario_converges() {
    let timeline = build_timeline(&[metric_entity("A", 400, 0.8), metric_entity("B", 600, 0.9)], 200)
        .expect("timeline should build");

    let clock = Arc::new(LogicalClock::new());
    let scheduler = PlaybackScheduler::new(clock.clone()).with_max_wait(Duration::from_secs(1));
    let board = PlaybackBoard::new();
    board.load(StageId::ModelSelection, timeline.entities());
    board.begin();

    let mut finished_at = Vec::new();
    let outcome = scheduler
        .start(
            timeline.events(),
            |event| board.apply(event),
            || finished_at.push(clock.elapsed()),
        )
        .await;

    assert_eq!(outcome, PlaybackOutcome::Finished { delivered: 5 });
    assert_eq!(finished_at, vec![Duration::from_millis(600)]);

    let snapshot = board.snapshot();
    assert_all_complete(&snapshot);
    assert_eq!(snapshot.entity("A").unwrap().status, EntityStatus::Complete);
    assert_eq!(snapshot.entity("B").unwrap().progress, 100.0);
    let ranked: Vec<_> = snapshot.leaderboard.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(ranked, vec!["B", "A"]);
}

#[tokio::test]
async fn test_subscribers_see_monotonic_progress() {
    let timeline = build_timeline(
        &[
            metric_entity("A", 1000, 0.7),
            metric_entity("B", 600, 0.8),
            metric_entity("C", 150, 0.9),
        ],
        200,
    )
    .expect("timeline should build");

    let board = PlaybackBoard::new();
    board.load(StageId::ModelSelection, timeline.entities());
    let mut updates = board.stream();

    let watcher = tokio::spawn(async move {
        let mut last: HashMap<String, f64> = HashMap::new();
        while let Some(snapshot) = updates.next().await {
            for entity in &snapshot.entities {
                let previous = last.insert(entity.name.clone(), entity.progress).unwrap_or(0.0);
                assert!(
                    entity.progress >= previous,
                    "{} went from {} to {}",
                    entity.name,
                    previous,
                    entity.progress
                );
            }
            if snapshot.all_complete() {
                return true;
            }
        }
        false
    });

    let clock: Arc<dyn Clock> = Arc::new(LogicalClock::new());
    let scheduler = PlaybackScheduler::new(clock);
    board.begin();
    scheduler.start(timeline.events(), |e| board.apply(e), || {}).await;

    assert!(watcher.await.unwrap(), "watcher should observe completion");
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_model_selection_writes_nothing() {
    let engine = create_engine_with_clock(Arc::new(TokioClock::new()));
    let (controller, mut rx) = create_controller_with_engine(engine);
    complete_input_stages(&controller, "telco-churn", "churn-predict").await;
    advance_to(&controller, StageId::ModelSelection).await;
    drain_events(&mut rx);

    let runner = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .handle(Op::RunStage {
                    stage: StageId::ModelSelection,
                })
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    controller.handle(Op::CancelPlayback).await.unwrap();

    let run = runner.await.unwrap().unwrap();
    assert_eq!(run, Some(StageRun::Cancelled));

    let events = drain_events(&mut rx);
    assert_no_result_written(&events);

    let session = controller.session_snapshot().await;
    assert!(!session
        .results
        .iter()
        .any(|r| r.stage() == StageId::ModelSelection));
    assert_logged(&session, "Model Selection cancelled", LogLevel::Warning);

    let board = controller.playback_snapshot();
    assert!(!board.analysis_complete);
    assert!(board.champion.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_rerun_after_cancel_completes() {
    let engine = create_engine_with_clock(Arc::new(TokioClock::new()));
    let (controller, _rx) = create_controller_with_engine(engine);
    complete_input_stages(&controller, "credit-fraud", "fraud-detect").await;
    advance_to(&controller, StageId::PatternDiscovery).await;

    let runner = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .handle(Op::RunStage {
                    stage: StageId::PatternDiscovery,
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    controller.handle(Op::CancelPlayback).await.unwrap();
    assert_eq!(runner.await.unwrap().unwrap(), Some(StageRun::Cancelled));

    let run = controller
        .handle(Op::RunStage {
            stage: StageId::PatternDiscovery,
        })
        .await
        .unwrap();
    assert_eq!(run, Some(StageRun::Completed));
    assert_all_complete(&controller.playback_snapshot());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_right_after_run_is_not_lost() {
    let engine = create_engine_with_clock(Arc::new(TokioClock::new()));
    let (controller, mut rx) = create_controller_with_engine(engine);
    complete_input_stages(&controller, "telco-churn", "churn-predict").await;
    advance_to(&controller, StageId::ModelSelection).await;
    drain_events(&mut rx);

    let runner = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .handle(Op::RunStage {
                    stage: StageId::ModelSelection,
                })
                .await
        })
    };
    // No yield: the runner has not registered its scheduler yet.
    controller.handle(Op::CancelPlayback).await.unwrap();

    assert_eq!(runner.await.unwrap().unwrap(), Some(StageRun::Cancelled));
    let events = drain_events(&mut rx);
    assert_no_result_written(&events);

    let session = controller.session_snapshot().await;
    assert!(!session
        .results
        .iter()
        .any(|r| r.stage() == StageId::ModelSelection));
    assert_logged(&session, "Model Selection cancelled", LogLevel::Warning);

    let run = controller
        .handle(Op::RunStage {
            stage: StageId::ModelSelection,
        })
        .await
        .unwrap();
    assert_eq!(run, Some(StageRun::Completed));
    assert!(controller.playback_snapshot().champion.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_reset_while_idle_does_not_cancel_next_run() {
    let engine = create_engine_with_clock(Arc::new(TokioClock::new()));
    let (controller, _rx) = create_controller_with_engine(engine);
    controller.handle(Op::Reset).await.unwrap();

    complete_input_stages(&controller, "credit-fraud", "fraud-detect").await;
    let run = controller
        .handle(Op::RunStage {
            stage: StageId::DataProfiling,
        })
        .await
        .unwrap();
    assert_eq!(run, Some(StageRun::Completed));
}
