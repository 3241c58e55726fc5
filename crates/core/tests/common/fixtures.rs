//! Engines, controllers and timelines shared by the integration tests.

use ap_core::engine::controller::PlaygroundController;
use ap_core::engine::StageEngine;
use ap_core::fixtures::FixtureSet;
use ap_core::playback::{Clock, LogicalClock};
use ap_core::timeline::EntitySpec;
use ap_protocol::config_models::PlaybackConfig;
use ap_protocol::ipc::{Event, Op};
use ap_protocol::metrics_models::ModelMetrics;
use ap_protocol::stage_models::{DeploymentMode, StageId};
use ap_protocol::timeline_models::TerminalPayload;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const TEST_SEED: u64 = 42;

/// Playback config with a fixed seed and the default pacing.
#[allow(dead_code)]
pub fn seeded_config() -> PlaybackConfig {
    PlaybackConfig {
        seed: Some(TEST_SEED),
        ..PlaybackConfig::default()
    }
}

/// An engine over the built-in fixtures, playing on a logical clock.
#[allow(dead_code)]
pub fn create_test_engine() -> StageEngine {
    create_engine_with_clock(Arc::new(LogicalClock::new()))
}

#[allow(dead_code)]
pub fn create_engine_with_clock(clock: Arc<dyn Clock>) -> StageEngine {
    let fixtures = FixtureSet::builtin().expect("built-in fixtures should load");
    StageEngine::new(Arc::new(fixtures), clock, seeded_config())
}

/// A controller with a channel large enough to never drop an event.
#[allow(dead_code)]
pub fn create_test_controller() -> (Arc<PlaygroundController>, mpsc::Receiver<Event>) {
    create_controller_with_engine(create_test_engine())
}

#[allow(dead_code)]
pub fn create_controller_with_engine(
    engine: StageEngine,
) -> (Arc<PlaygroundController>, mpsc::Receiver<Event>) {
    let (events_tx, events_rx) = mpsc::channel(65_536);
    let controller = PlaygroundController::new(Arc::new(engine), events_tx);
    (Arc::new(controller), events_rx)
}

/// Fill stages 1 and 2 for `dataset_id` and move to stage 3.
#[allow(dead_code)]
pub async fn complete_input_stages(controller: &PlaygroundController, dataset_id: &str, objective_id: &str) {
    controller
        .handle(Op::SelectDataset {
            dataset_id: dataset_id.to_string(),
            objective_id: objective_id.to_string(),
        })
        .await
        .expect("dataset selection should succeed");
    controller
        .handle(Op::Proceed {
            stage: StageId::ChooseDataset,
        })
        .await
        .expect("proceed from stage 1 should succeed");
    controller
        .handle(Op::ConfigureBusiness {
            business_goal: "Reduce churn by 5%".to_string(),
            deployment_mode: DeploymentMode::Cloud,
        })
        .await
        .expect("business setup should succeed");
    controller
        .handle(Op::Proceed {
            stage: StageId::BusinessSetup,
        })
        .await
        .expect("proceed from stage 2 should succeed");
}

/// Play and proceed through each stage until `target` is the active stage.
#[allow(dead_code)]
pub async fn advance_to(controller: &PlaygroundController, target: StageId) {
    loop {
        let current = controller.session_snapshot().await.current_stage;
        if current >= target {
            break;
        }
        controller
            .handle(Op::RunStage { stage: current })
            .await
            .expect("stage on the way should run");
        controller
            .handle(Op::Proceed { stage: current })
            .await
            .expect("proceed on the way should succeed");
    }
}

/// Everything currently buffered in the channel.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[allow(dead_code)]
pub fn uniform_metrics(value: f64) -> ModelMetrics {
    ModelMetrics {
        accuracy: value,
        precision: value,
        recall: value,
        f1: value,
        auc: value,
    }
}

#[allow(dead_code)]
pub fn metric_entity(name: &str, duration_ms: i64, auc: f64) -> EntitySpec {
    EntitySpec::new(name, duration_ms, TerminalPayload::Metrics(uniform_metrics(auc)))
}
