//! Subcommand implementations.

use crate::render;
use ap_core::config::{load_config, AppConfig};
use ap_core::engine::controller::PlaygroundController;
use ap_core::engine::{StageEngine, StageRun};
use ap_core::fixtures::{FixtureProvider, FixtureSet};
use ap_core::playback::{Clock, LogicalClock, TokioClock};
use ap_protocol::ipc::{Event, Op};
use ap_protocol::stage_models::{DeploymentMode, StageId, StageResult};
use color_eyre::eyre::{eyre, Result, WrapErr};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Options for `playground run`.
pub struct RunArgs {
    pub dataset: String,
    pub objective: Option<String>,
    pub goal: String,
    pub deployment_mode: DeploymentMode,
    pub realtime: bool,
    pub seed: Option<u64>,
    pub json: bool,
    pub fallback: bool,
}

const PLAYBACK_STAGES: [StageId; 4] = [
    StageId::DataProfiling,
    StageId::PatternDiscovery,
    StageId::Validation,
    StageId::ModelSelection,
];

async fn load(root: &Path, seed: Option<u64>) -> Result<(AppConfig, FixtureSet)> {
    let mut config = load_config(root)
        .await
        .wrap_err_with(|| format!("Failed to load configuration from {}", root.display()))?;
    if seed.is_some() {
        config.playback.seed = seed;
    }
    let fixtures = config.fixture_set()?;
    Ok((config, fixtures))
}

fn build_controller(
    config: &AppConfig,
    fixtures: FixtureSet,
    clock: Arc<dyn Clock>,
    capacity: usize,
) -> (Arc<PlaygroundController>, mpsc::Receiver<Event>) {
    let engine = StageEngine::new(Arc::new(fixtures), clock, config.playback.clone());
    let (events_tx, events_rx) = mpsc::channel(capacity);
    (
        Arc::new(PlaygroundController::new(Arc::new(engine), events_tx)),
        events_rx,
    )
}

async fn apply(controller: &PlaygroundController, op: Op) -> Result<Option<StageRun>> {
    controller.handle(op).await.map_err(|e| eyre!("{e:#}"))
}

/// Resolve the dataset id to play, optionally falling back to the default dataset.
fn resolve_dataset(fixtures: &FixtureSet, dataset_id: &str, fallback: bool) -> Result<String> {
    let fixture = if fallback {
        fixtures.get_or_default(dataset_id)?
    } else {
        fixtures.get_fixture(dataset_id)?
    };
    Ok(fixture.id().to_string())
}

fn default_objective(fixtures: &FixtureSet, dataset_id: &str) -> Result<String> {
    let fixture = fixtures.get_fixture(dataset_id)?;
    fixture
        .objectives
        .first()
        .map(|objective| objective.id.clone())
        .ok_or_else(|| eyre!("Dataset '{dataset_id}' declares no objectives"))
}

/// Walk every stage of the pipeline for one dataset.
pub async fn run_pipeline(root: &Path, args: RunArgs) -> Result<()> {
    let (config, fixtures) = load(root, args.seed).await?;
    let dataset = resolve_dataset(&fixtures, &args.dataset, args.fallback)?;
    let objective = match args.objective {
        Some(objective) if dataset == args.dataset => objective,
        _ => default_objective(&fixtures, &dataset)?,
    };

    let clock: Arc<dyn Clock> = if args.realtime {
        Arc::new(TokioClock::new())
    } else {
        Arc::new(LogicalClock::new())
    };
    let (controller, mut events_rx) = build_controller(&config, fixtures, clock, 1024);

    // Live output only makes sense when playback takes wall-clock time.
    let printer = if args.realtime && !args.json {
        Some(tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                if let Event::LogAppended { entry } = event {
                    println!("{}", render::log_line(&entry));
                }
            }
        }))
    } else {
        drop(events_rx);
        None
    };

    let interrupt = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                let _ = controller.handle(Op::CancelPlayback).await;
            }
        })
    };

    info!(dataset = %dataset, objective = %objective, realtime = args.realtime, "starting run");
    let cancelled = drive(&controller, &dataset, &objective, &args.goal, args.deployment_mode).await?;
    interrupt.abort();
    let _ = interrupt.await;

    let snapshot = controller.session_snapshot().await;
    drop(controller);
    if let Some(printer) = printer {
        let _ = printer.await;
    } else if !args.json {
        for entry in &snapshot.log {
            println!("{}", render::log_line(entry));
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if cancelled {
        println!("{}", "Playback cancelled.".yellow());
        return Ok(());
    }
    for result in &snapshot.results {
        if let StageResult::ModelSelection(selection) = result {
            println!();
            print!("{}", render::leaderboard(&selection.leaderboard, &selection.champion));
        }
    }
    Ok(())
}

/// Drive the controller through all six stages. Returns `true` if a
/// playback was cancelled part way.
async fn drive(
    controller: &PlaygroundController,
    dataset_id: &str,
    objective_id: &str,
    goal: &str,
    deployment_mode: DeploymentMode,
) -> Result<bool> {
    let select = Op::SelectDataset {
        dataset_id: dataset_id.to_string(),
        objective_id: objective_id.to_string(),
    };
    apply(controller, select).await?;
    apply(controller, Op::Proceed { stage: StageId::ChooseDataset }).await?;

    let business = Op::ConfigureBusiness {
        business_goal: goal.to_string(),
        deployment_mode,
    };
    apply(controller, business).await?;
    apply(controller, Op::Proceed { stage: StageId::BusinessSetup }).await?;

    for stage in PLAYBACK_STAGES {
        let run = apply(controller, Op::RunStage { stage }).await?;
        match run {
            Some(StageRun::Completed) | Some(StageRun::Rehydrated) => {}
            Some(StageRun::Cancelled) => return Ok(true),
            other => return Err(eyre!("Stage {stage} did not complete: {other:?}")),
        }
        if stage.next().is_some() {
            apply(controller, Op::Proceed { stage }).await?;
        }
    }
    Ok(false)
}

/// Print the drift simulation for a dataset.
pub async fn show_drift(
    root: &Path,
    dataset_id: &str,
    week: Option<u8>,
    seed: Option<u64>,
    fallback: bool,
) -> Result<()> {
    let (config, fixtures) = load(root, seed).await?;
    let dataset_id = resolve_dataset(&fixtures, dataset_id, fallback)?;
    let objective = default_objective(&fixtures, &dataset_id)?;
    let (controller, _events_rx) = build_controller(&config, fixtures, Arc::new(LogicalClock::new()), 64);

    let select = Op::SelectDataset {
        dataset_id,
        objective_id: objective,
    };
    apply(&controller, select).await?;

    if let Some(week) = week {
        apply(&controller, Op::SetDriftWeek { week }).await?;
        let current = controller
            .drift_week()
            .await
            .ok_or_else(|| eyre!("No drift data for week {week}"))?;
        print!("{}", render::week_detail(&current));
        return Ok(());
    }

    let snapshot = controller.session_snapshot().await;
    let simulation = snapshot
        .results
        .iter()
        .find_map(|result| match result {
            StageResult::Dataset(choice) => Some(&choice.drift),
            _ => None,
        })
        .ok_or_else(|| eyre!("Dataset selection produced no drift simulation"))?;
    print!("{}", render::drift_table(simulation));
    Ok(())
}

/// List every dataset in the fixture catalog.
pub async fn list_datasets(root: &Path) -> Result<()> {
    let (_, fixtures) = load(root, None).await?;
    for id in fixtures.dataset_ids() {
        let fixture = fixtures.get_fixture(&id)?;
        print!("{}", render::dataset_summary(fixture));
    }
    Ok(())
}
