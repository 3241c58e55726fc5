//! Stage engine.
//!
//! The `StageEngine` runs each stage's playback against a pipeline session:
//! it looks up the dataset's fixture, builds the stage's timeline, plays it
//! on the shared clock while publishing progress to the playback board, and
//! writes the stage's result only once playback has finished.
//!
//! Re-entering a stage whose result is already cached restores the board
//! from that result in a single update instead of playing again.

pub mod controller;
pub mod stages;

use crate::fixtures::{FixtureError, FixtureProvider};
use crate::playback::{Clock, PlaybackBoard, PlaybackOutcome, PlaybackPhase, PlaybackScheduler};
use crate::session::{transitions, PipelineSession, SessionError};
use crate::synthesis::drift::build_drift_simulation;
use crate::timeline::{build_staged_timeline, build_timeline, Timeline};
use anyhow::{Context, Result};
use ap_protocol::config_models::PlaybackConfig;
use ap_protocol::ipc::Event;
use ap_protocol::stage_models::{
    BusinessSetup, DatasetChoice, DeploymentMode, LogLevel, PatternResults, ProfilingResults,
    StageId, StageResult,
};
use ap_protocol::timeline_models::{TerminalPayload, TimelineEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How a call to [`StageEngine::run_stage`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRun {
    /// The cached result was restored without playback.
    Rehydrated,
    /// Playback finished and the result was written.
    Completed,
    /// Playback was cancelled; nothing was written.
    Cancelled,
    /// The scheduler refused to start.
    Ignored,
    /// The stage takes user input instead of playing a timeline.
    AwaitingInput,
}

/// Log lines produced while a timeline plays.
struct Narration {
    started: fn(&str) -> Option<String>,
    completed: fn(&TimelineEvent) -> String,
}

fn append_and_emit(
    session: &mut PipelineSession,
    message: String,
    level: LogLevel,
    events_tx: &Sender<Event>,
) {
    let entry = session.append_log(message, level).clone();
    let _ = events_tx.try_send(Event::LogAppended { entry });
}

fn interrupted(outcome: PlaybackOutcome) -> Option<StageRun> {
    match outcome {
        PlaybackOutcome::Finished { .. } => None,
        PlaybackOutcome::Cancelled { .. } | PlaybackOutcome::Ignored(PlaybackPhase::Cancelled) => {
            Some(StageRun::Cancelled)
        }
        PlaybackOutcome::Ignored(_) => Some(StageRun::Ignored),
    }
}

/// Runs stage playback against a pipeline session.
pub struct StageEngine {
    fixtures: Arc<dyn FixtureProvider>,
    clock: Arc<dyn Clock>,
    config: PlaybackConfig,
    rng: Mutex<StdRng>,
    board: PlaybackBoard,
    active: Mutex<Option<PlaybackScheduler>>,

    /// Set by a cancel that found no registered scheduler. The next playback
    /// consumes it and never starts. Cleared by `reset`.
    pending_cancel: AtomicBool,
}

impl StageEngine {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `fixtures` - Source of per-dataset fixtures
    /// * `clock` - Time source for every playback; a `LogicalClock` plays instantly
    /// * `config` - Pacing, plus the seed for drift synthesis when present
    pub fn new(fixtures: Arc<dyn FixtureProvider>, clock: Arc<dyn Clock>, config: PlaybackConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            fixtures,
            clock,
            config,
            rng: Mutex::new(rng),
            board: PlaybackBoard::new(),
            active: Mutex::new(None),
            pending_cancel: AtomicBool::new(false),
        }
    }

    pub fn board(&self) -> &PlaybackBoard {
        &self.board
    }

    fn scheduler(&self) -> PlaybackScheduler {
        PlaybackScheduler::new(Arc::clone(&self.clock))
            .with_max_wait(Duration::from_millis(self.config.max_wait_ms))
    }

    /// Cancel the running playback.
    ///
    /// With no playback registered yet the cancel is held until the next
    /// playback begins, which then ends as cancelled without delivering any
    /// event. Returns `false` only if the registered playback had already
    /// finished.
    pub async fn cancel_active(&self) -> bool {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(scheduler) => scheduler.cancel(),
            None => {
                self.pending_cancel.store(true, Ordering::SeqCst);
                debug!("no playback registered, holding cancel for the next one");
                true
            }
        }
    }

    /// Stage 1: record the dataset and objective and synthesize its drift scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset or objective is unknown. The session
    /// is left untouched in that case.
    pub async fn select_dataset(
        &self,
        session: &mut PipelineSession,
        dataset_id: &str,
        objective_id: &str,
        events_tx: &Sender<Event>,
    ) -> Result<()> {
        let fixture = self.fixtures.get_fixture(dataset_id)?;
        let objective = fixture
            .objective(objective_id)
            .ok_or_else(|| FixtureError::UnknownObjective {
                dataset_id: dataset_id.to_string(),
                objective_id: objective_id.to_string(),
            })?;

        let drift = {
            let mut rng = self.rng.lock().await;
            build_drift_simulation(&fixture.drift, &mut *rng)
        };

        info!(dataset_id, objective_id, "dataset selected");
        transitions::write_result(
            session,
            StageResult::Dataset(DatasetChoice {
                dataset_id: dataset_id.to_string(),
                objective_id: objective_id.to_string(),
                drift,
            }),
            events_tx,
        )
        .await;
        transitions::log(
            session,
            format!("Selected {}: {}", fixture.dataset.name, objective.label),
            LogLevel::Action,
            events_tx,
        )
        .await;
        Ok(())
    }

    /// Stage 2: record the business goal and deployment target.
    pub async fn configure_business(
        &self,
        session: &mut PipelineSession,
        business_goal: &str,
        deployment_mode: DeploymentMode,
        events_tx: &Sender<Event>,
    ) -> Result<()> {
        transitions::write_result(
            session,
            StageResult::Business(BusinessSetup {
                business_goal: business_goal.to_string(),
                deployment_mode,
            }),
            events_tx,
        )
        .await;
        transitions::log(
            session,
            format!("Business goal set: {}", business_goal),
            LogLevel::Action,
            events_tx,
        )
        .await;
        Ok(())
    }

    /// Enter `stage`: restore it from the cache, or play it.
    ///
    /// # Errors
    ///
    /// Returns `StageNotReached` for a stage ahead of the active one, an
    /// error if a stage after business setup runs without a dataset choice,
    /// or if the dataset's fixture cannot produce a timeline. Nothing is
    /// written to the session on error.
    pub async fn run_stage(
        &self,
        session: &mut PipelineSession,
        stage: StageId,
        events_tx: &Sender<Event>,
    ) -> Result<StageRun> {
        let current = session.current_stage();
        if stage > current {
            return Err(SessionError::StageNotReached { stage, current }.into());
        }

        if let Some(result) = session.result_for(stage) {
            if let Some(restored) = stages::rehydration(result) {
                self.board.rehydrate(
                    stage,
                    restored.entities,
                    restored.leaderboard,
                    restored.champion,
                );
            }
            debug!(stage = stage.number(), "stage rehydrated from cache");
            let _ = events_tx.send(Event::StageRehydrated { stage }).await;
            return Ok(StageRun::Rehydrated);
        }

        match stage {
            StageId::ChooseDataset | StageId::BusinessSetup => Ok(StageRun::AwaitingInput),
            StageId::DataProfiling => self.run_profiling(session, events_tx).await,
            StageId::PatternDiscovery => self.run_pattern_discovery(session, events_tx).await,
            StageId::Validation => self.run_validation(session, events_tx).await,
            StageId::ModelSelection => self.run_model_selection(session, events_tx).await,
        }
    }

    /// Mark `stage` complete and advance past it.
    ///
    /// # Errors
    ///
    /// Fails with `MissingUpstream` while `stage` has no result yet, and with
    /// the session's navigation errors otherwise.
    pub async fn proceed(
        &self,
        session: &mut PipelineSession,
        stage: StageId,
        events_tx: &Sender<Event>,
    ) -> Result<StageId> {
        if let Some(next) = stage.next() {
            if stage == session.current_stage() && !session.has_result(stage) {
                return Err(SessionError::MissingUpstream {
                    stage: next,
                    requires: stage,
                }
                .into());
            }
        }
        Ok(transitions::proceed(session, stage, events_tx).await?)
    }

    /// Cancel any playback, clear the board and reset the session.
    pub async fn reset(&self, session: &mut PipelineSession, events_tx: &Sender<Event>) {
        self.cancel_active().await;
        self.board.clear();
        transitions::reset(session, events_tx).await;
        self.pending_cancel.store(false, Ordering::SeqCst);
    }

    fn dataset_id(session: &PipelineSession, stage: StageId) -> Result<String> {
        Ok(session.require_dataset(stage)?.dataset_id.clone())
    }

    /// Play `timeline` for `stage` and report how it ended.
    #[allow(clippy::too_many_arguments)]
    async fn play(
        &self,
        session: &mut PipelineSession,
        stage: StageId,
        timeline: &Timeline,
        scheduler: PlaybackScheduler,
        narration: Narration,
        on_finished: impl FnOnce(),
        events_tx: &Sender<Event>,
    ) -> PlaybackOutcome {
        {
            let mut active = self.active.lock().await;
            if self.pending_cancel.swap(false, Ordering::SeqCst) {
                scheduler.cancel();
            }
            *active = Some(scheduler.clone());
        }
        self.board.load(stage, timeline.entities());
        self.board.begin();

        let board = &self.board;
        let mut started = HashSet::new();
        let outcome = scheduler
            .start(
                timeline.events(),
                |event| {
                    board.apply(event);
                    if started.insert(event.entity.clone()) {
                        if let Some(message) = (narration.started)(&event.entity) {
                            append_and_emit(session, message, LogLevel::Info, events_tx);
                        }
                    }
                    match &event.payload {
                        Some(payload) => {
                            let _ = events_tx.try_send(Event::EntityCompleted {
                                stage,
                                entity: event.entity.clone(),
                                payload: payload.clone(),
                            });
                            append_and_emit(
                                session,
                                (narration.completed)(event),
                                LogLevel::Success,
                                events_tx,
                            );
                        }
                        None => {
                            let _ = events_tx.try_send(Event::EntityProgress {
                                stage,
                                entity: event.entity.clone(),
                                progress: event.progress,
                            });
                        }
                    }
                },
                || {
                    board.mark_analysis_complete();
                    on_finished();
                },
            )
            .await;
        self.active.lock().await.take();

        match outcome {
            PlaybackOutcome::Finished { delivered } => {
                debug!(stage = stage.number(), delivered, "stage playback finished");
                let _ = events_tx.send(Event::PlaybackFinished { stage }).await;
            }
            PlaybackOutcome::Cancelled { .. } | PlaybackOutcome::Ignored(PlaybackPhase::Cancelled) => {
                warn!(stage = stage.number(), ?outcome, "stage playback cancelled");
                let _ = events_tx.send(Event::PlaybackCancelled { stage }).await;
                transitions::log(
                    session,
                    format!("{} cancelled", stage.label()),
                    LogLevel::Warning,
                    events_tx,
                )
                .await;
            }
            PlaybackOutcome::Ignored(phase) => {
                debug!(stage = stage.number(), ?phase, "stage playback not started");
            }
        }
        outcome
    }

    async fn run_profiling(&self, session: &mut PipelineSession, events_tx: &Sender<Event>) -> Result<StageRun> {
        let stage = StageId::DataProfiling;
        let fixture = self.fixtures.get_fixture(&Self::dataset_id(session, stage)?)?;
        let timeline = build_staged_timeline(
            &stages::reveal_specs(&fixture.profiling.modules),
            self.config.step_ms,
        )?;

        let narration = Narration {
            started: |name| Some(format!("Analyzing: {}...", name)),
            completed: |event| format!("Completed: {}", event.entity),
        };
        let outcome = self
            .play(session, stage, &timeline, self.scheduler(), narration, || {}, events_tx)
            .await;
        if let Some(run) = interrupted(outcome) {
            return Ok(run);
        }

        let quality_score = fixture.profiling.quality_score;
        let results = ProfilingResults {
            modules: stages::reveal_findings(&fixture.profiling.modules),
            quality_score,
        };
        transitions::write_result(session, StageResult::Profiling(results), events_tx).await;
        transitions::log(
            session,
            format!("Profiling complete, data quality score {}/100", quality_score),
            LogLevel::Success,
            events_tx,
        )
        .await;
        Ok(StageRun::Completed)
    }

    async fn run_pattern_discovery(
        &self,
        session: &mut PipelineSession,
        events_tx: &Sender<Event>,
    ) -> Result<StageRun> {
        let stage = StageId::PatternDiscovery;
        let fixture = self.fixtures.get_fixture(&Self::dataset_id(session, stage)?)?;
        let patterns = &fixture.patterns;
        let timeline = build_staged_timeline(&stages::reveal_specs(&patterns.phases), self.config.step_ms)?;

        let narration = Narration {
            started: |name| Some(format!("Running: {}...", name)),
            completed: |event| format!("Completed: {}", event.entity),
        };
        let outcome = self
            .play(session, stage, &timeline, self.scheduler(), narration, || {}, events_tx)
            .await;
        if let Some(run) = interrupted(outcome) {
            return Ok(run);
        }

        let results = PatternResults {
            phases: stages::reveal_findings(&patterns.phases),
            cluster_count: patterns.cluster_count,
            anomaly_count: patterns.anomaly_count,
            anomaly_percent: patterns.anomaly_percent,
        };
        transitions::write_result(session, StageResult::Patterns(results), events_tx).await;
        transitions::log(
            session,
            format!(
                "Discovered {} segments and {} anomalous records ({:.1}%)",
                patterns.cluster_count, patterns.anomaly_count, patterns.anomaly_percent
            ),
            LogLevel::Success,
            events_tx,
        )
        .await;
        Ok(StageRun::Completed)
    }

    async fn run_validation(&self, session: &mut PipelineSession, events_tx: &Sender<Event>) -> Result<StageRun> {
        let stage = StageId::Validation;
        let choice = session.require_dataset(stage)?;
        let simulation = choice.drift.clone();
        let fixture = self.fixtures.get_fixture(&choice.dataset_id)?;
        let timeline = build_staged_timeline(
            &stages::week_specs(&simulation, fixture.validation.week_duration_ms),
            self.config.step_ms,
        )?;

        let narration = Narration {
            started: |_| None,
            completed: |event| match event.payload.as_ref().and_then(TerminalPayload::finding) {
                Some(insight) => format!("{} checked. {}", event.entity, insight.text),
                None => format!("{} checked", event.entity),
            },
        };
        let outcome = self
            .play(session, stage, &timeline, self.scheduler(), narration, || {}, events_tx)
            .await;
        if let Some(run) = interrupted(outcome) {
            return Ok(run);
        }

        let results = stages::validation_results(&simulation);
        let summary = match results.first_critical_week {
            Some(week) => format!(
                "Critical drift from week {}. Retraining lifts AUC to {:.3} (+{:.1}%)",
                week, results.retraining.new_metrics.auc, results.retraining.improvement
            ),
            None => "No critical drift detected".to_string(),
        };
        let level = if results.first_critical_week.is_some() {
            LogLevel::Warning
        } else {
            LogLevel::Success
        };
        transitions::write_result(session, StageResult::Validation(results), events_tx).await;
        transitions::log(session, summary, level, events_tx).await;
        Ok(StageRun::Completed)
    }

    async fn run_model_selection(
        &self,
        session: &mut PipelineSession,
        events_tx: &Sender<Event>,
    ) -> Result<StageRun> {
        let stage = StageId::ModelSelection;
        let fixture = self.fixtures.get_fixture(&Self::dataset_id(session, stage)?)?;
        let timeline = build_timeline(&stages::candidate_specs(&fixture.models), self.config.step_ms)?;
        let results = stages::model_selection_results(&fixture.models, &timeline)
            .context("Model fixture has no candidates")?;

        let scheduler = self
            .scheduler()
            .with_tail(Duration::from_millis(self.config.champion_pause_ms));
        let narration = Narration {
            started: |name| Some(format!("Training: {}...", name)),
            completed: |event| match event.payload.as_ref().and_then(TerminalPayload::metrics) {
                Some(metrics) => format!("{} complete, AUC {:.3}", event.entity, metrics.auc),
                None => format!("{} complete", event.entity),
            },
        };
        let board = &self.board;
        let champion = results.champion.clone();
        let outcome = self
            .play(
                session,
                stage,
                &timeline,
                scheduler,
                narration,
                move || board.reveal_champion(&champion),
                events_tx,
            )
            .await;
        if let Some(run) = interrupted(outcome) {
            return Ok(run);
        }

        let message = format!(
            "Champion selected: {} (AUC {:.3})",
            results.champion, results.champion_metrics.auc
        );
        let name = results.champion.clone();
        transitions::write_result(session, StageResult::ModelSelection(results), events_tx).await;
        let _ = events_tx.send(Event::ChampionRevealed { name }).await;
        transitions::log(session, message, LogLevel::Success, events_tx).await;
        Ok(StageRun::Completed)
    }
}
