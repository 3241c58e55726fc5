//! Op dispatch for a single pipeline session.
//!
//! The `PlaygroundController` owns the session and the drift cursor and
//! turns each `Op` from the UI into engine calls. Events flow back through
//! the channel given at construction.

use super::{StageEngine, StageRun};
use crate::session::{transitions, PipelineSession};
use crate::synthesis::drift::DriftCursor;
use anyhow::Result;
use ap_protocol::drift_models::DriftWeek;
use ap_protocol::ipc::{Event, Op};
use ap_protocol::stage_models::SessionSnapshot;
use ap_protocol::timeline_models::PlaybackSnapshot;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Owns one pipeline session and applies `Op`s to it.
pub struct PlaygroundController {
    engine: Arc<StageEngine>,

    /// Locked for the whole of a stage run, so ops that touch the session
    /// wait for playback to end. `CancelPlayback` never takes this lock.
    session: Mutex<PipelineSession>,

    cursor: Mutex<DriftCursor>,

    events_tx: mpsc::Sender<Event>,
}

impl PlaygroundController {
    pub fn new(engine: Arc<StageEngine>, events_tx: mpsc::Sender<Event>) -> Self {
        Self {
            engine,
            session: Mutex::new(PipelineSession::new()),
            cursor: Mutex::new(DriftCursor::default()),
            events_tx,
        }
    }

    /// Apply one operation.
    ///
    /// # Returns
    ///
    /// The stage run outcome for `RunStage`, `None` for every other op.
    ///
    /// # Errors
    ///
    /// Returns the engine's or the session's error. A failed op leaves the
    /// session as it was.
    pub async fn handle(&self, op: Op) -> Result<Option<StageRun>> {
        debug!(?op, "handling op");
        let tx = &self.events_tx;
        match op {
            Op::CancelPlayback => {
                self.engine.cancel_active().await;
            }
            Op::SetDriftWeek { week } => {
                let week = self.cursor.lock().await.set(week);
                let _ = tx.send(Event::DriftWeekChanged { week }).await;
            }
            Op::SelectDataset {
                dataset_id,
                objective_id,
            } => {
                let mut session = self.session.lock().await;
                self.engine
                    .select_dataset(&mut session, &dataset_id, &objective_id, tx)
                    .await?;
                *self.cursor.lock().await = DriftCursor::default();
            }
            Op::ConfigureBusiness {
                business_goal,
                deployment_mode,
            } => {
                let mut session = self.session.lock().await;
                self.engine
                    .configure_business(&mut session, &business_goal, deployment_mode, tx)
                    .await?;
            }
            Op::RunStage { stage } => {
                let mut session = self.session.lock().await;
                let run = self.engine.run_stage(&mut session, stage, tx).await?;
                return Ok(Some(run));
            }
            Op::Proceed { stage } => {
                let mut session = self.session.lock().await;
                self.engine.proceed(&mut session, stage, tx).await?;
            }
            Op::Retreat { to } => {
                let mut session = self.session.lock().await;
                transitions::retreat(&mut session, to, tx).await?;
            }
            Op::Reset => {
                // Cancel first so a running stage releases the session lock.
                self.engine.cancel_active().await;
                let mut session = self.session.lock().await;
                self.engine.reset(&mut session, tx).await;
                *self.cursor.lock().await = DriftCursor::default();
            }
        }
        Ok(None)
    }

    pub async fn session_snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub fn playback_snapshot(&self) -> PlaybackSnapshot {
        self.engine.board().snapshot()
    }

    /// The drift week under the cursor, once a dataset is selected.
    pub async fn drift_week(&self) -> Option<DriftWeek> {
        let week = self.cursor.lock().await.week();
        let session = self.session.lock().await;
        session
            .dataset_choice()
            .and_then(|choice| choice.drift.week(week))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureSet;
    use crate::playback::LogicalClock;
    use ap_protocol::config_models::PlaybackConfig;
    use ap_protocol::stage_models::StageId;

    fn controller() -> (PlaygroundController, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(4096);
        let engine = StageEngine::new(
            Arc::new(FixtureSet::builtin().unwrap()),
            Arc::new(LogicalClock::new()),
            PlaybackConfig {
                seed: Some(5),
                ..PlaybackConfig::default()
            },
        );
        (PlaygroundController::new(Arc::new(engine), tx), rx)
    }

    #[tokio::test]
    async fn test_drift_week_follows_cursor() {
        let (controller, _rx) = controller();
        assert!(controller.drift_week().await.is_none());

        controller
            .handle(Op::SelectDataset {
                dataset_id: "credit-fraud".to_string(),
                objective_id: "fraud-detect".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(controller.drift_week().await.unwrap().week, 1);

        controller.handle(Op::SetDriftWeek { week: 40 }).await.unwrap();
        assert_eq!(controller.drift_week().await.unwrap().week, 12);
    }

    #[tokio::test]
    async fn test_set_drift_week_reports_clamped_week() {
        let (controller, mut rx) = controller();
        controller.handle(Op::SetDriftWeek { week: 0 }).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::DriftWeekChanged { week: 1 }
        ));
    }

    #[tokio::test]
    async fn test_reset_returns_to_first_stage() {
        let (controller, _rx) = controller();
        controller
            .handle(Op::SelectDataset {
                dataset_id: "telco-churn".to_string(),
                objective_id: "churn-predict".to_string(),
            })
            .await
            .unwrap();
        controller
            .handle(Op::Proceed {
                stage: StageId::ChooseDataset,
            })
            .await
            .unwrap();

        controller.handle(Op::Reset).await.unwrap();

        let snapshot = controller.session_snapshot().await;
        assert_eq!(snapshot.current_stage, StageId::ChooseDataset);
        assert!(snapshot.completed_stages.is_empty());
        assert!(snapshot.results.is_empty());
        assert!(snapshot.log.is_empty());
        assert!(controller.playback_snapshot().entities.is_empty());
    }

    #[tokio::test]
    async fn test_retreat_to_later_stage_fails() {
        let (controller, _rx) = controller();
        let result = controller
            .handle(Op::Retreat {
                to: StageId::Validation,
            })
            .await;
        assert!(result.is_err());
    }
}
