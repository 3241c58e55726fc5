//! Inter-process communication protocol.
//!
//! This module defines the message types exchanged between a user interface
//! and the playground core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the UI to the core
//! - `Event`: State changes sent from the core to the UI
//!
//! Events are notifications only. The authoritative state lives in the
//! pipeline session and the playback board, which the UI can snapshot at
//! any time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::stage_models::{DeploymentMode, LogEntry, StageId};
use crate::timeline_models::TerminalPayload;

/// Operations sent from the UI to the core.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "selectDataset",
///   "payload": { "dataset_id": "telco-churn", "objective_id": "churn-predict" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Stage 1: pick a dataset and one of its objectives.
    SelectDataset {
        dataset_id: String,
        objective_id: String,
    },

    /// Stage 2: record the business goal and deployment target.
    ConfigureBusiness {
        business_goal: String,
        deployment_mode: DeploymentMode,
    },

    /// Enter a stage's playback routine, or rehydrate it from the cache.
    RunStage { stage: StageId },

    /// Mark `stage` complete and move to the next one.
    Proceed { stage: StageId },

    /// Navigate back to an earlier stage.
    Retreat { to: StageId },

    /// Stop the playback that is currently running, if any.
    CancelPlayback,

    /// Move the drift week pointer.
    SetDriftWeek { week: u8 },

    /// Clear the whole session.
    Reset,
}

/// Events sent from the core to the UI.
///
/// ```json
/// {
///   "type": "entityProgress",
///   "payload": { "stage": "model-selection", "entity": "XGBoost", "progress": 40.0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The active stage changed.
    StageChanged { stage: StageId },

    /// A stage was added to the completed set.
    StageCompleted { stage: StageId },

    /// A line was appended to the session log.
    LogAppended { entry: LogEntry },

    /// An entity advanced during playback.
    EntityProgress {
        stage: StageId,
        entity: String,
        progress: f64,
    },

    /// An entity reached 100% and revealed its payload.
    EntityCompleted {
        stage: StageId,
        entity: String,
        payload: TerminalPayload,
    },

    /// Playback for a stage delivered its last event.
    PlaybackFinished { stage: StageId },

    /// Playback for a stage was cancelled before finishing.
    PlaybackCancelled { stage: StageId },

    /// A stage was restored from its cached result without playback.
    StageRehydrated { stage: StageId },

    /// A stage's result slot was written.
    ResultWritten { stage: StageId, overwritten: bool },

    /// The winning model was revealed.
    ChampionRevealed { name: String },

    /// The drift week pointer moved.
    DriftWeekChanged { week: u8 },

    /// The session was cleared.
    SessionReset {
        #[ts(type = "string")]
        session_id: Uuid,
    },
}
