//! Timeline and playback state models.
//!
//! A timeline is an ordered list of [`TimelineEvent`]s. Playing it back
//! mutates a list of [`EntityState`]s that the rendering layer observes
//! through a [`PlaybackSnapshot`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::metrics_models::ModelMetrics;
use crate::stage_models::{Insight, StageId};

/// Lifecycle of one entity inside a timeline.
///
/// Waiting -> Running -> Complete. An entity never leaves `Complete`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    Waiting,
    Running,
    Complete,
}

/// Value delivered together with an entity's final (100%) event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum TerminalPayload {
    /// Final metrics of a trained candidate model or of a validated week.
    Metrics(ModelMetrics),

    /// Finding revealed when a profiling module or discovery phase finishes.
    Finding(Insight),
}

impl TerminalPayload {
    pub fn metrics(&self) -> Option<&ModelMetrics> {
        match self {
            TerminalPayload::Metrics(metrics) => Some(metrics),
            TerminalPayload::Finding(_) => None,
        }
    }

    pub fn finding(&self) -> Option<&Insight> {
        match self {
            TerminalPayload::Finding(insight) => Some(insight),
            TerminalPayload::Metrics(_) => None,
        }
    }
}

/// One discrete progress update for one entity.
///
/// Events are immutable once built. For a given entity progress is strictly
/// increasing, and only the last event (progress 100) carries a payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct TimelineEvent {
    /// Offset from playback start, in milliseconds.
    #[ts(type = "number")]
    pub offset_ms: u64,

    /// Name of the entity this event advances.
    pub entity: String,

    /// Progress percentage in `(0, 100]`.
    pub progress: f64,

    /// Present exactly on the entity's terminal event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TerminalPayload>,
}

impl TimelineEvent {
    pub fn is_terminal(&self) -> bool {
        self.payload.is_some()
    }
}

/// Observable state of one entity during playback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct EntityState {
    pub name: String,
    pub status: EntityStatus,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TerminalPayload>,
}

impl EntityState {
    pub fn waiting(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: EntityStatus::Waiting,
            progress: 0.0,
            payload: None,
        }
    }

    pub fn completed(name: impl Into<String>, payload: TerminalPayload) -> Self {
        Self {
            name: name.into(),
            status: EntityStatus::Complete,
            progress: 100.0,
            payload: Some(payload),
        }
    }
}

/// One row of the model leaderboard, ranked by AUC.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct LeaderboardEntry {
    pub name: String,
    pub metrics: ModelMetrics,
}

/// Everything the rendering layer needs to draw the active stage's playback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct PlaybackSnapshot {
    /// Stage whose playback this snapshot describes, if any.
    pub stage: Option<StageId>,

    /// Entities in declaration order.
    pub entities: Vec<EntityState>,

    /// Set once the stage's analysis is done, either by playback or by
    /// rehydration from a cached result.
    pub analysis_complete: bool,

    /// Completed models ranked by AUC, best first. Empty outside model selection.
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,

    /// Revealed champion, once the final pause has elapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion: Option<String>,
}

impl PlaybackSnapshot {
    pub fn entity(&self, name: &str) -> Option<&EntityState> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn all_complete(&self) -> bool {
        !self.entities.is_empty()
            && self
                .entities
                .iter()
                .all(|entity| entity.status == EntityStatus::Complete)
    }
}
