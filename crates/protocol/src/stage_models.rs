//! Stage identifiers, session log entries and per-stage result objects.
//!
//! Each of the six stages owns exactly one result type. Results are written
//! into the pipeline session when the stage's playback completes and are
//! read by later stages.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::drift_models::{DriftSimulation, RetrainingResult};
use crate::metrics_models::ModelMetrics;
use crate::timeline_models::LeaderboardEntry;

/// One of the six steps of the guided pipeline, in order.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS,
)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    ChooseDataset = 1,
    BusinessSetup = 2,
    DataProfiling = 3,
    PatternDiscovery = 4,
    Validation = 5,
    ModelSelection = 6,
}

impl StageId {
    pub const FIRST: StageId = StageId::ChooseDataset;
    pub const LAST: StageId = StageId::ModelSelection;

    pub const ALL: [StageId; 6] = [
        StageId::ChooseDataset,
        StageId::BusinessSetup,
        StageId::DataProfiling,
        StageId::PatternDiscovery,
        StageId::Validation,
        StageId::ModelSelection,
    ];

    /// Stage number in `1..=6`.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Convert a stage number back into a `StageId`.
    pub fn from_number(number: u8) -> Option<StageId> {
        StageId::ALL.iter().copied().find(|stage| stage.number() == number)
    }

    pub fn next(self) -> Option<StageId> {
        StageId::from_number(self.number() + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            StageId::ChooseDataset => "Choose Dataset",
            StageId::BusinessSetup => "Business Setup",
            StageId::DataProfiling => "Data Profiling",
            StageId::PatternDiscovery => "Pattern Discovery",
            StageId::Validation => "Validation",
            StageId::ModelSelection => "Model Selection",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

/// Severity of a user-facing session log line.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Action,
}

/// One line of the append-only session log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
}

/// Tone of an insight card.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Info,
    Warning,
    Success,
}

/// A short narrative finding revealed by a stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Insight {
    pub id: String,
    pub text: String,
    pub kind: InsightKind,
}

/// Where the trained model will run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    Cloud,
    OnPremise,
    Edge,
}

/// Result of stage 1: the chosen dataset and objective.
///
/// The drift simulation is synthesized once, at selection time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct DatasetChoice {
    pub dataset_id: String,
    pub objective_id: String,
    pub drift: DriftSimulation,
}

/// Result of stage 2.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct BusinessSetup {
    pub business_goal: String,
    pub deployment_mode: DeploymentMode,
}

/// A profiling module together with the finding it revealed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ModuleFinding {
    pub module: String,
    pub insight: Insight,
}

/// Result of stage 3.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ProfilingResults {
    pub modules: Vec<ModuleFinding>,
    pub quality_score: u32,
}

/// Result of stage 4.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PatternResults {
    pub phases: Vec<ModuleFinding>,
    pub cluster_count: u32,
    pub anomaly_count: u32,
    pub anomaly_percent: f64,
}

/// Result of stage 5, derived from the dataset's drift simulation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ValidationResults {
    /// One finding per simulated week, in week order.
    pub checks: Vec<ModuleFinding>,
    pub weeks_checked: u8,
    pub first_warning_week: Option<u8>,
    pub first_critical_week: Option<u8>,
    pub failing_features: Vec<String>,
    pub final_drift_score: f64,
    pub retraining: RetrainingResult,
}

/// Result of stage 6: the leaderboard and the champion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ModelSelectionResults {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub champion: String,
    pub champion_metrics: ModelMetrics,
}

/// A result object tagged with the stage that owns it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum StageResult {
    Dataset(DatasetChoice),
    Business(BusinessSetup),
    Profiling(ProfilingResults),
    Patterns(PatternResults),
    Validation(ValidationResults),
    ModelSelection(ModelSelectionResults),
}

impl StageResult {
    /// The stage that is the sole writer of this result.
    pub fn stage(&self) -> StageId {
        match self {
            StageResult::Dataset(_) => StageId::ChooseDataset,
            StageResult::Business(_) => StageId::BusinessSetup,
            StageResult::Profiling(_) => StageId::DataProfiling,
            StageResult::Patterns(_) => StageId::PatternDiscovery,
            StageResult::Validation(_) => StageId::Validation,
            StageResult::ModelSelection(_) => StageId::ModelSelection,
        }
    }
}

/// Read-only copy of a pipeline session for the rendering layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct SessionSnapshot {
    #[ts(type = "string")]
    pub session_id: Uuid,
    pub current_stage: StageId,
    pub completed_stages: BTreeSet<StageId>,
    pub results: Vec<StageResult>,
    pub log: Vec<LogEntry>,
}
