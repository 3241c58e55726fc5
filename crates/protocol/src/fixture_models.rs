//! Fixture models for `.playground/fixtures/*.yaml`.
//!
//! A fixture bundles every precomputed number one dataset needs: drift
//! anchors, profiling and discovery reveals, and candidate models with their
//! training budgets. The core treats fixtures as opaque data keyed by id.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::drift_models::RetrainingResult;
use crate::metrics_models::ModelMetrics;
use crate::stage_models::Insight;

/// Kind of learning task a dataset supports.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    Classification,
    Regression,
    TimeSeries,
}

/// Descriptive header of a dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct DatasetConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub domain: String,
    pub task_type: TaskType,
    pub rows: u64,
    pub features: u32,
}

/// A business objective the user can pick for a dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct BusinessObjective {
    pub id: String,
    pub label: String,
    pub target_column: String,
    pub metric: String,
}

/// Healthy and critical anchors the weekly drift series is interpolated between.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct DriftFixture {
    pub healthy: ModelMetrics,
    pub critical: ModelMetrics,
    /// Monitored features, most important first.
    pub features: Vec<String>,
    pub retraining: RetrainingResult,
}

/// One sequentially revealed unit of work: a profiling module or a
/// pattern-discovery phase.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct RevealFixture {
    pub name: String,
    #[ts(type = "number")]
    pub duration_ms: i64,
    pub insight: Insight,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ProfilingFixture {
    pub quality_score: u32,
    pub modules: Vec<RevealFixture>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct PatternFixture {
    pub cluster_count: u32,
    pub anomaly_count: u32,
    pub anomaly_percent: f64,
    pub phases: Vec<RevealFixture>,
}

fn default_week_duration_ms() -> i64 {
    400
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ValidationFixture {
    /// Playback budget for checking a single simulated week.
    #[serde(default = "default_week_duration_ms")]
    #[ts(type = "number")]
    pub week_duration_ms: i64,
}

impl Default for ValidationFixture {
    fn default() -> Self {
        Self {
            week_duration_ms: default_week_duration_ms(),
        }
    }
}

/// A candidate model: how long it "trains" and what it scores.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct CandidateFixture {
    pub name: String,
    #[ts(type = "number")]
    pub duration_ms: i64,
    pub metrics: ModelMetrics,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ModelFixture {
    /// Declared winner. Falls back to the leaderboard leader when absent
    /// from `candidates`.
    pub champion: String,
    pub candidates: Vec<CandidateFixture>,
}

/// Everything precomputed for one dataset.
///
/// # Example
///
/// ```yaml
/// dataset:
///   id: telco-churn
///   name: Telco Customer Churn
///   domain: telecom
///   task-type: classification
///   rows: 7043
///   features: 21
/// objectives:
///   - id: churn-predict
///     label: Reduce churn
///     target-column: Churn
///     metric: recall
/// drift:
///   healthy: { accuracy: 0.873, precision: 0.781, recall: 0.694, f1: 0.735, auc: 0.912 }
///   critical: { accuracy: 0.741, precision: 0.628, recall: 0.542, f1: 0.582, auc: 0.779 }
///   features: [tenure, MonthlyCharges]
///   retraining: { ... }
/// profiling: { ... }
/// patterns: { ... }
/// models:
///   champion: XGBoost
///   candidates:
///     - name: XGBoost
///       duration-ms: 5000
///       metrics: { ... }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct Fixture {
    pub dataset: DatasetConfig,
    pub objectives: Vec<BusinessObjective>,
    pub drift: DriftFixture,
    pub profiling: ProfilingFixture,
    pub patterns: PatternFixture,
    #[serde(default)]
    pub validation: ValidationFixture,
    pub models: ModelFixture,
}

impl Fixture {
    pub fn id(&self) -> &str {
        &self.dataset.id
    }

    pub fn objective(&self, objective_id: &str) -> Option<&BusinessObjective> {
        self.objectives.iter().find(|o| o.id == objective_id)
    }
}
